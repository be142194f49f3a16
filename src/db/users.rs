// src/db/users.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::{CurrentUser, Role};
use crate::errors::ServerError;

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<CurrentUser>, ServerError> {
    conn.query_row(
        "select id, name, email, role from users where id = ?",
        params![user_id],
        |r| {
            Ok(CurrentUser {
                id: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
                role: Role::from_column(&r.get::<_, String>(3)?),
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::db("select user failed", e))
}

/// Current account email for a user id, if the account still exists.
/// Used to route notifications to the live address rather than the
/// snapshot taken at meeting creation.
pub fn email_for(conn: &Connection, user_id: i64) -> Result<Option<String>, ServerError> {
    conn.query_row(
        "select email from users where id = ?",
        params![user_id],
        |r| r.get(0),
    )
    .optional()
    .map_err(|e| ServerError::db("select user email failed", e))
}

/// Every admin's email, for new-request fan-out.
pub fn admin_emails(conn: &Connection) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare("select email from users where role = 'admin'")
        .map_err(|e| ServerError::db("prepare admin emails failed", e))?;

    let rows = stmt
        .query_map([], |r| r.get::<_, String>(0))
        .map_err(|e| ServerError::db("query admin emails failed", e))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::db("read admin email failed", e))?);
    }
    Ok(out)
}

/// Insert a user if the email is new, then return the user id.
/// Email should already be normalized by the caller (trim/lowercase).
pub fn ensure_user(
    conn: &Connection,
    name: &str,
    email: &str,
    role: Role,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert or ignore into users (name, email, role, created_at) values (?, ?, ?, ?)",
        params![name, email, role.as_str(), now],
    )
    .map_err(|e| ServerError::db("insert user failed", e))?;

    conn.query_row(
        "select id from users where email = ?",
        params![email],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::db("select user id failed", e))
}

/// First-run admin seeding: create the account if missing and make sure it
/// holds the admin role either way.
pub fn ensure_admin(
    conn: &Connection,
    name: &str,
    email: &str,
    now: i64,
) -> Result<i64, ServerError> {
    let id = ensure_user(conn, name, email, Role::Admin, now)?;
    conn.execute(
        "update users set role = 'admin' where id = ?",
        params![id],
    )
    .map_err(|e| ServerError::db("promote admin failed", e))?;
    Ok(id)
}
