// src/auth/sessions.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::{token, CurrentUser, Role};
use crate::errors::ServerError;

const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7; // 7 days

/// Mint a session for a user and return the raw bearer token.
/// Only the SHA-256 of the token is stored.
pub fn issue(conn: &Connection, user_id: i64, now: i64) -> Result<String, ServerError> {
    let raw_token = token::generate();
    let hash = token::digest(&raw_token);

    conn.execute(
        "insert into sessions (user_id, token_hash, created_at, expires_at)
         values (?, ?, ?, ?)",
        params![user_id, hash.as_slice(), now, now + SESSION_TTL_SECS],
    )
    .map_err(|e| ServerError::db("create session failed", e))?;

    conn.execute(
        "update users set last_login_at = ? where id = ?",
        params![now, user_id],
    )
    .map_err(|e| ServerError::db("update last_login_at failed", e))?;

    Ok(raw_token)
}

/// Resolve a raw token to the account it belongs to, if the session is
/// live (unexpired, unrevoked) and the account still exists.
pub fn current_user(
    conn: &Connection,
    raw_token: &str,
    now: i64,
) -> Result<Option<CurrentUser>, ServerError> {
    let hash = token::digest(raw_token);

    conn.query_row(
        "select u.id, u.name, u.email, u.role
         from sessions s
         join users u on u.id = s.user_id
         where s.token_hash = ?
           and s.expires_at > ?
           and s.revoked_at is null",
        params![hash.as_slice(), now],
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
    .map_err(|e| ServerError::db("session lookup failed", e))
}

/// Revoke one session by its raw token (logout).
pub fn revoke(conn: &Connection, raw_token: &str, now: i64) -> Result<(), ServerError> {
    let hash = token::digest(raw_token);
    conn.execute(
        "update sessions set revoked_at = ? where token_hash = ? and revoked_at is null",
        params![now, hash.as_slice()],
    )
    .map_err(|e| ServerError::db("revoke session failed", e))?;
    Ok(())
}
