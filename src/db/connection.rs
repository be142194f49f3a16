// src/db/connection.rs
use rusqlite::Connection;
use std::cell::RefCell;
use std::fs;

use crate::errors::ServerError;

// Thread-local connection slot. Each server worker thread opens the
// database once and reuses the connection for every request it serves.
thread_local! {
    static DB_CONN: RefCell<Option<Connection>> = const { RefCell::new(None) };
}

#[derive(Clone)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Open (or fetch) the per-thread SQLite connection and run `f(conn)`.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ServerError>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                if slot.is_none() {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| ServerError::db("open db failed", e))?;
                    conn.pragma_update(None, "foreign_keys", "ON")
                        .map_err(|e| ServerError::db("enable foreign keys failed", e))?;
                    *slot = Some(conn);
                }
                f(slot.as_mut().unwrap())
            })
            .map_err(|_| ServerError::Internal)?
    }
}

/// Apply the DDL in `schema_path` (idempotent: all statements are
/// `create .. if not exists`).
pub fn init_db(db: &Database, schema_path: &str) -> Result<(), ServerError> {
    let schema_sql = fs::read_to_string(schema_path)
        .map_err(|e| ServerError::db("read schema file failed", e))?;

    db.with_conn(|conn| {
        conn.execute_batch(&schema_sql)
            .map_err(|e| ServerError::db("apply schema failed", e))
    })?;

    log::info!("database initialized from {schema_path}");
    Ok(())
}
