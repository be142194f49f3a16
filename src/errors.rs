// src/errors.rs
use thiserror::Error;

/// Errors originating from server logic (routing, validation, authz)
/// or downstream layers (DB).
///
/// Notifier failures are deliberately *not* represented here: email
/// delivery is advisory and must never fail a lifecycle operation.
/// See `notify::NotifyError`.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed or missing input, bad status value, past-dated scheduling.
    #[error("Bad Request: {0}")]
    Validation(String),

    /// Referenced meeting/property/route does not exist.
    #[error("Not Found: {0}")]
    NotFound(String),

    /// Overlapping active meeting for the same requester. Kept distinct
    /// from Validation so clients can offer "pick another time".
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks ownership or role for the requested mutation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Persistence-layer failure. The only class treated as fatal to the
    /// calling operation.
    #[error("Database Error: {0}")]
    Db(String),

    #[error("Internal Server Error")]
    Internal,
}

impl ServerError {
    pub fn db(context: &str, e: impl std::fmt::Display) -> Self {
        Self::Db(format!("{context}: {e}"))
    }
}
