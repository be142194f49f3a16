// src/auth/mod.rs
pub mod sessions;
pub mod token;

use rusqlite::Connection;
use serde::Serialize;

use crate::errors::ServerError;

/// Role attached to an identity. The core trusts this blindly for
/// admin-gating; how the role got set is the identity provider's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Anything unrecognized in storage degrades to the unprivileged role.
    pub fn from_column(raw: &str) -> Self {
        if raw == "admin" {
            Self::Admin
        } else {
            Self::User
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

/// The authenticated caller, as the rest of the service sees it.
/// Name and email are authoritative at meeting-creation time.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Resolve the caller from an `Authorization: Bearer <token>` header value.
pub fn authenticate(
    conn: &Connection,
    authorization: Option<&str>,
    now: i64,
) -> Result<CurrentUser, ServerError> {
    let raw_token = authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServerError::Unauthorized("authentication required".into()))?;

    sessions::current_user(conn, raw_token, now)?
        .ok_or_else(|| ServerError::Unauthorized("invalid or expired token".into()))
}

/// Admin gate for back-office routes.
pub fn require_admin(user: &CurrentUser) -> Result<(), ServerError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ServerError::Forbidden(
            "admin privileges required".into(),
        ))
    }
}
