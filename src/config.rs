// src/config.rs
use std::env;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path.
    pub db_path: String,
    /// Bind address for the HTTP server.
    pub bind_addr: String,
    /// Brevo API key. When absent, outgoing email is logged instead of sent.
    pub brevo_api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
    /// Optional first-run admin account (email + display name).
    pub admin_email: Option<String>,
    pub admin_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("DWELLINGS_DB").unwrap_or_else(|_| "dwellings.sqlite3".into()),
            bind_addr: env::var("DWELLINGS_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            brevo_api_key: env::var("BREVO_API_KEY").ok().filter(|k| !k.is_empty()),
            sender_email: env::var("SENDER_EMAIL")
                .unwrap_or_else(|_| "noreply@dwellings.example".into()),
            sender_name: env::var("SENDER_NAME").unwrap_or_else(|_| "Dwellings".into()),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|e| !e.is_empty()),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into()),
        }
    }
}
