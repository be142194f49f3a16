// src/notify/mod.rs
pub mod brevo;
pub mod templates;

use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

pub use brevo::BrevoNotifier;

/// Delivery failure. Deliberately separate from `ServerError`: email is
/// advisory and a failed send must never fail the lifecycle operation
/// that triggered it.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("api error: {0}")]
    Api(String),
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Business content of an outgoing meeting email. Subject and HTML
/// composition live in `templates`.
#[derive(Debug, Clone)]
pub enum MeetingEmail {
    /// To each admin when a meeting is requested or rescheduled.
    NewRequest {
        requester_name: String,
        requester_email: String,
        requester_phone: String,
        property_title: String,
        scheduled_at: i64,
        notes: String,
    },
    /// To the requester when an admin accepts.
    Accepted {
        requester_name: String,
        property_title: String,
        scheduled_at: i64,
        admin_response: String,
        agent_name: String,
    },
    /// To the requester when an admin rejects.
    Rejected {
        requester_name: String,
        property_title: String,
        admin_response: String,
    },
    /// Defined for completeness; the cancel path deliberately sends
    /// nothing today.
    Cancelled {
        requester_name: String,
        property_title: String,
        scheduled_at: i64,
    },
}

pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, email: &MeetingEmail) -> Result<SendReceipt, NotifyError>;
}

/// Development/test notifier: logs instead of sending. Selected when no
/// API key is configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, to: &str, email: &MeetingEmail) -> Result<SendReceipt, NotifyError> {
        info!("email (log only) to {to}: {}", templates::subject(email));
        Ok(SendReceipt { message_id: None })
    }
}

/// Fan an email out to every recipient, isolating failures: one bad
/// address never blocks the rest. Returns the delivered count.
pub fn dispatch_to_all(notifier: &dyn Notifier, recipients: &[String], email: &MeetingEmail) -> usize {
    let mut delivered = 0;
    for to in recipients {
        match notifier.send(to, email) {
            Ok(_) => delivered += 1,
            Err(e) => warn!("notification to {to} failed: {e}"),
        }
    }
    delivered
}

/// Hand the fan-out to a detached thread. Called only after the primary
/// transaction has committed, so the emails always describe durable state.
pub fn dispatch_detached(notifier: Arc<dyn Notifier>, recipients: Vec<String>, email: MeetingEmail) {
    if recipients.is_empty() {
        return;
    }
    std::thread::spawn(move || {
        let delivered = dispatch_to_all(notifier.as_ref(), &recipients, &email);
        info!(
            "notification fan-out: {delivered}/{} delivered",
            recipients.len()
        );
    });
}
