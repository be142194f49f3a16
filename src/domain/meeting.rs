// src/domain/meeting.rs
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// Two active meetings for the same requester may not sit within this many
/// seconds of each other (the ±1-hour conflict window).
pub const CONFLICT_WINDOW_SECS: i64 = 60 * 60;

/// Lifecycle state of a meeting request.
///
/// `Rejected` and `Cancelled` are terminal for `cancel`/`reschedule`;
/// an admin status update itself is deliberately permissive (re-accepting
/// an accepted meeting is a harmless no-op on the status value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a client-supplied status value.
    pub fn parse(s: &str) -> Result<Self, ServerError> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ServerError::Validation(format!("invalid status: {other}"))),
        }
    }

    /// Pending or accepted, i.e. still counts toward the conflict window.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// No further cancel/reschedule is permitted out of these states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property-viewing appointment request.
///
/// `property_title` and the requester name/email are snapshots taken at
/// creation time and never re-synced; historic meetings keep showing what
/// was actually communicated even if the property or account is renamed
/// later. Timestamps are UNIX seconds, serialized as RFC 3339 strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: i64,
    pub property_id: i64,
    pub property_title: String,
    pub requester_id: Option<i64>,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_phone: String,
    #[serde(with = "rfc3339")]
    pub scheduled_at: i64,
    pub notes: String,
    pub status: MeetingStatus,
    pub admin_response: String,
    #[serde(with = "rfc3339_opt")]
    pub responded_at: Option<i64>,
    #[serde(with = "rfc3339")]
    pub created_at: i64,
    #[serde(with = "rfc3339")]
    pub updated_at: i64,
}

/// Serialize unix-second timestamps as RFC 3339 for the JSON API.
pub mod rfc3339 {
    use chrono::{TimeZone, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(ts: &i64, ser: S) -> Result<S::Ok, S::Error> {
        match Utc.timestamp_opt(*ts, 0).single() {
            Some(dt) => ser.serialize_str(&dt.to_rfc3339()),
            None => ser.serialize_i64(*ts),
        }
    }
}

pub mod rfc3339_opt {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(ts: &Option<i64>, ser: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(t) => super::rfc3339::serialize(t, ser),
            None => ser.serialize_none(),
        }
    }
}

/// Parse a client-supplied RFC 3339 datetime into UNIX seconds.
pub fn parse_scheduled_at(raw: &str) -> Result<i64, ServerError> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.timestamp())
        .map_err(|_| ServerError::Validation("invalid date format".into()))
}
