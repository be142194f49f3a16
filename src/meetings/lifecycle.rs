// src/meetings/lifecycle.rs
//
// The meeting state machine: create, admin transition, cancel, reschedule.
// Persistence always commits before any notification referencing it goes
// out, and notification failures never unwind a committed change.
use std::sync::Arc;

use log::warn;
use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::db::meetings::{self, NewMeeting};
use crate::db::{properties, users};
use crate::domain::meeting::parse_scheduled_at;
use crate::domain::{Meeting, MeetingStatus};
use crate::errors::ServerError;
use crate::notify::{self, MeetingEmail, Notifier};

/// Create/reschedule request body as it arrives on the wire. Field
/// presence is validated here, not by serde, so missing fields surface
/// as the workflow's own validation error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub property_id: Option<i64>,
    pub phone: Option<String>,
    pub scheduled_at: Option<String>,
    pub notes: Option<String>,
}

pub struct MeetingLifecycle {
    notifier: Arc<dyn Notifier>,
}

impl MeetingLifecycle {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Create a meeting request on behalf of the authenticated caller.
    ///
    /// Validation order: required fields, property exists, date parses,
    /// date is future, no active meeting within the ±1h window. The
    /// conflict check and insert run in one transaction; admins are
    /// notified on a detached thread after commit.
    pub fn create(
        &self,
        conn: &mut Connection,
        requester: &CurrentUser,
        req: &CreateMeetingRequest,
        now: i64,
    ) -> Result<Meeting, ServerError> {
        let (property_id, phone, raw_date) = match (
            req.property_id,
            req.phone.as_deref().filter(|p| !p.trim().is_empty()),
            req.scheduled_at.as_deref().filter(|d| !d.trim().is_empty()),
        ) {
            (Some(p), Some(ph), Some(d)) => (p, ph.trim(), d),
            _ => {
                return Err(ServerError::Validation(
                    "please provide all required fields".into(),
                ))
            }
        };

        let property = properties::get_property(conn, property_id)?
            .ok_or_else(|| ServerError::NotFound("property not found".into()))?;

        let scheduled_at = parse_scheduled_at(raw_date)?;
        if scheduled_at <= now {
            return Err(ServerError::Validation(
                "meeting date must be in the future".into(),
            ));
        }

        let notes = req.notes.as_deref().unwrap_or("");
        let meeting = meetings::create_meeting(
            conn,
            &NewMeeting {
                property_id,
                property_title: &property.title,
                requester_id: requester.id,
                requester_name: &requester.name,
                requester_email: &requester.email,
                requester_phone: phone,
                scheduled_at,
                notes,
            },
            now,
        )?;

        self.notify_admins(
            conn,
            MeetingEmail::NewRequest {
                requester_name: requester.name.clone(),
                requester_email: requester.email.clone(),
                requester_phone: phone.to_string(),
                property_title: property.title.clone(),
                scheduled_at,
                notes: notes.to_string(),
            },
        );

        Ok(meeting)
    }

    /// Admin decision. Permissive on the status value itself (re-accepting
    /// an accepted meeting is a no-op that still refreshes responded_at);
    /// the requester is emailed only when the status actually changed to
    /// accepted or rejected. Returns the updated meeting plus whether the
    /// notification attempt succeeded.
    pub fn transition(
        &self,
        conn: &mut Connection,
        meeting_id: i64,
        raw_status: &str,
        admin_response: Option<&str>,
        now: i64,
    ) -> Result<(Meeting, bool), ServerError> {
        let target = MeetingStatus::parse(raw_status)?;

        let before = meetings::get_meeting(conn, meeting_id)?
            .ok_or_else(|| ServerError::NotFound("meeting not found".into()))?;
        let previous = before.status;

        let meeting =
            meetings::set_status(conn, meeting_id, target, admin_response.unwrap_or(""), now)?;

        let email = match target {
            MeetingStatus::Accepted if previous != MeetingStatus::Accepted => {
                let agent_name = properties::get_property(conn, meeting.property_id)?
                    .and_then(|p| p.agent_name)
                    .unwrap_or_else(|| "Our Agent".to_string());
                Some(MeetingEmail::Accepted {
                    requester_name: meeting.requester_name.clone(),
                    property_title: meeting.property_title.clone(),
                    scheduled_at: meeting.scheduled_at,
                    admin_response: meeting.admin_response.clone(),
                    agent_name,
                })
            }
            MeetingStatus::Rejected if previous != MeetingStatus::Rejected => {
                Some(MeetingEmail::Rejected {
                    requester_name: meeting.requester_name.clone(),
                    property_title: meeting.property_title.clone(),
                    admin_response: meeting.admin_response.clone(),
                })
            }
            // No requester email for pending/cancelled targets, nor for
            // decisions that did not change the status.
            _ => None,
        };

        let notification_sent = match email {
            Some(email) => {
                let recipient = self.requester_address(conn, &meeting)?;
                match self.notifier.send(&recipient, &email) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("decision email for meeting {meeting_id} failed: {e}");
                        false
                    }
                }
            }
            None => false,
        };

        Ok((meeting, notification_sent))
    }

    /// Cancel a still-future, non-terminal meeting. Allowed for the
    /// original requester or any admin. Sends no notification (the
    /// cancellation template exists but is deliberately unwired).
    pub fn cancel(
        &self,
        conn: &mut Connection,
        caller: &CurrentUser,
        meeting_id: i64,
        now: i64,
    ) -> Result<(), ServerError> {
        let meeting = meetings::get_meeting(conn, meeting_id)?
            .ok_or_else(|| ServerError::NotFound("meeting not found".into()))?;

        let is_owner = meeting.requester_id == Some(caller.id);
        if !is_owner && !caller.role.is_admin() {
            return Err(ServerError::Forbidden(
                "not authorized to cancel this meeting".into(),
            ));
        }

        if meeting.scheduled_at < now {
            return Err(ServerError::Validation(
                "cannot cancel past meetings".into(),
            ));
        }
        if meeting.status.is_terminal() {
            return Err(ServerError::Validation(
                "meeting is already cancelled or rejected".into(),
            ));
        }

        meetings::mark_cancelled(conn, meeting_id, now)
    }

    /// Move a pending/accepted meeting to a new future date. Requester
    /// only. The meeting re-enters the approval queue (status resets to
    /// pending, prior admin decision cleared) and admins are notified
    /// again with the previous date in the notes.
    pub fn reschedule(
        &self,
        conn: &mut Connection,
        caller: &CurrentUser,
        meeting_id: i64,
        raw_date: Option<&str>,
        now: i64,
    ) -> Result<Meeting, ServerError> {
        let meeting = meetings::get_meeting(conn, meeting_id)?
            .ok_or_else(|| ServerError::NotFound("meeting not found".into()))?;

        if meeting.requester_id != Some(caller.id) {
            return Err(ServerError::Forbidden(
                "not authorized to reschedule this meeting".into(),
            ));
        }
        if !meeting.status.is_active() {
            return Err(ServerError::Validation(
                "cannot reschedule this meeting".into(),
            ));
        }

        let raw_date = raw_date
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| ServerError::Validation("please provide a new meeting date".into()))?;
        let new_scheduled_at = parse_scheduled_at(raw_date)?;
        if new_scheduled_at <= now {
            return Err(ServerError::Validation(
                "new meeting date must be in the future".into(),
            ));
        }

        let previous_date = meeting.scheduled_at;
        let updated = meetings::apply_reschedule(conn, meeting_id, new_scheduled_at, now)?;

        self.notify_admins(
            conn,
            MeetingEmail::NewRequest {
                requester_name: updated.requester_name.clone(),
                requester_email: updated.requester_email.clone(),
                requester_phone: updated.requester_phone.clone(),
                property_title: updated.property_title.clone(),
                scheduled_at: new_scheduled_at,
                notes: format!(
                    "Rescheduled meeting. Previous date: {}",
                    chrono::DateTime::from_timestamp(previous_date, 0)
                        .map(|dt| dt.to_rfc3339())
                        .unwrap_or_else(|| previous_date.to_string())
                ),
            },
        );

        Ok(updated)
    }

    /// Fan the new-request email out to every admin on a detached thread.
    /// Best-effort by design: a failed lookup or send is logged, never
    /// surfaced to the caller.
    fn notify_admins(&self, conn: &Connection, email: MeetingEmail) {
        match users::admin_emails(conn) {
            Ok(recipients) => {
                notify::dispatch_detached(Arc::clone(&self.notifier), recipients, email);
            }
            Err(e) => warn!("admin email lookup failed, skipping notification: {e}"),
        }
    }

    /// Decision emails go to the account's current address when the
    /// account still exists, falling back to the snapshot taken at
    /// creation time.
    fn requester_address(
        &self,
        conn: &Connection,
        meeting: &Meeting,
    ) -> Result<String, ServerError> {
        if let Some(uid) = meeting.requester_id {
            if let Some(email) = users::email_for(conn, uid)? {
                return Ok(email);
            }
        }
        Ok(meeting.requester_email.clone())
    }
}
