// src/notify/templates.rs
//
// Subject + HTML composition for meeting emails. Business content only;
// transport (Brevo payload, headers) lives in `brevo`.
use chrono::{TimeZone, Utc};

use super::MeetingEmail;

fn format_date(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%A, %B %-d, %Y at %H:%M UTC").to_string(),
        None => ts.to_string(),
    }
}

pub fn subject(email: &MeetingEmail) -> String {
    match email {
        MeetingEmail::NewRequest { property_title, .. } => {
            format!("New meeting request: {property_title}")
        }
        MeetingEmail::Accepted { property_title, .. } => {
            format!("Meeting confirmed: {property_title}")
        }
        MeetingEmail::Rejected { property_title, .. } => {
            format!("Meeting update: {property_title}")
        }
        MeetingEmail::Cancelled { property_title, .. } => {
            format!("Meeting cancelled: {property_title}")
        }
    }
}

pub fn html_body(email: &MeetingEmail) -> String {
    match email {
        MeetingEmail::NewRequest {
            requester_name,
            requester_email,
            requester_phone,
            property_title,
            scheduled_at,
            notes,
        } => {
            let notes_block = if notes.is_empty() {
                String::new()
            } else {
                format!("<p><strong>Notes:</strong> {notes}</p>")
            };
            format!(
                r#"
                <h2>New meeting request</h2>
                <p>A viewing has been requested for <strong>{property_title}</strong>.</p>
                <p><strong>When:</strong> {date}</p>
                <p><strong>Requested by:</strong> {requester_name}<br>
                   {requester_email} &middot; {requester_phone}</p>
                {notes_block}
                <p>Please review and respond from the admin dashboard.</p>
                "#,
                date = format_date(*scheduled_at),
            )
        }
        MeetingEmail::Accepted {
            requester_name,
            property_title,
            scheduled_at,
            admin_response,
            agent_name,
        } => {
            let response_block = if admin_response.is_empty() {
                String::new()
            } else {
                format!("<p><em>{admin_response}</em></p>")
            };
            format!(
                r#"
                <h2>Your viewing is confirmed</h2>
                <p>Hi {requester_name},</p>
                <p>Your meeting for <strong>{property_title}</strong> has been accepted.</p>
                <p><strong>When:</strong> {date}<br>
                   <strong>Your agent:</strong> {agent_name}</p>
                {response_block}
                <p>If you can no longer make it, you can cancel or reschedule
                   from your meetings page.</p>
                "#,
                date = format_date(*scheduled_at),
            )
        }
        MeetingEmail::Rejected {
            requester_name,
            property_title,
            admin_response,
        } => {
            let response_block = if admin_response.is_empty() {
                String::new()
            } else {
                format!("<p><em>{admin_response}</em></p>")
            };
            format!(
                r#"
                <h2>About your viewing request</h2>
                <p>Hi {requester_name},</p>
                <p>We could not accommodate your meeting request for
                   <strong>{property_title}</strong>.</p>
                {response_block}
                <p>Feel free to request another time slot.</p>
                "#
            )
        }
        MeetingEmail::Cancelled {
            requester_name,
            property_title,
            scheduled_at,
        } => format!(
            r#"
            <h2>Meeting cancelled</h2>
            <p>Hi {requester_name},</p>
            <p>The viewing of <strong>{property_title}</strong> scheduled for
               {date} has been cancelled.</p>
            "#,
            date = format_date(*scheduled_at),
        ),
    }
}
