// src/router.rs
use std::collections::HashMap;
use std::io::Read;

use astra::Request;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, CurrentUser};
use crate::db::Database;
use crate::domain::MeetingStatus;
use crate::errors::ServerError;
use crate::meetings::queries::{self, AdminListParams};
use crate::meetings::{CreateMeetingRequest, MeetingLifecycle};
use crate::responses::{json_response, ResultResp};

pub struct AppState {
    pub db: Database,
    pub lifecycle: MeetingLifecycle,
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let now = Utc::now().timestamp();

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["api", "meetings"]) => create_meeting(&mut req, state, now),
        ("GET", ["api", "meetings", "my-meetings"]) => my_meetings(&req, state, now),
        ("GET", ["api", "meetings", "admin", "all"]) => admin_all(&req, state, now),
        ("GET", ["api", "meetings", "admin", "stats"]) => admin_stats(&req, state, now),
        ("GET", ["api", "meetings", "property", pid]) => {
            property_meetings(state, parse_id(pid)?, now)
        }
        ("PATCH", ["api", "meetings", id, "status"]) => {
            let id = parse_id(id)?;
            set_meeting_status(&mut req, state, id, now)
        }
        ("PATCH", ["api", "meetings", id, "reschedule"]) => {
            let id = parse_id(id)?;
            reschedule_meeting(&mut req, state, id, now)
        }
        ("DELETE", ["api", "meetings", id]) => {
            let id = parse_id(id)?;
            cancel_meeting(&req, state, id, now)
        }
        _ => Err(ServerError::NotFound("no such route".into())),
    }
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::Validation(format!("invalid id: {raw}")))
}

/// Resolve the caller from the Authorization header.
fn current_user(req: &Request, state: &AppState, now: i64) -> Result<CurrentUser, ServerError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state
        .db
        .with_conn(|conn| auth::authenticate(conn, header.as_deref(), now))
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let mut buf = String::new();
    req.body_mut()
        .reader()
        .read_to_string(&mut buf)
        .map_err(|e| ServerError::Validation(format!("unreadable request body: {e}")))?;
    serde_json::from_str(&buf)
        .map_err(|e| ServerError::Validation(format!("invalid json body: {e}")))
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(q) = req.uri().query() {
        for pair in q.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }
    map
}

// POST /api/meetings
fn create_meeting(req: &mut Request, state: &AppState, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;
    let body: CreateMeetingRequest = read_json(req)?;

    let meeting = state
        .db
        .with_conn(|conn| state.lifecycle.create(conn, &user, &body, now))?;

    json_response(
        201,
        &json!({
            "status": "success",
            "data": meeting,
            "message": "Meeting request submitted successfully. \
                        You will receive notifications at your registered email.",
        }),
    )
}

// GET /api/meetings/my-meetings
fn my_meetings(req: &Request, state: &AppState, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;
    let meetings = queries::my_meetings(&state.db, user.id)?;
    json_response(200, &json!({ "status": "success", "data": meetings }))
}

// GET /api/meetings/admin/all
fn admin_all(req: &Request, state: &AppState, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;
    auth::require_admin(&user)?;

    let q = parse_query(req);
    let mut params = AdminListParams::default();

    if let Some(status) = q.get("status").filter(|s| !s.is_empty() && *s != "all") {
        params.status = Some(MeetingStatus::parse(status)?);
    }
    params.search = q.get("search").filter(|s| !s.is_empty()).cloned();
    if let Some(page) = q.get("page").and_then(|p| p.parse().ok()) {
        params.page = page;
    }
    if let Some(limit) = q.get("limit").and_then(|l| l.parse().ok()) {
        params.limit = limit;
    }
    if let Some(sort_by) = q.get("sortBy") {
        params.sort_by = crate::db::meetings::SortField::parse(sort_by);
    }
    if let Some(order) = q.get("sortOrder") {
        params.descending = order != "asc";
    }

    let (items, pagination) = queries::admin_meetings(&state.db, &params)?;
    json_response(
        200,
        &json!({ "status": "success", "data": items, "pagination": pagination }),
    )
}

// GET /api/meetings/admin/stats
fn admin_stats(req: &Request, state: &AppState, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;
    auth::require_admin(&user)?;

    let stats = queries::meeting_stats(&state.db, now)?;
    json_response(200, &json!({ "status": "success", "data": stats }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: Option<String>,
    admin_response: Option<String>,
}

// PATCH /api/meetings/{id}/status
fn set_meeting_status(req: &mut Request, state: &AppState, id: i64, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;
    auth::require_admin(&user)?;

    let body: StatusBody = read_json(req)?;
    let raw_status = body
        .status
        .as_deref()
        .ok_or_else(|| ServerError::Validation("missing status".into()))?;

    let (meeting, email_sent) = state.db.with_conn(|conn| {
        state
            .lifecycle
            .transition(conn, id, raw_status, body.admin_response.as_deref(), now)
    })?;

    let message = match meeting.status {
        MeetingStatus::Accepted if email_sent => "Meeting accepted. Email sent to user.",
        MeetingStatus::Accepted => "Meeting accepted. Email failed to send.",
        MeetingStatus::Rejected if email_sent => "Meeting rejected. Email sent to user.",
        MeetingStatus::Rejected => "Meeting rejected. Email failed to send.",
        _ => "Meeting status updated.",
    };

    json_response(
        200,
        &json!({
            "status": "success",
            "data": meeting,
            "emailSent": email_sent,
            "message": message,
        }),
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RescheduleBody {
    scheduled_at: Option<String>,
}

// PATCH /api/meetings/{id}/reschedule
fn reschedule_meeting(req: &mut Request, state: &AppState, id: i64, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;
    let body: RescheduleBody = read_json(req)?;

    let meeting = state.db.with_conn(|conn| {
        state
            .lifecycle
            .reschedule(conn, &user, id, body.scheduled_at.as_deref(), now)
    })?;

    json_response(
        200,
        &json!({
            "status": "success",
            "data": meeting,
            "message": "Meeting rescheduled successfully. Waiting for admin approval.",
        }),
    )
}

// DELETE /api/meetings/{id}
fn cancel_meeting(req: &Request, state: &AppState, id: i64, now: i64) -> ResultResp {
    let user = current_user(req, state, now)?;

    state
        .db
        .with_conn(|conn| state.lifecycle.cancel(conn, &user, id, now))?;

    json_response(
        200,
        &json!({ "status": "success", "message": "Meeting cancelled successfully" }),
    )
}

// GET /api/meetings/property/{id} — public availability view.
fn property_meetings(state: &AppState, property_id: i64, now: i64) -> ResultResp {
    let meetings = queries::property_meetings(&state.db, property_id, now)?;
    json_response(200, &json!({ "status": "success", "data": meetings }))
}
