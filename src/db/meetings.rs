// src/db/meetings.rs
use chrono::{TimeZone, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::Serialize;

use crate::domain::meeting::CONFLICT_WINDOW_SECS;
use crate::domain::{Meeting, MeetingStatus, PropertySummary};
use crate::errors::ServerError;

const SELECT_COLS: &str = "id, property_id, property_title, requester_id, requester_name, \
     requester_email, requester_phone, scheduled_at, notes, status, admin_response, \
     responded_at, created_at, updated_at";

/// Insert payload for a new meeting. Contact fields are the snapshot taken
/// from the authenticated account (name/email) plus the supplied phone.
#[derive(Debug)]
pub struct NewMeeting<'a> {
    pub property_id: i64,
    pub property_title: &'a str,
    pub requester_id: i64,
    pub requester_name: &'a str,
    pub requester_email: &'a str,
    pub requester_phone: &'a str,
    pub scheduled_at: i64,
    pub notes: &'a str,
}

fn status_from_col(idx: usize, raw: String) -> rusqlite::Result<MeetingStatus> {
    MeetingStatus::parse(&raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown meeting status: {raw}").into(),
        )
    })
}

fn meeting_from_row(r: &Row<'_>) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: r.get(0)?,
        property_id: r.get(1)?,
        property_title: r.get(2)?,
        requester_id: r.get(3)?,
        requester_name: r.get(4)?,
        requester_email: r.get(5)?,
        requester_phone: r.get(6)?,
        scheduled_at: r.get(7)?,
        notes: r.get(8)?,
        status: status_from_col(9, r.get::<_, String>(9)?)?,
        admin_response: r.get(10)?,
        responded_at: r.get(11)?,
        created_at: r.get(12)?,
        updated_at: r.get(13)?,
    })
}

pub fn get_meeting(conn: &Connection, id: i64) -> Result<Option<Meeting>, ServerError> {
    conn.query_row(
        &format!("select {SELECT_COLS} from meetings where id = ?"),
        params![id],
        meeting_from_row,
    )
    .optional()
    .map_err(|e| ServerError::db("select meeting failed", e))
}

/// Conflict check + insert as one IMMEDIATE transaction.
///
/// IMMEDIATE takes the writer lock up front, so two concurrent creates for
/// the same requester serialize here and the loser sees the winner's row.
/// A plain check-then-insert would leave a window where both pass the check.
pub fn create_meeting(
    conn: &mut Connection,
    m: &NewMeeting<'_>,
    now: i64,
) -> Result<Meeting, ServerError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| ServerError::db("begin tx failed", e))?;

    let clash: Option<i64> = tx
        .query_row(
            "select id from meetings
             where requester_id = ?
               and status in ('pending', 'accepted')
               and abs(scheduled_at - ?) <= ?
             limit 1",
            params![m.requester_id, m.scheduled_at, CONFLICT_WINDOW_SECS],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| ServerError::db("conflict check failed", e))?;

    if clash.is_some() {
        tx.rollback().ok();
        return Err(ServerError::Conflict(
            "you already have a meeting scheduled around this time".into(),
        ));
    }

    tx.execute(
        "insert into meetings (property_id, property_title, requester_id, requester_name,
            requester_email, requester_phone, scheduled_at, notes, status, admin_response,
            created_at, updated_at)
         values (?, ?, ?, ?, ?, ?, ?, ?, 'pending', '', ?, ?)",
        params![
            m.property_id,
            m.property_title,
            m.requester_id,
            m.requester_name,
            m.requester_email,
            m.requester_phone,
            m.scheduled_at,
            m.notes,
            now,
            now
        ],
    )
    .map_err(|e| ServerError::db("insert meeting failed", e))?;

    let id = tx.last_insert_rowid();
    tx.commit().map_err(|e| ServerError::db("commit tx failed", e))?;

    get_meeting(conn, id)?.ok_or(ServerError::Internal)
}

/// Admin decision write: status, response text, responded_at/updated_at.
pub fn set_status(
    conn: &Connection,
    id: i64,
    status: MeetingStatus,
    admin_response: &str,
    now: i64,
) -> Result<Meeting, ServerError> {
    conn.execute(
        "update meetings
         set status = ?, admin_response = ?, responded_at = ?, updated_at = ?
         where id = ?",
        params![status.as_str(), admin_response, now, now, id],
    )
    .map_err(|e| ServerError::db("update meeting status failed", e))?;

    get_meeting(conn, id)?.ok_or_else(|| ServerError::NotFound("meeting not found".into()))
}

pub fn mark_cancelled(conn: &Connection, id: i64, now: i64) -> Result<(), ServerError> {
    conn.execute(
        "update meetings set status = 'cancelled', updated_at = ? where id = ?",
        params![now, id],
    )
    .map_err(|e| ServerError::db("cancel meeting failed", e))?;
    Ok(())
}

/// Reschedule write: new date, back to the approval queue, previous admin
/// decision cleared.
pub fn apply_reschedule(
    conn: &Connection,
    id: i64,
    new_scheduled_at: i64,
    now: i64,
) -> Result<Meeting, ServerError> {
    conn.execute(
        "update meetings
         set scheduled_at = ?, status = 'pending', admin_response = '',
             responded_at = null, updated_at = ?
         where id = ?",
        params![new_scheduled_at, now, id],
    )
    .map_err(|e| ServerError::db("reschedule meeting failed", e))?;

    get_meeting(conn, id)?.ok_or_else(|| ServerError::NotFound("meeting not found".into()))
}

/// A requester's meetings, newest scheduled first, each with the minimal
/// property projection (if the property still exists).
pub fn list_for_requester(
    conn: &Connection,
    requester_id: i64,
) -> Result<Vec<(Meeting, Option<PropertySummary>)>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select m.id, m.property_id, m.property_title, m.requester_id, m.requester_name,
                    m.requester_email, m.requester_phone, m.scheduled_at, m.notes, m.status,
                    m.admin_response, m.responded_at, m.created_at, m.updated_at,
                    p.id, p.title, p.location, p.price, p.status, p.images_json
             from meetings m
             left join properties p on p.id = m.property_id
             where m.requester_id = ?
             order by m.scheduled_at desc",
        )
        .map_err(|e| ServerError::db("prepare my-meetings failed", e))?;

    let rows = stmt
        .query_map(params![requester_id], |r| {
            let meeting = meeting_from_row(r)?;
            let summary = match r.get::<_, Option<i64>>(14)? {
                Some(pid) => {
                    let images_json: String = r.get(19)?;
                    let image = serde_json::from_str::<serde_json::Value>(&images_json)
                        .ok()
                        .and_then(|v| v.as_array()?.first()?.as_str().map(String::from));
                    Some(PropertySummary {
                        id: pid,
                        title: r.get(15)?,
                        location: r.get(16)?,
                        price: r.get(17)?,
                        status: r.get(18)?,
                        image,
                    })
                }
                None => None,
            };
            Ok((meeting, summary))
        })
        .map_err(|e| ServerError::db("query my-meetings failed", e))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::db("read my-meetings row failed", e))?);
    }
    Ok(out)
}

/// Admin list filter: optional exact status, optional case-insensitive
/// substring search over requester name/email/phone and property title.
#[derive(Debug, Default, Clone)]
pub struct AdminFilter {
    pub status: Option<MeetingStatus>,
    pub search: Option<String>,
}

/// Sort field whitelist for the admin list. Anything else falls back to
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    ScheduledAt,
    RespondedAt,
    Status,
}

impl SortField {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "scheduledAt" | "meetingDate" => Self::ScheduledAt,
            "respondedAt" => Self::RespondedAt,
            "status" => Self::Status,
            _ => Self::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::ScheduledAt => "scheduled_at",
            Self::RespondedAt => "responded_at",
            Self::Status => "status",
        }
    }
}

fn build_filter(filter: &AdminFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?".to_string());
        args.push(Value::from(status.as_str().to_string()));
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        clauses.push(
            "(requester_name like ? or requester_email like ? \
              or requester_phone like ? or property_title like ?)"
                .to_string(),
        );
        for _ in 0..4 {
            args.push(Value::from(pattern.clone()));
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" where {}", clauses.join(" and "))
    };
    (where_sql, args)
}

/// Paging bounds for the admin list, clamped in one place. The pagination
/// envelope in `meetings::queries` reuses these same bounds.
pub fn clamp_paging(page: i64, page_size: i64) -> (i64, i64) {
    (page.max(1), page_size.clamp(1, 100))
}

/// One page of the admin list plus the unpaginated total for the filter.
pub fn list_for_admin(
    conn: &Connection,
    filter: &AdminFilter,
    sort_by: SortField,
    descending: bool,
    page: i64,
    page_size: i64,
) -> Result<(Vec<Meeting>, i64), ServerError> {
    let (page, page_size) = clamp_paging(page, page_size);
    let (where_sql, args) = build_filter(filter);

    let total: i64 = conn
        .query_row(
            &format!("select count(*) from meetings{where_sql}"),
            params_from_iter(args.iter()),
            |r| r.get(0),
        )
        .map_err(|e| ServerError::db("count meetings failed", e))?;

    let order = if descending { "desc" } else { "asc" };
    let sql = format!(
        "select {SELECT_COLS} from meetings{where_sql} \
         order by {col} {order} limit ? offset ?",
        col = sort_by.column(),
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::db("prepare admin list failed", e))?;

    // page is query input; saturate rather than overflow on absurd values.
    let mut all_args = args;
    all_args.push(Value::from(page_size));
    all_args.push(Value::from((page - 1).saturating_mul(page_size)));

    let rows = stmt
        .query_map(params_from_iter(all_args.iter()), meeting_from_row)
        .map_err(|e| ServerError::db("query admin list failed", e))?;

    let mut items = Vec::new();
    for r in rows {
        items.push(r.map_err(|e| ServerError::db("read admin list row failed", e))?);
    }
    Ok((items, total))
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MeetingStats {
    pub total: i64,
    pub pending: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub cancelled: i64,
    /// Created within the current UTC calendar day.
    pub today: i64,
    /// Accepted and not yet past.
    pub upcoming: i64,
    /// Accepted and scheduled within tomorrow's 24h window.
    pub tomorrow: i64,
}

pub fn stats(conn: &Connection, now: i64) -> Result<MeetingStats, ServerError> {
    let today_start = Utc
        .timestamp_opt(now, 0)
        .single()
        .ok_or(ServerError::Internal)?
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or(ServerError::Internal)?
        .and_utc()
        .timestamp();
    let tomorrow_start = today_start + 24 * 60 * 60;
    let day_after_start = tomorrow_start + 24 * 60 * 60;

    conn.query_row(
        "select count(*),
                coalesce(sum(status = 'pending'), 0),
                coalesce(sum(status = 'accepted'), 0),
                coalesce(sum(status = 'rejected'), 0),
                coalesce(sum(status = 'cancelled'), 0),
                coalesce(sum(created_at >= ?1), 0),
                coalesce(sum(status = 'accepted' and scheduled_at >= ?2), 0),
                coalesce(sum(status = 'accepted' and scheduled_at >= ?3 and scheduled_at < ?4), 0)
         from meetings",
        params![today_start, now, tomorrow_start, day_after_start],
        |r| {
            Ok(MeetingStats {
                total: r.get(0)?,
                pending: r.get(1)?,
                accepted: r.get(2)?,
                rejected: r.get(3)?,
                cancelled: r.get(4)?,
                today: r.get(5)?,
                upcoming: r.get(6)?,
                tomorrow: r.get(7)?,
            })
        },
    )
    .map_err(|e| ServerError::db("meeting stats failed", e))
}

/// Accepted future meetings for one property, soonest first. Public data,
/// capped small; used to show availability on the listing page.
pub fn upcoming_for_property(
    conn: &Connection,
    property_id: i64,
    now: i64,
    limit: i64,
) -> Result<Vec<Meeting>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {SELECT_COLS} from meetings
             where property_id = ? and status = 'accepted' and scheduled_at >= ?
             order by scheduled_at asc
             limit ?"
        ))
        .map_err(|e| ServerError::db("prepare property meetings failed", e))?;

    let rows = stmt
        .query_map(params![property_id, now, limit], meeting_from_row)
        .map_err(|e| ServerError::db("query property meetings failed", e))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::db("read property meetings row failed", e))?);
    }
    Ok(out)
}
