// src/meetings/queries.rs
//
// Read side of the meeting workflow: Database-level wrappers over the
// store queries, shaped for the JSON API.
use serde::Serialize;

use crate::db::meetings::{self, AdminFilter, MeetingStats, SortField};
use crate::db::Database;
use crate::domain::{Meeting, MeetingStatus, PropertySummary};
use crate::errors::ServerError;

/// A meeting plus the property card projection, for the requester's list.
#[derive(Debug, Serialize)]
pub struct MeetingWithProperty {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub property: Option<PropertySummary>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

/// Parsed query parameters for the admin list.
#[derive(Debug, Clone)]
pub struct AdminListParams {
    pub status: Option<MeetingStatus>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
    pub sort_by: SortField,
    pub descending: bool,
}

impl Default for AdminListParams {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            page: 1,
            limit: 10,
            sort_by: SortField::CreatedAt,
            descending: true,
        }
    }
}

pub fn my_meetings(
    db: &Database,
    requester_id: i64,
) -> Result<Vec<MeetingWithProperty>, ServerError> {
    db.with_conn(|conn| {
        Ok(meetings::list_for_requester(conn, requester_id)?
            .into_iter()
            .map(|(meeting, property)| MeetingWithProperty { meeting, property })
            .collect())
    })
}

pub fn admin_meetings(
    db: &Database,
    params: &AdminListParams,
) -> Result<(Vec<Meeting>, Pagination), ServerError> {
    // Same bounds the store applies; reused here so the envelope reports
    // the page/limit actually queried.
    let (page, limit) = meetings::clamp_paging(params.page, params.limit);

    db.with_conn(|conn| {
        let filter = AdminFilter {
            status: params.status,
            search: params.search.clone(),
        };
        let (items, total) =
            meetings::list_for_admin(conn, &filter, params.sort_by, params.descending, page, limit)?;
        let pagination = Pagination {
            total,
            page,
            limit,
            pages: (total + limit - 1) / limit,
        };
        Ok((items, pagination))
    })
}

pub fn meeting_stats(db: &Database, now: i64) -> Result<MeetingStats, ServerError> {
    db.with_conn(|conn| meetings::stats(conn, now))
}

/// Accepted future meetings for one property, capped at 10. Public.
pub fn property_meetings(
    db: &Database,
    property_id: i64,
    now: i64,
) -> Result<Vec<Meeting>, ServerError> {
    db.with_conn(|conn| meetings::upcoming_for_property(conn, property_id, now, 10))
}
