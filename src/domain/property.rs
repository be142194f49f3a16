// src/domain/property.rs
use serde::Serialize;

/// Minimal property projection attached to a requester's meeting list.
/// Mirrors what the listing card needs: title, location, cover image,
/// price, availability status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub price: i64,
    pub status: String,
    pub image: Option<String>,
}
