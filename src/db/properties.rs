// src/db/properties.rs
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::domain::PropertySummary;
use crate::errors::ServerError;

/// A property row as the meeting workflow sees it. The full catalog
/// (descriptions, media management, publishing) lives outside this core.
#[derive(Debug, Clone)]
pub struct PropertyRow {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub price: i64,
    pub status: String,
    pub agent_name: Option<String>,
    pub images_json: String,
}

impl PropertyRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            title: r.get(1)?,
            location: r.get(2)?,
            price: r.get(3)?,
            status: r.get(4)?,
            agent_name: r.get(5)?,
            images_json: r.get(6)?,
        })
    }

    /// First image of the stored JSON array, if any.
    pub fn cover_image(&self) -> Option<String> {
        let parsed: Value = serde_json::from_str(&self.images_json).ok()?;
        parsed
            .as_array()?
            .first()?
            .as_str()
            .map(|s| s.to_string())
    }

    pub fn summary(&self) -> PropertySummary {
        PropertySummary {
            id: self.id,
            title: self.title.clone(),
            location: self.location.clone(),
            price: self.price,
            status: self.status.clone(),
            image: self.cover_image(),
        }
    }
}

const SELECT_COLS: &str = "id, title, location, price, status, agent_name, images_json";

pub fn get_property(conn: &Connection, id: i64) -> Result<Option<PropertyRow>, ServerError> {
    conn.query_row(
        &format!("select {SELECT_COLS} from properties where id = ?"),
        params![id],
        PropertyRow::from_row,
    )
    .optional()
    .map_err(|e| ServerError::db("select property failed", e))
}

/// Used by seeding and tests; the public catalog CRUD is not part of this
/// service.
pub fn insert_property(
    conn: &Connection,
    title: &str,
    location: &str,
    price: i64,
    agent_name: Option<&str>,
    images_json: &str,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into properties (title, location, price, agent_name, images_json, created_at)
         values (?, ?, ?, ?, ?, ?)",
        params![title, location, price, agent_name, images_json, now],
    )
    .map_err(|e| ServerError::db("insert property failed", e))?;
    Ok(conn.last_insert_rowid())
}
