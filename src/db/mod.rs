//! Database layer for gorge-import
//!
//! Handles SQLite persistence for servers, data sources and their update records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`data_sources`]: Server and data source CRUD
//! - [`updates`]: Update records and the [`UpdateStore`](crate::store::UpdateStore) impl

use crate::types::{DataSourceId, UpdateId};
use crate::update::{UpdateRecord, UpdateState};
use chrono::{TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};
use std::path::PathBuf;
use std::time::Duration;

mod data_sources;
mod migrations;
mod updates;

/// Update record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct UpdateRow {
    /// Unique database ID
    pub id: i64,
    /// Data source the attempt belongs to
    pub data_source_id: i64,
    /// State code (see [`UpdateState::to_i32`])
    pub state: i32,
    /// Unix timestamp when the record was created
    pub timestamp: i64,
    /// URL snapshot
    pub url: String,
    /// Transfer duration in seconds
    pub download_time: Option<f64>,
    /// Downloaded file path
    pub file_path: Option<String>,
    /// Failure diagnostic
    pub error_message: Option<String>,
}

impl From<UpdateRow> for UpdateRecord {
    fn from(row: UpdateRow) -> Self {
        UpdateRecord {
            id: UpdateId(row.id),
            data_source_id: DataSourceId(row.data_source_id),
            state: UpdateState::from_i32(row.state),
            timestamp: Utc
                .timestamp_opt(row.timestamp, 0)
                .single()
                .unwrap_or_else(Utc::now),
            url: row.url,
            download_time: row
                .download_time
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            file_path: row.file_path.map(PathBuf::from),
            error_message: row.error_message,
        }
    }
}

/// Database handle for gorge-import
pub struct Database {
    pool: SqlitePool,
}
