//! Update records: one tracked attempt to fetch a data source's content.
//!
//! Transitions:
//!
//! ```text
//! scheduled   --start_download-->  downloading
//! downloading --record_success-->  downloading         (download_time, file_path set)
//! downloading --record_failure-->  downloading_failed  (error_message set)
//! scheduled | downloading --record_fatal--> failed     (error_message set)
//! ```
//!
//! A successful transfer does not leave `downloading`. Consumers tell a
//! completed download apart from one still in flight by the presence of
//! `file_path` (see [`UpdateRecord::is_downloaded`]).

use crate::error::UpdateError;
use crate::types::{DataSource, DataSourceId, UpdateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// State of an update record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    /// Created, download not started yet
    Scheduled,
    /// Download in progress, or finished successfully when `file_path` is set
    Downloading,
    /// Timeout, transport error or non-success HTTP status
    DownloadingFailed,
    /// Unexpected error during the attempt
    Failed,
}

impl UpdateState {
    /// Convert integer state code to UpdateState
    ///
    /// Unknown codes map to `Failed` so a corrupt row never reads as in flight.
    pub fn from_i32(state: i32) -> Self {
        match state {
            0 => UpdateState::Scheduled,
            1 => UpdateState::Downloading,
            2 => UpdateState::DownloadingFailed,
            _ => UpdateState::Failed,
        }
    }

    /// Convert UpdateState to its integer code
    pub fn to_i32(&self) -> i32 {
        match self {
            UpdateState::Scheduled => 0,
            UpdateState::Downloading => 1,
            UpdateState::DownloadingFailed => 2,
            UpdateState::Failed => 3,
        }
    }

    /// Lowercase name as used in logs and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateState::Scheduled => "scheduled",
            UpdateState::Downloading => "downloading",
            UpdateState::DownloadingFailed => "downloading_failed",
            UpdateState::Failed => "failed",
        }
    }

    /// Whether the state is one of the terminal failure states
    pub fn is_failure(&self) -> bool {
        matches!(self, UpdateState::DownloadingFailed | UpdateState::Failed)
    }
}

impl std::fmt::Display for UpdateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New update record to be inserted for a data source
#[derive(Debug, Clone)]
pub struct NewUpdate {
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Snapshot of the data source URL
    pub url: String,
}

impl NewUpdate {
    /// Snapshot a data source at `now`
    pub fn for_source(source: &DataSource, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now,
            url: source.url.clone(),
        }
    }
}

/// One download attempt for a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Unique database ID
    pub id: UpdateId,
    /// Data source this attempt belongs to
    pub data_source_id: DataSourceId,
    /// Lifecycle state
    pub state: UpdateState,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// URL at creation time; later edits to the data source do not touch it
    pub url: String,
    /// Time taken by a successful transfer
    pub download_time: Option<Duration>,
    /// Downloaded file, set only by a successful transfer
    pub file_path: Option<PathBuf>,
    /// Diagnostic for failed attempts
    pub error_message: Option<String>,
}

impl UpdateRecord {
    /// `scheduled -> downloading`
    pub fn start_download(&mut self) -> Result<(), UpdateError> {
        self.expect_state(&[UpdateState::Scheduled], "start download")?;
        self.state = UpdateState::Downloading;
        Ok(())
    }

    /// Record a completed transfer. The state stays `downloading`.
    pub fn record_success(&mut self, elapsed: Duration, file_path: &Path) -> Result<(), UpdateError> {
        self.expect_state(&[UpdateState::Downloading], "record success for")?;
        self.expect_not_downloaded()?;
        self.download_time = Some(elapsed);
        self.file_path = Some(file_path.to_path_buf());
        Ok(())
    }

    /// `downloading -> downloading_failed`
    pub fn record_failure(&mut self, message: impl Into<String>) -> Result<(), UpdateError> {
        self.expect_state(&[UpdateState::Downloading], "record failure for")?;
        self.expect_not_downloaded()?;
        self.state = UpdateState::DownloadingFailed;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// `scheduled | downloading -> failed`
    pub fn record_fatal(&mut self, message: impl Into<String>) -> Result<(), UpdateError> {
        self.expect_state(
            &[UpdateState::Scheduled, UpdateState::Downloading],
            "record fatal error for",
        )?;
        self.expect_not_downloaded()?;
        self.state = UpdateState::Failed;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Whether the transfer completed and the file is on disk
    pub fn is_downloaded(&self) -> bool {
        self.file_path.is_some()
    }

    fn expect_state(
        &self,
        allowed: &[UpdateState],
        operation: &'static str,
    ) -> Result<(), UpdateError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(UpdateError::InvalidTransition {
                id: self.id,
                from: self.state,
                operation,
            })
        }
    }

    fn expect_not_downloaded(&self) -> Result<(), UpdateError> {
        if self.is_downloaded() {
            return Err(UpdateError::AlreadyDownloaded { id: self.id });
        }
        Ok(())
    }
}
