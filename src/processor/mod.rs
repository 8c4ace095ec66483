//! Update lifecycle for data sources.
//!
//! [`DataSourceProcessor::process`] runs one attempt end to end:
//!
//! 1. create a `scheduled` update record snapshotting the source URL and attach
//!    it as the source's current update
//! 2. move it to `downloading`
//! 3. stream the URL into a file named by [`build_sink_path`]
//! 4. record the classified result on the update and persist it
//!
//! Each call runs inside its own `data_source_processing` span, so
//! concurrent calls for different sources never share logging context.
//! Calls for the *same* source are not serialized here; a scheduler that
//! overlaps them can get sink name collisions and out-of-order current
//! update pointers.

use crate::config::Config;
use crate::downloader::{DownloadOutcome, Downloader};
use crate::error::{Error, Result};
use crate::sink::build_sink_path;
use crate::store::UpdateStore;
use crate::types::DataSource;
use crate::update::{NewUpdate, UpdateRecord};
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;

/// How a processing attempt ended
///
/// Every variant carries the update record as it was persisted.
#[must_use]
#[derive(Debug)]
pub enum ProcessOutcome {
    /// File downloaded; the record has `file_path` and `download_time` set
    Success(UpdateRecord),
    /// Timeout, transport error or non-success status; record is `downloading_failed`
    ExpectedFailure(UpdateRecord),
    /// Unexpected error; record is `failed` and the error is handed back
    FatalFailure {
        /// Persisted record
        record: UpdateRecord,
        /// The error that aborted the attempt
        error: Error,
    },
}

impl ProcessOutcome {
    /// Whether the data file was downloaded
    pub fn succeeded(&self) -> bool {
        matches!(self, ProcessOutcome::Success(_))
    }

    /// The persisted update record
    pub fn record(&self) -> &UpdateRecord {
        match self {
            ProcessOutcome::Success(record)
            | ProcessOutcome::ExpectedFailure(record)
            | ProcessOutcome::FatalFailure { record, .. } => record,
        }
    }

    /// Boolean success, re-raising fatal errors
    ///
    /// By the time this returns `Err`, the attempt is already recorded as `failed`.
    pub fn into_result(self) -> Result<bool> {
        match self {
            ProcessOutcome::Success(_) => Ok(true),
            ProcessOutcome::ExpectedFailure(_) => Ok(false),
            ProcessOutcome::FatalFailure { error, .. } => Err(error),
        }
    }
}

/// Runs download attempts for data sources and records them
pub struct DataSourceProcessor {
    store: Arc<dyn UpdateStore>,
    downloader: Downloader,
    config: Arc<Config>,
}

impl DataSourceProcessor {
    /// Create a processor with a downloader built from `config`
    pub fn new(config: Config, store: Arc<dyn UpdateStore>) -> Result<Self> {
        config.validate()?;
        let downloader = Downloader::from_config(&config)?;
        Ok(Self::with_downloader(config, store, downloader))
    }

    /// Create a processor around an existing downloader
    pub fn with_downloader(
        config: Config,
        store: Arc<dyn UpdateStore>,
        downloader: Downloader,
    ) -> Self {
        Self {
            store,
            downloader,
            config: Arc::new(config),
        }
    }

    /// Run one update attempt for `source`
    ///
    /// `source.current_update_id` is pointed at the new record. Expected
    /// transfer failures and fatal errors are both returned as
    /// [`ProcessOutcome`] values; `Err` means the store itself failed and the
    /// attempt could not be recorded.
    pub async fn process(&self, source: &mut DataSource) -> Result<ProcessOutcome> {
        let span = tracing::debug_span!(
            "data_source_processing",
            name = %source.name,
            server = %source.server_name
        );

        async {
            tracing::debug!("Starting processing");

            let record = self
                .store
                .create_update(source.id, &NewUpdate::for_source(source, Utc::now()))
                .await?;
            source.current_update_id = Some(record.id);

            self.fetch_data(source, record).await
        }
        .instrument(span)
        .await
    }

    async fn fetch_data(
        &self,
        source: &DataSource,
        mut record: UpdateRecord,
    ) -> Result<ProcessOutcome> {
        record.start_download()?;
        self.store.save_update(&record).await?;

        let sink_path = build_sink_path(
            &self.config.storage_dir,
            &source.server_name,
            &source.name,
            Utc::now(),
        );

        let span = tracing::debug_span!("download", url = %record.url);
        let outcome = async {
            tracing::debug!(path = %sink_path.display(), "Downloading data file");
            self.downloader.download(&record.url, &sink_path).await
        }
        .instrument(span)
        .await;

        match outcome {
            DownloadOutcome::Success { elapsed, file_path } => {
                tracing::debug!(
                    download_time = elapsed.as_secs_f64(),
                    path = %file_path.display(),
                    "Successfully downloaded"
                );
                record.record_success(elapsed, &file_path)?;
                self.store.save_update(&record).await?;
                Ok(ProcessOutcome::Success(record))
            }
            DownloadOutcome::Failed { message } => {
                tracing::error!(msg = %message, success = false, "download failed");
                record.record_failure(message)?;
                self.store.save_update(&record).await?;
                Ok(ProcessOutcome::ExpectedFailure(record))
            }
            DownloadOutcome::Fatal { message, error } => {
                tracing::error!(msg = %message, error = %error, "download aborted");
                record.record_fatal(message)?;
                if let Err(save_err) = self.store.save_update(&record).await {
                    tracing::error!(
                        update_id = %record.id,
                        error = %save_err,
                        original_error = %error,
                        "failed to record fatal download error"
                    );
                    return Err(save_err);
                }
                Ok(ProcessOutcome::FatalFailure { record, error })
            }
        }
    }
}
