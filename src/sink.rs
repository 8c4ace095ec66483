//! Sink naming and the file sink response bodies are streamed into.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Extension of every downloaded data file
pub const SINK_EXTENSION: &str = ".sqlite3";

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// Build the file name for a download attempt
///
/// `<server>_<source>_<YYYYMMDD_HHMMSS>.sqlite3`, lowercased, with every
/// whitespace run collapsed into a single underscore. The timestamp has
/// second granularity, so two attempts for the same source within the same
/// second share a name.
pub fn sink_file_name(server_name: &str, data_source_name: &str, now: DateTime<Utc>) -> String {
    let joined = [
        server_name,
        data_source_name,
        &now.format("%Y%m%d_%H%M%S").to_string(),
    ]
    .join("_")
    .to_lowercase();

    let mut name = WHITESPACE_RUN.replace_all(&joined, "_").into_owned();
    name.push_str(SINK_EXTENSION);
    name
}

/// Join [`sink_file_name`] onto the storage directory
pub fn build_sink_path(
    storage_dir: &Path,
    server_name: &str,
    data_source_name: &str,
    now: DateTime<Utc>,
) -> PathBuf {
    storage_dir.join(sink_file_name(server_name, data_source_name, now))
}

/// Write target for a streamed response body
///
/// Chunks are written as they arrive; nothing is buffered beyond what the
/// underlying file does. [`Sink::close`] flushes and syncs the file and is
/// safe to call more than once. Dropping an open sink also releases the
/// handle, without the flush.
#[derive(Debug)]
pub struct Sink {
    file: Option<File>,
    path: PathBuf,
    bytes_written: u64,
}

impl Sink {
    /// Open `path` for writing, truncating any existing file
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Append one body chunk
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            std::io::Error::other(format!("sink {} is already closed", self.path.display()))
        })?;
        file.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flush, sync and release the file handle
    ///
    /// The handle is released even when flushing fails.
    pub async fn close(&mut self) -> std::io::Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush().await?;
        file.sync_all().await
    }

    /// Whether the file handle is still held
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of body bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
