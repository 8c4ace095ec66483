//! Streaming downloader for data source files.
//!
//! A download opens the sink first, issues a GET, and writes each body chunk
//! to the sink as it arrives, so peak memory stays at one chunk whatever the
//! payload size. Once the body is done the sink is closed and the attempt is
//! classified:
//!
//! - 2xx: [`DownloadOutcome::Success`] with the elapsed time and sink path
//! - connect timeout, transport error, other status: [`DownloadOutcome::Failed`]
//! - sink I/O errors and anything else unexpected: [`DownloadOutcome::Fatal`]
//!
//! `download` resolves only after the transfer (or its failure) is fully
//! settled; no partial result is observable.

mod classify;

pub use classify::{
    TIMEOUT_MESSAGE, TransportFailure, fatal_error_message, status_error_message,
    transport_error_message,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sink::Sink;
use futures::StreamExt;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of one download
#[must_use]
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Body fully written to the sink with a 2xx status
    Success {
        /// Time from request start to sink close
        elapsed: Duration,
        /// Final sink path
        file_path: PathBuf,
    },
    /// Expected transfer failure (timeout, transport error, non-2xx status)
    Failed {
        /// Diagnostic for the update record
        message: String,
    },
    /// Unexpected error; the sink has already been released
    Fatal {
        /// Diagnostic for the update record
        message: String,
        /// The underlying error, to be handed back to the caller
        error: Error,
    },
}

impl DownloadOutcome {
    fn fatal(error: Error) -> Self {
        DownloadOutcome::Fatal {
            message: fatal_error_message(&error),
            error,
        }
    }

    /// Whether the body was downloaded with a success status
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    /// Failure diagnostic, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            DownloadOutcome::Success { .. } => None,
            DownloadOutcome::Failed { message } | DownloadOutcome::Fatal { message, .. } => {
                Some(message)
            }
        }
    }
}

/// How the HTTP exchange ended, before classification
enum Transfer {
    /// Body read to the end
    Completed(StatusCode),
    /// Client reported an error before or during the body
    Interrupted(TransportFailure),
}

/// HTTP client for data source downloads
#[derive(Clone, Debug)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader with the given connect timeout
    ///
    /// Responses are requested with `Accept-Encoding: gzip` and decoded
    /// transparently before they reach the sink. Redirects are not followed;
    /// a 3xx response is classified like any other non-2xx status.
    pub fn new(connect_timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true);

        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    /// Create a downloader from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.http_connect_timeout, config.user_agent.as_deref())
    }

    #[cfg(test)]
    pub(crate) fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Stream `url` into a new file at `sink_path` and classify the result
    pub async fn download(&self, url: &str, sink_path: &Path) -> DownloadOutcome {
        let started_at = Instant::now();

        let mut sink = match Sink::create(sink_path).await {
            Ok(sink) => sink,
            Err(e) => return DownloadOutcome::fatal(Error::Io(e)),
        };

        let transfer = match self.transfer(url, &mut sink).await {
            Ok(transfer) => transfer,
            Err(e) => {
                if let Err(close_err) = sink.close().await {
                    tracing::warn!(
                        path = %sink.path().display(),
                        error = %close_err,
                        "failed to close sink after fatal error"
                    );
                }
                return DownloadOutcome::fatal(e);
            }
        };

        if let Err(e) = sink.close().await {
            return DownloadOutcome::fatal(Error::Io(e));
        }

        tracing::debug!(
            path = %sink.path().display(),
            bytes = sink.bytes_written(),
            "sink closed"
        );

        match transfer {
            Transfer::Completed(status) if status.is_success() => DownloadOutcome::Success {
                elapsed: started_at.elapsed(),
                file_path: sink.path().to_path_buf(),
            },
            Transfer::Completed(status) => DownloadOutcome::Failed {
                message: status_error_message(status.as_u16()),
            },
            Transfer::Interrupted(failure) => DownloadOutcome::Failed {
                message: failure.message(),
            },
        }
    }

    /// Send the request and pump the body into the sink
    ///
    /// Client errors become [`Transfer::Interrupted`]; only sink errors are
    /// returned as `Err`.
    async fn transfer(&self, url: &str, sink: &mut Sink) -> Result<Transfer> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Ok(Transfer::Interrupted(TransportFailure::from_reqwest(&e))),
        };

        let status = response.status();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => sink.write_chunk(&bytes).await?,
                Err(e) => return Ok(Transfer::Interrupted(TransportFailure::from_reqwest(&e))),
            }
        }

        Ok(Transfer::Completed(status))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
