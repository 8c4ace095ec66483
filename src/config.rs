//! Configuration types for gorge-import

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Default connect-phase timeout for data source downloads
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Main configuration
///
/// The crate never creates `storage_dir`; provisioning it is left to the
/// deployment. A missing directory makes every download attempt fail fatally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory downloaded data files are written to (default: "data_imports")
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Connect timeout for the data source request (default: 10s)
    ///
    /// Only the connect phase is bounded. A transfer that stalls after the
    /// connection is established is not cut off.
    #[serde(default = "default_http_connect_timeout")]
    pub http_connect_timeout: Duration,

    /// Database path (default: "gorge.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// User-Agent header sent with download requests (None = reqwest default)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            http_connect_timeout: default_http_connect_timeout(),
            database_path: default_database_path(),
            user_agent: None,
        }
    }
}

impl Config {
    /// Reject settings the download pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "storage directory must not be empty".to_string(),
                key: Some("storage_dir".to_string()),
            });
        }

        if self.http_connect_timeout.is_zero() {
            return Err(Error::Config {
                message: "connect timeout must be greater than zero".to_string(),
                key: Some("http_connect_timeout".to_string()),
            });
        }

        Ok(())
    }
}

// Default value functions
fn default_storage_dir() -> PathBuf {
    PathBuf::from("data_imports")
}

fn default_http_connect_timeout() -> Duration {
    HTTP_CONNECT_TIMEOUT
}

fn default_database_path() -> PathBuf {
    PathBuf::from("gorge.db")
}
