//! # gorge-import
//!
//! Ingests external data files referenced by registered data sources. Every
//! attempt is tracked as an auditable update record.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or server; an external scheduler decides when to run
//! - **Streaming** - Response bodies go straight to disk, one chunk at a time
//! - **Auditable** - Every attempt leaves a record, including ones that end in an error
//! - **Pluggable persistence** - Records flow through the [`UpdateStore`] trait;
//!   [`Database`] is the SQLite implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use gorge_import::{Config, Database, DataSourceProcessor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let db = Arc::new(Database::new(&config.database_path).await?);
//!
//!     let server = db.insert_server("EU Server 01").await?;
//!     let source_id = db
//!         .insert_data_source(server, "Player Stats", "https://stats.example.com/eu01.sqlite3")
//!         .await?;
//!     let mut source = db.get_data_source(source_id).await?.ok_or("missing source")?;
//!
//!     let processor = DataSourceProcessor::new(config, db.clone())?;
//!     let downloaded = processor.process(&mut source).await?.into_result()?;
//!     println!("downloaded: {}", downloaded);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Streaming HTTP downloads and failure classification
pub mod downloader;
/// Error types
pub mod error;
/// Update lifecycle orchestration
pub mod processor;
/// Sink naming and file sink
pub mod sink;
/// Persistence port
pub mod store;
/// Core identifier and record types
pub mod types;
/// Update records and their state machine
pub mod update;

// Re-export commonly used types
pub use config::{Config, HTTP_CONNECT_TIMEOUT};
pub use db::Database;
pub use downloader::{DownloadOutcome, Downloader};
pub use error::{DatabaseError, Error, Result, UpdateError};
pub use processor::{DataSourceProcessor, ProcessOutcome};
pub use sink::{Sink, build_sink_path, sink_file_name};
pub use store::UpdateStore;
pub use types::{DataSource, DataSourceId, Server, ServerId, UpdateId};
pub use update::{NewUpdate, UpdateRecord, UpdateState};
