//! Database, storage and data source fixtures

use gorge_import::{Config, DataSource, DataSourceProcessor, Database};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Minimal SQLite header, enough to tell a data file from an error page
pub const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// Everything a processing test needs (keep `temp_dir` alive for the test)
pub struct TestEnv {
    pub processor: DataSourceProcessor,
    pub db: Arc<Database>,
    pub storage_dir: PathBuf,
    pub temp_dir: TempDir,
}

/// Create a database, a provisioned storage directory and a processor
pub async fn create_test_env() -> TestEnv {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage_dir = temp_dir.path().join("imports");
    std::fs::create_dir_all(&storage_dir).unwrap();

    let config = Config {
        storage_dir: storage_dir.clone(),
        http_connect_timeout: Duration::from_secs(5),
        database_path: temp_dir.path().join("gorge.db"),
        user_agent: Some("gorge-import-tests".to_string()),
    };

    let db = Arc::new(Database::new(&config.database_path).await.unwrap());
    let processor = DataSourceProcessor::new(config, db.clone()).unwrap();

    TestEnv {
        processor,
        db,
        storage_dir,
        temp_dir,
    }
}

/// Register `server_name` / `source_name` at `url` and load it back
pub async fn create_data_source(
    db: &Database,
    server_name: &str,
    source_name: &str,
    url: &str,
) -> DataSource {
    let server_id = db.insert_server(server_name).await.unwrap();
    let source_id = db
        .insert_data_source(server_id, source_name, url)
        .await
        .unwrap();
    db.get_data_source(source_id).await.unwrap().unwrap()
}

/// URL on a local port nothing listens on
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/stats.sqlite3", port)
}
