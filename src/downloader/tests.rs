use super::*;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &[u8] = b"SQLite format 3\0player stats payload";

fn test_downloader() -> Downloader {
    Downloader::new(Duration::from_secs(5), None).unwrap()
}

/// A local address nothing is listening on
fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/stats.sqlite3", port)
}

#[tokio::test]
async fn test_download_success_streams_body_to_sink() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats.sqlite3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let sink_path = dir.path().join("srv_src_20240101_120000.sqlite3");
    let url = format!("{}/stats.sqlite3", mock_server.uri());

    let outcome = test_downloader().download(&url, &sink_path).await;

    match outcome {
        DownloadOutcome::Success { file_path, .. } => {
            assert_eq!(file_path, sink_path);
            assert_eq!(std::fs::read(&file_path).unwrap(), BODY);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_requests_gzip_encoding() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats.sqlite3"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/stats.sqlite3", mock_server.uri());

    let outcome = test_downloader()
        .download(&url, &dir.path().join("out.sqlite3"))
        .await;

    assert!(outcome.is_success(), "got {:?}", outcome);
}

#[tokio::test]
async fn test_download_success_measures_elapsed_time() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BODY)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/slow.sqlite3", mock_server.uri());

    match test_downloader()
        .download(&url, &dir.path().join("slow.sqlite3"))
        .await
    {
        DownloadOutcome::Success { elapsed, .. } => {
            assert!(
                elapsed >= Duration::from_millis(300),
                "elapsed {:?} should include the server delay",
                elapsed
            );
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_http_500_is_expected_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/stats.sqlite3", mock_server.uri());

    let outcome = test_downloader()
        .download(&url, &dir.path().join("out.sqlite3"))
        .await;

    match outcome {
        DownloadOutcome::Failed { message } => {
            assert_eq!(message, "Non-success status code received: 500");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_http_404_is_expected_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/missing.sqlite3", mock_server.uri());

    let outcome = test_downloader()
        .download(&url, &dir.path().join("out.sqlite3"))
        .await;

    assert_eq!(
        outcome.error_message(),
        Some("Non-success status code received: 404")
    );
}

#[tokio::test]
async fn test_download_connection_refused_is_transport_error() {
    let dir = tempdir().unwrap();

    let outcome = test_downloader()
        .download(&refused_url(), &dir.path().join("out.sqlite3"))
        .await;

    match outcome {
        DownloadOutcome::Failed { message } => {
            assert!(
                message.starts_with("Error while downloading: "),
                "unexpected message: {}",
                message
            );
        }
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_invalid_url_is_transport_error() {
    let dir = tempdir().unwrap();

    let outcome = test_downloader()
        .download("not a url", &dir.path().join("out.sqlite3"))
        .await;

    let message = outcome.error_message().unwrap();
    assert!(message.starts_with("Error while downloading: "));
}

#[tokio::test]
async fn test_download_missing_storage_dir_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let sink_path = dir.path().join("not_provisioned").join("out.sqlite3");
    let url = format!("{}/stats.sqlite3", mock_server.uri());

    match test_downloader().download(&url, &sink_path).await {
        DownloadOutcome::Fatal { message, error } => {
            assert!(
                message.starts_with("Unhandled NotFound while downloading: "),
                "unexpected message: {}",
                message
            );
            assert!(matches!(error, Error::Io(_)));
        }
        other => panic!("expected fatal outcome, got {:?}", other),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_download_disk_full_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 256 * 1024]))
        .mount(&mock_server)
        .await;

    let url = format!("{}/big.sqlite3", mock_server.uri());

    // Every write to /dev/full fails with ENOSPC
    match test_downloader()
        .download(&url, Path::new("/dev/full"))
        .await
    {
        DownloadOutcome::Fatal { message, error } => {
            assert!(message.starts_with("Unhandled "), "got {}", message);
            match error {
                Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::StorageFull),
                other => panic!("expected I/O error, got {:?}", other),
            }
        }
        other => panic!("expected fatal outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old.sqlite3"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new.sqlite3"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new.sqlite3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/old.sqlite3", mock_server.uri());

    let outcome = test_downloader()
        .download(&url, &dir.path().join("out.sqlite3"))
        .await;

    match outcome {
        DownloadOutcome::Failed { message } => {
            assert_eq!(message, "Non-success status code received: 302");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

/// Client whose overall request timeout is far shorter than the mock's delay
fn impatient_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_reqwest_timeout_classified_as_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BODY)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let err = impatient_client()
        .get(format!("{}/stats.sqlite3", mock_server.uri()))
        .send()
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(
        TransportFailure::from_reqwest(&err),
        TransportFailure::Timeout
    ));
    assert_eq!(
        TransportFailure::from_reqwest(&err).message(),
        "Timeout while connecting"
    );
}

#[tokio::test]
async fn test_download_timeout_is_failed_with_timeout_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BODY)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let url = format!("{}/stats.sqlite3", mock_server.uri());

    let outcome = Downloader::from_client(impatient_client())
        .download(&url, &dir.path().join("out.sqlite3"))
        .await;

    match outcome {
        DownloadOutcome::Failed { message } => assert_eq!(message, "Timeout while connecting"),
        other => panic!("expected failure, got {:?}", other),
    }
}

/// Needs a network where 10.255.255.1 silently drops SYNs
#[tokio::test]
#[ignore]
async fn test_download_connect_timeout() {
    let downloader = Downloader::new(Duration::from_millis(200), None).unwrap();
    let dir = tempdir().unwrap();

    let outcome = downloader
        .download(
            "http://10.255.255.1/stats.sqlite3",
            &dir.path().join("out.sqlite3"),
        )
        .await;

    assert_eq!(outcome.error_message(), Some("Timeout while connecting"));
}

#[test]
fn test_downloader_from_config_accepts_user_agent() {
    let config = Config {
        user_agent: Some("gorge-import/0.1".to_string()),
        ..Default::default()
    };
    assert!(Downloader::from_config(&config).is_ok());
}
