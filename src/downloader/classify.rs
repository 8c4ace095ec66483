//! Failure classification and the diagnostics recorded for each class.

use crate::error::Error;

/// Recorded when the connect phase exceeds the configured timeout
pub const TIMEOUT_MESSAGE: &str = "Timeout while connecting";

/// Transport-level failure reported by the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// Connect timeout
    Timeout,
    /// Anything below HTTP: refused connection, DNS failure, reset, bad URL
    Transport(String),
}

impl TransportFailure {
    /// Classify a reqwest error
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportFailure::Timeout
        } else {
            TransportFailure::Transport(error_chain(error))
        }
    }

    /// Diagnostic stored on the update record
    pub fn message(&self) -> String {
        match self {
            TransportFailure::Timeout => TIMEOUT_MESSAGE.to_string(),
            TransportFailure::Transport(detail) => transport_error_message(detail),
        }
    }
}

/// `Error while downloading: <detail>`
pub fn transport_error_message(detail: &str) -> String {
    format!("Error while downloading: {}", detail)
}

/// `Non-success status code received: <code>`
pub fn status_error_message(status: u16) -> String {
    format!("Non-success status code received: {}", status)
}

/// `Unhandled <kind> while downloading: <detail>`
pub fn fatal_error_message(error: &Error) -> String {
    let detail = match error {
        Error::Io(e) => e.to_string(),
        other => other.to_string(),
    };
    format!("Unhandled {} while downloading: {}", error.kind(), detail)
}

// reqwest nests the useful part ("Connection refused") a few sources deep
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = std::error::Error::source(cause);
    }
    message
}
