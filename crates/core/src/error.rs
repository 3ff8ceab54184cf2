use std::path::PathBuf;

use thiserror::Error;

/// A request to the analysis service that could not be completed.
///
/// Distinct from [`crate::types::AnalysisResponse::Failure`], which means the
/// service was reached and declined to produce metrics.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Could not read video {path}: {source}")]
    VideoUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis service unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Analysis service timed out: {reason}")]
    Timeout { reason: String },

    #[error("Analysis service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Analysis service returned an empty response")]
    EmptyResponse,

    #[error("Malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("HTTP client error: {reason}")]
    Client { reason: String },
}

impl TransportError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Unreachable { .. } | TransportError::Timeout { .. } => true,
            TransportError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            TransportError::EmptyResponse => true,
            TransportError::VideoUnreadable { .. }
            | TransportError::MalformedBody(_)
            | TransportError::Client { .. } => false,
        }
    }

    /// Message suitable for showing to the person who recorded the video.
    pub fn user_message(&self) -> String {
        if self.is_retryable() {
            format!("{self}. Check your connection and try again.")
        } else {
            self.to_string()
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                reason: err.to_string(),
            }
        } else if err.is_builder() {
            TransportError::Client {
                reason: err.to_string(),
            }
        } else {
            TransportError::Unreachable {
                reason: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum GaitError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Assessment {id} not found")]
    AssessmentNotFound { id: String },

    #[error("Invalid assessment id {id:?}")]
    InvalidAssessmentId { id: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GaitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = TransportError::Status {
            status: 503,
            message: "warming up".to_string(),
        };
        assert!(err.is_retryable());
        assert!(err.user_message().contains("try again"));
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = TransportError::Status {
            status: 413,
            message: "payload too large".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.user_message(),
            "Analysis service returned HTTP 413: payload too large"
        );
    }

    #[test]
    fn connection_failures_are_retryable() {
        let err = TransportError::Unreachable {
            reason: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }
}
