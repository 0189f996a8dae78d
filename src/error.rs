//! Error types for the doctriage library.

use std::io;
use thiserror::Error;

/// Result type alias for doctriage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Processing stage at which a whole-document failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Page content filtering.
    Filter,
    /// Page triage.
    Triage,
    /// Remote backend processing.
    Remote,
    /// Result merging and post-processing.
    Merge,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Filter => "filter",
            Stage::Triage => "triage",
            Stage::Remote => "remote",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Error types that can occur during hybrid document processing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or missing configuration, detected at construction time.
    /// Never retried and never recovered by fallback.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend request failed: non-success HTTP status, transport
    /// failure, or a malformed or incomplete response body.
    #[error("{backend} backend error: {message}")]
    Backend {
        /// Name of the backend that produced the failure.
        backend: &'static str,
        /// Failure detail, including any backend-supplied error body.
        message: String,
    },

    /// The backend reported that the analysis itself failed.
    #[error("{backend} analysis failed: {detail}")]
    AnalysisFailed {
        /// Name of the backend that reported the failure.
        backend: &'static str,
        /// Backend-supplied error detail.
        detail: String,
    },

    /// The polling loop exhausted its attempt ceiling without a terminal
    /// status from the backend.
    #[error("{backend} analysis timed out after {attempts} poll attempts")]
    PollTimeout {
        /// Name of the backend being polled.
        backend: &'static str,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A backend response could not be interpreted by its transformer.
    #[error("Schema transform error: {0}")]
    Transform(String),

    /// Error serializing or deserializing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A whole-document processing failure, tagged with the stage that
    /// produced it.
    #[error("Processing failed at {stage} stage: {source}")]
    Processing {
        /// The stage at which processing failed.
        stage: Stage,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error with the processing stage it occurred in.
    pub fn at_stage(self, stage: Stage) -> Self {
        Error::Processing {
            stage,
            source: Box::new(self),
        }
    }

    /// True for failures the remote path may recover from via fallback:
    /// transport and status failures, backend-reported analysis failures,
    /// poll timeouts, and malformed response bodies. Configuration errors
    /// are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Backend { .. }
                | Error::AnalysisFailed { .. }
                | Error::PollTimeout { .. }
                | Error::Transform(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Backend {
            backend: "http",
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PollTimeout {
            backend: "azure",
            attempts: 120,
        };
        assert_eq!(
            err.to_string(),
            "azure analysis timed out after 120 poll attempts"
        );

        let err = Error::Config("missing API key".into());
        assert_eq!(err.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_stage_tagging() {
        let err = Error::Backend {
            backend: "docling",
            message: "status 500".into(),
        }
        .at_stage(Stage::Remote);

        assert!(err.to_string().starts_with("Processing failed at remote"));
        match err {
            Error::Processing { stage, .. } => assert_eq!(stage, Stage::Remote),
            _ => panic!("expected Processing variant"),
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::PollTimeout {
            backend: "azure",
            attempts: 1
        }
        .is_recoverable());
        assert!(!Error::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
