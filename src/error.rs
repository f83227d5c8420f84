//! Error types for jarshield-client
//!
//! The error taxonomy follows the controller's failure surfaces:
//! - [`ValidationError`] — user input malformed; recoverable, blocks submission
//! - [`SubmissionError`] — the backend rejected the job or the exchange failed;
//!   recoverable, the attempt is abandoned and surfaced as a notification
//! - transport failures during polling are produced as [`Error::Network`] /
//!   [`Error::Api`] / [`Error::Backend`] by the API layer and swallowed by the
//!   polling engine (retry on next tick, never surfaced individually)
//! - a job reaching FAILED is not an `Err` anywhere: it is a terminal state
//!   surfaced through the notification feed and the progress snapshot
//!
//! No error is fatal to the controller; every failure leaves it in a state
//! from which a new selection/submission can be initiated.

use thiserror::Error;

/// Result type alias for jarshield-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for jarshield-client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// User input failed validation (blocks submission, surfaced inline)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The submission exchange failed (attempt abandoned, no automatic retry)
    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),

    /// No artifact has been selected yet
    #[error("no artifact selected")]
    NoArtifact,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend returned a non-success HTTP status
    #[error("backend returned status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body for diagnostics
        message: String,
    },

    /// The backend answered 200 but flagged the operation as failed
    #[error("backend rejected request: {0}")]
    Backend(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// User-input validation errors (recoverable, surfaced inline)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The candidate file name does not carry the required archive extension
    #[error("unsupported artifact '{name}': only .{extension} files are supported")]
    UnsupportedExtension {
        /// The rejected file name
        name: String,
        /// The extension the selector requires
        extension: String,
    },

    /// The only-main flag is set but the scope filter field is blank
    #[error("a scope filter is required when restricting to the main package")]
    MissingScopeFilter,
}

/// Submission failures (the attempt is terminal; the user must re-initiate)
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The backend answered but refused the job, with its own message
    #[error("{reason}")]
    Rejected {
        /// Backend-supplied rejection message
        reason: String,
    },

    /// The exchange itself failed (network, malformed response, missing job id)
    #[error("transport failure: {0}")]
    Transport(String),
}
