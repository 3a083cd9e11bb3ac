//! Error type definitions for the IPTV aggregator.
//!
//! The taxonomy follows the propagation policy of the pipeline: per-source
//! and per-URL failures are converted to typed values at their origin and
//! never abort a run, while configuration, template and output-file errors
//! propagate to the top level.

use thiserror::Error;

/// Top-level application error type
///
/// Only fatal conditions appear here; recoverable failures live in
/// [`SourceError`] and [`ProbeFailure`] and are absorbed by the pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    /// Template file could not be read; fatal to the whole run
    #[error("Template unreadable: {path} - {source}")]
    Template {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Output file errors; logged and re-raised, run terminates
    #[error("Output error: {path} - {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an output error for a specific path
    pub fn output<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

/// Per-source fetch failures; each one costs the run only that source's
/// contribution.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Connection or read timed out after all retry attempts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Non-2xx response from the source
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Transport-level failure (DNS, connect, TLS, read)
    #[error("Network error: {url} - {message}")]
    Network { url: String, message: String },

    /// Body was empty or whitespace-only
    #[error("Empty response: {url}")]
    Empty { url: String },
}

impl SourceError {
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Transient failures are worth retrying; 4xx responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Empty { .. } => false,
        }
    }
}

/// Why a single URL probe failed. Carried inside
/// [`crate::models::ProbeOutcome::Failed`] so callers can distinguish a
/// timeout from a refused connection from a non-200 status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Probe did not complete within its timeout
    #[error("probe timed out")]
    Timeout,

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Host answered with a non-200 status
    #[error("unexpected status: {0}")]
    Status(u16),

    /// Media probe process could not be spawned or waited on
    #[error("probe process failed: {0}")]
    Process(String),
}
