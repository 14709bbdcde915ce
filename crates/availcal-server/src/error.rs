//! Server error types.

use std::io;
use std::time::Duration;

use availcal_providers::ProviderError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (bind, accept).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error. Fatal at startup.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The calendar feed could not be fetched or parsed.
    #[error("Calendar fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    /// The calendar feed did not answer in time.
    #[error("Calendar fetch timed out after {}ms", .timeout.as_millis())]
    FetchTimeout { timeout: Duration },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true for failures of a single refresh, as opposed to
    /// process-level errors.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::FetchTimeout { .. })
    }
}
