//! Base error type for the HTTP and tracing helpers.
//!
//! Transport failures are sorted into connectivity errors (the peer could not
//! be reached or did not answer in time) and everything else, so callers
//! above can report an unreachable server distinctly.

use thiserror::Error;

/// Error raised by the shared helpers.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP failure that is not a connectivity problem
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Peer refused or dropped the connection
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Request did not complete within the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Global tracing subscriber could not be installed
    #[error("Tracing setup failed: {0}")]
    Tracing(String),
}

impl PlatformError {
    /// Whether the failure was a connectivity problem.
    ///
    /// These are the only transient platform errors: the same request may
    /// succeed once the peer is reachable again.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// assert!(PlatformError::timeout("30s elapsed").is_retryable());
    /// assert!(!PlatformError::Tracing("already set".to_string()).is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a timeout error with the given message.
    #[must_use]
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}
