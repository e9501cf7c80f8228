//! Error types for the record repository.

use std::time::Duration;

/// Upstream and repository errors.
///
/// Cache failures never appear here: they are absorbed inside [`crate::cache`].
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// Upstream answered with a server-side (5xx) error.
    #[error("upstream unavailable: HTTP {status}: {message}")]
    Unavailable { status: u16, message: String },

    /// Upstream is rate limiting us (429).
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Record not found upstream.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other 4xx answer, passed through with its status.
    #[error("upstream rejected request: HTTP {status}: {message}")]
    Client { status: u16, message: String },

    /// Retry budget consumed on transient failures.
    #[error("upstream still unavailable after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// Backoff wait was cancelled.
    #[error("interrupted while waiting to retry")]
    Interrupted,

    /// Delete target is ambiguous because its name is not unique.
    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    /// Upstream accepted the delete call but did not confirm the deletion.
    #[error("upstream did not confirm deletion of {name}")]
    DeleteRejected { name: String },

    /// Response body could not be understood.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Transport failure talking to upstream.
    #[error("network error: {message}")]
    Network { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl RosterError {
    /// Whether the failure is transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited { .. })
    }

    /// HTTP status a routing layer should answer with.
    ///
    /// Passthrough failures keep their upstream status; everything else
    /// collapses to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Client { status, .. } => *status,
            Self::DuplicateName { .. } => 409,
            Self::Unavailable { .. }
            | Self::RateLimited { .. }
            | Self::Exhausted { .. }
            | Self::Interrupted
            | Self::DeleteRejected { .. }
            | Self::InvalidResponse { .. }
            | Self::Network { .. }
            | Self::Config { .. } => 500,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 1,
            Self::Config { .. } => 1,

            Self::Client { .. } => 4,
            Self::DuplicateName { .. } => 3,

            // Transient upstream trouble
            Self::Unavailable { .. } => 5,
            Self::RateLimited { .. } => 5,
            Self::Exhausted { .. } => 5,
            Self::Interrupted => 5,
            Self::Network { .. } => 5,

            Self::DeleteRejected { .. } => 6,
            Self::InvalidResponse { .. } => 6,
        }
    }
}

impl From<reqwest::Error> for RosterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type RosterResult<T> = Result<T, RosterError>;
