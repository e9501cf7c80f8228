//! Resilient cache-aside access to an upstream record API.
//!
//! This crate provides:
//!
//! - A minimal cache wire protocol (command frames, bulk replies, null and
//!   short-read handling) and a fail-open TCP cache client
//! - A retry executor with exponential backoff for transient upstream failures
//! - An HTTP client for the upstream record API
//! - A cache-aside repository keeping the cache consistent with mutations
//! - Read-only queries over the record collection
//!
//! # Quick Start
//!
//! ```no_run
//! use roster_core::{RecordRepository, RosterConfig};
//!
//! # async fn example() -> roster_core::RosterResult<()> {
//! let repository = RecordRepository::from_config(&RosterConfig::from_env())?;
//!
//! let record = repository.fetch_by_id("123").await?;
//! println!("{} earns {}", record.name, record.salary);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ROSTER_API_URL` | Upstream base URL (default: `http://localhost:8112/api/v1/employee`) |
//! | `ROSTER_CACHE_HOST` | Cache host (default: `127.0.0.1`) |
//! | `ROSTER_CACHE_PORT` | Cache port (default: `6379`) |
//! | `ROSTER_RETRY_MAX_ATTEMPTS` | Attempts per upstream call (default: 3) |
//! | `ROSTER_RETRY_INITIAL_DELAY_MS` | First backoff delay (default: 1000) |
//! | `ROSTER_API_TIMEOUT` | Request timeout in seconds (default: 30) |

pub mod cache;
pub mod client;
pub mod error;
pub mod query;
pub mod repository;
pub mod retry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use cache::{CacheClient, KeyValueCache, RecordCache};
pub use client::{HttpRecordApi, RecordApi};
pub use error::{RosterError, RosterResult};
pub use repository::RecordRepository;
pub use retry::{Outcome, RetryExecutor, RetryPolicy};
pub use types::{Record, RecordInput, RosterConfig};

/// User-Agent sent to upstream.
pub const ROSTER_USER_AGENT: &str = concat!("roster/", env!("CARGO_PKG_VERSION"));
