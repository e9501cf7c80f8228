//! Typed cache entries: the collection snapshot and per-record entries.
//!
//! # Keys
//!
//! ```text
//! employees            # JSON array of every record (snapshot)
//! employeeById:{id}    # JSON object of one record
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::KeyValueCache;
use crate::types::Record;

/// Key of the collection snapshot.
pub const SNAPSHOT_KEY: &str = "employees";

/// Prefix of per-record keys.
pub const RECORD_KEY_PREFIX: &str = "employeeById:";

pub fn record_key(id: &str) -> String {
    format!("{}{}", RECORD_KEY_PREFIX, id)
}

/// Record-aware view over a [`KeyValueCache`].
#[derive(Clone)]
pub struct RecordCache {
    inner: Arc<dyn KeyValueCache>,
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache").finish_non_exhaustive()
    }
}

impl RecordCache {
    pub fn new(inner: Arc<dyn KeyValueCache>) -> Self {
        Self { inner }
    }

    /// Cached snapshot of the whole collection.
    pub async fn snapshot(&self) -> Option<Vec<Record>> {
        self.load(SNAPSHOT_KEY).await
    }

    pub async fn store_snapshot(&self, records: &[Record]) {
        debug!(count = records.len(), "caching record snapshot");
        self.store(SNAPSHOT_KEY, records).await;
    }

    pub async fn evict_snapshot(&self) {
        debug!("evicting record snapshot");
        self.inner.delete(SNAPSHOT_KEY).await;
    }

    /// Cached entry for a single record.
    pub async fn record(&self, id: &str) -> Option<Record> {
        self.load(&record_key(id)).await
    }

    pub async fn store_record(&self, record: &Record) {
        debug!(id = %record.id, "caching record");
        self.store(&record_key(&record.id), record).await;
    }

    pub async fn evict_record(&self, id: &str) {
        debug!(id, "evicting record");
        self.inner.delete(&record_key(id)).await;
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.inner.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.inner.set(key, &json).await,
            Err(e) => warn!(key, error = %e, "failed to encode cache entry"),
        }
    }
}
