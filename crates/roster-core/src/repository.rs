//! Cache-aside record repository.
//!
//! Reads consult the cache first and populate it after a successful upstream
//! read. Writes go upstream first and then invalidate or repopulate the
//! affected entries. Snapshot and per-record invalidation are independent
//! cache commands; a concurrent reader may see either one stale.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::{CacheClient, KeyValueCache, RecordCache};
use crate::client::{HttpRecordApi, RecordApi};
use crate::error::{RosterError, RosterResult};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::types::{Record, RecordInput, RosterConfig};

/// Record repository fronting an upstream [`RecordApi`] with a cache.
#[derive(Clone)]
pub struct RecordRepository {
    api: Arc<dyn RecordApi>,
    cache: RecordCache,
    retry: RetryExecutor,
}

impl std::fmt::Debug for RecordRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordRepository")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl RecordRepository {
    pub fn new(
        api: Arc<dyn RecordApi>,
        cache: Arc<dyn KeyValueCache>,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            api,
            cache: RecordCache::new(cache),
            retry,
        }
    }

    /// Wire the HTTP upstream client and the TCP cache client from `config`.
    pub fn from_config(config: &RosterConfig) -> RosterResult<Self> {
        let api = HttpRecordApi::new(config)?;
        let cache = CacheClient::new(config.cache_addr());
        let retry = RetryExecutor::new(RetryPolicy::new(
            config.retry_max_attempts,
            config.retry_initial_delay(),
        ));
        Ok(Self::new(Arc::new(api), Arc::new(cache), retry))
    }

    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// All records. A non-empty cached snapshot is served without calling upstream.
    pub async fn fetch_all(&self) -> RosterResult<Vec<Record>> {
        if let Some(records) = self.cache.snapshot().await {
            if !records.is_empty() {
                debug!(count = records.len(), "serving records from cache");
                return Ok(records);
            }
        }

        let records = self.retry.execute("list", || self.api.list()).await?;
        self.cache.store_snapshot(&records).await;

        debug!(count = records.len(), "fetched records from upstream");
        Ok(records)
    }

    /// One record. Not-found answers are never cached.
    pub async fn fetch_by_id(&self, id: &str) -> RosterResult<Record> {
        if let Some(record) = self.cache.record(id).await {
            debug!(id, "serving record from cache");
            return Ok(record);
        }

        let record = match self.retry.execute("get", || self.api.get(id)).await {
            Ok(record) => record,
            Err(e @ RosterError::NotFound { .. }) => {
                warn!(id, "record not found upstream");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        self.cache.store_record(&record).await;
        debug!(id = %record.id, "fetched record from upstream");
        Ok(record)
    }

    /// Create a record upstream, then drop the snapshot and cache the new entry.
    pub async fn create(&self, input: &RecordInput) -> RosterResult<Record> {
        let record = self
            .retry
            .execute("create", || self.api.create(input))
            .await?;

        self.cache.evict_snapshot().await;
        self.cache.store_record(&record).await;

        info!(id = %record.id, name = %record.name, "created record");
        Ok(record)
    }

    /// Delete `record` upstream by its name.
    ///
    /// Upstream deletes by name, so the call is refused when the name is not
    /// unique in the current collection.
    pub async fn delete_by_record(&self, record: &Record) -> RosterResult<String> {
        let all = self.fetch_all().await?;
        if has_duplicate_name(&all, &record.name) {
            error!(name = %record.name, "refusing delete: duplicate name");
            return Err(RosterError::DuplicateName {
                name: record.name.clone(),
            });
        }

        let deleted = match self
            .retry
            .execute("delete", || self.api.delete_by_name(&record.name))
            .await
        {
            Ok(deleted) => deleted,
            Err(RosterError::NotFound { .. }) => {
                warn!(name = %record.name, "record not found upstream for deletion");
                return Err(RosterError::NotFound {
                    resource: format!("record named {}", record.name),
                });
            }
            Err(e) => return Err(e),
        };

        if !deleted {
            error!(name = %record.name, "upstream did not confirm deletion");
            return Err(RosterError::DeleteRejected {
                name: record.name.clone(),
            });
        }

        self.cache.evict_record(&record.id).await;
        self.cache.evict_snapshot().await;

        info!(id = %record.id, name = %record.name, "deleted record");
        Ok(record.name.clone())
    }

    /// Look up the record by id, then delete it by name.
    pub async fn delete_by_id(&self, id: &str) -> RosterResult<String> {
        let record = self.fetch_by_id(id).await?;
        self.delete_by_record(&record).await
    }
}

/// Whether more than one record is named `name`.
pub fn has_duplicate_name(records: &[Record], name: &str) -> bool {
    records.iter().filter(|r| r.name == name).nth(1).is_some()
}
