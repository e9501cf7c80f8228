//! In-memory fakes for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cache::KeyValueCache;
use crate::client::RecordApi;
use crate::error::{RosterError, RosterResult};
use crate::types::{Record, RecordInput};

pub(crate) fn record(id: &str, name: &str, salary: u64) -> Record {
    Record {
        id: id.to_string(),
        name: name.to_string(),
        salary,
        age: 30,
        title: "Engineer".to_string(),
        email: None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub(crate) fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub(crate) fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.get_raw(key)
    }

    async fn set(&self, key: &str, value: &str) {
        self.insert(key, value);
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

type Failure = fn() -> RosterError;

/// Upstream fake backed by a record list.
#[derive(Debug)]
pub(crate) struct FakeApi {
    records: Mutex<Vec<Record>>,
    list_calls: AtomicU32,
    get_calls: AtomicU32,
    create_calls: AtomicU32,
    delete_calls: AtomicU32,
    delete_flag: AtomicBool,
    list_failure: Mutex<Option<Failure>>,
    create_failure: Mutex<Option<Failure>>,
    delete_failure: Mutex<Option<Failure>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl FakeApi {
    pub(crate) fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            list_calls: AtomicU32::new(0),
            get_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
            delete_calls: AtomicU32::new(0),
            delete_flag: AtomicBool::new(true),
            list_failure: Mutex::new(None),
            create_failure: Mutex::new(None),
            delete_failure: Mutex::new(None),
        }
    }

    pub(crate) fn fail_list_with(&self, failure: Failure) {
        *self.list_failure.lock().unwrap() = Some(failure);
    }

    pub(crate) fn fail_create_with(&self, failure: Failure) {
        *self.create_failure.lock().unwrap() = Some(failure);
    }

    pub(crate) fn fail_delete_with(&self, failure: Failure) {
        *self.delete_failure.lock().unwrap() = Some(failure);
    }

    pub(crate) fn set_delete_flag(&self, flag: bool) {
        self.delete_flag.store(flag, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_calls(&self) -> u32 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn injected(slot: &Mutex<Option<Failure>>) -> Option<RosterError> {
        let failure = *slot.lock().unwrap();
        failure.map(|f| f())
    }
}

#[async_trait]
impl RecordApi for FakeApi {
    async fn list(&self) -> RosterResult<Vec<Record>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::injected(&self.list_failure) {
            return Err(e);
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get(&self, id: &str) -> RosterResult<Record> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| RosterError::NotFound {
                resource: format!("record {}", id),
            })
    }

    async fn create(&self, input: &RecordInput) -> RosterResult<Record> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::injected(&self.create_failure) {
            return Err(e);
        }
        let created = Record {
            id: format!("new-{}", n),
            name: input.name.clone(),
            salary: input.salary,
            age: input.age,
            title: input.title.clone(),
            email: input.email.clone(),
        };
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_by_name(&self, name: &str) -> RosterResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = Self::injected(&self.delete_failure) {
            return Err(e);
        }
        let flag = self.delete_flag.load(Ordering::SeqCst);
        if flag {
            let mut records = self.records.lock().unwrap();
            if let Some(pos) = records.iter().position(|r| r.name == name) {
                records.remove(pos);
            }
        }
        Ok(flag)
    }
}
