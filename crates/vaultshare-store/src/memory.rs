//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite but nothing is persisted. Writers are serialized
//! by the write lock; a failed `update` is rolled back from an undo log
//! before the lock is released, so readers never see its writes.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use vaultshare_core::clock::deadline;
use vaultshare_core::{Clock, SystemClock};

use crate::error::{Result, StoreError};
use crate::traits::{is_live, IndexTerm, ReadTx, SetOptions, Store, Visit, WriteTx};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Primary records by key.
    records: BTreeMap<String, Record>,

    /// Composite index: (index, term) -> keys.
    indexes: BTreeMap<(String, String), BTreeSet<String>>,
}

#[derive(Clone)]
struct Record {
    value: Bytes,
    expires_at: Option<i64>,
    terms: Vec<IndexTerm>,
}

impl MemoryStoreInner {
    fn live(&self, key: &str, now: i64) -> Option<&Record> {
        self.records
            .get(key)
            .filter(|record| is_live(record.expires_at, now))
    }

    fn get(&self, key: &str, now: i64) -> Result<Bytes> {
        self.live(key, now)
            .map(|record| record.value.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn ascend(&self, index: &str, term: &str, now: i64, visit: &mut Visit<'_>) {
        let Some(keys) = self.indexes.get(&(index.to_string(), term.to_string())) else {
            return;
        };
        for key in keys {
            if let Some(record) = self.live(key, now) {
                if visit(key.as_str(), &record.value[..]).is_break() {
                    break;
                }
            }
        }
    }

    /// Insert a record, replacing the previous one and its index terms.
    fn insert(&mut self, key: String, record: Record) -> Option<Record> {
        let previous = self.remove(&key);
        for term in &record.terms {
            self.indexes
                .entry((term.index.clone(), term.term.clone()))
                .or_default()
                .insert(key.clone());
        }
        self.records.insert(key, record);
        previous
    }

    /// Remove a record and its index terms, live or not.
    fn remove(&mut self, key: &str) -> Option<Record> {
        let record = self.records.remove(key)?;
        for term in &record.terms {
            let slot = (term.index.clone(), term.term.clone());
            if let Some(keys) = self.indexes.get_mut(&slot) {
                keys.remove(key);
                if keys.is_empty() {
                    self.indexes.remove(&slot);
                }
            }
        }
        Some(record)
    }
}

/// A read-write transaction holding the write lock.
struct MemoryWriteTx<'a> {
    inner: &'a mut MemoryStoreInner,
    now: i64,
    /// Previous state of every key touched, oldest first.
    undo: Vec<(String, Option<Record>)>,
}

impl MemoryWriteTx<'_> {
    fn rollback(self) {
        for (key, previous) in self.undo.into_iter().rev() {
            match previous {
                Some(record) => {
                    self.inner.insert(key, record);
                }
                None => {
                    self.inner.remove(&key);
                }
            }
        }
    }
}

impl ReadTx for MemoryWriteTx<'_> {
    fn get(&self, key: &str) -> Result<Bytes> {
        self.inner.get(key, self.now)
    }

    fn ascend_index(&self, index: &str, term: &str, visit: &mut Visit<'_>) -> Result<()> {
        self.inner.ascend(index, term, self.now, visit);
        Ok(())
    }
}

impl WriteTx for MemoryWriteTx<'_> {
    fn set(&mut self, key: &str, value: Bytes, options: SetOptions) -> Result<()> {
        let record = Record {
            value,
            expires_at: options.ttl.map(|ttl| deadline(self.now, ttl)),
            terms: options.index_terms,
        };
        let previous = self.inner.insert(key.to_string(), record);
        self.undo.push((key.to_string(), previous));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        if self.inner.live(key, self.now).is_none() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let previous = self.inner.remove(key);
        self.undo.push((key.to_string(), previous));
        Ok(())
    }
}

/// A read-only transaction holding the read lock.
struct MemoryReadTx<'a> {
    inner: &'a MemoryStoreInner,
    now: i64,
}

impl ReadTx for MemoryReadTx<'_> {
    fn get(&self, key: &str) -> Result<Bytes> {
        self.inner.get(key, self.now)
    }

    fn ascend_index(&self, index: &str, term: &str, visit: &mut Visit<'_>) -> Result<()> {
        self.inner.ascend(index, term, self.now, visit);
        Ok(())
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new empty in-memory store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
            clock,
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.records.len()).unwrap_or(0)
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update_blocking<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn WriteTx) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let mut tx = MemoryWriteTx {
            inner: &mut guard,
            now: self.clock.now_millis(),
            undo: Vec::new(),
        };

        match f(&mut tx) {
            Ok(value) => Ok(value),
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    fn view_blocking<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&dyn ReadTx) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self
            .inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let tx = MemoryReadTx {
            inner: &guard,
            now: self.clock.now_millis(),
        };
        f(&tx)
    }

    fn purge_blocking(&self) -> Result<usize> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let now = self.clock.now_millis();

        let expired: Vec<String> = inner
            .records
            .iter()
            .filter(|(_, record)| !is_live(record.expires_at, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        Ok(expired.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    async fn update<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn WriteTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.update_blocking(f)
    }

    async fn view<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&dyn ReadTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.view_blocking(f)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let purged = self.purge_blocking()?;
        if purged > 0 {
            tracing::debug!(purged, "purged expired records");
        }
        Ok(purged)
    }
}
