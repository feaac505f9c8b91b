//! Store trait: the abstract interface for expiring, indexed records.
//!
//! All access goes through scoped transactions. [`Store::update`] runs a
//! callback against a [`WriteTx`] and commits only if the callback returns
//! `Ok`; [`Store::view`] runs a callback against a read-only [`ReadTx`].

use std::ops::ControlFlow;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};

/// One secondary index entry: the record is listed under `term` in `index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexTerm {
    pub index: String,
    pub term: String,
}

impl IndexTerm {
    pub fn new(index: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            term: term.into(),
        }
    }
}

/// Options for [`WriteTx::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Time to live. `None` never expires.
    pub ttl: Option<Duration>,
    /// Index terms maintained alongside the record.
    pub index_terms: Vec<IndexTerm>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire the record `ttl` after it is written.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// List the record under `term` in `index`.
    pub fn index(mut self, index: impl Into<String>, term: impl Into<String>) -> Self {
        self.index_terms.push(IndexTerm::new(index, term));
        self
    }
}

/// Visitor for [`ReadTx::ascend_index`]. Return `ControlFlow::Break(())` to
/// stop the scan early.
pub type Visit<'a> = dyn FnMut(&str, &[u8]) -> ControlFlow<()> + 'a;

/// Read access inside a transaction.
///
/// Expired records are never returned: not by `get`, not by scans.
pub trait ReadTx {
    /// Get a live value. Fails with [`StoreError::NotFound`] if the key is
    /// absent or expired.
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Visit every live record listed under `term` in `index`, in ascending
    /// key order.
    fn ascend_index(&self, index: &str, term: &str, visit: &mut Visit<'_>) -> Result<()>;
}

/// Write access inside an [`update`](Store::update) transaction.
pub trait WriteTx: ReadTx {
    /// Store `value` under `key`, replacing any previous value and index terms.
    fn set(&mut self, key: &str, value: Bytes, options: SetOptions) -> Result<()>;

    /// Delete a live record and its index terms. Fails with
    /// [`StoreError::NotFound`] if the key is absent or expired.
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// The Store trait: async interface for expiring record persistence.
///
/// # Design Notes
///
/// - **Atomicity**: if an `update` callback fails, none of its writes are visible.
/// - **Isolation**: `update` transactions are serialized; a `view` never sees
///   a partially applied `update`.
/// - **Expiry**: a record with a TTL is unreadable from its deadline on. No
///   background task is needed; [`purge_expired`](Store::purge_expired) only
///   reclaims space.
/// - **Indexes**: index terms are written and removed in the same transaction
///   as their record, so index scans and primary reads always agree.
#[async_trait]
pub trait Store: Send + Sync {
    /// Current time of the store clock (Unix ms).
    fn now_millis(&self) -> i64;

    /// Run `f` in a read-write transaction.
    async fn update<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn WriteTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;

    /// Run `f` in a read-only transaction.
    async fn view<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&dyn ReadTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;

    /// Remove expired records and their index terms. Returns how many
    /// records were removed.
    async fn purge_expired(&self) -> Result<usize>;
}

/// Extension trait for single-operation transactions.
pub trait StoreExt: Store {
    /// Get a live value in its own read transaction.
    fn get_value(&self, key: &str) -> impl std::future::Future<Output = Result<Bytes>> + Send;

    /// Set a value in its own write transaction.
    fn set_value(
        &self,
        key: &str,
        value: Bytes,
        options: SetOptions,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a value in its own write transaction.
    fn delete_value(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<S: Store> StoreExt for S {
    async fn get_value(&self, key: &str) -> Result<Bytes> {
        let key = key.to_string();
        self.view(move |tx| tx.get(&key)).await
    }

    async fn set_value(&self, key: &str, value: Bytes, options: SetOptions) -> Result<()> {
        let key = key.to_string();
        self.update(move |tx| tx.set(&key, value, options)).await
    }

    async fn delete_value(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.update(move |tx| tx.delete(&key)).await
    }
}

/// Whether a record with deadline `expires_at` is still readable at `now`.
pub(crate) fn is_live(expires_at: Option<i64>, now: i64) -> bool {
    expires_at.map_or(true, |deadline| now < deadline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_options_builder() {
        let opts = SetOptions::new()
            .ttl(Duration::from_secs(10))
            .index("by_user", "u1");
        assert_eq!(opts.ttl, Some(Duration::from_secs(10)));
        assert_eq!(opts.index_terms, vec![IndexTerm::new("by_user", "u1")]);
    }

    #[test]
    fn test_is_live() {
        assert!(is_live(None, i64::MAX));
        assert!(is_live(Some(10), 9));
        assert!(!is_live(Some(10), 10));
        assert!(!is_live(Some(10), 11));
    }
}
