//! # VaultShare Store
//!
//! Expiring, transactional record storage for VaultShare. Provides a
//! trait-based interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store abstracts record persistence behind the [`Store`] trait so the
//! share manager is storage-agnostic. [`SqliteStore`] persists to disk;
//! [`MemoryStore`] is for tests and single-process deployments.
//!
//! ## Key Types
//!
//! - [`Store`] - Scoped `update` / `view` transactions
//! - [`ReadTx`] / [`WriteTx`] - Operations available inside a transaction
//! - [`SetOptions`] - TTL and secondary index terms for a write
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bytes::Bytes;
//! use vaultshare_store::{SetOptions, SqliteStore, Store, StoreError};
//!
//! async fn example() -> Result<(), StoreError> {
//!     let store = SqliteStore::open("vault.db")?;
//!
//!     store
//!         .update(|tx| {
//!             let opts = SetOptions::new()
//!                 .ttl(Duration::from_secs(60))
//!                 .index("by_owner", "alice");
//!             tx.set("note:1", Bytes::from_static(b"hello"), opts)
//!         })
//!         .await?;
//!
//!     let value = store.view(|tx| tx.get("note:1")).await?;
//!     assert_eq!(value, Bytes::from_static(b"hello"));
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Passive expiry**: records past their deadline read as `NotFound` and
//!   drop out of index scans; no sweeper has to run
//! - **Explicit indexes**: index terms are stored next to the record, not
//!   derived from its serialized form
//! - **Early stop**: scans stop on `ControlFlow::Break`, which is not an error

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{IndexTerm, ReadTx, SetOptions, Store, StoreExt, Visit, WriteTx};
