//! # VaultShare
//!
//! Time-limited, revocable sharing of team secret entries.
//!
//! ## Overview
//!
//! A member of a team shares one of the team's entries with another user.
//! The share carries a token that binds the recipient to a pre-hashed pass,
//! encrypted under the entry's key. Shares expire on their own; any current
//! team member can revoke one sooner.
//!
//! - **Shares**: expiring records indexed by recipient, entry and team
//! - **Tokens**: keyed BLAKE3 signatures sealed with ChaCha20-Poly1305
//! - **Teams**: membership decides who may create and revoke
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vaultshare::{ShareConfig, ShareManager};
//! use vaultshare::core::{Oid, ShareDraft, UserId};
//! use vaultshare::store::SqliteStore;
//! use vaultshare::token::TokenCrypto;
//!
//! async fn example() -> vaultshare::Result<()> {
//!     let store = Arc::new(SqliteStore::open("vault.db")?);
//!     let crypto = Arc::new(TokenCrypto::new(b"installation salt"));
//!     let shares = ShareManager::new(store, crypto, ShareConfig::default());
//!
//!     let entry_id = Oid::new();
//!     let access_key = "00".repeat(32);
//!     let pass = "15e2536def2490c115759ceabf012872fddbd7887fbe67e5074d1e66148d5d00";
//!
//!     let result = shares
//!         .create(
//!             entry_id,
//!             &access_key,
//!             pass,
//!             Duration::from_secs(3600),
//!             ShareDraft {
//!                 team_id: Oid::new(),
//!                 user_id: UserId::from("jeo"),
//!                 name: "Github".into(),
//!             },
//!         )
//!         .await?;
//!
//!     let listed = shares.find_by_entry_id(entry_id).await?;
//!     assert_eq!(listed, vec![result]);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `vaultshare::core` - identifiers and records
//! - `vaultshare::store` - storage abstraction, SQLite and in-memory backends
//! - `vaultshare::token` - token signing and encryption

pub mod config;
pub mod directory;
pub mod error;
pub mod manager;
pub mod request;
pub mod service;
pub mod team;

// Re-export component crates
pub use vaultshare_core as core;
pub use vaultshare_store as store;
pub use vaultshare_token as token;

pub use config::{CorruptRecordPolicy, ShareConfig, DEFAULT_MIN_EXPIRE_SECS};
pub use directory::{EntryDirectory, EntryRef, UserDirectory};
pub use error::{ErrorKind, Result, ShareError};
pub use manager::ShareManager;
pub use request::ShareRequest;
pub use service::ShareService;
pub use team::TeamDirectory;

pub use vaultshare_core::{Oid, Share, ShareDraft, ShareResult, TeamRecord, UserId};
