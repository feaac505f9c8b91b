//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a store on a manual clock, a
//! share manager over it, and in-memory entry and user directories.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rand::RngCore;
use tokio::sync::RwLock;

use vaultshare::{
    EntryDirectory, EntryRef, Result, ShareConfig, ShareError, ShareManager, ShareService,
    TeamDirectory, UserDirectory,
};
use vaultshare_core::{Clock, ManualClock, Oid, TeamRecord, UserId};
use vaultshare_store::{MemoryStore, SqliteStore, Store, StoreError};
use vaultshare_token::{EncryptionKey, TokenCrypto};

/// Start time of every fixture clock (Unix ms).
pub const FIXTURE_EPOCH_MILLIS: i64 = 1_700_000_000_000;

/// Salt used by fixture token crypto.
pub const FIXTURE_SALT: &[u8] = b"vaultshare-testkit-salt";

/// Entries known to a test, keyed by id.
#[derive(Clone, Default)]
pub struct StaticEntries {
    entries: Arc<RwLock<HashMap<Oid, EntryRef>>>,
}

impl StaticEntries {
    /// Register an entry.
    pub async fn insert(&self, entry: EntryRef) {
        self.entries.write().await.insert(entry.id, entry);
    }

    /// Forget an entry, as if it had been deleted.
    pub async fn remove(&self, entry_id: &Oid) {
        self.entries.write().await.remove(entry_id);
    }
}

#[async_trait]
impl EntryDirectory for StaticEntries {
    async fn find_entry(&self, entry_id: &Oid) -> Result<EntryRef> {
        self.entries
            .read()
            .await
            .get(entry_id)
            .cloned()
            .ok_or_else(|| ShareError::NotFound(format!("entry {}", entry_id)))
    }
}

/// User accounts known to a test.
#[derive(Clone, Default)]
pub struct StaticUsers {
    users: Arc<RwLock<HashSet<UserId>>>,
}

impl StaticUsers {
    /// Register a user.
    pub async fn insert(&self, user: UserId) {
        self.users.write().await.insert(user);
    }
}

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn user_exists(&self, user: &UserId) -> Result<()> {
        if self.users.read().await.contains(user) {
            Ok(())
        } else {
            Err(ShareError::NotFound(format!("user {}", user)))
        }
    }
}

/// A test fixture: one store on a manual clock and everything built on it.
pub struct TestFixture<S: Store = MemoryStore> {
    pub clock: Arc<ManualClock>,
    pub store: Arc<S>,
    pub crypto: Arc<TokenCrypto>,
    pub shares: ShareManager<S>,
    pub teams: TeamDirectory<S>,
    pub entries: StaticEntries,
    pub users: StaticUsers,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture over a memory store.
    pub fn new() -> Self {
        Self::with_config(ShareConfig::default())
    }

    /// Create a fixture over a memory store with the given configuration.
    pub fn with_config(config: ShareConfig) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MILLIS));
        let store = MemoryStore::with_clock(clock.clone());
        Self::from_parts(store, clock, config)
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture<SqliteStore> {
    /// Create a fixture over a SQLite database file.
    pub fn sqlite(path: impl AsRef<Path>) -> std::result::Result<Self, StoreError> {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MILLIS));
        let store = SqliteStore::open_with_clock(path, clock.clone())?;
        Ok(Self::from_parts(store, clock, ShareConfig::default()))
    }

    /// Create a fixture over an in-memory SQLite database.
    pub fn sqlite_memory() -> std::result::Result<Self, StoreError> {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MILLIS));
        let store = SqliteStore::open_memory_with_clock(clock.clone())?;
        Ok(Self::from_parts(store, clock, ShareConfig::default()))
    }
}

impl<S: Store> TestFixture<S> {
    /// Assemble a fixture around an existing store and its clock.
    pub fn from_parts(store: S, clock: Arc<ManualClock>, config: ShareConfig) -> Self {
        let store = Arc::new(store);
        let crypto = Arc::new(TokenCrypto::new(FIXTURE_SALT));
        Self {
            shares: ShareManager::new(store.clone(), crypto.clone(), config),
            teams: TeamDirectory::new(store.clone()),
            clock,
            store,
            crypto,
            entries: StaticEntries::default(),
            users: StaticUsers::default(),
        }
    }

    /// Current fixture time (Unix ms).
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Save a team and register its members as users.
    pub async fn add_team(&self, name: &str, members: &[&str]) -> Result<TeamRecord> {
        let members: Vec<UserId> = members.iter().map(|m| UserId::from(*m)).collect();
        for member in &members {
            self.users.insert(member.clone()).await;
        }
        let team = TeamRecord::new(Oid::new(), name, members, self.now());
        self.teams.save(&team).await?;
        Ok(team)
    }

    /// Register an entry owned by `team_id` under a fresh random key.
    pub async fn add_entry(&self, team_id: Oid) -> EntryRef {
        let entry = EntryRef {
            id: Oid::new(),
            team_id,
            access_key: random_access_key(),
        };
        self.entries.insert(entry.clone()).await;
        entry
    }

    /// Register a user account.
    pub async fn add_user(&self, user: &str) -> UserId {
        let user = UserId::from(user);
        self.users.insert(user.clone()).await;
        user
    }

    /// A service over this fixture's manager and directories.
    pub fn service(&self) -> ShareService<S, StaticEntries, StaticUsers> {
        ShareService::new(
            self.shares.clone(),
            self.teams.clone(),
            self.entries.clone(),
            self.users.clone(),
        )
    }
}

/// A fresh hex-encoded 32-byte entry key.
pub fn random_access_key() -> String {
    EncryptionKey::generate().to_hex()
}

/// A random pass in the client's pre-hashed form (64 hex characters).
pub fn random_pass() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Install a test-writer `tracing` subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
