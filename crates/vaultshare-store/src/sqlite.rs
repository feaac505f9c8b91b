//! SQLite implementation of the Store trait.
//!
//! This is the persistent backend. It uses rusqlite with bundled SQLite;
//! each transaction runs on a blocking thread via tokio::spawn_blocking and
//! maps onto one SQL transaction.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use vaultshare_core::clock::deadline;
use vaultshare_core::{Clock, SystemClock};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ReadTx, SetOptions, Store, Visit, WriteTx};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex, which also serializes transactions.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open a SQLite database at the given path on the given clock.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, clock)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::open_memory_with_clock(Arc::new(SystemClock))
    }

    /// Open an in-memory SQLite database on the given clock.
    pub fn open_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, clock)
    }

    fn from_connection(mut conn: Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        migration::migrate(&mut conn, clock.now_millis())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {}", e)))
}

/// A transaction view over a connection with a fixed `now`.
///
/// `now` is read after the connection lock is taken, so a transaction that
/// waited behind another writer judges expiry at the time it actually runs.
struct SqliteTx<'a> {
    conn: &'a Connection,
    now: i64,
}

impl ReadTx for SqliteTx<'_> {
    fn get(&self, key: &str) -> Result<Bytes> {
        let value: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT value FROM records
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, self.now],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(Bytes::from)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn ascend_index(&self, index: &str, term: &str, visit: &mut Visit<'_>) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT r.key, r.value FROM record_index i
             JOIN records r ON r.key = i.key
             WHERE i.index_name = ?1 AND i.term = ?2
               AND (r.expires_at IS NULL OR r.expires_at > ?3)
             ORDER BY i.key ASC",
        )?;
        let mut rows = stmt.query(params![index, term, self.now])?;

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: Vec<u8> = row.get(1)?;
            if let ControlFlow::Break(()) = visit(key.as_str(), value.as_slice()) {
                break;
            }
        }
        Ok(())
    }
}

impl WriteTx for SqliteTx<'_> {
    fn set(&mut self, key: &str, value: Bytes, options: SetOptions) -> Result<()> {
        let expires_at = options.ttl.map(|ttl| deadline(self.now, ttl));

        self.conn.execute(
            "INSERT INTO records (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at",
            params![key, value.as_ref(), expires_at],
        )?;

        self.conn
            .execute("DELETE FROM record_index WHERE key = ?1", params![key])?;

        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO record_index (index_name, term, key) VALUES (?1, ?2, ?3)",
        )?;
        for term in &options.index_terms {
            stmt.execute(params![term.index, term.term, key])?;
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM records
             WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            params![key, self.now],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound(key.to_string()));
        }

        self.conn
            .execute("DELETE FROM record_index WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    async fn update<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn WriteTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let clock = self.clock.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<T, E> {
            let mut conn = lock(&conn)?;
            let now = clock.now_millis();
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StoreError::from)?;

            let outcome = f(&mut SqliteTx { conn: &tx, now });

            // Dropping an uncommitted transaction rolls it back.
            match outcome {
                Ok(value) => {
                    tx.commit().map_err(StoreError::from)?;
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(|e| E::from(StoreError::Task(e.to_string())))?
    }

    async fn view<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&dyn ReadTx) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        let clock = self.clock.clone();

        tokio::task::spawn_blocking(move || -> std::result::Result<T, E> {
            let mut conn = lock(&conn)?;
            let now = clock.now_millis();
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Deferred)
                .map_err(StoreError::from)?;
            f(&SqliteTx { conn: &tx, now })
        })
        .await
        .map_err(|e| E::from(StoreError::Task(e.to_string())))?
    }

    async fn purge_expired(&self) -> Result<usize> {
        let conn = self.conn.clone();
        let clock = self.clock.clone();

        let purged = tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn = lock(&conn)?;
            let now = clock.now_millis();
            let tx = conn.transaction()?;

            tx.execute(
                "DELETE FROM record_index WHERE key IN (
                    SELECT key FROM records
                    WHERE expires_at IS NOT NULL AND expires_at <= ?1
                )",
                params![now],
            )?;
            let purged = tx.execute(
                "DELETE FROM records WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )?;

            tx.commit()?;
            Ok(purged)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        if purged > 0 {
            tracing::debug!(purged, "purged expired records");
        }
        Ok(purged)
    }
}
