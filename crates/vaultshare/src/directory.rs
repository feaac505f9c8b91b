//! Collaborators the share service consults but does not own.
//!
//! Entries and user accounts live in other parts of the vault. The service
//! only needs to look an entry up and to confirm a user exists, so both are
//! expressed as narrow async traits.

use async_trait::async_trait;

use vaultshare_core::{Oid, UserId};

use crate::error::Result;

/// The parts of a vault entry a share needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    /// The entry identifier.
    pub id: Oid,
    /// Team that owns the entry.
    pub team_id: Oid,
    /// Hex-encoded 32-byte key that protects the entry's shares.
    pub access_key: String,
}

/// Lookup of vault entries.
#[async_trait]
pub trait EntryDirectory: Send + Sync {
    /// Find an entry. Absent entries are `ShareError::NotFound`.
    async fn find_entry(&self, entry_id: &Oid) -> Result<EntryRef>;
}

/// Lookup of user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Succeeds when the user exists; otherwise `ShareError::NotFound`.
    async fn user_exists(&self, user: &UserId) -> Result<()>;
}
