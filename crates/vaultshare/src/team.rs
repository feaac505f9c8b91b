//! Team records and membership checks.
//!
//! Teams live in the same store as shares so a revocation can read the
//! owning team and delete the share inside one transaction.

use std::sync::Arc;

use bytes::Bytes;

use vaultshare_core::{team_key, Oid, TeamRecord, UserId};
use vaultshare_store::{ReadTx, SetOptions, Store, WriteTx};

use crate::error::{Result, ShareError};

/// Team records in the share store.
pub struct TeamDirectory<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for TeamDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> TeamDirectory<S> {
    /// Create a directory over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Insert or replace a team. Teams never expire.
    pub async fn save(&self, team: &TeamRecord) -> Result<()> {
        let key = team.key();
        let value = Bytes::from(team.to_bytes()?);
        self.store
            .update(move |tx| tx.set(&key, value, SetOptions::new()))
            .await?;
        Ok(())
    }

    /// Find a team, deleted or not.
    pub async fn find(&self, team_id: Oid) -> Result<TeamRecord> {
        self.store.view(move |tx| read_team(tx, &team_id)).await
    }

    /// Whether `user` belongs to a live team.
    ///
    /// A missing or deleted team is `NotFound`.
    pub async fn is_member(&self, team_id: Oid, user: &UserId) -> Result<bool> {
        let user = user.clone();
        self.store
            .view(move |tx| Ok(read_live_team(tx, &team_id)?.has_member(&user)))
            .await
    }

    /// Whether the team has been marked deleted.
    pub async fn is_deleted(&self, team_id: Oid) -> Result<bool> {
        Ok(self.find(team_id).await?.is_deleted)
    }

    /// Add `user` to the team. Adding an existing member is a no-op.
    pub async fn add_member(&self, team_id: Oid, user: &UserId) -> Result<()> {
        let user = user.clone();
        self.modify(team_id, move |team| {
            if !team.has_member(&user) {
                team.members.push(user);
            }
        })
        .await
    }

    /// Remove `user` from the team.
    pub async fn remove_member(&self, team_id: Oid, user: &UserId) -> Result<()> {
        let user = user.clone();
        self.modify(team_id, move |team| team.members.retain(|m| *m != user))
            .await
    }

    /// Mark the team deleted. The record is kept.
    pub async fn mark_deleted(&self, team_id: Oid) -> Result<()> {
        self.modify(team_id, |team| team.is_deleted = true).await
    }

    async fn modify<F>(&self, team_id: Oid, change: F) -> Result<()>
    where
        F: FnOnce(&mut TeamRecord) + Send + 'static,
    {
        let now = self.store.now_millis();
        self.store
            .update(move |tx| {
                let mut team = read_team(&*tx, &team_id)?;
                change(&mut team);
                team.updated = now;
                write_team(tx, &team)
            })
            .await
    }
}

/// Read a team inside a transaction.
///
/// Absent and undecodable records are both `NotFound`.
pub(crate) fn read_team<T: ReadTx + ?Sized>(tx: &T, team_id: &Oid) -> Result<TeamRecord> {
    let not_found = || ShareError::NotFound(format!("team {}", team_id));
    let value = tx.get(&team_key(team_id)).map_err(|e| {
        if e.is_not_found() {
            not_found()
        } else {
            ShareError::from(e)
        }
    })?;
    TeamRecord::from_bytes(&value).map_err(|_| not_found())
}

/// Read a team that has not been deleted.
pub(crate) fn read_live_team<T: ReadTx + ?Sized>(tx: &T, team_id: &Oid) -> Result<TeamRecord> {
    let team = read_team(tx, team_id)?;
    if team.is_deleted {
        return Err(ShareError::NotFound(format!("team {} is deleted", team_id)));
    }
    Ok(team)
}

fn write_team(tx: &mut dyn WriteTx, team: &TeamRecord) -> Result<()> {
    let value = Bytes::from(team.to_bytes()?);
    tx.set(&team.key(), value, SetOptions::new())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultshare_store::MemoryStore;

    use crate::error::ErrorKind;

    fn directory() -> TeamDirectory<MemoryStore> {
        TeamDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_membership_changes() {
        let teams = directory();
        let team = TeamRecord::new(Oid::new(), "ops", vec![UserId::from("alice")], 1);
        teams.save(&team).await.unwrap();

        let bob = UserId::from("bob");
        assert!(!teams.is_member(team.id, &bob).await.unwrap());

        teams.add_member(team.id, &bob).await.unwrap();
        teams.add_member(team.id, &bob).await.unwrap();
        assert!(teams.is_member(team.id, &bob).await.unwrap());
        assert_eq!(teams.find(team.id).await.unwrap().members.len(), 2);

        teams.remove_member(team.id, &bob).await.unwrap();
        assert!(!teams.is_member(team.id, &bob).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleted_team_is_not_found_for_membership() {
        let teams = directory();
        let alice = UserId::from("alice");
        let team = TeamRecord::new(Oid::new(), "ops", vec![alice.clone()], 1);
        teams.save(&team).await.unwrap();

        teams.mark_deleted(team.id).await.unwrap();
        assert!(teams.is_deleted(team.id).await.unwrap());

        let err = teams.is_member(team.id, &alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_missing_team() {
        let teams = directory();
        let err = teams.find(Oid::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = teams
            .remove_member(Oid::new(), &UserId::from("alice"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
