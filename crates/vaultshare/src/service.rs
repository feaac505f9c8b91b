//! Request-level share flows.
//!
//! [`ShareService`] takes identifiers as the caller supplied them, checks
//! requests and authorization against its collaborators, and drives the
//! [`ShareManager`].

use std::time::Duration;

use vaultshare_core::{Oid, Share, ShareDraft, ShareResult, UserId};
use vaultshare_store::Store;
use vaultshare_token::TokenError;

use crate::directory::{EntryDirectory, UserDirectory};
use crate::error::{ErrorKind, Result, ShareError};
use crate::manager::ShareManager;
use crate::request::ShareRequest;
use crate::team::TeamDirectory;

/// Share flows over a manager and its collaborators.
pub struct ShareService<S: Store, E, U> {
    shares: ShareManager<S>,
    teams: TeamDirectory<S>,
    entries: E,
    users: U,
}

impl<S, E, U> ShareService<S, E, U>
where
    S: Store,
    E: EntryDirectory,
    U: UserDirectory,
{
    /// Create a service.
    pub fn new(shares: ShareManager<S>, teams: TeamDirectory<S>, entries: E, users: U) -> Self {
        Self {
            shares,
            teams,
            entries,
            users,
        }
    }

    /// Get the share manager.
    pub fn shares(&self) -> &ShareManager<S> {
        &self.shares
    }

    /// Get the team directory.
    pub fn teams(&self) -> &TeamDirectory<S> {
        &self.teams
    }

    /// Share an entry with `request.user_id` on behalf of `requester`.
    ///
    /// The requester must be a member of the entry's team.
    pub async fn share_entry(
        &self,
        requester: &UserId,
        entry_id: &str,
        request: ShareRequest,
    ) -> Result<ShareResult> {
        let entry_id = Oid::parse(entry_id)?;
        request.validate(self.shares.config())?;

        self.users
            .user_exists(&request.user_id)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    ShareError::InvalidInput(format!("unknown user {}", request.user_id))
                }
                _ => e,
            })?;

        let entry = self.entries.find_entry(&entry_id).await?;
        if !self.teams.is_member(entry.team_id, requester).await? {
            tracing::warn!(
                entry_id = %entry_id,
                team_id = %entry.team_id,
                requester = %requester,
                "share creation by non-member refused"
            );
            return Err(ShareError::Forbidden(format!(
                "{} is not a member of team {}",
                requester, entry.team_id
            )));
        }

        let expire = Duration::from_secs(request.expire_secs);
        let draft = ShareDraft {
            team_id: entry.team_id,
            user_id: request.user_id,
            name: request.name,
        };
        self.shares
            .create(entry_id, &entry.access_key, &request.pass, expire, draft)
            .await
    }

    /// Revoke a share on behalf of `requester`.
    pub async fn revoke(&self, share_id: &str, requester: &UserId) -> Result<()> {
        let share_id = Oid::parse(share_id)?;
        self.shares.delete(share_id, requester).await
    }

    /// Open a share as its recipient.
    ///
    /// Succeeds only for the user the share names, presenting the pass it
    /// was created with.
    pub async fn redeem(&self, share_id: &str, user: &UserId, pass: &str) -> Result<ShareResult> {
        let share_id = Oid::parse(share_id)?;
        let share: Share = self.shares.find(share_id).await?;

        if share.user_id != *user {
            tracing::warn!(share_id = %share_id, user = %user, "share redeemed by non-recipient");
            return Err(ShareError::Forbidden(format!(
                "share {} is not addressed to {}",
                share_id, user
            )));
        }

        let entry = self.entries.find_entry(&share.entry_id).await?;
        self.shares
            .crypto()
            .verify_token(user, pass, &share.token, &entry.access_key)
            .map_err(|e| match e {
                TokenError::RecipientMismatch => {
                    tracing::warn!(share_id = %share_id, "share pass rejected");
                    ShareError::Forbidden(format!("wrong pass for share {}", share_id))
                }
                other => ShareError::Crypto(other),
            })?;

        Ok(share.result())
    }

    /// Live shares addressed to `user`.
    pub async fn list_for_user(&self, user: &UserId) -> Result<Vec<ShareResult>> {
        self.shares.find_by_user_id(user).await
    }

    /// Live shares of an entry.
    pub async fn list_for_entry(&self, entry_id: &str) -> Result<Vec<ShareResult>> {
        let entry_id = Oid::parse(entry_id)?;
        self.shares.find_by_entry_id(entry_id).await
    }

    /// Live shares owned by a team.
    pub async fn list_for_team(&self, team_id: &str) -> Result<Vec<ShareResult>> {
        let team_id = Oid::parse(team_id)?;
        self.shares.find_by_team_id(team_id).await
    }
}
