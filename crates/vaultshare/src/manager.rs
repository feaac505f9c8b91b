//! The share manager: create, find, revoke and list shares.
//!
//! Every operation is one store transaction. Creation writes the record,
//! its TTL and its three index terms together; revocation reads the share,
//! checks the owning team and deletes in the same write transaction.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use vaultshare_core::{
    share_id_from_key, share_key, Oid, Share, ShareDraft, ShareResult, UserId, SHARE_BY_ENTRY,
    SHARE_BY_TEAM, SHARE_BY_USER,
};
use vaultshare_store::{ReadTx, SetOptions, Store};
use vaultshare_token::TokenCrypto;

use crate::config::{CorruptRecordPolicy, ShareConfig};
use crate::error::{Result, ShareError};
use crate::team::read_live_team;

/// Creates, finds, revokes and lists shares over a [`Store`].
pub struct ShareManager<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Token signing and encryption.
    crypto: Arc<TokenCrypto>,
    /// Configuration.
    config: ShareConfig,
}

impl<S: Store> Clone for ShareManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            crypto: self.crypto.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> ShareManager<S> {
    /// Create a manager.
    pub fn new(store: Arc<S>, crypto: Arc<TokenCrypto>, config: ShareConfig) -> Self {
        Self {
            store,
            crypto,
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the token crypto context.
    pub fn crypto(&self) -> &TokenCrypto {
        &self.crypto
    }

    /// Get the configuration.
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single-share operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a share of `entry_id` that expires after `expire`.
    ///
    /// The token binds `draft.user_id` to `pass` and is encrypted under
    /// `access_key`. Inputs are trusted; request validation happens before
    /// this is called.
    pub async fn create(
        &self,
        entry_id: Oid,
        access_key: &str,
        pass: &str,
        expire: Duration,
        draft: ShareDraft,
    ) -> Result<ShareResult> {
        let token = self
            .crypto
            .seal(&draft.user_id, pass, access_key)
            .map_err(ShareError::Sealing)?;

        let share = Share::from_draft(Oid::new(), entry_id, draft, token, self.store.now_millis());
        let result = share.result();

        let key = share.key();
        let value = Bytes::from(share.to_bytes()?);
        let options = share
            .index_terms()
            .into_iter()
            .fold(SetOptions::new().ttl(expire), |opts, (index, term)| {
                opts.index(index, term)
            });

        self.store
            .update(move |tx| tx.set(&key, value, options))
            .await?;

        tracing::debug!(
            share_id = %result.id,
            entry_id = %result.entry_id,
            user_id = %result.user_id,
            ttl_secs = expire.as_secs(),
            "created share"
        );
        Ok(result)
    }

    /// Find a live share, token included.
    pub async fn find(&self, share_id: Oid) -> Result<Share> {
        let key = share_key(&share_id);
        self.store
            .view(move |tx| {
                let value = tx.get(&key)?;
                Ok(Share::from_bytes(&value)?)
            })
            .await
    }

    /// Revoke a share on behalf of `requester`.
    ///
    /// The requester must be a current member of the share's team. A share
    /// that is absent, expired or unreadable is `NotFound`, as is a team that
    /// is absent or deleted.
    pub async fn delete(&self, share_id: Oid, requester: &UserId) -> Result<()> {
        let key = share_key(&share_id);
        let requester = requester.clone();

        let team_id = self
            .store
            .update(move |tx| {
                let not_found = || ShareError::NotFound(format!("share {}", share_id));

                let value = tx.get(&key).map_err(|e| {
                    if e.is_not_found() {
                        not_found()
                    } else {
                        ShareError::from(e)
                    }
                })?;
                let share = Share::from_bytes(&value).map_err(|_| not_found())?;

                let team = read_live_team(&*tx, &share.team_id)?;
                if !team.has_member(&requester) {
                    tracing::warn!(
                        share_id = %share_id,
                        team_id = %team.id,
                        requester = %requester,
                        "share revocation by non-member refused"
                    );
                    return Err(ShareError::Forbidden(format!(
                        "{} is not a member of team {}",
                        requester, team.id
                    )));
                }

                tx.delete(&key)?;
                Ok(team.id)
            })
            .await?;

        tracing::debug!(share_id = %share_id, team_id = %team_id, "revoked share");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Listings
    // ─────────────────────────────────────────────────────────────────────────

    /// All live shares addressed to `user_id`, in creation order.
    pub async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<ShareResult>> {
        self.find_by_index(SHARE_BY_USER, user_id.to_string()).await
    }

    /// All live shares of `entry_id`, in creation order.
    pub async fn find_by_entry_id(&self, entry_id: Oid) -> Result<Vec<ShareResult>> {
        self.find_by_index(SHARE_BY_ENTRY, entry_id.to_hex()).await
    }

    /// All live shares owned by `team_id`, in creation order.
    pub async fn find_by_team_id(&self, team_id: Oid) -> Result<Vec<ShareResult>> {
        self.find_by_index(SHARE_BY_TEAM, team_id.to_hex()).await
    }

    async fn find_by_index(&self, index: &'static str, term: String) -> Result<Vec<ShareResult>> {
        let policy = self.config.on_corrupt_record;
        self.store
            .view(move |tx| collect_shares(tx, index, &term, policy))
            .await
    }
}

/// Collect every usable share under `(index, term)`.
fn collect_shares<T: ReadTx + ?Sized>(
    tx: &T,
    index: &str,
    term: &str,
    policy: CorruptRecordPolicy,
) -> Result<Vec<ShareResult>> {
    let mut shares = Vec::new();
    let mut failure = None;

    tx.ascend_index(index, term, &mut |key, value| {
        let reason = match Share::from_bytes(value) {
            Ok(share) if !share.matches(index, term) => {
                format!("record does not carry {} term {}", index, term)
            }
            Ok(share) if share_id_from_key(key) != Some(share.id) => {
                format!("record id {} does not match its key", share.id)
            }
            Ok(share) => {
                shares.push(share.result());
                return ControlFlow::Continue(());
            }
            Err(e) => e.to_string(),
        };

        match policy {
            CorruptRecordPolicy::Skip => {
                tracing::warn!(key, index, %reason, "skipping unreadable share record");
                ControlFlow::Continue(())
            }
            CorruptRecordPolicy::Abort => {
                failure = Some(ShareError::Corrupt {
                    key: key.to_string(),
                    reason,
                });
                ControlFlow::Break(())
            }
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(shares),
    }
}
