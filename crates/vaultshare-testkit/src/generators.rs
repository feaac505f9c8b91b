//! Proptest generators for property-based testing.

use proptest::prelude::*;

use vaultshare::ShareRequest;
use vaultshare_core::{Oid, ShareDraft, UserId, OID_LEN};

/// Generate a random Oid.
pub fn oid() -> impl Strategy<Value = Oid> {
    any::<[u8; OID_LEN]>().prop_map(Oid::from_bytes)
}

/// Generate a non-empty user id.
pub fn user_id() -> impl Strategy<Value = UserId> {
    "[a-z][a-z0-9_.-]{0,23}".prop_map(UserId::from)
}

/// Generate a share name.
pub fn share_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 _-]{0,39}".prop_map(String::from)
}

/// Generate a pass in pre-hashed form.
pub fn pass() -> impl Strategy<Value = String> {
    any::<[u8; 32]>().prop_map(hex::encode)
}

/// Generate a hex-encoded 32-byte entry key.
pub fn access_key() -> impl Strategy<Value = String> {
    any::<[u8; 32]>().prop_map(hex::encode)
}

/// Generate an acceptable share lifetime in seconds.
pub fn expire_secs() -> impl Strategy<Value = u64> {
    10u64..=30 * 24 * 3600
}

/// Generate a draft for the given team.
pub fn draft(team_id: Oid) -> impl Strategy<Value = ShareDraft> {
    (user_id(), share_name()).prop_map(move |(user_id, name)| ShareDraft {
        team_id,
        user_id,
        name,
    })
}

/// Parameters for a share request.
#[derive(Debug, Clone)]
pub struct ShareParams {
    pub name: String,
    pub pass: String,
    pub user_id: UserId,
    pub expire_secs: u64,
}

impl ShareParams {
    /// Build the request these parameters describe.
    pub fn request(&self) -> ShareRequest {
        ShareRequest {
            name: self.name.clone(),
            pass: self.pass.clone(),
            user_id: self.user_id.clone(),
            expire_secs: self.expire_secs,
        }
    }
}

impl Arbitrary for ShareParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (share_name(), pass(), user_id(), expire_secs())
            .prop_map(|(name, pass, user_id, expire_secs)| ShareParams {
                name,
                pass,
                user_id,
                expire_secs,
            })
            .boxed()
    }
}
