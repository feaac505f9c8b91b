//! # VaultShare Core
//!
//! Pure primitives for the VaultShare credential sharing subsystem:
//! identifiers, share records and the team records shares are authorized
//! against.
//!
//! This crate contains no I/O, no storage and no cryptography.
//!
//! ## Key Types
//!
//! - [`Oid`] - Globally unique, sortable object identifier
//! - [`UserId`] - Opaque user identifier
//! - [`Share`] - A persisted, time-limited grant of one entry to one user
//! - [`ShareResult`] - The exposed projection of a share (no token)
//! - [`TeamRecord`] - Stored team membership
//! - [`Clock`] - Injectable time source
//!
//! ## Encoding
//!
//! Records are encoded as CBOR. See the [`codec`] module.

pub mod clock;
pub mod codec;
pub mod error;
pub mod oid;
pub mod share;
pub mod team;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result};
pub use oid::{Oid, OidGenerator, OID_HEX_LEN, OID_LEN};
pub use share::{
    share_id_from_key, share_key, Share, ShareDraft, ShareResult, SHARE_BY_ENTRY, SHARE_BY_TEAM,
    SHARE_BY_USER,
};
pub use team::{team_key, TeamRecord};
pub use types::UserId;
