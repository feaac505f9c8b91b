//! # VaultShare Token
//!
//! Crypto for share tokens.
//!
//! ## Overview
//!
//! A share token lets a recipient redeem one entry without the entry's access
//! key ever being stored next to the grant. It is built in two layers:
//!
//! 1. **Signing**: the recipient's one-time pass is signed with a keyed
//!    BLAKE3 hash that mixes in the recipient id.
//! 2. **Encryption**: the signature is encrypted with ChaCha20-Poly1305 under
//!    the entry's per-entry access key.
//!
//! Splitting the layers lets the signing key stay deployment-wide while the
//! encryption key can be rotated per entry.
//!
//! ## Usage
//!
//! ```rust
//! use vaultshare_core::UserId;
//! use vaultshare_token::{EncryptionKey, TokenCrypto};
//!
//! let crypto = TokenCrypto::new(b"deployment salt");
//! let entry_key = EncryptionKey::generate().to_hex();
//! let recipient = UserId::from("jeo");
//!
//! let token = crypto.seal(&recipient, "one-time pass", &entry_key).unwrap();
//! crypto.verify_token(&recipient, "one-time pass", &token, &entry_key).unwrap();
//! ```

pub mod crypto;
pub mod error;
pub mod sign;
pub mod token;

pub use crypto::{EncryptionKey, EncryptionNonce};
pub use error::{Result, TokenError};
pub use sign::{SignedPass, SigningKey};
pub use token::{TokenCrypto, MIN_TOKEN_LEN, TOKEN_VERSION};
