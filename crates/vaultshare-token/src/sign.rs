//! Recipient-bound pass signatures.
//!
//! A pass is signed with a keyed BLAKE3 hash over the recipient id and the
//! pass, so a pass leaked for one recipient is useless to another.

use std::fmt;

use vaultshare_core::UserId;

use crate::error::{Result, TokenError};

/// Key derivation context for the pass signing key.
pub const SIGN_CONTEXT: &str = "vaultshare token v1 sign-pass";

/// Key used to sign passes. Derived from the deployment salt.
#[derive(Clone)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    /// Derive the signing key from a salt.
    pub fn derive(salt: &[u8]) -> Self {
        Self(blake3::derive_key(SIGN_CONTEXT, salt))
    }

    /// Sign `pass` for `user`. Deterministic.
    pub fn sign(&self, user: &UserId, pass: &str) -> SignedPass {
        let user = user.as_str().as_bytes();
        let mut hasher = blake3::Hasher::new_keyed(&self.0);
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update(&(user.len() as u64).to_be_bytes());
        hasher.update(user);
        hasher.update(pass.as_bytes());
        SignedPass(hasher.finalize())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// A signed pass. Equality is constant time.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignedPass(blake3::Hash);

impl SignedPass {
    /// Render as 64 hex characters.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// Parse the hex form.
    pub fn from_hex(s: &str) -> Result<Self> {
        blake3::Hash::from_hex(s)
            .map(Self)
            .map_err(|e| TokenError::Malformed(format!("signed pass: {}", e)))
    }
}

impl fmt::Debug for SignedPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedPass(..)")
    }
}
