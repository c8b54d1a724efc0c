//! Password hashing and verification
//!
//! bcrypt with a configurable work factor. Rows written before hashing was
//! introduced still hold the plaintext; those are accepted once and then
//! rewritten as a hash by [`LegacyRehash`], a hook run after the login
//! response is produced.

use crate::auth::user_store::UserStore;
use bcrypt::{hash, verify, BcryptError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Outcome of comparing a submitted password with the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordMatch {
    /// bcrypt comparison succeeded
    Hashed,
    /// Stored value is the plaintext itself (pre-hashing row)
    Legacy,
    Mismatch,
}

impl PasswordMatch {
    pub fn is_match(self) -> bool {
        !matches!(self, PasswordMatch::Mismatch)
    }
}

/// bcrypt-based password hasher
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, BcryptError> {
        hash(plaintext, self.cost)
    }

    /// Compare `plaintext` against a stored bcrypt hash.
    ///
    /// Legacy behaviour: when the bcrypt comparison fails (or the stored value
    /// is not a bcrypt hash at all) and the stored value is byte-equal to the
    /// submitted plaintext, the password is accepted as [`PasswordMatch::Legacy`].
    /// The comparison is not constant-time.
    pub fn verify(&self, plaintext: &str, stored: &str) -> PasswordMatch {
        if let Ok(true) = verify(plaintext, stored) {
            return PasswordMatch::Hashed;
        }

        if !stored.is_empty() && stored.as_bytes() == plaintext.as_bytes() {
            warn!(event = "legacy_password_match", "Plaintext-stored password accepted");
            return PasswordMatch::Legacy;
        }

        PasswordMatch::Mismatch
    }
}

/// Post-login hook that replaces a plaintext-stored password with its hash.
///
/// The update only applies while the row still holds the old plaintext, so
/// running it twice, or after the user changed their password, is a no-op.
#[derive(Debug, Clone)]
pub struct LegacyRehash {
    pub account_id: i64,
    pub plaintext: String,
}

impl LegacyRehash {
    /// Run the rehash on the blocking pool. Failures are logged and dropped.
    pub fn spawn(self, users: Arc<UserStore>, hasher: Arc<PasswordHasher>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            let account_id = self.account_id;
            let new_hash = match hasher.hash(&self.plaintext) {
                Ok(h) => h,
                Err(e) => {
                    error!(account_id, error = %e, "Legacy password rehash failed");
                    return;
                }
            };

            match users.replace_legacy_password(account_id, &self.plaintext, &new_hash) {
                Ok(true) => info!(account_id, "Legacy password migrated to bcrypt"),
                Ok(false) => info!(account_id, "Legacy password already migrated"),
                Err(e) => error!(account_id, error = %e, "Failed to persist rehashed password"),
            }
        })
    }
}
