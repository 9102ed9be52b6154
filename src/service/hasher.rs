use crate::error::PlatformError;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Cost bounds accepted by bcrypt.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Salted password hashing with bcrypt.
///
/// Accounts created before bcrypt was adopted carry a bare SHA-256 hex digest.
/// Those still verify, and [`PasswordHasher::needs_rehash`] flags them so the
/// caller can upgrade the stored value after a successful login.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn hash(&self, plain: &str) -> Result<String, PlatformError> {
        Ok(bcrypt::hash(plain, self.cost)?)
    }

    /// A malformed stored hash never verifies.
    pub fn verify(&self, plain: &str, stored: &str) -> bool {
        if is_legacy_sha256(stored) {
            let digest = legacy_sha256(plain);
            return bool::from(digest.as_bytes().ct_eq(stored.to_ascii_lowercase().as_bytes()));
        }
        bcrypt::verify(plain, stored).unwrap_or(false)
    }

    pub fn needs_rehash(&self, stored: &str) -> bool {
        is_legacy_sha256(stored)
    }
}

fn is_legacy_sha256(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

fn legacy_sha256(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}
