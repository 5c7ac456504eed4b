//! Password hashing and verification.
//!
//! Production hashing uses Argon2id with a random salt per password and the
//! PHC string format, so the salt and parameters travel with the hash.

use std::sync::atomic::{AtomicU64, Ordering};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString},
    Argon2,
};

use common::{AppError, AppResult};

/// One-way password hashing capability.
pub trait PasswordVerifier: Send + Sync {
    /// Hash a raw password for storage.
    fn encode(&self, raw: &str) -> AppResult<String>;

    /// Compare a raw password with a stored hash.
    ///
    /// Returns false for malformed hashes instead of failing.
    fn matches(&self, raw: &str, hash: &str) -> bool;

    /// A well-formed hash that matches no password, verified against when
    /// the account is unknown so both login failures cost the same.
    fn decoy_hash(&self) -> &str;
}

/// Argon2id implementation.
pub struct Argon2PasswordVerifier {
    decoy_hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Argon2PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordVerifier")
            .field("decoy_hash", &"[REDACTED]")
            .finish()
    }
}

impl Argon2PasswordVerifier {
    pub fn new() -> AppResult<Self> {
        let decoy = SaltString::generate(&mut OsRng);
        let decoy_hash = Self::hash(decoy.as_str())?;
        Ok(Self { decoy_hash })
    }

    fn hash(plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl PasswordVerifier for Argon2PasswordVerifier {
    fn encode(&self, raw: &str) -> AppResult<String> {
        Self::hash(raw)
    }

    fn matches(&self, raw: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Self::argon2()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::debug!("Rejecting malformed password hash: {}", e);
                false
            }
        }
    }

    fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}

const FAKE_HASH_PREFIX: &str = "fake";

/// Cheap in-memory double that keeps tests fast.
///
/// Hashes look like `fake$<salt>$<raw>`; the counter salt makes repeated
/// encodings of one password differ, as with the real thing.
#[derive(Debug, Default)]
pub struct FakePasswordVerifier {
    salt: AtomicU64,
}

impl FakePasswordVerifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordVerifier for FakePasswordVerifier {
    fn encode(&self, raw: &str) -> AppResult<String> {
        let salt = self.salt.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{}${}${}", FAKE_HASH_PREFIX, salt, raw))
    }

    fn matches(&self, raw: &str, hash: &str) -> bool {
        let mut parts = hash.splitn(3, '$');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(FAKE_HASH_PREFIX), Some(salt), Some(stored)) => {
                salt.parse::<u64>().is_ok() && stored == raw
            }
            _ => false,
        }
    }

    fn decoy_hash(&self) -> &str {
        "fake$decoy$"
    }
}
