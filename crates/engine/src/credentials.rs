//! Password hashing capability
//!
//! Services never see a hashing algorithm, only the `PasswordHasher` trait.
//! Production uses Argon2id with a random salt; tests can inject something
//! cheaper.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;
use healthtrack_core::{Error, Result};

/// Canonical form of a login email: trimmed, lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Present and non-blank, trimmed.
pub(crate) fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Turns a secret into a storable digest and checks secrets against it.
pub trait PasswordHasher: Send + Sync {
    /// Hash `secret` into a self-describing digest.
    fn hash(&self, secret: &str) -> Result<String>;

    /// Does `secret` match `digest`? Malformed digests never match.
    fn verify(&self, secret: &str, digest: &str) -> bool;
}

/// Argon2id hasher producing PHC strings
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Hasher with the crate's default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| Error::storage(format!("password hashing failed: {}", e)))
    }

    fn verify(&self, secret: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
