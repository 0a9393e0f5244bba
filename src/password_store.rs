//! Salted password hashes used to gate encryption and decryption
//!
//! The store never holds the password itself, only
//! `sha256(password ∥ salt)` in hex plus the salt. It is persisted as two
//! `KEY=value` lines:
//!
//! ```text
//! HASHED_PASSWORD=<64 hex chars>
//! SALT=<salt>
//! ```
//!
//! New records always get a random salt. Records written with any other
//! salt still verify, since the salt is read back from the file.

use crate::atomic::{self, Mode};
use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

const HASH_KEY: &str = "HASHED_PASSWORD";
const SALT_KEY: &str = "SALT";

/// Anything that can tell whether a candidate password is the right one.
pub trait PasswordStore {
    fn verify_password(&self, candidate: &[u8]) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedPasswordHash {
    hash: String,
    salt: String,
}

impl SaltedPasswordHash {
    /// Hash `password` under a fresh random salt.
    pub fn new(password: &[u8]) -> Self {
        Self::with_salt(password, hex::encode(kdf::random_salt()))
    }

    /// Hash `password` under the given salt.
    pub fn with_salt(password: &[u8], salt: impl Into<String>) -> Self {
        let salt = salt.into();
        Self {
            hash: salted_hash(password, &salt),
            salt,
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Parse the `KEY=value` representation. Blank lines, `#` comments and
    /// unknown keys are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut hash = None;
        let mut salt = None;
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(DircryptError::format(format!(
                    "password store line is not KEY=value: {:?}",
                    line
                )));
            };
            match key.trim() {
                HASH_KEY => hash = Some(value.trim().to_string()),
                SALT_KEY => salt = Some(value.trim().to_string()),
                _ => {}
            }
        }
        match (hash, salt) {
            (Some(hash), Some(salt)) => Ok(Self { hash, salt }),
            (None, _) => Err(DircryptError::format(format!(
                "password store is missing {}",
                HASH_KEY
            ))),
            (_, None) => Err(DircryptError::format(format!(
                "password store is missing {}",
                SALT_KEY
            ))),
        }
    }

    /// Load a record from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| DircryptError::io("failed to read password store", path, e))?;
        Self::parse(&text)
            .map_err(|e| e.with_context(format!("invalid password store {}", path.display())))
    }

    /// Atomically write the record to `path`, readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        atomic::write_atomic(path, self.to_string().as_bytes(), Mode::Private).map_err(|e| {
            e.with_context(format!("failed to save password store {}", path.display()))
        })
    }
}

impl std::fmt::Display for SaltedPasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}\n{}={}", HASH_KEY, self.hash, SALT_KEY, self.salt)
    }
}

impl PasswordStore for SaltedPasswordHash {
    fn verify_password(&self, candidate: &[u8]) -> bool {
        salted_hash(candidate, &self.salt) == self.hash
    }
}

fn salted_hash(password: &[u8], salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Error returned when a store rejects a password.
pub(crate) fn rejected() -> DircryptError {
    DircryptError::with_kind(
        ErrorCategory::User,
        ErrorKind::PasswordRejected,
        "password does not match the saved password",
    )
}
