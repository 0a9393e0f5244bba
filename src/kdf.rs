//! Password-based key derivation
//!
//! Keys are derived with PBKDF2-HMAC-SHA256. The same password, salt,
//! length and iteration count always produce the same key, which is what
//! lets decryption re-derive the key from the salt stored in a container
//! and compare its fingerprint against the stored one.

use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use hmac::Hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count used unless configured otherwise
pub const DEFAULT_ITERATIONS: u32 = 100_000;

pub type Salt = [u8; SALT_LEN];

/// A 32-byte symmetric key, wiped from memory when dropped.
#[derive(Clone)]
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// SHA-256 hex digest of the key.
    pub fn fingerprint(&self) -> String {
        fingerprint(self.as_bytes())
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Lowercase SHA-256 hex digest of `key`, as stored in framed containers.
pub fn fingerprint(key: &[u8]) -> String {
    hex::encode(Sha256::digest(key))
}

/// Generate a fresh random salt from the OS RNG.
pub fn random_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive `length` key bytes from `password`.
///
/// A random salt is generated when `salt` is `None`; the salt actually
/// used is returned alongside the key so it can be persisted.
pub fn derive_key_bytes(
    password: &[u8],
    salt: Option<Salt>,
    length: usize,
    iterations: u32,
) -> Result<(Zeroizing<Vec<u8>>, Salt)> {
    check_params(length, iterations)?;
    let salt = salt.unwrap_or_else(random_salt);
    let mut key = Zeroizing::new(vec![0u8; length]);
    pbkdf2_into(password, &salt, iterations, &mut key)?;
    Ok((key, salt))
}

/// Derive a 32-byte key suitable for both cipher modes.
pub fn derive_key(password: &[u8], salt: Option<Salt>, iterations: u32) -> Result<(DerivedKey, Salt)> {
    check_params(KEY_LEN, iterations)?;
    let salt = salt.unwrap_or_else(random_salt);
    // Derived straight into wiped storage; no plain copy of the key exists.
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_into(password, &salt, iterations, &mut key[..])?;
    Ok((DerivedKey(key), salt))
}

fn check_params(length: usize, iterations: u32) -> Result<()> {
    if iterations == 0 {
        return Err(DircryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Kdf,
            "PBKDF2 iterations must be at least 1",
        ));
    }
    if length == 0 {
        return Err(DircryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Kdf,
            "derived key length must be at least 1",
        ));
    }
    Ok(())
}

fn pbkdf2_into(password: &[u8], salt: &Salt, iterations: u32, out: &mut [u8]) -> Result<()> {
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, out).map_err(|e| {
        DircryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Kdf,
            "PBKDF2 key derivation failed",
            e,
        )
    })
}
