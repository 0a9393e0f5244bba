//! Authenticated tokens in the Fernet layout
//!
//! A token is the base64url (padded) encoding of:
//! - version: 1 byte, always 0x80
//! - timestamp: 8 bytes, big-endian seconds since the Unix epoch
//! - iv: 16 bytes
//! - ciphertext: AES-128-CBC with PKCS7 padding, variable length
//! - hmac: 32 bytes, HMAC-SHA256 over everything before it
//!
//! The 32-byte key is split into a signing key (first half) and an
//! encryption key (second half).

use crate::blockcrypt::{self, BLOCK_LEN, IV_LEN, Iv};
use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{DerivedKey, KEY_LEN};
use aes::Aes128;
use aes::cipher::KeyInit;
use aes::cipher::generic_array::GenericArray;
use base64::{Engine, engine::general_purpose::URL_SAFE};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const VERSION: u8 = 0x80;
const TIMESTAMP_LEN: usize = 8;
const HMAC_LEN: usize = 32;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + IV_LEN;

/// Tokens stamped further than this in the future are rejected when a TTL is checked.
const MAX_CLOCK_SKEW: u64 = 60;

/// Encrypt `plaintext` into a token stamped with the current time.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<String> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_at(plaintext, key, &iv, now()?)
}

/// Encrypt with a caller-chosen IV and timestamp.
///
/// This function is ONLY for tests and golden vectors. Production code
/// must use `encrypt()` which generates a random IV.
pub fn encrypt_at(plaintext: &[u8], key: &DerivedKey, iv: &Iv, timestamp: u64) -> Result<String> {
    let (signing_key, encryption_key) = split_key(key);
    let cipher = Aes128::new(GenericArray::from_slice(encryption_key));
    let ciphertext = blockcrypt::cbc_encrypt(&cipher, iv, plaintext);

    let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + HMAC_LEN);
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = new_mac(signing_key)?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(URL_SAFE.encode(token))
}

/// Verify and decrypt `token`.
///
/// With `ttl` set, tokens older than `ttl` or stamped too far in the
/// future are rejected.
pub fn decrypt(token: &[u8], key: &DerivedKey, ttl: Option<Duration>) -> Result<Vec<u8>> {
    decrypt_at(token, key, ttl, now()?)
}

fn decrypt_at(
    token: &[u8],
    key: &DerivedKey,
    ttl: Option<Duration>,
    current_time: u64,
) -> Result<Vec<u8>> {
    let data = URL_SAFE.decode(token).map_err(|e| {
        DircryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidToken,
            "token is not valid base64url",
            e,
        )
    })?;

    if data.len() < HEADER_LEN + BLOCK_LEN + HMAC_LEN {
        return Err(invalid("token too short"));
    }
    if data[0] != VERSION {
        return Err(invalid(format!("unsupported token version 0x{:02x}", data[0])));
    }

    let mut ts_bytes = [0u8; TIMESTAMP_LEN];
    ts_bytes.copy_from_slice(&data[1..1 + TIMESTAMP_LEN]);
    let timestamp = u64::from_be_bytes(ts_bytes);
    if let Some(ttl) = ttl {
        if timestamp.saturating_add(ttl.as_secs()) < current_time {
            return Err(invalid("token has expired"));
        }
        if current_time.saturating_add(MAX_CLOCK_SKEW) < timestamp {
            return Err(invalid("token timestamp is in the future"));
        }
    }

    let (signing_key, encryption_key) = split_key(key);
    let (signed, tag) = data.split_at(data.len() - HMAC_LEN);
    let mut mac = new_mac(signing_key)?;
    mac.update(signed);
    mac.verify_slice(tag)
        .map_err(|_| invalid("token signature mismatch: tampered data or wrong key"))?;

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&signed[1 + TIMESTAMP_LEN..HEADER_LEN]);
    let cipher = Aes128::new(GenericArray::from_slice(encryption_key));
    blockcrypt::cbc_decrypt(&cipher, &iv, &signed[HEADER_LEN..])
        .map_err(|_| invalid("token payload has invalid padding"))
}

/// Timestamp embedded in `token`, without verifying it.
pub fn timestamp(token: &[u8]) -> Result<u64> {
    let data = URL_SAFE
        .decode(token)
        .map_err(|_| invalid("token is not valid base64url"))?;
    if data.len() < 1 + TIMESTAMP_LEN || data[0] != VERSION {
        return Err(invalid("token too short or wrong version"));
    }
    let mut ts_bytes = [0u8; TIMESTAMP_LEN];
    ts_bytes.copy_from_slice(&data[1..1 + TIMESTAMP_LEN]);
    Ok(u64::from_be_bytes(ts_bytes))
}

/// Parse a key in the base64url form produced by Fernet key generators.
pub fn key_from_base64(encoded: &str) -> Result<DerivedKey> {
    let bytes = URL_SAFE.decode(encoded.trim()).map_err(|e| {
        DircryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            "token key is not valid base64url",
            e,
        )
    })?;
    let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
        DircryptError::format(format!("token key must be {} bytes, got {}", KEY_LEN, b.len()))
    })?;
    Ok(DerivedKey::from_bytes(bytes))
}

fn split_key(key: &DerivedKey) -> (&[u8], &[u8]) {
    key.as_bytes().split_at(KEY_LEN / 2)
}

fn new_mac(signing_key: &[u8]) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(signing_key).map_err(|e| {
        DircryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to initialize HMAC",
            e,
        )
    })
}

fn now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| {
            DircryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "system clock is before the Unix epoch",
                e,
            )
        })
}

fn invalid(msg: impl Into<String>) -> DircryptError {
    DircryptError::with_kind(ErrorCategory::User, ErrorKind::InvalidToken, msg)
}
