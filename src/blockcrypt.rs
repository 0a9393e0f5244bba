//! AES-256-CBC with PKCS7 padding
//!
//! This mode provides confidentiality only. Nothing authenticates the
//! ciphertext: a wrong key is caught by comparing the key fingerprint
//! stored next to the ciphertext, but tampering with the ciphertext itself
//! goes undetected unless it happens to break the padding. Use the token
//! format when integrity matters.

use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf::DerivedKey;
use aes::cipher::consts::U16;
use aes::cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit};
use aes::{Aes256, Block};
use rand::RngCore;
use rand::rngs::OsRng;

/// AES block size in bytes
pub const BLOCK_LEN: usize = 16;

/// Length of the CBC initialization vector in bytes
pub const IV_LEN: usize = 16;

pub type Iv = [u8; IV_LEN];

/// Output of a block-mode encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    /// SHA-256 hex digest of the key the ciphertext was produced with.
    pub fingerprint: String,
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Sealed {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(plaintext, key, &iv)
}

/// Encrypt `plaintext` under `key` with the given IV.
///
/// Reusing an IV with the same key leaks plaintext equality; only tests
/// and golden vectors should call this directly.
pub fn encrypt_with_iv(plaintext: &[u8], key: &DerivedKey, iv: &Iv) -> Sealed {
    Sealed {
        ciphertext: cbc_encrypt(&Aes256::new(key.as_bytes().into()), iv, plaintext),
        iv: *iv,
        fingerprint: key.fingerprint(),
    }
}

/// Decrypt CBC `ciphertext` under `key` and strip the PKCS7 padding.
pub fn decrypt(ciphertext: &[u8], key: &DerivedKey, iv: &Iv) -> Result<Vec<u8>> {
    cbc_decrypt(&Aes256::new(key.as_bytes().into()), iv, ciphertext)
}

/// CBC-encrypt with PKCS7 padding using any AES key size.
pub(crate) fn cbc_encrypt<C: BlockEncrypt + BlockSizeUser<BlockSize = U16>>(
    cipher: &C,
    iv: &Iv,
    plaintext: &[u8],
) -> Vec<u8> {
    let mut buf = pad(plaintext);
    let mut prev = *iv;
    for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
        for (b, p) in chunk.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        let block = Block::from_mut_slice(chunk);
        cipher.encrypt_block(block);
        prev.copy_from_slice(chunk);
    }
    buf
}

/// CBC-decrypt and unpad using any AES key size.
pub(crate) fn cbc_decrypt<C: BlockDecrypt + BlockSizeUser<BlockSize = U16>>(
    cipher: &C,
    iv: &Iv,
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(padding_error(format!(
            "ciphertext length {} is not a positive multiple of the block size",
            ciphertext.len()
        )));
    }

    let mut buf = ciphertext.to_vec();
    let mut prev = *iv;
    for chunk in buf.chunks_exact_mut(BLOCK_LEN) {
        let mut saved = [0u8; BLOCK_LEN];
        saved.copy_from_slice(chunk);
        cipher.decrypt_block(Block::from_mut_slice(chunk));
        for (b, p) in chunk.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        prev = saved;
    }

    let len = unpadded_len(&buf)?;
    buf.truncate(len);
    Ok(buf)
}

fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_LEN - (data.len() % BLOCK_LEN);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

fn unpadded_len(data: &[u8]) -> Result<usize> {
    let pad_len = match data.last() {
        Some(&n) => n as usize,
        None => return Err(padding_error("no data to unpad")),
    };
    if pad_len == 0 || pad_len > BLOCK_LEN || pad_len > data.len() {
        return Err(padding_error("invalid padding length"));
    }
    if !data[data.len() - pad_len..].iter().all(|&b| b as usize == pad_len) {
        return Err(padding_error("invalid padding bytes"));
    }
    Ok(data.len() - pad_len)
}

fn padding_error(msg: impl Into<String>) -> DircryptError {
    DircryptError::with_kind(ErrorCategory::User, ErrorKind::Padding, msg)
}
