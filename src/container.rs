//! On-disk container formats
//!
//! Two format versions exist and are kept apart because they give
//! different integrity guarantees:
//!
//! - **Framed** (v1): `HEADER ∥ ciphertext ∥ DELIM ∥ iv ∥ DELIM ∥ salt ∥
//!   DELIM ∥ key fingerprint ∥ FOOTER`, carrying AES-256-CBC ciphertext.
//!   The binary variant stores raw bytes; the armored variant stores
//!   ciphertext, iv and salt as standard base64 so the whole container is
//!   UTF-8 text. The header, footer and delimiter literals must never
//!   change, they are what identifies existing containers.
//! - **Token** (v2): `MARKER ∥ base64url(salt) ∥ "." ∥ token`, carrying an
//!   authenticated token (see [`crate::token`]).

use crate::blockcrypt::{IV_LEN, Iv};
use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{SALT_LEN, Salt};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE},
};

pub const HEADER: &[u8] = b"---  BEGIN ENCRYPTED DATA  ---\n\n";
pub const FOOTER: &[u8] = b"\n\n---  END ENCRYPTED DATA  ---";
pub const DELIM: &[u8] = DELIM_STR.as_bytes();

const DELIM_STR: &str = "---END---";

/// Prefix of every token container.
pub const MARKER: &[u8] = b"---  ENCRYPTED TOKEN v2  ---\n";

const TOKEN_SALT_SEP: u8 = b'.';

/// Number of DELIM-separated fields between HEADER and FOOTER.
const FRAMED_FIELDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// Header/footer framed CBC ciphertext with a key fingerprint.
    Framed,
    /// Marker-prefixed authenticated token.
    Token,
}

impl FormatVersion {
    /// Classify `blob` by its leading bytes without parsing it.
    pub fn detect(blob: &[u8]) -> Option<Self> {
        if blob.starts_with(HEADER) {
            Some(Self::Framed)
        } else if blob.starts_with(MARKER) {
            Some(Self::Token)
        } else {
            None
        }
    }
}

/// True when `blob` starts like any container this crate writes.
pub fn is_encrypted(blob: &[u8]) -> bool {
    FormatVersion::detect(blob).is_some()
}

/// Framed (v1) container contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedContainer {
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
    pub salt: Salt,
    /// SHA-256 hex digest of the key, kept as stored.
    pub fingerprint: String,
}

impl FramedContainer {
    /// Serialize, armored (base64 text) or raw binary.
    pub fn encode(&self, armored: bool) -> Vec<u8> {
        if armored {
            let text = [
                STANDARD.encode(&self.ciphertext),
                STANDARD.encode(self.iv),
                STANDARD.encode(self.salt),
                self.fingerprint.clone(),
            ]
            .join(DELIM_STR);
            [HEADER, text.as_bytes(), FOOTER].concat()
        } else {
            let fields: [&[u8]; 9] = [
                HEADER,
                &self.ciphertext,
                DELIM,
                &self.iv,
                DELIM,
                &self.salt,
                DELIM,
                self.fingerprint.as_bytes(),
                FOOTER,
            ];
            fields.concat()
        }
    }

    /// Parse a framed container.
    pub fn decode(blob: &[u8], armored: bool) -> Result<Self> {
        let body = framed_body(blob)?;
        let parts = split(body, DELIM);
        if parts.len() != FRAMED_FIELDS {
            return Err(DircryptError::format(format!(
                "expected {} fields in container, found {}",
                FRAMED_FIELDS,
                parts.len()
            )));
        }

        let (ciphertext, iv, salt) = if armored {
            (
                decode_b64(parts[0], "ciphertext")?,
                decode_b64(parts[1], "iv")?,
                decode_b64(parts[2], "salt")?,
            )
        } else {
            (parts[0].to_vec(), parts[1].to_vec(), parts[2].to_vec())
        };

        let iv: Iv = iv.try_into().map_err(|v: Vec<u8>| {
            DircryptError::format(format!("iv must be {} bytes, got {}", IV_LEN, v.len()))
        })?;
        let salt: Salt = salt.try_into().map_err(|v: Vec<u8>| {
            DircryptError::format(format!("salt must be {} bytes, got {}", SALT_LEN, v.len()))
        })?;
        let fingerprint = std::str::from_utf8(parts[3])
            .map_err(|e| {
                DircryptError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Format,
                    "key fingerprint is not valid UTF-8",
                    e,
                )
            })?
            .to_string();

        Ok(Self {
            ciphertext,
            iv,
            salt,
            fingerprint,
        })
    }

    /// Parse a framed container whose variant is not known up front.
    ///
    /// Returns the container and whether it was armored.
    pub fn decode_any(blob: &[u8]) -> Result<(Self, bool)> {
        if std::str::from_utf8(blob).is_ok() {
            if let Ok(container) = Self::decode(blob, true) {
                return Ok((container, true));
            }
        }
        Self::decode(blob, false).map(|c| (c, false))
    }
}

/// Token (v2) container contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContainer {
    pub salt: Salt,
    pub token: String,
}

impl TokenContainer {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MARKER.len() + 25 + self.token.len());
        out.extend_from_slice(MARKER);
        out.extend_from_slice(URL_SAFE.encode(self.salt).as_bytes());
        out.push(TOKEN_SALT_SEP);
        out.extend_from_slice(self.token.as_bytes());
        out
    }

    pub fn decode(blob: &[u8]) -> Result<Self> {
        let rest = blob.strip_prefix(MARKER).ok_or_else(|| {
            DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::NotEncrypted,
                "data does not start with the token marker",
            )
        })?;
        let sep = rest
            .iter()
            .position(|&b| b == TOKEN_SALT_SEP)
            .ok_or_else(|| DircryptError::format("token container has no salt separator"))?;
        let salt = URL_SAFE.decode(&rest[..sep]).map_err(|e| {
            DircryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Format,
                "token container salt is not valid base64url",
                e,
            )
        })?;
        let salt: Salt = salt.try_into().map_err(|v: Vec<u8>| {
            DircryptError::format(format!("salt must be {} bytes, got {}", SALT_LEN, v.len()))
        })?;
        let token = std::str::from_utf8(&rest[sep + 1..])
            .map_err(|e| {
                DircryptError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Format,
                    "token is not valid UTF-8",
                    e,
                )
            })?
            .trim_end()
            .to_string();
        Ok(Self { salt, token })
    }
}

/// Slice between HEADER and the last FOOTER.
fn framed_body(blob: &[u8]) -> Result<&[u8]> {
    let start = find(blob, HEADER)
        .ok_or_else(|| DircryptError::format("container header not found"))?
        + HEADER.len();
    let end = rfind(&blob[start..], FOOTER)
        .ok_or_else(|| DircryptError::format("container footer not found"))?
        + start;
    Ok(&blob[start..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn split<'a>(mut data: &'a [u8], delim: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::with_capacity(FRAMED_FIELDS);
    while let Some(pos) = find(data, delim) {
        parts.push(&data[..pos]);
        data = &data[pos + delim.len()..];
    }
    parts.push(data);
    parts
}

fn decode_b64(field: &[u8], what: &str) -> Result<Vec<u8>> {
    STANDARD.decode(field).map_err(|e| {
        DircryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            format!("{} is not valid base64", what),
            e,
        )
    })
}
