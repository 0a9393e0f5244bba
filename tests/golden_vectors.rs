//! Golden test vector validation
//!
//! The vectors under testdata/ were produced by independent PBKDF2, AES-CBC
//! and Fernet implementations, so passing them means existing containers
//! stay readable.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::Deserialize;

use dircrypt::blockcrypt::Iv;
use dircrypt::container::{FormatVersion, FramedContainer};
use dircrypt::file_ops::{self, KeyCache};
use dircrypt::kdf::{self, DEFAULT_ITERATIONS, Salt};
use dircrypt::token;

#[derive(Debug, Deserialize)]
struct KdfVector {
    password: String,
    salt: String,
    iterations: u32,
    key: String,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct ContainerVector {
    password: String,
    plaintext: String,
    container: String,
    armored: bool,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct TokenVectors {
    tokens: Vec<TokenVector>,
    containers: Vec<TokenContainerVector>,
}

#[derive(Debug, Deserialize)]
struct TokenVector {
    secret: String,
    token: String,
    iv: String,
    timestamp: u64,
    plaintext: String,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct TokenContainerVector {
    password: String,
    container: String,
    plaintext: String,
    comment: String,
}

fn b64(field: &str) -> Vec<u8> {
    BASE64_STANDARD.decode(field).expect("failed to decode base64 field")
}

#[test]
fn test_kdf_vectors() {
    let vectors: Vec<KdfVector> =
        serde_json::from_str(include_str!("../testdata/kdf-vectors.json")).unwrap();
    assert!(!vectors.is_empty());

    for (i, vector) in vectors.iter().enumerate() {
        let salt: Salt = b64(&vector.salt).try_into().expect("salt must be 16 bytes");
        let expected = hex::decode(&vector.key).unwrap();
        let (key, used_salt) = kdf::derive_key_bytes(
            &b64(&vector.password),
            Some(salt),
            expected.len(),
            vector.iterations,
        )
        .unwrap();
        assert_eq!(used_salt, salt);
        assert_eq!(
            hex::encode(&*key),
            vector.key,
            "vector {} ({}) derived the wrong key",
            i,
            vector.comment
        );
    }
}

#[test]
fn test_framed_container_vectors() {
    let vectors: Vec<ContainerVector> =
        serde_json::from_str(include_str!("../testdata/container-vectors.json")).unwrap();
    assert!(!vectors.is_empty());

    for (i, vector) in vectors.iter().enumerate() {
        let blob = b64(&vector.container);
        assert_eq!(FormatVersion::detect(&blob), Some(FormatVersion::Framed));

        let (container, armored) = FramedContainer::decode_any(&blob).unwrap();
        assert_eq!(armored, vector.armored, "vector {} ({})", i, vector.comment);
        assert_eq!(container.encode(armored), blob, "vector {} must re-encode exactly", i);

        let mut keys = KeyCache::new(&b64(&vector.password), DEFAULT_ITERATIONS);
        let plaintext = file_ops::open(&blob, &mut keys)
            .unwrap_or_else(|e| panic!("vector {} ({}): {}", i, vector.comment, e));
        assert_eq!(plaintext, b64(&vector.plaintext));
    }
}

#[test]
fn test_framed_container_vectors_reject_wrong_password() {
    let vectors: Vec<ContainerVector> =
        serde_json::from_str(include_str!("../testdata/container-vectors.json")).unwrap();
    let vector = &vectors[0];
    let mut keys = KeyCache::new(b"wrongpass", DEFAULT_ITERATIONS);
    let err = file_ops::open(&b64(&vector.container), &mut keys).expect_err("expected mismatch");
    assert!(err.is(dircrypt::error::ErrorKind::KeyMismatch));
}

#[test]
fn test_fernet_token_vectors() {
    let vectors: TokenVectors =
        serde_json::from_str(include_str!("../testdata/token-vectors.json")).unwrap();
    assert!(!vectors.tokens.is_empty());

    for vector in &vectors.tokens {
        let key = token::key_from_base64(&vector.secret).unwrap();
        let iv: Iv = hex::decode(&vector.iv).unwrap().try_into().unwrap();
        let plaintext = b64(&vector.plaintext);

        let generated = token::encrypt_at(&plaintext, &key, &iv, vector.timestamp).unwrap();
        assert_eq!(generated, vector.token, "{}", vector.comment);
        assert_eq!(token::timestamp(vector.token.as_bytes()).unwrap(), vector.timestamp);
        assert_eq!(
            token::decrypt(vector.token.as_bytes(), &key, None).unwrap(),
            plaintext
        );
    }
}

#[test]
fn test_token_container_vectors() {
    let vectors: TokenVectors =
        serde_json::from_str(include_str!("../testdata/token-vectors.json")).unwrap();
    assert!(!vectors.containers.is_empty());

    for vector in &vectors.containers {
        let blob = b64(&vector.container);
        assert_eq!(FormatVersion::detect(&blob), Some(FormatVersion::Token));
        let mut keys = KeyCache::new(&b64(&vector.password), DEFAULT_ITERATIONS);
        let plaintext = file_ops::open(&blob, &mut keys)
            .unwrap_or_else(|e| panic!("{}: {}", vector.comment, e));
        assert_eq!(plaintext, b64(&vector.plaintext));
    }
}
