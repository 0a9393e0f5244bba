//! File and directory-tree encryption/decryption operations
//!
//! Files are rewritten in place: each one is read fully, transformed, and
//! atomically replaced (tempfile + fsync + rename) with its original
//! permissions. Tree operations are gated on the root's state flag and
//! only flip it once every file has been handled without failure.

use crate::atomic::{self, Mode};
use crate::blockcrypt;
use crate::config::{Options, Scheme};
use crate::container::{self, FormatVersion, FramedContainer, TokenContainer};
use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{self, DerivedKey, Salt};
use crate::passphrase::PassphraseReader;
use crate::state::{StateTracker, TreeState};
use crate::token;
use crate::walk;
use bytesize::ByteSize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Result of handling one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Plaintext of `bytes` bytes was sealed into a container.
    Encrypted { bytes: u64 },
    /// A container of `bytes` bytes was opened back into plaintext.
    Decrypted { bytes: u64 },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file is at or above the configured size limit.
    Oversize { size: u64 },
    /// Encrypting a file that already holds a container.
    AlreadyEncrypted,
    /// Decrypting a file that holds no container.
    NotEncrypted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Oversize { size } => write!(f, "too large ({})", ByteSize(*size)),
            SkipReason::AlreadyEncrypted => f.write_str("already encrypted"),
            SkipReason::NotEncrypted => f.write_str("not encrypted"),
        }
    }
}

/// Aggregate result of a whole-tree operation.
#[derive(Debug, Default)]
pub struct TreeReport {
    /// Files successfully transformed.
    pub processed: usize,
    /// Total size of the processed files before they were transformed.
    pub bytes: u64,
    pub elapsed: Duration,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    pub failed: Vec<(PathBuf, DircryptError)>,
}

impl TreeReport {
    /// True when no file failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Encrypted { bytes } | FileOutcome::Decrypted { bytes } => {
                self.processed += 1;
                self.bytes += bytes;
            }
            FileOutcome::Skipped(reason) => {
                warn!(path = %path.display(), %reason, "skipping file");
                self.skipped.push((path, reason));
            }
        }
    }

    fn fail(&mut self, path: PathBuf, err: DircryptError) {
        warn!(path = %path.display(), error = %err, "failed to process file");
        self.failed.push((path, err));
    }
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files ({}) processed in {}, {} skipped, {} failed",
            self.processed,
            ByteSize(self.bytes),
            humantime::format_duration(whole_millis(self.elapsed)),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Sub-millisecond precision only adds noise to a run summary.
fn whole_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Result of [`encrypt`] or [`decrypt`], depending on what the path was.
#[derive(Debug)]
pub enum Outcome {
    File(FileOutcome),
    Tree(TreeReport),
}

impl Outcome {
    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        match self {
            Outcome::File(_) => true,
            Outcome::Tree(report) => report.is_clean(),
        }
    }
}

/// Keys derived from one password, looked up by salt.
///
/// Every container carries its own salt, so decrypting a tree may need
/// several keys; each is derived at most once.
pub struct KeyCache {
    password: Zeroizing<Vec<u8>>,
    iterations: u32,
    keys: HashMap<Salt, DerivedKey>,
}

impl KeyCache {
    pub fn new(password: &[u8], iterations: u32) -> Self {
        Self {
            password: Zeroizing::new(password.to_vec()),
            iterations,
            keys: HashMap::new(),
        }
    }

    pub fn key_for(&mut self, salt: Salt) -> Result<&DerivedKey> {
        match self.keys.entry(salt) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let (key, _) = kdf::derive_key(&self.password, Some(salt), self.iterations)?;
                Ok(entry.insert(key))
            }
        }
    }
}

/// Seal `plaintext` into a container of the given scheme.
///
/// `salt` is the salt `key` was derived with; it is stored in the
/// container so the key can be derived again on decryption.
pub fn seal(plaintext: &[u8], key: &DerivedKey, salt: &Salt, scheme: Scheme) -> Result<Vec<u8>> {
    match scheme {
        Scheme::Binary | Scheme::Armored => {
            let sealed = blockcrypt::encrypt(plaintext, key);
            let framed = FramedContainer {
                ciphertext: sealed.ciphertext,
                iv: sealed.iv,
                salt: *salt,
                fingerprint: sealed.fingerprint,
            };
            Ok(framed.encode(scheme == Scheme::Armored))
        }
        Scheme::Token => {
            let token = token::encrypt(plaintext, key)?;
            Ok(TokenContainer { salt: *salt, token }.encode())
        }
    }
}

/// Open a container of any format, deriving its key through `keys`.
///
/// Framed containers are checked against their stored key fingerprint
/// before any decryption is attempted.
pub fn open(blob: &[u8], keys: &mut KeyCache) -> Result<Vec<u8>> {
    match FormatVersion::detect(blob) {
        None => Err(DircryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::NotEncrypted,
            "data is not an encrypted container",
        )),
        Some(FormatVersion::Framed) => {
            let (framed, _) = FramedContainer::decode_any(blob)?;
            let key = keys.key_for(framed.salt)?;
            if !key.fingerprint().eq_ignore_ascii_case(&framed.fingerprint) {
                return Err(DircryptError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::KeyMismatch,
                    "password does not match the key this data was encrypted with",
                ));
            }
            blockcrypt::decrypt(&framed.ciphertext, key, &framed.iv)
        }
        Some(FormatVersion::Token) => {
            let sealed = TokenContainer::decode(blob)?;
            let key = keys.key_for(sealed.salt)?;
            token::decrypt(sealed.token.as_bytes(), key, None)
        }
    }
}

/// Holds the single key and salt used for every file of one encryption run.
struct Encryptor {
    key: DerivedKey,
    salt: Salt,
    scheme: Scheme,
    size_limit: u64,
}

impl Encryptor {
    fn new(password: &[u8], opts: &Options) -> Result<Self> {
        let (key, salt) = kdf::derive_key(password, None, opts.iterations)?;
        Ok(Self {
            key,
            salt,
            scheme: opts.scheme,
            size_limit: opts.size_limit,
        })
    }

    fn seal_bytes(&self, plaintext: &[u8], path: &Path) -> Result<Vec<u8>> {
        if container::is_encrypted(plaintext) {
            return Err(DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::AlreadyEncrypted,
                format!("{} is already encrypted", path.display()),
            ));
        }
        seal(plaintext, &self.key, &self.salt, self.scheme)
    }

    fn encrypt_in_place(&self, path: &Path) -> Result<FileOutcome> {
        let metadata = stat(path)?;
        if metadata.len() >= self.size_limit {
            return Ok(FileOutcome::Skipped(SkipReason::Oversize {
                size: metadata.len(),
            }));
        }
        let plaintext = read(path)?;
        let blob = self.seal_bytes(&plaintext, path)?;
        atomic::write_atomic(path, &blob, Mode::Preserve(metadata.permissions()))
            .map_err(|e| e.with_context(format!("failed to replace {}", path.display())))?;
        debug!(path = %path.display(), bytes = plaintext.len(), "encrypted file");
        Ok(FileOutcome::Encrypted {
            bytes: plaintext.len() as u64,
        })
    }
}

/// Opens containers of any format. The size limit does not apply here: a
/// container is always larger than the plaintext it was sealed from.
struct Decryptor {
    keys: KeyCache,
}

impl Decryptor {
    fn new(password: &[u8], opts: &Options) -> Self {
        Self {
            keys: KeyCache::new(password, opts.iterations),
        }
    }

    fn open_bytes(&mut self, blob: &[u8], path: &Path) -> Result<Zeroizing<Vec<u8>>> {
        if !container::is_encrypted(blob) {
            return Err(DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::NotEncrypted,
                format!("{} is not encrypted", path.display()),
            ));
        }
        open(blob, &mut self.keys)
            .map(Zeroizing::new)
            .map_err(|e| e.with_context(format!("failed to decrypt {}", path.display())))
    }

    fn decrypt_in_place(&mut self, path: &Path) -> Result<FileOutcome> {
        let metadata = stat(path)?;
        let blob = read(path)?;
        let plaintext = self.open_bytes(&blob, path)?;
        atomic::write_atomic(path, &plaintext, Mode::Preserve(metadata.permissions()))
            .map_err(|e| e.with_context(format!("failed to replace {}", path.display())))?;
        debug!(path = %path.display(), bytes = blob.len(), "decrypted file");
        Ok(FileOutcome::Decrypted {
            bytes: blob.len() as u64,
        })
    }
}

/// Encrypt `path` in place: a single file, or every file of a directory
/// tree, depending on what `path` is.
pub fn encrypt(
    path: &Path,
    opts: &Options,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<Outcome> {
    if stat(path)?.is_dir() {
        encrypt_tree(path, opts, passphrase_reader).map(Outcome::Tree)
    } else {
        let passphrase = passphrase_reader.read_passphrase()?;
        let encryptor = Encryptor::new(&passphrase, opts)?;
        let outcome = encryptor.encrypt_in_place(path)?;
        if let FileOutcome::Skipped(reason) = outcome {
            warn!(path = %path.display(), %reason, "skipping file");
        }
        Ok(Outcome::File(outcome))
    }
}

/// Decrypt `path` in place: a single file, or every file of a directory
/// tree. The container format of each file is detected on its own.
pub fn decrypt(
    path: &Path,
    opts: &Options,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<Outcome> {
    if stat(path)?.is_dir() {
        decrypt_tree(path, opts, passphrase_reader).map(Outcome::Tree)
    } else {
        let passphrase = passphrase_reader.read_passphrase()?;
        let mut decryptor = Decryptor::new(&passphrase, opts);
        let outcome = decryptor.decrypt_in_place(path)?;
        if let FileOutcome::Skipped(reason) = outcome {
            warn!(path = %path.display(), %reason, "skipping file");
        }
        Ok(Outcome::File(outcome))
    }
}

/// Encrypt every file under `root`.
///
/// Refuses to start if the root is already flagged as encrypted. Files that
/// fail are left untouched and recorded; the walk continues. The flag is set
/// only if no file failed.
pub fn encrypt_tree(
    root: &Path,
    opts: &Options,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<TreeReport> {
    let tracker = StateTracker::new(root, &opts.flag_file_name);
    tracker.ensure_can_encrypt()?;

    let passphrase = passphrase_reader.read_passphrase()?;
    let encryptor = Encryptor::new(&passphrase, opts)?;

    let started = Instant::now();
    let mut report = TreeReport::default();
    for entry in walk::for_each_file(root, &opts.ignore_set(root)) {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                report.fail(root.to_path_buf(), e);
                continue;
            }
        };
        match encryptor.encrypt_in_place(&path) {
            Ok(outcome) => report.record(path, outcome),
            Err(e) if e.is(ErrorKind::AlreadyEncrypted) => {
                report.record(path, FileOutcome::Skipped(SkipReason::AlreadyEncrypted))
            }
            Err(e) => report.fail(path, e),
        }
    }
    report.elapsed = started.elapsed();

    finish_tree(&tracker, TreeState::Encrypted, &report)?;
    info!(root = %root.display(), "encrypted tree: {}", report);
    Ok(report)
}

/// Decrypt every file under `root`.
///
/// Refuses to start unless the root is flagged as encrypted. Files that fail
/// (wrong password, damaged container) are left untouched and recorded; the
/// walk continues. The flag is cleared only if no file failed.
pub fn decrypt_tree(
    root: &Path,
    opts: &Options,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<TreeReport> {
    let tracker = StateTracker::new(root, &opts.flag_file_name);
    tracker.ensure_can_decrypt()?;

    let passphrase = passphrase_reader.read_passphrase()?;
    let mut decryptor = Decryptor::new(&passphrase, opts);

    let started = Instant::now();
    let mut report = TreeReport::default();
    for entry in walk::for_each_file(root, &opts.ignore_set(root)) {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                report.fail(root.to_path_buf(), e);
                continue;
            }
        };
        match decryptor.decrypt_in_place(&path) {
            Ok(outcome) => report.record(path, outcome),
            Err(e) if e.is(ErrorKind::NotEncrypted) => {
                report.record(path, FileOutcome::Skipped(SkipReason::NotEncrypted))
            }
            Err(e) => report.fail(path, e),
        }
    }
    report.elapsed = started.elapsed();

    finish_tree(&tracker, TreeState::Plaintext, &report)?;
    info!(root = %root.display(), "decrypted tree: {}", report);
    Ok(report)
}

fn finish_tree(tracker: &StateTracker, state: TreeState, report: &TreeReport) -> Result<()> {
    if report.is_clean() {
        tracker.write(state)
    } else {
        warn!(
            flag = %tracker.flag_path().display(),
            failed = report.failed.len(),
            "some files failed; tree state left unchanged"
        );
        Ok(())
    }
}

fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|e| DircryptError::io("failed to stat", path, e))
}

fn read(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    fs::read(path)
        .map(Zeroizing::new)
        .map_err(|e| DircryptError::io("failed to read from", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::HEADER;
    use crate::passphrase::ConstantPassphraseReader;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    const FAST: u32 = 16;

    fn opts() -> Options {
        Options::default().with_iterations(FAST)
    }

    fn reader(pw: &[u8]) -> ConstantPassphraseReader {
        ConstantPassphraseReader::new(pw.to_vec())
    }

    #[test]
    fn test_seal_open_all_schemes() {
        let (key, salt) = kdf::derive_key(b"pw", None, FAST).unwrap();
        for scheme in [Scheme::Binary, Scheme::Armored, Scheme::Token] {
            let blob = seal(b"some plaintext", &key, &salt, scheme).unwrap();
            assert!(container::is_encrypted(&blob));
            let mut keys = KeyCache::new(b"pw", FAST);
            assert_eq!(open(&blob, &mut keys).unwrap(), b"some plaintext");
        }
    }

    #[test]
    fn test_open_wrong_password() {
        let (key, salt) = kdf::derive_key(b"right", None, FAST).unwrap();

        let framed = seal(b"x", &key, &salt, Scheme::Binary).unwrap();
        let err = open(&framed, &mut KeyCache::new(b"wrong", FAST)).expect_err("expected mismatch");
        assert_eq!(err.kind, Some(ErrorKind::KeyMismatch));

        let token = seal(b"x", &key, &salt, Scheme::Token).unwrap();
        let err = open(&token, &mut KeyCache::new(b"wrong", FAST)).expect_err("expected bad token");
        assert_eq!(err.kind, Some(ErrorKind::InvalidToken));
    }

    #[test]
    fn test_open_plaintext() {
        let err = open(b"just text", &mut KeyCache::new(b"pw", FAST)).expect_err("expected error");
        assert_eq!(err.kind, Some(ErrorKind::NotEncrypted));
    }

    #[test]
    fn test_key_cache_reuses_keys() {
        let mut keys = KeyCache::new(b"pw", FAST);
        let first = keys.key_for([1u8; kdf::SALT_LEN]).unwrap().fingerprint();
        let again = keys.key_for([1u8; kdf::SALT_LEN]).unwrap().fingerprint();
        let other = keys.key_for([2u8; kdf::SALT_LEN]).unwrap().fingerprint();
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(keys.keys.len(), 2);
    }

    #[test]
    fn test_single_file_in_place_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, b"Hello, dircrypt!").unwrap();

        let outcome = encrypt(&path, &opts(), &mut reader(b"pw")).unwrap();
        assert!(matches!(outcome, Outcome::File(FileOutcome::Encrypted { bytes: 16 })));
        assert!(fs::read(&path).unwrap().starts_with(HEADER));
        // Single files never touch a flag.
        assert!(!temp_dir.path().join(".encrypted").exists());

        let outcome = decrypt(&path, &opts(), &mut reader(b"pw")).unwrap();
        assert!(matches!(outcome, Outcome::File(FileOutcome::Decrypted { .. })));
        assert_eq!(fs::read(&path).unwrap(), b"Hello, dircrypt!");
    }

    #[test]
    fn test_single_file_double_encrypt_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a");
        fs::write(&path, b"data").unwrap();
        encrypt(&path, &opts(), &mut reader(b"pw")).unwrap();
        let before = fs::read(&path).unwrap();

        let err = encrypt(&path, &opts(), &mut reader(b"pw")).expect_err("expected error");
        assert_eq!(err.kind, Some(ErrorKind::AlreadyEncrypted));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_single_file_decrypt_plaintext_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a");
        fs::write(&path, b"data").unwrap();
        let err = decrypt(&path, &opts(), &mut reader(b"pw")).expect_err("expected error");
        assert_eq!(err.kind, Some(ErrorKind::NotEncrypted));
    }

    #[test]
    fn test_wrong_password_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a");
        fs::write(&path, b"data").unwrap();
        encrypt(&path, &opts(), &mut reader(b"right")).unwrap();
        let sealed = fs::read(&path).unwrap();

        let err = decrypt(&path, &opts(), &mut reader(b"wrong")).expect_err("expected error");
        assert_eq!(err.kind, Some(ErrorKind::KeyMismatch));
        assert_eq!(fs::read(&path).unwrap(), sealed);
    }

    #[test]
    fn test_oversize_single_file_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big");
        fs::write(&path, vec![7u8; 64]).unwrap();
        let opts = opts().with_size_limit(64);

        let outcome = encrypt(&path, &opts, &mut reader(b"pw")).unwrap();
        assert!(matches!(
            outcome,
            Outcome::File(FileOutcome::Skipped(SkipReason::Oversize { size: 64 }))
        ));
        assert_eq!(fs::read(&path).unwrap(), vec![7u8; 64]);
    }

    #[test]
    fn test_tree_skips_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("small"), b"abc").unwrap();
        fs::write(root.join("big"), vec![0u8; 100]).unwrap();
        let (key, salt) = kdf::derive_key(b"pw", None, FAST).unwrap();
        fs::write(root.join("sealed"), seal(b"old", &key, &salt, Scheme::Armored).unwrap()).unwrap();

        let opts = opts().with_size_limit(100);
        let report = encrypt_tree(root, &opts, &mut reader(b"pw")).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.bytes, 3);
        assert!(report.is_clean());
        assert_eq!(
            report.skipped,
            vec![
                (root.join("big"), SkipReason::Oversize { size: 100 }),
                (root.join("sealed"), SkipReason::AlreadyEncrypted),
            ]
        );
        assert_eq!(fs::read(root.join(".encrypted")).unwrap(), b"1");
    }

    #[test]
    fn test_tree_failure_keeps_flag() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let (key, salt) = kdf::derive_key(b"other", None, FAST).unwrap();
        fs::write(root.join("foreign"), seal(b"x", &key, &salt, Scheme::Binary).unwrap()).unwrap();
        fs::write(root.join(".encrypted"), b"1").unwrap();

        let report = decrypt_tree(root, &opts(), &mut reader(b"pw")).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, root.join("foreign"));
        assert_eq!(report.failed[0].1.kind, Some(ErrorKind::KeyMismatch));
        assert_eq!(fs::read(root.join(".encrypted")).unwrap(), b"1");
    }

    #[test]
    fn test_report_display() {
        let report = TreeReport {
            processed: 5,
            bytes: 1536,
            elapsed: Duration::from_millis(1500),
            skipped: vec![(PathBuf::from("x"), SkipReason::NotEncrypted)],
            failed: Vec::new(),
        };
        let summary = report.to_string();
        assert_eq!(
            summary,
            format!(
                "5 files ({}) processed in {}, 1 skipped, 0 failed",
                ByteSize(1536),
                humantime::format_duration(Duration::from_millis(1500))
            )
        );
        assert!(summary.contains("1s 500ms"), "unexpected summary: {}", summary);
    }

    #[test]
    fn test_report_elapsed_drops_sub_millisecond_noise() {
        let report = TreeReport {
            elapsed: Duration::from_nanos(2_000_123_456),
            ..TreeReport::default()
        };
        assert!(report.to_string().contains("in 2s 123ms,"), "got: {}", report);
    }

    #[test]
    fn test_decrypt_ignores_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("near_limit");
        fs::write(&path, vec![3u8; 90]).unwrap();
        let opts = opts().with_size_limit(100);

        encrypt(&path, &opts, &mut reader(b"pw")).unwrap();
        assert!(fs::metadata(&path).unwrap().len() >= 100);

        let outcome = decrypt(&path, &opts, &mut reader(b"pw")).unwrap();
        assert!(matches!(outcome, Outcome::File(FileOutcome::Decrypted { .. })));
        assert_eq!(fs::read(&path).unwrap(), vec![3u8; 90]);
    }

    #[test]
    #[cfg(unix)]
    fn test_in_place_preserves_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("script.sh");
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o750)).unwrap();

        encrypt(&path, &opts(), &mut reader(b"pw")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = encrypt(&temp_dir.path().join("nope"), &opts(), &mut reader(b"pw"))
            .expect_err("expected io error");
        assert_eq!(err.kind, Some(ErrorKind::Io));
        assert_eq!(err.category, ErrorCategory::User);
    }
}
