//! Per-directory encryption state
//!
//! A tree root carries a hidden flag file holding `1` while the tree is
//! encrypted and `0` once it has been decrypted again. A missing flag file
//! means the tree has never been encrypted.

use crate::atomic::{self, Mode};
use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default name of the flag file at a tree root.
pub const DEFAULT_FLAG_FILE: &str = ".encrypted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    Plaintext,
    Encrypted,
}

impl TreeState {
    fn as_flag(self) -> &'static [u8] {
        match self {
            TreeState::Plaintext => b"0",
            TreeState::Encrypted => b"1",
        }
    }
}

impl fmt::Display for TreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeState::Plaintext => f.write_str("plaintext"),
            TreeState::Encrypted => f.write_str("encrypted"),
        }
    }
}

/// Reads and writes the flag file of one tree root.
#[derive(Debug, Clone)]
pub struct StateTracker {
    flag_path: PathBuf,
}

impl StateTracker {
    pub fn new(root: &Path, flag_file_name: &str) -> Self {
        Self {
            flag_path: root.join(flag_file_name),
        }
    }

    pub fn flag_path(&self) -> &Path {
        &self.flag_path
    }

    /// Current state; a missing flag file reads as plaintext.
    pub fn read(&self) -> Result<TreeState> {
        let contents = match fs::read(&self.flag_path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TreeState::Plaintext),
            Err(e) => return Err(DircryptError::io("failed to read flag file", &self.flag_path, e)),
        };
        match contents.trim_ascii() {
            b"1" => Ok(TreeState::Encrypted),
            b"0" => Ok(TreeState::Plaintext),
            other => Err(DircryptError::format(format!(
                "flag file {} holds {:?}, expected \"0\" or \"1\"",
                self.flag_path.display(),
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Atomically persist `state`.
    pub fn write(&self, state: TreeState) -> Result<()> {
        atomic::write_atomic(&self.flag_path, state.as_flag(), Mode::Private)
            .map_err(|e| e.with_context("failed to update flag file"))?;
        info!(flag = %self.flag_path.display(), %state, "tree state updated");
        Ok(())
    }

    /// Refuse to encrypt a tree that is already encrypted.
    pub fn ensure_can_encrypt(&self) -> Result<()> {
        match self.read()? {
            TreeState::Plaintext => Ok(()),
            TreeState::Encrypted => Err(DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::AlreadyEncrypted,
                format!("{} is already encrypted", self.root_display()),
            )),
        }
    }

    /// Refuse to decrypt a tree that is not encrypted.
    pub fn ensure_can_decrypt(&self) -> Result<()> {
        match self.read()? {
            TreeState::Encrypted => Ok(()),
            TreeState::Plaintext => Err(DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::NotEncrypted,
                format!("{} is not encrypted", self.root_display()),
            )),
        }
    }

    fn root_display(&self) -> String {
        self.flag_path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_flag_is_plaintext() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = StateTracker::new(temp_dir.path(), DEFAULT_FLAG_FILE);
        assert_eq!(tracker.read().unwrap(), TreeState::Plaintext);
        assert!(tracker.ensure_can_encrypt().is_ok());
        let err = tracker.ensure_can_decrypt().expect_err("expected not encrypted");
        assert_eq!(err.kind, Some(ErrorKind::NotEncrypted));
    }

    #[test]
    fn test_transitions() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = StateTracker::new(temp_dir.path(), DEFAULT_FLAG_FILE);

        tracker.write(TreeState::Encrypted).unwrap();
        assert_eq!(fs::read(tracker.flag_path()).unwrap(), b"1");
        assert_eq!(tracker.read().unwrap(), TreeState::Encrypted);
        let err = tracker.ensure_can_encrypt().expect_err("expected already encrypted");
        assert_eq!(err.kind, Some(ErrorKind::AlreadyEncrypted));
        assert!(tracker.ensure_can_decrypt().is_ok());

        tracker.write(TreeState::Plaintext).unwrap();
        assert_eq!(fs::read(tracker.flag_path()).unwrap(), b"0");
        assert_eq!(tracker.read().unwrap(), TreeState::Plaintext);
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = StateTracker::new(temp_dir.path(), DEFAULT_FLAG_FILE);
        fs::write(tracker.flag_path(), b"1\n").unwrap();
        assert_eq!(tracker.read().unwrap(), TreeState::Encrypted);
    }

    #[test]
    fn test_garbage_flag_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = StateTracker::new(temp_dir.path(), DEFAULT_FLAG_FILE);
        fs::write(tracker.flag_path(), b"yes").unwrap();
        let err = tracker.read().expect_err("expected format error");
        assert_eq!(err.kind, Some(ErrorKind::Format));
    }

    #[test]
    fn test_custom_flag_name() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = StateTracker::new(temp_dir.path(), ".locked");
        tracker.write(TreeState::Encrypted).unwrap();
        assert!(temp_dir.path().join(".locked").exists());
        assert!(!temp_dir.path().join(DEFAULT_FLAG_FILE).exists());
    }
}
