//! Operation settings
//!
//! Everything that used to be a process-wide constant (ignore list, flag
//! file name, size ceiling, KDF cost, output format) lives here and is
//! passed explicitly to every operation.

use crate::kdf::DEFAULT_ITERATIONS;
use crate::state::DEFAULT_FLAG_FILE;
use crate::walk::canonical;
use std::path::{Path, PathBuf};

/// Files at or above this size are skipped: 2 GiB.
pub const DEFAULT_SIZE_LIMIT: u64 = 2 * 1024 * 1024 * 1024;

/// Container format written by encryption. Decryption detects the format
/// of each file on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Framed AES-256-CBC, raw binary fields.
    #[default]
    Binary,
    /// Framed AES-256-CBC, base64 fields; the container is UTF-8 text.
    Armored,
    /// Marker-prefixed authenticated token.
    Token,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub scheme: Scheme,
    /// PBKDF2 iterations. Not stored in containers, so decryption must use
    /// the same value encryption did.
    pub iterations: u32,
    /// Files whose size is >= this many bytes are skipped.
    pub size_limit: u64,
    /// Name of the state flag file at each tree root.
    pub flag_file_name: String,
    /// Extra paths excluded from tree walks. Relative paths are resolved
    /// against the tree root.
    pub ignore: Vec<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            iterations: DEFAULT_ITERATIONS,
            size_limit: DEFAULT_SIZE_LIMIT,
            flag_file_name: DEFAULT_FLAG_FILE.to_string(),
            ignore: Vec::new(),
        }
    }
}

impl Options {
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    pub fn with_flag_file_name(mut self, name: impl Into<String>) -> Self {
        self.flag_file_name = name.into();
        self
    }

    pub fn with_ignored(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore.push(path.into());
        self
    }

    /// Every path a walk of `root` must skip: the flag file plus the
    /// configured extras, all in canonical form.
    pub fn ignore_set(&self, root: &Path) -> Vec<PathBuf> {
        let root = canonical(root);
        let mut set = Vec::with_capacity(self.ignore.len() + 1);
        set.push(root.join(&self.flag_file_name));
        set.extend(self.ignore.iter().map(|p| canonical(&root.join(p))));
        set
    }
}
