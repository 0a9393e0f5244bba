//! Crash-safe file replacement
//!
//! Contents are written to a temp file in the target's directory, flushed,
//! fsynced, then renamed over the target. Either the old file or the new
//! file exists afterwards, never a partial one.

use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

/// Permissions applied to the replacement file.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Owner read/write only (0o600 on Unix).
    Private,
    /// Copy the given permissions, typically those of the file being replaced.
    Preserve(Permissions),
}

/// Atomically replace `path` with `contents`.
pub fn write_atomic(path: &Path, contents: &[u8], mode: Mode) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(DircryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("{} has no parent directory", path.display()),
            ));
        }
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| DircryptError::io("failed to create tempfile in", dir, e))?;
    temp_file
        .write_all(contents)
        .map_err(|e| DircryptError::io("failed to write tempfile for", path, e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| DircryptError::io("failed to flush tempfile for", path, e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| DircryptError::io("failed to sync tempfile for", path, e))?;

    let permissions = match mode {
        Mode::Preserve(perms) => Some(perms),
        Mode::Private => private_permissions(&temp_file)?,
    };
    if let Some(perms) = permissions {
        temp_file
            .as_file()
            .set_permissions(perms)
            .map_err(|e| DircryptError::io("failed to set permissions on tempfile for", path, e))?;
    }

    temp_file.persist(path).map_err(|e| {
        DircryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

#[cfg(unix)]
fn private_permissions(temp_file: &tempfile::NamedTempFile) -> Result<Option<Permissions>> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = temp_file
        .as_file()
        .metadata()
        .map_err(|e| DircryptError::io("failed to get metadata of", temp_file.path(), e))?
        .permissions();
    perms.set_mode(0o600);
    Ok(Some(perms))
}

#[cfg(not(unix))]
fn private_permissions(_temp_file: &tempfile::NamedTempFile) -> Result<Option<Permissions>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("target");
        fs::write(&path, b"old contents").unwrap();

        write_atomic(&path, b"new", Mode::Private).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        // No temp files left behind.
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fresh");
        write_atomic(&path, b"1", Mode::Private).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"1");
    }

    #[test]
    fn test_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope").join("file");
        let err = write_atomic(&path, b"x", Mode::Private).expect_err("expected io error");
        assert_eq!(err.kind, Some(ErrorKind::Io));
    }

    #[test]
    #[cfg(unix)]
    fn test_private_mode() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret");
        write_atomic(&path, b"x", Mode::Private).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    #[cfg(unix)]
    fn test_preserve_mode() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shared");
        fs::write(&path, b"x").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        write_atomic(&path, b"y", Mode::Preserve(perms)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
