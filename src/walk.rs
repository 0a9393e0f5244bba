//! Recursive file enumeration

use crate::error::{DircryptError, ErrorCategory, ErrorKind, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolve `path` to the form ignore entries are compared in.
///
/// Symlinks and `..` are resolved when the path exists; otherwise it is
/// only made absolute.
pub fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Lazily yield every regular file under `root` that is not in `ignore`.
///
/// `ignore` holds [`canonical`] paths; each file is matched by its
/// location under the canonical root, while the yielded path keeps the
/// root as given.
///
/// Each directory is listed completely (and sorted) before any of its
/// entries is yielded, so files created while the walk is in progress,
/// such as the temp files of in-place rewrites, are never picked up.
/// Symlinks are not followed. The iterator is single-use.
pub fn for_each_file<'a>(
    root: &Path,
    ignore: &'a [PathBuf],
) -> impl Iterator<Item = Result<PathBuf>> + use<'a> {
    let given = root.to_path_buf();
    let base = canonical(root);
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.into_path();
                let resolved = match path.strip_prefix(&given) {
                    Ok(rel) if rel.as_os_str().is_empty() => base.clone(),
                    Ok(rel) => base.join(rel),
                    Err(_) => path.clone(),
                };
                if ignore.contains(&resolved) {
                    None
                } else {
                    Some(Ok(path))
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                Some(Err(DircryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to walk {}", path.display()),
                    e,
                )))
            }
        })
}
