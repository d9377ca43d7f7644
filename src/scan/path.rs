//! Root resolution and relative path rendering

use crate::error::ScanError;
use std::path::{Component, Path, PathBuf};

/// Canonicalize the scan root and check that it is a directory.
///
/// `dunce` keeps Windows paths free of the `\\?\` prefix so relative paths
/// stay comparable across platforms.
pub fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let canonical = dunce::canonicalize(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    let metadata = std::fs::metadata(&canonical).map_err(|source| ScanError::RootUnreadable {
        path: canonical.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::RootNotDirectory(canonical));
    }
    Ok(canonical)
}

/// Render `path` relative to `root` with `/` separators.
///
/// Returns `None` when the path is outside the root or a component is not
/// valid UTF-8. The root itself renders as the empty string.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
