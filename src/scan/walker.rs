//! Filesystem walker producing the sorted list of files to hash

use crate::error::ScanError;
use crate::ignore::IgnoreMatcher;
use crate::scan::path::relative_slash_path;
use std::io;
use std::path::PathBuf;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// A regular file selected for hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Root-relative path with `/` separators.
    pub rel_path: String,
}

/// Why a file was left out of the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A path component is not valid UTF-8 and cannot be named in a manifest.
    NonUtf8Path,
    /// The file could not be opened.
    Unreadable { kind: io::ErrorKind, message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NonUtf8Path => f.write_str("path is not valid UTF-8"),
            SkipReason::Unreadable { message, .. } => write!(f, "unreadable: {}", message),
        }
    }
}

/// A file that was seen but not hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

impl SkippedFile {
    pub fn unreadable(path: PathBuf, err: &io::Error) -> Self {
        Self {
            path,
            reason: SkipReason::Unreadable {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Walk result: files sorted by `rel_path`, plus anything skipped on the way.
#[derive(Debug, Default)]
pub struct WalkOutput {
    pub files: Vec<ScannedFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Walks a resolved root, pruning ignored directories.
pub struct DirectoryScanner {
    root: PathBuf,
    matcher: IgnoreMatcher,
}

impl DirectoryScanner {
    /// `root` must already be resolved (see [`crate::scan::path::resolve_root`]).
    pub fn new(root: PathBuf, matcher: IgnoreMatcher) -> Self {
        Self { root, matcher }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Collect every regular, non-ignored file under the root.
    ///
    /// Symlinks are never followed. Output is sorted by relative path in byte
    /// order regardless of directory listing order.
    pub fn walk(&self) -> Result<WalkOutput, ScanError> {
        let mut output = WalkOutput::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                match relative_slash_path(&self.root, entry.path()) {
                    Some(rel) => {
                        let ignored = self.matcher.is_ignored(&rel);
                        if ignored {
                            trace!(path = %rel, "Ignored");
                        }
                        !ignored
                    }
                    // Non-UTF-8 names are reported below, not silently pruned.
                    None => true,
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Err(self.walk_error(err)),
            };

            let file_type = entry.file_type();
            if !file_type.is_file() {
                if file_type.is_symlink() {
                    debug!(path = %entry.path().display(), "Skipping symlink");
                }
                continue;
            }

            let path = entry.into_path();
            match relative_slash_path(&self.root, &path) {
                Some(rel_path) => output.files.push(ScannedFile { path, rel_path }),
                None => {
                    warn!(path = %path.display(), "Skipping file with non-UTF-8 path");
                    output.skipped.push(SkippedFile {
                        path,
                        reason: SkipReason::NonUtf8Path,
                    });
                }
            }
        }

        output.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        debug!(
            root = %self.root.display(),
            files = output.files.len(),
            skipped = output.skipped.len(),
            "Directory walk complete"
        );
        Ok(output)
    }

    fn walk_error(&self, err: walkdir::Error) -> ScanError {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.root.clone());
        if err.depth() == 0 {
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "walk failed at root"));
            ScanError::RootUnreadable { path, source }
        } else {
            ScanError::DirectoryUnreadable {
                path,
                message: err.to_string(),
            }
        }
    }
}
