//! Directory scanning: walk, dual-hash, aggregate
//!
//! [`TreeScanner::scan`] is the single entry point used by both release and
//! verification, so both sides see the same ignore rules and the same
//! ordering.

pub mod aggregate;
pub mod hasher;
pub mod path;
pub mod walker;

pub use aggregate::{aggregate_content_hash, GlobalAggregator};
pub use hasher::{CancelFlag, DualHasher, FileOutcome};
pub use walker::{DirectoryScanner, ScannedFile, SkipReason, SkippedFile};

use crate::error::ScanError;
use crate::fingerprint::FingerprintRegistry;
use crate::ignore::IgnoreMatcher;
use crate::manifest::Asset;
use crate::types::Digest;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Patterns added to `.provmarkignore` and the built-in defaults.
    pub extra_ignore: Vec<String>,
    /// Hash on the rayon pool (default) or on the calling thread.
    pub parallel: bool,
    pub cancel: CancelFlag,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extra_ignore: Vec::new(),
            parallel: true,
            cancel: CancelFlag::new(),
        }
    }
}

/// Everything a scan learned about a tree.
#[derive(Debug, Clone)]
pub struct TreeScan {
    /// Resolved root.
    pub root: PathBuf,
    /// Assets sorted by path.
    pub assets: Vec<Asset>,
    pub skipped: Vec<SkippedFile>,
    pub content_hash: Digest,
}

impl TreeScan {
    pub fn asset(&self, path: &str) -> Option<&Asset> {
        self.assets
            .binary_search_by(|a| a.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.assets[i])
    }
}

/// Walks, hashes and aggregates a directory tree.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    hasher: DualHasher,
    options: ScanOptions,
}

impl TreeScanner {
    pub fn new(registry: FingerprintRegistry) -> Self {
        Self::with_options(registry, ScanOptions::default())
    }

    pub fn with_options(registry: FingerprintRegistry, options: ScanOptions) -> Self {
        Self {
            hasher: DualHasher::new(registry),
            options,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn scan(&self, root: &Path) -> Result<TreeScan, ScanError> {
        let started = Instant::now();
        let root = path::resolve_root(root)?;
        let matcher = IgnoreMatcher::for_root(&root, &self.options.extra_ignore);

        let walk = DirectoryScanner::new(root.clone(), matcher).walk()?;
        let batch = self
            .hasher
            .hash_all(&walk.files, self.options.parallel, &self.options.cancel)?;

        let content_hash = aggregate_content_hash(&batch.assets);
        let mut skipped = walk.skipped;
        skipped.extend(batch.skipped);
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            root = %root.display(),
            assets = batch.assets.len(),
            skipped = skipped.len(),
            content_hash = %content_hash.short(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        Ok(TreeScan {
            root,
            assets: batch.assets,
            skipped,
            content_hash,
        })
    }
}

/// Scan `root` with the built-in languages.
pub fn scan_tree(root: &Path, options: ScanOptions) -> Result<TreeScan, ScanError> {
    TreeScanner::with_options(FingerprintRegistry::with_builtin_languages(), options).scan(root)
}
