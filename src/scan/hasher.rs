//! Per-file dual hashing: raw SHA-256 plus optional logic fingerprint

use crate::error::ScanError;
use crate::fingerprint::FingerprintRegistry;
use crate::manifest::Asset;
use crate::scan::walker::{ScannedFile, SkippedFile};
use crate::types::Digest;
use rayon::prelude::*;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Buffer size for streaming reads.
pub const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Cooperative cancellation shared by every hashing worker.
///
/// Checked before each file. Raised by the caller or by the first fatal
/// read error.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of hashing one file. Each worker owns its outcome; outcomes are
/// merged after the pool finishes.
#[derive(Debug)]
pub enum FileOutcome {
    Hashed(Asset),
    /// The file could not be opened; the scan continues without it.
    Skipped(SkippedFile),
    /// Read failed after open; the whole scan must fail.
    Fatal { path: PathBuf, source: io::Error },
    /// Not attempted because the cancel flag was raised.
    Cancelled,
}

/// Hashed assets and skipped files for one batch, assets sorted by path.
#[derive(Debug, Default)]
pub struct HashBatch {
    pub assets: Vec<Asset>,
    pub skipped: Vec<SkippedFile>,
}

/// Stream `reader` through SHA-256, optionally retaining the bytes.
pub fn hash_reader<R: Read>(mut reader: R, mut retain: Option<&mut Vec<u8>>) -> io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        if let Some(out) = retain.as_deref_mut() {
            out.extend_from_slice(&buf[..n]);
        }
    }
    Ok(Digest::from_bytes(hasher.finalize().into()))
}

/// Computes an [`Asset`] per file using a fingerprint registry.
#[derive(Debug, Clone)]
pub struct DualHasher {
    registry: FingerprintRegistry,
}

impl DualHasher {
    pub fn new(registry: FingerprintRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FingerprintRegistry {
        &self.registry
    }

    /// Hash a single file.
    pub fn hash_file(&self, file: &ScannedFile) -> FileOutcome {
        let handle = match File::open(&file.path) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(path = %file.rel_path, error = %err, "Skipping unreadable file");
                return FileOutcome::Skipped(SkippedFile::unreadable(file.path.clone(), &err));
            }
        };

        let rel = Path::new(&file.rel_path);
        let mut source = self.registry.supports(rel).then(Vec::new);

        let raw_hash = match hash_reader(handle, source.as_mut()) {
            Ok(digest) => digest,
            Err(err) => {
                return FileOutcome::Fatal {
                    path: file.path.clone(),
                    source: err,
                }
            }
        };

        let logic_hash = source.and_then(|bytes| match self.registry.fingerprint(rel, &bytes)? {
            Ok(digest) => Some(digest),
            Err(err) => {
                debug!(path = %file.rel_path, error = %err, "No logic fingerprint");
                None
            }
        });

        FileOutcome::Hashed(Asset {
            path: file.rel_path.clone(),
            raw_hash,
            logic_hash,
        })
    }

    /// Hash every file, in parallel on the rayon pool or sequentially.
    ///
    /// The first fatal read error raises `cancel` and the batch fails with
    /// [`ScanError::Interrupted`]. A flag raised by the caller yields
    /// [`ScanError::Cancelled`].
    pub fn hash_all(
        &self,
        files: &[ScannedFile],
        parallel: bool,
        cancel: &CancelFlag,
    ) -> Result<HashBatch, ScanError> {
        let total = files.len();
        let completed = AtomicUsize::new(0);

        let run = |file: &ScannedFile| -> FileOutcome {
            if cancel.is_cancelled() {
                return FileOutcome::Cancelled;
            }
            let outcome = self.hash_file(file);
            match &outcome {
                FileOutcome::Fatal { .. } => cancel.cancel(),
                _ => {
                    completed.fetch_add(1, Ordering::SeqCst);
                }
            }
            outcome
        };

        let outcomes: Vec<FileOutcome> = if parallel {
            files.par_iter().map(run).collect()
        } else {
            files.iter().map(run).collect()
        };
        let completed = completed.load(Ordering::SeqCst);

        let mut batch = HashBatch::default();
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Hashed(asset) => batch.assets.push(asset),
                FileOutcome::Skipped(skipped) => batch.skipped.push(skipped),
                FileOutcome::Fatal { path, source } => {
                    return Err(ScanError::Interrupted {
                        path,
                        completed,
                        total,
                        source,
                    })
                }
                FileOutcome::Cancelled => cancelled = true,
            }
        }
        if cancelled {
            return Err(ScanError::Cancelled { completed, total });
        }

        batch.assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(batch)
    }
}
