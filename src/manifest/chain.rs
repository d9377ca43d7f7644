//! Provenance chain resolution
//!
//! Manifests link backwards through `parent_hash`, the SHA-256 of the previous
//! manifest file. Nothing indexes these links on disk, so a resolver has to be
//! told where to look.

use super::{Manifest, MANIFEST_EXTENSION};
use crate::error::ManifestError;
use crate::types::Digest;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A sidecar sits next to the file it signs: `paper.tex.pmk` beside `paper.tex`.
fn is_sidecar(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION)
        && path.with_extension("").is_file()
}

/// Default bound on how many ancestors [`walk_chain`] follows.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// A resolved ancestor manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub path: PathBuf,
    /// SHA-256 of the file's bytes.
    pub file_hash: Digest,
    pub manifest: Manifest,
}

/// Looks up a manifest file by the hash of its bytes.
pub trait ChainResolver {
    fn resolve(&self, parent_hash: &Digest) -> Option<ChainLink>;
}

/// Resolver over every `*.pmk` file directly inside a set of directories.
#[derive(Debug, Default)]
pub struct DirectoryChainResolver {
    by_hash: HashMap<Digest, ChainLink>,
}

impl DirectoryChainResolver {
    /// Index the given directories. Missing directories and unreadable or
    /// unparseable files are logged and skipped.
    pub fn index<I, P>(dirs: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut by_hash = HashMap::new();
        for dir in dirs {
            let dir = dir.as_ref();
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Cannot index chain directory");
                    continue;
                }
            };
            for entry in entries {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "Cannot read chain directory entry");
                        continue;
                    }
                };
                if !path.is_file()
                    || path.extension().and_then(|e| e.to_str()) != Some(MANIFEST_EXTENSION)
                {
                    continue;
                }
                let bytes = match fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable manifest");
                        continue;
                    }
                };
                match Manifest::from_json_bytes(&bytes) {
                    Ok(manifest) => {
                        let file_hash = Digest::of(&bytes);
                        by_hash.insert(
                            file_hash,
                            ChainLink {
                                path,
                                file_hash,
                                manifest,
                            },
                        );
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping malformed manifest"),
                }
            }
        }
        debug!(manifests = by_hash.len(), "Indexed chain directories");
        Ok(Self { by_hash })
    }

    /// Newest indexed release manifest by timestamp, ties broken by path.
    /// `<file>.pmk` sidecars written by single-file signing are never picked.
    pub fn latest(&self) -> Option<&ChainLink> {
        self.by_hash
            .values()
            .filter(|link| !is_sidecar(&link.path))
            .max_by(|a, b| {
                a.manifest
                    .timestamp
                    .cmp(&b.manifest.timestamp)
                    .then_with(|| a.path.cmp(&b.path))
            })
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

impl ChainResolver for DirectoryChainResolver {
    fn resolve(&self, parent_hash: &Digest) -> Option<ChainLink> {
        self.by_hash.get(parent_hash).cloned()
    }
}

/// Why a chain walk stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEnd {
    /// The last manifest has no parent.
    Genesis,
    /// A parent hash no resolver entry matches.
    Unresolved(Digest),
    DepthLimit,
}

/// Ancestors of a manifest, nearest first.
#[derive(Debug, Clone)]
pub struct ProvenanceChain {
    pub links: Vec<ChainLink>,
    pub end: ChainEnd,
}

/// Follow `parent_hash` links from `head` until genesis, an unresolved hash,
/// or `max_depth` ancestors. A hash seen twice is a cycle and an error.
pub fn walk_chain(
    head: &Manifest,
    resolver: &dyn ChainResolver,
    max_depth: usize,
) -> Result<ProvenanceChain, ManifestError> {
    let mut links: Vec<ChainLink> = Vec::new();
    let mut seen = HashSet::new();
    let mut next = head.parent_hash;

    let end = loop {
        let Some(hash) = next else {
            break ChainEnd::Genesis;
        };
        if links.len() >= max_depth {
            break ChainEnd::DepthLimit;
        }
        if !seen.insert(hash) {
            return Err(ManifestError::Chain(format!(
                "cycle detected at manifest {}",
                hash
            )));
        }
        match resolver.resolve(&hash) {
            Some(link) => {
                next = link.manifest.parent_hash;
                links.push(link);
            }
            None => break ChainEnd::Unresolved(hash),
        }
    };

    Ok(ProvenanceChain { links, end })
}
