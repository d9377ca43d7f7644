//! Manifest data model and persistence
//!
//! A manifest is pretty-printed JSON on disk. Its signature covers a separate
//! compact canonical form (see [`canonical`]), so the on-disk layout can be
//! reformatted without invalidating it, while `parent_hash` links pin the
//! exact bytes of the previous file.

pub mod builder;
pub mod canonical;
pub mod chain;

pub use builder::{ContributionProvider, ManifestBuilder, ProofProvider};
pub use canonical::{canonical_payload, payload_digest};
pub use chain::{walk_chain, ChainEnd, ChainLink, ChainResolver, DirectoryChainResolver, ProvenanceChain};

use crate::error::ManifestError;
use crate::types::Digest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest format version written by this build.
pub const MANIFEST_VERSION: &str = "v1";

/// Extension used for manifest files. Always ignored by scans.
pub const MANIFEST_EXTENSION: &str = "pmk";

/// Default manifest file name in a scanned root.
pub const DEFAULT_MANIFEST_FILE: &str = "manifest.pmk";

/// A hashed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Root-relative path with `/` separators.
    pub path: String,
    pub raw_hash: Digest,
    /// Structural fingerprint; only for supported languages that parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_hash: Option<Digest>,
}

/// Per-path contribution metric supplied by a [`ContributionProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionMetric {
    pub count: u64,
    pub score: f64,
}

/// Opaque per-path proof supplied by a [`ProofProvider`], stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CognitiveProof(pub serde_json::Value);

/// Signed provenance statement for a directory tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    /// Address derived from `public_key`.
    pub author: String,
    /// Compressed SEC1 public key, hex.
    pub public_key: String,
    pub content_hash: Digest,
    /// SHA-256 of the previous manifest file's bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<Digest>,
    /// Unix seconds.
    pub timestamp: i64,
    pub entropy_dna: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contribution_map: BTreeMap<String, ContributionMetric>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cognitive_proofs: BTreeMap<String, CognitiveProof>,
    /// DER signature, hex. Empty until signed.
    #[serde(default)]
    pub signature: String,
}

impl Manifest {
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    pub fn asset(&self, path: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.path == path)
    }

    /// Reject manifests that name the same path twice.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::with_capacity(self.assets.len());
        for asset in &self.assets {
            if !seen.insert(asset.path.as_str()) {
                return Err(ManifestError::DuplicateAsset(asset.path.clone()));
            }
        }
        Ok(())
    }

    /// Pretty JSON (two-space indent) with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String, ManifestError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_pretty_json()?;
        fs::write(path, json).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = read_bytes(path)?;
        Self::from_json_bytes(&bytes)
    }
}

/// SHA-256 of a manifest file's exact bytes, the value stored as `parent_hash`.
pub fn file_digest(path: &Path) -> Result<Digest, ManifestError> {
    Ok(Digest::of(&read_bytes(path)?))
}

/// `manifest.pmk`, or `manifest-<tag>.pmk` with spaces in the tag replaced by `_`.
///
/// The result is always a bare file name; tags that could escape the target
/// directory are rejected.
pub fn manifest_file_name(tag: Option<&str>) -> Result<String, ManifestError> {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => {
            if tag.contains('/') || tag.contains('\\') || tag.contains("..") {
                return Err(ManifestError::InvalidTag(tag.to_string()));
            }
            Ok(format!("manifest-{}.{}", tag.replace(' ', "_"), MANIFEST_EXTENSION))
        }
        None => Ok(DEFAULT_MANIFEST_FILE.to_string()),
    }
}

/// Sidecar manifest for a single signed file: `<file>.pmk` next to it.
pub fn file_manifest_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".");
    name.push(MANIFEST_EXTENSION);
    PathBuf::from(name)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ManifestError> {
    fs::read(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
