//! Manifest assembly

use super::{
    file_digest, Asset, CognitiveProof, ContributionMetric, Manifest, MANIFEST_VERSION,
};
use crate::error::ManifestError;
use crate::scan::TreeScan;
use crate::types::Digest;
use rand::RngCore;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Supplies a contribution metric for an asset path.
pub trait ContributionProvider {
    fn metric_for(&self, path: &str) -> Option<ContributionMetric>;
}

/// Supplies an opaque proof for an asset path.
pub trait ProofProvider {
    fn proof_for(&self, path: &str) -> Option<CognitiveProof>;
}

impl ContributionProvider for BTreeMap<String, ContributionMetric> {
    fn metric_for(&self, path: &str) -> Option<ContributionMetric> {
        self.get(path).copied()
    }
}

impl ProofProvider for BTreeMap<String, CognitiveProof> {
    fn proof_for(&self, path: &str) -> Option<CognitiveProof> {
        self.get(path).cloned()
    }
}

/// Hex of 32 random bytes, the default `entropy_dna`.
pub fn generate_entropy() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Assembles an unsigned [`Manifest`].
///
/// Unset timestamp and entropy default to "now" and fresh random bytes.
pub struct ManifestBuilder<'a> {
    assets: Vec<Asset>,
    content_hash: Digest,
    author: String,
    public_key: String,
    version: String,
    parent_hash: Option<Digest>,
    timestamp: Option<i64>,
    entropy_dna: Option<String>,
    contributions: Option<&'a dyn ContributionProvider>,
    proofs: Option<&'a dyn ProofProvider>,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(assets: Vec<Asset>, content_hash: Digest) -> Self {
        Self {
            assets,
            content_hash,
            author: String::new(),
            public_key: String::new(),
            version: MANIFEST_VERSION.to_string(),
            parent_hash: None,
            timestamp: None,
            entropy_dna: None,
            contributions: None,
            proofs: None,
        }
    }

    pub fn from_scan(scan: &TreeScan) -> Self {
        Self::new(scan.assets.clone(), scan.content_hash)
    }

    /// Single-file manifest: no assets, `content_hash` is the file's raw SHA-256.
    pub fn for_file(path: &Path) -> Result<Self, ManifestError> {
        Ok(Self::new(Vec::new(), file_digest(path)?))
    }

    /// Author address and the hex public key it was derived from.
    pub fn author(mut self, address: impl Into<String>, public_key: impl Into<String>) -> Self {
        self.author = address.into();
        self.public_key = public_key.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn parent_hash(mut self, parent: Option<Digest>) -> Self {
        self.parent_hash = parent;
        self
    }

    /// Link to the previous manifest file by hashing its bytes.
    pub fn link_parent_file(mut self, path: &Path) -> Result<Self, ManifestError> {
        let digest = file_digest(path)?;
        debug!(parent = %path.display(), hash = %digest.short(), "Linked parent manifest");
        self.parent_hash = Some(digest);
        Ok(self)
    }

    pub fn timestamp(mut self, unix_seconds: i64) -> Self {
        self.timestamp = Some(unix_seconds);
        self
    }

    pub fn entropy(mut self, entropy_dna: impl Into<String>) -> Self {
        self.entropy_dna = Some(entropy_dna.into());
        self
    }

    pub fn contributions(mut self, provider: &'a dyn ContributionProvider) -> Self {
        self.contributions = Some(provider);
        self
    }

    pub fn proofs(mut self, provider: &'a dyn ProofProvider) -> Self {
        self.proofs = Some(provider);
        self
    }

    pub fn build(self) -> Result<Manifest, ManifestError> {
        let mut assets = self.assets;
        assets.sort_by(|a, b| a.path.cmp(&b.path));
        if let Some(dup) = assets.windows(2).find(|w| w[0].path == w[1].path) {
            return Err(ManifestError::DuplicateAsset(dup[0].path.clone()));
        }

        let mut contribution_map = BTreeMap::new();
        let mut cognitive_proofs = BTreeMap::new();
        for asset in &assets {
            if let Some(metric) = self.contributions.and_then(|p| p.metric_for(&asset.path)) {
                contribution_map.insert(asset.path.clone(), metric);
            }
            if let Some(proof) = self.proofs.and_then(|p| p.proof_for(&asset.path)) {
                cognitive_proofs.insert(asset.path.clone(), proof);
            }
        }

        Ok(Manifest {
            version: self.version,
            author: self.author,
            public_key: self.public_key,
            content_hash: self.content_hash,
            parent_hash: self.parent_hash,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            entropy_dna: self.entropy_dna.unwrap_or_else(generate_entropy),
            assets,
            contribution_map,
            cognitive_proofs,
            signature: String::new(),
        })
    }
}
