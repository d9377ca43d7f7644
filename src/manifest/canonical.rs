//! Frozen canonical payload
//!
//! The signed bytes are compact JSON with a fixed key order and every empty
//! optional left out. Changing anything here breaks every existing signature.

use super::{Asset, CognitiveProof, ContributionMetric, Manifest};
use crate::error::ManifestError;
use crate::types::Digest;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct CanonicalPayload<'a> {
    version: &'a str,
    author: &'a str,
    public_key: &'a str,
    content_hash: &'a Digest,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_hash: Option<&'a Digest>,
    timestamp: i64,
    entropy_dna: &'a str,
    #[serde(skip_serializing_if = "no_assets")]
    assets: &'a [Asset],
    #[serde(skip_serializing_if = "empty_map")]
    contribution_map: &'a BTreeMap<String, ContributionMetric>,
    #[serde(skip_serializing_if = "empty_map")]
    cognitive_proofs: &'a BTreeMap<String, CognitiveProof>,
}

fn no_assets(assets: &&[Asset]) -> bool {
    assets.is_empty()
}

fn empty_map<V>(map: &&BTreeMap<String, V>) -> bool {
    map.is_empty()
}

/// Compact canonical JSON of everything except `signature`.
pub fn canonical_payload(manifest: &Manifest) -> Result<Vec<u8>, ManifestError> {
    let payload = CanonicalPayload {
        version: &manifest.version,
        author: &manifest.author,
        public_key: &manifest.public_key,
        content_hash: &manifest.content_hash,
        parent_hash: manifest.parent_hash.as_ref(),
        timestamp: manifest.timestamp,
        entropy_dna: &manifest.entropy_dna,
        assets: &manifest.assets,
        contribution_map: &manifest.contribution_map,
        cognitive_proofs: &manifest.cognitive_proofs,
    };
    Ok(serde_json::to_vec(&payload)?)
}

/// SHA-256 of the canonical payload; the value that gets signed.
pub fn payload_digest(manifest: &Manifest) -> Result<Digest, ManifestError> {
    Ok(Digest::of(&canonical_payload(manifest)?))
}
