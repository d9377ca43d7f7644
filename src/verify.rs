//! Two-tier content verification
//!
//! Strict: the rescanned content hash equals the manifest's. Fuzzy: every
//! fingerprinted source file still has the fingerprint the manifest recorded.
//! Fuzzy mode does not raw-check non-source files.

use crate::error::{ManifestError, ScanError};
use crate::identity::Identity;
use crate::manifest::{Asset, Manifest};
use crate::scan::{TreeScan, TreeScanner};
use crate::signing::{verify_authorship, AuthorshipReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceReason {
    /// In the manifest, not on disk.
    Missing,
    /// On disk, not in the manifest.
    New,
    /// Structural fingerprint differs or disappeared.
    LogicChanged,
    /// Raw bytes differ; reported only when no structural comparison was possible.
    ContentChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub path: String,
    pub reason: DivergenceReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ContentVerdict {
    StrictOk,
    FuzzyOk { compared: usize },
    Fail { divergences: Vec<Divergence> },
}

impl ContentVerdict {
    pub fn is_ok(&self) -> bool {
        !matches!(self, ContentVerdict::Fail { .. })
    }
}

/// Compare a fresh scan with a manifest.
pub fn compare_content(manifest: &Manifest, scan: &TreeScan) -> ContentVerdict {
    if scan.content_hash == manifest.content_hash {
        return ContentVerdict::StrictOk;
    }

    let recorded: BTreeMap<&str, &Asset> =
        manifest.assets.iter().map(|a| (a.path.as_str(), a)).collect();
    let current: BTreeMap<&str, &Asset> = scan.assets.iter().map(|a| (a.path.as_str(), a)).collect();

    let mut divergences = Vec::new();
    let mut compared = 0usize;

    for (path, asset) in &current {
        let Some(logic) = asset.logic_hash else {
            continue;
        };
        match recorded.get(path) {
            None => divergences.push(divergence(path, DivergenceReason::New)),
            Some(old) if old.logic_hash == Some(logic) => compared += 1,
            Some(_) => divergences.push(divergence(path, DivergenceReason::LogicChanged)),
        }
    }

    for (path, old) in &recorded {
        if old.logic_hash.is_none() {
            continue;
        }
        match current.get(path) {
            None => divergences.push(divergence(path, DivergenceReason::Missing)),
            Some(now) if now.logic_hash.is_none() => {
                divergences.push(divergence(path, DivergenceReason::LogicChanged))
            }
            Some(_) => {}
        }
    }

    if divergences.is_empty() && compared > 0 {
        return ContentVerdict::FuzzyOk { compared };
    }

    if divergences.is_empty() {
        divergences = raw_divergences(&recorded, &current);
    }
    divergences.sort_by(|a, b| a.path.cmp(&b.path).then(a.reason.cmp(&b.reason)));
    ContentVerdict::Fail { divergences }
}

fn divergence(path: &str, reason: DivergenceReason) -> Divergence {
    Divergence {
        path: path.to_string(),
        reason,
    }
}

fn raw_divergences(
    recorded: &BTreeMap<&str, &Asset>,
    current: &BTreeMap<&str, &Asset>,
) -> Vec<Divergence> {
    let mut out = Vec::new();
    for (path, old) in recorded {
        match current.get(path) {
            None => out.push(divergence(path, DivergenceReason::Missing)),
            Some(now) if now.raw_hash != old.raw_hash => {
                out.push(divergence(path, DivergenceReason::ContentChanged))
            }
            Some(_) => {}
        }
    }
    for path in current.keys() {
        if !recorded.contains_key(path) {
            out.push(divergence(path, DivergenceReason::New));
        }
    }
    out
}

/// Rescan `root` and compare it with `manifest`.
pub fn verify_content(
    manifest: &Manifest,
    root: &Path,
    scanner: &TreeScanner,
) -> Result<ContentVerdict, ScanError> {
    let scan = scanner.scan(root)?;
    let verdict = compare_content(manifest, &scan);
    match &verdict {
        ContentVerdict::StrictOk => info!(root = %root.display(), "Content matches exactly"),
        ContentVerdict::FuzzyOk { compared } => {
            info!(root = %root.display(), compared, "Content matches structurally")
        }
        ContentVerdict::Fail { divergences } => {
            warn!(root = %root.display(), divergences = divergences.len(), "Content verification failed")
        }
    }
    Ok(verdict)
}

/// Authorship and content checks for one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub authorship: AuthorshipReport,
    pub content: ContentVerdict,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.authorship.is_authentic() && self.content.is_ok()
    }
}

/// Full verification against the manifest's embedded public key.
pub fn verify_manifest(
    manifest: &Manifest,
    root: &Path,
    identity: &dyn Identity,
    scanner: &TreeScanner,
) -> Result<VerificationReport, ManifestError> {
    let authorship = verify_authorship(manifest, identity, &manifest.public_key)?;
    let content = verify_content(manifest, root, scanner)?;
    Ok(VerificationReport {
        authorship,
        content,
    })
}
