//! Content hash aggregation over sorted assets

use crate::manifest::Asset;
use crate::types::Digest;
use sha2::{Digest as _, Sha256};

/// Folds `(path, raw_hash)` pairs into the tree's content hash.
///
/// Each pair contributes the UTF-8 path bytes followed by the 64 lowercase hex
/// characters of the raw hash, with no delimiters. Logic fingerprints never
/// contribute. Callers must push in ascending path order.
#[derive(Default)]
pub struct GlobalAggregator {
    hasher: Sha256,
    count: usize,
}

impl GlobalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: &str, raw_hash: &Digest) {
        self.hasher.update(path.as_bytes());
        self.hasher.update(raw_hash.to_hex().as_bytes());
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finish(self) -> Digest {
        Digest::from_bytes(self.hasher.finalize().into())
    }
}

/// Content hash of path-sorted assets. The empty set hashes to SHA-256("").
pub fn aggregate_content_hash(assets: &[Asset]) -> Digest {
    debug_assert!(
        assets.windows(2).all(|w| w[0].path < w[1].path),
        "assets must be sorted by path and unique"
    );
    let mut aggregator = GlobalAggregator::new();
    for asset in assets {
        aggregator.push(&asset.path, &asset.raw_hash);
    }
    aggregator.finish()
}
