//! Property-based tests for determinism guarantees

use proptest::prelude::*;
use provmark::ignore::IgnoreMatcher;
use provmark::manifest::{canonical_payload, Asset, ManifestBuilder};
use provmark::scan::{aggregate_content_hash, scan_tree, GlobalAggregator, ScanOptions};
use provmark::types::Digest;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn asset_set() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map("[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.txt", any::<Vec<u8>>(), 0..8)
}

fn assets_from(files: &BTreeMap<String, Vec<u8>>) -> Vec<Asset> {
    files
        .iter()
        .map(|(path, bytes)| Asset {
            path: path.clone(),
            raw_hash: Digest::of(bytes),
            logic_hash: None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The streaming aggregator and the slice helper agree.
    #[test]
    fn aggregator_matches_helper(files in asset_set()) {
        let assets = assets_from(&files);
        let mut aggregator = GlobalAggregator::new();
        for asset in &assets {
            aggregator.push(&asset.path, &asset.raw_hash);
        }
        prop_assert_eq!(aggregator.len(), assets.len());
        prop_assert_eq!(aggregator.finish(), aggregate_content_hash(&assets));
    }

    /// Changing any one file's bytes changes the content hash.
    #[test]
    fn content_hash_tracks_every_file(files in asset_set(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!files.is_empty());
        let before = aggregate_content_hash(&assets_from(&files));

        let mut changed = files.clone();
        let key = changed.keys().nth(pick.index(changed.len())).cloned().unwrap();
        changed.get_mut(&key).unwrap().push(0xAA);
        prop_assert_ne!(before, aggregate_content_hash(&assets_from(&changed)));
    }

    /// Builder input order never affects the canonical payload.
    #[test]
    fn payload_ignores_asset_input_order(files in asset_set()) {
        let assets = assets_from(&files);
        let mut reversed = assets.clone();
        reversed.reverse();
        let content_hash = aggregate_content_hash(&assets);

        let build = |assets: Vec<Asset>| {
            ManifestBuilder::new(assets, content_hash)
                .author("bc1qexample", "02ab")
                .timestamp(1_700_000_000)
                .entropy("00")
                .build()
                .unwrap()
        };
        prop_assert_eq!(
            canonical_payload(&build(assets)).unwrap(),
            canonical_payload(&build(reversed)).unwrap()
        );
    }

    /// A child of an ignored directory is ignored too.
    #[test]
    fn ignored_directory_covers_children(dir in "[a-z]{1,8}", child in "[a-z]{1,8}(/[a-z]{1,8}){0,2}") {
        let matcher = IgnoreMatcher::new([dir.clone()]);
        prop_assert!(matcher.is_ignored(&dir));
        let nested = format!("{}/{}", dir, child);
        prop_assert!(matcher.is_ignored(&nested));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Scanning the same files twice gives identical assets and content hash.
    #[test]
    fn scan_is_deterministic(files in asset_set()) {
        let temp = TempDir::new().unwrap();
        for (path, bytes) in &files {
            let full = temp.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(&full, bytes).unwrap();
        }
        let first = scan_tree(temp.path(), ScanOptions::default()).unwrap();
        let second = scan_tree(temp.path(), ScanOptions { parallel: false, ..ScanOptions::default() }).unwrap();
        prop_assert_eq!(&first.assets, &second.assets);
        prop_assert_eq!(first.content_hash, second.content_hash);
        prop_assert_eq!(first.content_hash, aggregate_content_hash(&first.assets));
    }
}
