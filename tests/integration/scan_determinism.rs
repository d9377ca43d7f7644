//! Scan ordering, hashing and content hash aggregation

use super::test_utils::write_files;
use provmark::scan::{scan_tree, ScanOptions};
use provmark::types::Digest;
use sha2::{Digest as _, Sha256};
use tempfile::TempDir;

#[test]
fn test_two_file_tree_matches_known_hashes() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("b.txt", "world"), ("a.txt", "hello")]);

    let scan = scan_tree(temp.path(), ScanOptions::default()).unwrap();
    let paths: Vec<&str> = scan.assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt", "b.txt"]);
    assert_eq!(
        scan.assets[0].raw_hash.to_hex(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(scan.assets[1].raw_hash, Digest::of(b"world"));
    assert!(scan.assets.iter().all(|a| a.logic_hash.is_none()));

    let mut hasher = Sha256::new();
    hasher.update(b"a.txt");
    hasher.update(Digest::of(b"hello").to_hex().as_bytes());
    hasher.update(b"b.txt");
    hasher.update(Digest::of(b"world").to_hex().as_bytes());
    let expected: [u8; 32] = hasher.finalize().into();
    assert_eq!(scan.content_hash, Digest::from(expected));
}

#[test]
fn test_scan_is_repeatable_and_order_independent() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let files = [
        ("src/main.go", "package main\n\nfunc main() {}\n"),
        ("docs/readme.md", "# hi\n"),
        ("z.txt", "z"),
        ("a/b/c.txt", "deep"),
    ];
    write_files(first.path(), &files);
    let mut reversed = files;
    reversed.reverse();
    write_files(second.path(), &reversed);

    let one = scan_tree(first.path(), ScanOptions::default()).unwrap();
    let two = scan_tree(second.path(), ScanOptions::default()).unwrap();
    let again = scan_tree(first.path(), ScanOptions::default()).unwrap();

    assert_eq!(one.assets, two.assets);
    assert_eq!(one.content_hash, two.content_hash);
    assert_eq!(one.content_hash, again.content_hash);
    assert!(one.asset("src/main.go").unwrap().logic_hash.is_some());
}

#[test]
fn test_sequential_and_parallel_agree() {
    let temp = TempDir::new().unwrap();
    for i in 0..40 {
        write_files(temp.path(), &[(&format!("dir{}/file{}.txt", i % 5, i), "x")]);
    }
    let parallel = scan_tree(temp.path(), ScanOptions::default()).unwrap();
    let sequential = scan_tree(
        temp.path(),
        ScanOptions {
            parallel: false,
            ..ScanOptions::default()
        },
    )
    .unwrap();
    assert_eq!(parallel.assets.len(), 40);
    assert_eq!(parallel.content_hash, sequential.content_hash);
}

#[test]
fn test_ignore_rules_change_what_is_hashed() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[
            ("keep.txt", "k"),
            ("build/out.bin", "o"),
            ("notes.log", "l"),
            (".git/HEAD", "ref"),
            ("node_modules/x/index.js", "js"),
            ("manifest.pmk", "{}"),
            (".provmarkignore", "# generated\nbuild\n*.log\n"),
        ],
    );

    let scan = scan_tree(temp.path(), ScanOptions::default()).unwrap();
    let paths: Vec<&str> = scan.assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, vec!["keep.txt"]);

    let extra = scan_tree(
        temp.path(),
        ScanOptions {
            extra_ignore: vec!["keep.txt".to_string()],
            ..ScanOptions::default()
        },
    )
    .unwrap();
    assert!(extra.assets.is_empty());
    assert_eq!(extra.content_hash, Digest::of(b""));
}

#[test]
fn test_empty_tree_hashes_to_empty_digest() {
    let temp = TempDir::new().unwrap();
    let scan = scan_tree(temp.path(), ScanOptions::default()).unwrap();
    assert!(scan.assets.is_empty());
    assert_eq!(scan.content_hash, Digest::of(b""));
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let result = scan_tree(&temp.path().join("absent"), ScanOptions::default());
    assert!(result.is_err());
}
