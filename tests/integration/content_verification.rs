//! Strict and fuzzy verification against real trees

use super::test_utils::{signed_manifest, write_files};
use provmark::fingerprint::FingerprintRegistry;
use provmark::identity::{Network, Secp256k1Identity};
use provmark::scan::{scan_tree, ScanOptions, TreeScanner};
use provmark::verify::{verify_content, verify_manifest, ContentVerdict, Divergence, DivergenceReason};
use std::fs;
use tempfile::TempDir;

const HANDLER: &str = "package api\n\nimport \"net/http\"\n\nfunc Handle(w http.ResponseWriter, r *http.Request) {\n\tw.WriteHeader(200)\n}\n";
const HANDLER_REFORMATTED: &str = "package api\n\nimport \"net/http\"\n\n// Handle answers every request.\nfunc Handle(w http.ResponseWriter, r *http.Request) { w.WriteHeader(204) }\n";
const UTIL: &str = "package api\n\nfunc double(x int) int {\n\treturn x * 2\n}\n";

fn scanner() -> TreeScanner {
    TreeScanner::new(FingerprintRegistry::with_builtin_languages())
}

fn release(root: &std::path::Path) -> provmark::Manifest {
    let scan = scan_tree(root, ScanOptions::default()).unwrap();
    signed_manifest(&scan, Network::Mainnet).0
}

#[test]
fn test_untouched_tree_is_strict_ok() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("api/handler.go", HANDLER), ("README.md", "docs")]);
    let manifest = release(temp.path());

    let report = verify_manifest(
        &manifest,
        temp.path(),
        &Secp256k1Identity::new(Network::Mainnet),
        &scanner(),
    )
    .unwrap();
    assert!(report.is_ok());
    assert_eq!(report.content, ContentVerdict::StrictOk);
}

#[test]
fn test_reformatted_source_is_fuzzy_ok() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[("api/handler.go", HANDLER), ("api/util.go", UTIL), ("README.md", "docs")],
    );
    let manifest = release(temp.path());

    fs::write(temp.path().join("api/handler.go"), HANDLER_REFORMATTED).unwrap();
    let verdict = verify_content(&manifest, temp.path(), &scanner()).unwrap();
    assert_eq!(verdict, ContentVerdict::FuzzyOk { compared: 2 });
}

#[test]
fn test_fuzzy_mode_does_not_check_plain_files() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("api/handler.go", HANDLER), ("README.md", "docs")]);
    let manifest = release(temp.path());

    fs::write(temp.path().join("README.md"), "rewritten docs").unwrap();
    let verdict = verify_content(&manifest, temp.path(), &scanner()).unwrap();
    assert_eq!(verdict, ContentVerdict::FuzzyOk { compared: 1 });
}

#[test]
fn test_logic_change_fails() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("api/handler.go", HANDLER), ("api/util.go", UTIL)]);
    let manifest = release(temp.path());

    fs::write(
        temp.path().join("api/util.go"),
        "package api\n\nfunc double(x int) int {\n\treturn add(x, x)\n}\n",
    )
    .unwrap();
    let verdict = verify_content(&manifest, temp.path(), &scanner()).unwrap();
    assert_eq!(
        verdict,
        ContentVerdict::Fail {
            divergences: vec![Divergence {
                path: "api/util.go".to_string(),
                reason: DivergenceReason::LogicChanged,
            }]
        }
    );
}

#[test]
fn test_added_and_removed_sources_fail() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("api/handler.go", HANDLER), ("api/util.go", UTIL)]);
    let manifest = release(temp.path());

    fs::remove_file(temp.path().join("api/util.go")).unwrap();
    write_files(temp.path(), &[("api/extra.go", UTIL)]);
    let verdict = verify_content(&manifest, temp.path(), &scanner()).unwrap();
    let ContentVerdict::Fail { divergences } = verdict else {
        panic!("expected failure, got {:?}", verdict);
    };
    assert_eq!(
        divergences,
        vec![
            Divergence {
                path: "api/extra.go".to_string(),
                reason: DivergenceReason::New,
            },
            Divergence {
                path: "api/util.go".to_string(),
                reason: DivergenceReason::Missing,
            },
        ]
    );
}

#[test]
fn test_plain_tree_change_reports_raw_divergence() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("a.txt", "hello"), ("b.txt", "world")]);
    let manifest = release(temp.path());

    fs::write(temp.path().join("b.txt"), "changed").unwrap();
    let verdict = verify_content(&manifest, temp.path(), &scanner()).unwrap();
    assert_eq!(
        verdict,
        ContentVerdict::Fail {
            divergences: vec![Divergence {
                path: "b.txt".to_string(),
                reason: DivergenceReason::ContentChanged,
            }]
        }
    );
}
