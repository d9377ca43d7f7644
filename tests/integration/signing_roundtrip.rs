//! Sign, persist, reload and verify manifests

use super::test_utils::{signed_manifest, write_files};
use provmark::identity::{Identity, Network, Secp256k1Identity, SecretKey};
use provmark::manifest::{canonical_payload, ContributionMetric, Manifest, ManifestBuilder};
use provmark::scan::{scan_tree, ScanOptions};
use provmark::signing::{
    sign_manifest, verify_authorship, verify_embedded_authorship, IdentityCheck, SignatureCheck,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn sample() -> (TempDir, Manifest, SecretKey) {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("a.txt", "hello"), ("src/lib.rs", "pub fn f() {}\n")]);
    let scan = scan_tree(temp.path(), ScanOptions::default()).unwrap();
    let (manifest, secret) = signed_manifest(&scan, Network::Mainnet);
    (temp, manifest, secret)
}

#[test]
fn test_saved_manifest_verifies_after_reload() {
    let (temp, manifest, _) = sample();
    let path = temp.path().join("manifest.pmk");
    manifest.save(&path).unwrap();

    let loaded = Manifest::load(&path).unwrap();
    assert_eq!(loaded, manifest);
    assert_eq!(
        canonical_payload(&loaded).unwrap(),
        canonical_payload(&manifest).unwrap()
    );

    let report =
        verify_embedded_authorship(&loaded, &Secp256k1Identity::new(Network::Mainnet)).unwrap();
    assert!(report.is_authentic());
    assert!(loaded.author.starts_with("bc1q"));
}

#[test]
fn test_edited_file_on_disk_breaks_signature() {
    let (temp, manifest, _) = sample();
    let path = temp.path().join("manifest.pmk");
    manifest.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let tampered = text.replacen("\"a.txt\"", "\"A.txt\"", 1);
    assert_ne!(text, tampered);
    std::fs::write(&path, tampered).unwrap();

    let loaded = Manifest::load(&path).unwrap();
    let report =
        verify_embedded_authorship(&loaded, &Secp256k1Identity::new(Network::Mainnet)).unwrap();
    assert_eq!(report.signature, SignatureCheck::Invalid);
    assert!(!report.is_authentic());
}

#[test]
fn test_other_key_cannot_claim_authorship() {
    let (_temp, manifest, _) = sample();
    let identity = Secp256k1Identity::new(Network::Mainnet);
    let other = identity.public_key(&SecretKey::generate()).unwrap();

    let report = verify_authorship(&manifest, &identity, &other).unwrap();
    assert_eq!(report.signature, SignatureCheck::Invalid);
    assert!(matches!(report.identity, IdentityCheck::Mismatch { .. }));
}

#[test]
fn test_network_mismatch_is_identity_failure() {
    let (_temp, manifest, _) = sample();
    let report =
        verify_embedded_authorship(&manifest, &Secp256k1Identity::new(Network::Testnet)).unwrap();
    assert_eq!(report.signature, SignatureCheck::Valid);
    assert!(matches!(report.identity, IdentityCheck::Mismatch { .. }));
}

#[test]
fn test_fractional_contribution_score_survives_reload() {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[("a.txt", "hello")]);
    let scan = scan_tree(temp.path(), ScanOptions::default()).unwrap();

    // 50/49: the shortest decimal form needs all 17 significant digits.
    let score = 1.0204081632653061_f64;
    let mut metrics = BTreeMap::new();
    metrics.insert("a.txt".to_string(), ContributionMetric { count: 1, score });

    let identity = Secp256k1Identity::new(Network::Mainnet);
    let secret = SecretKey::generate();
    let public_key = identity.public_key(&secret).unwrap();
    let author = identity.derive_address(&public_key).unwrap();
    let mut manifest = ManifestBuilder::from_scan(&scan)
        .author(author, public_key)
        .contributions(&metrics)
        .build()
        .unwrap();
    sign_manifest(&mut manifest, &identity, &secret).unwrap();

    let path = temp.path().join("manifest.pmk");
    manifest.save(&path).unwrap();
    let loaded = Manifest::load(&path).unwrap();

    assert_eq!(loaded.contribution_map["a.txt"].score.to_bits(), score.to_bits());
    assert_eq!(
        canonical_payload(&loaded).unwrap(),
        canonical_payload(&manifest).unwrap()
    );
    let report = verify_embedded_authorship(&loaded, &identity).unwrap();
    assert_eq!(report.signature, SignatureCheck::Valid);
}
