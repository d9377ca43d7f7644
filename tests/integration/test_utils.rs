//! Shared test utilities for integration tests
//!
//! Config discovery reads process-wide environment variables, so every test
//! that touches them goes through one mutex.

use provmark::identity::{Identity, Network, Secp256k1Identity, SecretKey};
use provmark::manifest::{Manifest, ManifestBuilder};
use provmark::scan::TreeScan;
use provmark::signing::sign_manifest;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variables the config loader reads.
const TRACKED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "PROVMARK_KEY_PATH",
    "PROVMARK__SCAN__PARALLEL",
    "PROVMARK__MANIFEST__VERSION",
];

struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            TRACKED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with `XDG_CONFIG_HOME` and `HOME` pointing into `test_dir`,
/// provmark env overrides cleared, and the original environment restored
/// afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let state = EnvState::capture();

    let config_home = test_dir.path().join("xdg");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&home).unwrap();

    for name in TRACKED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    state.restore();
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Write `files` (relative path, contents) under `root`, creating parents.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

/// Build and sign a manifest for `scan` with a fresh key.
pub fn signed_manifest(scan: &TreeScan, network: Network) -> (Manifest, SecretKey) {
    let identity = Secp256k1Identity::new(network);
    let secret = SecretKey::generate();
    let public_key = identity.public_key(&secret).unwrap();
    let author = identity.derive_address(&public_key).unwrap();
    let mut manifest = ManifestBuilder::from_scan(scan)
        .author(author, public_key)
        .build()
        .unwrap();
    sign_manifest(&mut manifest, &identity, &secret).unwrap();
    (manifest, secret)
}
