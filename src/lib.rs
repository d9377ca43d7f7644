//! Provmark: Signed Provenance Manifests
//!
//! Scans a directory tree into a deterministic, content-addressed manifest,
//! fingerprints source files structurally so formatting-only edits still
//! verify, signs the manifest with a secp256k1 author key bound to a Bitcoin
//! style address, and links releases into a provenance chain.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod ignore;
pub mod logging;
pub mod manifest;
pub mod scan;
pub mod signing;
pub mod types;
pub mod verify;

pub use error::{ApiError, CryptoError, ManifestError, ParseError, ScanError};
pub use identity::{Identity, Network, Secp256k1Identity, SecretKey};
pub use manifest::{Asset, Manifest, ManifestBuilder};
pub use scan::{scan_tree, ScanOptions, TreeScan, TreeScanner};
pub use types::Digest;
pub use verify::{verify_manifest, ContentVerdict, VerificationReport};
