//! Error types for the provenance manifest engine.
//!
//! Each concern gets its own enum so callers can tell a fatal scan failure
//! from a key problem from a malformed manifest. Verification *outcomes*
//! (bad signature, identity mismatch, content divergence) are not errors and
//! live in [`crate::signing`] and [`crate::verify`].

use crate::types::DigestParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal directory-scan errors.
///
/// A single unreadable file is not a `ScanError`; it is reported as a
/// [`crate::scan::SkippedFile`] and the scan continues.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Cannot open scan root {path:?}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan root {0:?} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("Cannot read directory {path:?}: {message}")]
    DirectoryUnreadable { path: PathBuf, message: String },

    #[error("Hashing interrupted at {path:?} after {completed} of {total} files: {source}")]
    Interrupted {
        path: PathBuf,
        completed: usize,
        total: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan cancelled after {completed} of {total} files")]
    Cancelled { completed: usize, total: usize },
}

/// Structural parse failure. Never fatal: the file simply gets no logic hash.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("{language} source has syntax errors: {message}")]
    Syntax {
        language: &'static str,
        message: String,
    },

    #[error("{language} source is not valid UTF-8")]
    InvalidUtf8 { language: &'static str },

    #[error("{language} parser unavailable: {message}")]
    Parser {
        language: &'static str,
        message: String,
    },
}

/// Key material and signing failures.
///
/// Fatal for the signing or verification call that needed the key, but never
/// a statement about content integrity.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Address derivation failed: {0}")]
    Address(String),

    #[error("Key file {path:?} not found")]
    KeyFileMissing { path: PathBuf },

    #[error("Key file {path:?} already exists")]
    KeyFileExists { path: PathBuf },

    #[error("Key file I/O error for {path:?}: {source}")]
    KeyFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Manifest assembly, persistence and parsing errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest I/O error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidDigest(#[from] DigestParseError),

    #[error("Duplicate asset path in manifest: {0}")]
    DuplicateAsset(String),

    #[error("Provenance chain error: {0}")]
    Chain(String),

    #[error("Invalid release tag '{0}': tags must not contain path separators or '..'")]
    InvalidTag(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Top-level error used by configuration, logging and the command line.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Manifest not found at {0:?}. Run `provmark release` first.")]
    ManifestNotFound(PathBuf),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
