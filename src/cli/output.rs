//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, CryptoError, ManifestError};

/// Map domain/service errors to a string for CLI output, with a hint where
/// the fix is a known command.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Crypto(CryptoError::KeyFileMissing { .. })
        | ApiError::Manifest(ManifestError::Crypto(CryptoError::KeyFileMissing { .. })) => {
            format!("{}\nhint: run `provmark keygen` to create one", e)
        }
        ApiError::Crypto(CryptoError::KeyFileExists { .. }) => {
            format!("{}\nhint: pass --force to replace it", e)
        }
        _ => e.to_string(),
    }
}
