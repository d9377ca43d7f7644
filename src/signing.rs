//! Manifest signing and authorship verification

use crate::error::{CryptoError, ManifestError};
use crate::identity::{Identity, KeySource};
use crate::manifest::{payload_digest, Manifest};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of checking the stored signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureCheck {
    Valid,
    Invalid,
    /// The stored signature is not parseable (bad hex or DER).
    Malformed,
}

/// Outcome of checking that the public key derives the claimed author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityCheck {
    Bound,
    Mismatch { derived: String, claimed: String },
}

/// Both authorship checks; callers may act on either independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorshipReport {
    pub identity: IdentityCheck,
    pub signature: SignatureCheck,
}

impl AuthorshipReport {
    pub fn is_authentic(&self) -> bool {
        self.identity == IdentityCheck::Bound && self.signature == SignatureCheck::Valid
    }
}

/// Sign `manifest` in place with the key from `keys`.
///
/// The manifest's `public_key` must belong to the signing key; a mismatch is
/// refused rather than producing a manifest that can never verify.
pub fn sign_manifest(
    manifest: &mut Manifest,
    identity: &dyn Identity,
    keys: &dyn KeySource,
) -> Result<(), ManifestError> {
    let secret = keys.load_secret()?;
    let public_key = identity.public_key(&secret)?;
    if !manifest.public_key.eq_ignore_ascii_case(&public_key) {
        return Err(CryptoError::Signing(format!(
            "manifest public key {} does not belong to {}",
            manifest.public_key,
            keys.describe()
        ))
        .into());
    }

    let digest = payload_digest(manifest)?;
    manifest.signature = identity.sign(&digest, &secret)?;
    info!(
        author = %manifest.author,
        payload = %digest.short(),
        assets = manifest.assets.len(),
        "Signed manifest"
    );
    Ok(())
}

/// Check the signature against `public_key` and that `public_key` derives
/// the manifest's `author`.
pub fn verify_authorship(
    manifest: &Manifest,
    identity: &dyn Identity,
    public_key: &str,
) -> Result<AuthorshipReport, ManifestError> {
    let digest = payload_digest(manifest)?;
    let signature = identity.verify(&digest, &manifest.signature, public_key)?;

    let derived = identity.derive_address(public_key)?;
    let identity_check = if derived == manifest.author {
        IdentityCheck::Bound
    } else {
        IdentityCheck::Mismatch {
            derived,
            claimed: manifest.author.clone(),
        }
    };

    let report = AuthorshipReport {
        identity: identity_check,
        signature,
    };
    if report.is_authentic() {
        info!(author = %manifest.author, "Authorship verified");
    } else {
        warn!(author = %manifest.author, ?report, "Authorship check failed");
    }
    Ok(report)
}

/// [`verify_authorship`] using the public key embedded in the manifest.
pub fn verify_embedded_authorship(
    manifest: &Manifest,
    identity: &dyn Identity,
) -> Result<AuthorshipReport, ManifestError> {
    verify_authorship(manifest, identity, &manifest.public_key)
}
