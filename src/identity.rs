//! Author identity: secp256k1 keys, ECDSA signatures, P2WPKH addresses
//!
//! Key storage is kept behind [`KeySource`]. The shipped [`HexKeyFile`] keeps
//! the raw secret as hex in a 0600 file; passphrase-protected stores plug in
//! through the same trait.

use crate::error::CryptoError;
use crate::signing::SignatureCheck;
use crate::types::Digest;
use bech32::Hrp;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// A 32-byte secp256k1 secret scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Fresh key from the OS random source.
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        Self(key.to_bytes().into())
    }

    /// Parse 64 hex characters, rejecting values that are not a valid scalar.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(text.trim(), &mut bytes)
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        SigningKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn signing_key(&self) -> Result<SigningKey, CryptoError> {
        SigningKey::from_slice(&self.0).map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Signature scheme plus address derivation for manifest authors.
pub trait Identity: Send + Sync {
    /// Hex public key corresponding to `secret`.
    fn public_key(&self, secret: &SecretKey) -> Result<String, CryptoError>;

    /// Sign a 32-byte digest. Returns the hex signature encoding.
    fn sign(&self, digest: &Digest, secret: &SecretKey) -> Result<String, CryptoError>;

    /// Check a hex signature. Malformed signatures are an outcome, malformed
    /// public keys are an error.
    fn verify(
        &self,
        digest: &Digest,
        signature: &str,
        public_key: &str,
    ) -> Result<SignatureCheck, CryptoError>;

    fn derive_address(&self, public_key: &str) -> Result<String, CryptoError>;
}

/// Address network; selects the bech32 human-readable part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Network implied by an address's human-readable part.
    pub fn from_address(address: &str) -> Option<Self> {
        let lower = address.to_ascii_lowercase();
        if lower.starts_with("bc1") {
            Some(Network::Mainnet)
        } else if lower.starts_with("tb1") {
            Some(Network::Testnet)
        } else {
            None
        }
    }

    fn hrp(self) -> Hrp {
        match self {
            Network::Mainnet => bech32::hrp::BC,
            Network::Testnet => bech32::hrp::TB,
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "bc" => Ok(Network::Mainnet),
            "testnet" | "tb" => Ok(Network::Testnet),
            other => Err(format!("unknown network '{}': use mainnet or testnet", other)),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

/// ECDSA over secp256k1 with RFC 6979 nonces, low-S, DER signatures, and
/// bech32 segwit v0 (P2WPKH) addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Identity {
    network: Network,
}

impl Secp256k1Identity {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    fn parse_public_key(public_key: &str) -> Result<VerifyingKey, CryptoError> {
        let bytes =
            hex::decode(public_key.trim()).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

impl Identity for Secp256k1Identity {
    fn public_key(&self, secret: &SecretKey) -> Result<String, CryptoError> {
        let key = secret.signing_key()?;
        Ok(hex::encode(key.verifying_key().to_encoded_point(true).as_bytes()))
    }

    fn sign(&self, digest: &Digest, secret: &SecretKey) -> Result<String, CryptoError> {
        let key = secret.signing_key()?;
        let signature: Signature = key
            .sign_prehash(digest.as_bytes())
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(hex::encode(signature.to_der().as_bytes()))
    }

    fn verify(
        &self,
        digest: &Digest,
        signature: &str,
        public_key: &str,
    ) -> Result<SignatureCheck, CryptoError> {
        let key = Self::parse_public_key(public_key)?;
        let Ok(der) = hex::decode(signature.trim()) else {
            return Ok(SignatureCheck::Malformed);
        };
        let Ok(signature) = Signature::from_der(&der) else {
            return Ok(SignatureCheck::Malformed);
        };
        Ok(match key.verify_prehash(digest.as_bytes(), &signature) {
            Ok(()) => SignatureCheck::Valid,
            Err(_) => SignatureCheck::Invalid,
        })
    }

    fn derive_address(&self, public_key: &str) -> Result<String, CryptoError> {
        let key = Self::parse_public_key(public_key)?;
        let compressed = key.to_encoded_point(true);
        let program = hash160(compressed.as_bytes());
        bech32::segwit::encode_v0(self.network.hrp(), &program)
            .map_err(|e| CryptoError::Address(e.to_string()))
    }
}

/// Produces the author's signing key.
pub trait KeySource {
    fn load_secret(&self) -> Result<SecretKey, CryptoError>;

    /// Human-readable origin, for logs and error messages.
    fn describe(&self) -> String;
}

impl KeySource for SecretKey {
    fn load_secret(&self) -> Result<SecretKey, CryptoError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "in-memory key".to_string()
    }
}

/// A file holding the secret key as 64 hex characters.
#[derive(Debug, Clone)]
pub struct HexKeyFile {
    path: PathBuf,
}

impl HexKeyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Generate a key and write it. Refuses to overwrite unless `force`.
    pub fn generate(&self, force: bool) -> Result<SecretKey, CryptoError> {
        let secret = SecretKey::generate();
        self.save(&secret, force)?;
        Ok(secret)
    }

    /// Write `secret`, creating parent directories. Mode 0600 on Unix.
    pub fn save(&self, secret: &SecretKey, force: bool) -> Result<(), CryptoError> {
        if self.exists() && !force {
            return Err(CryptoError::KeyFileExists {
                path: self.path.clone(),
            });
        }
        let io_err = |source| CryptoError::KeyFileIo {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(io_err)?;
        writeln!(file, "{}", secret.to_hex()).map_err(io_err)?;
        info!(path = %self.path.display(), "Wrote key file");
        Ok(())
    }
}

impl KeySource for HexKeyFile {
    fn load_secret(&self) -> Result<SecretKey, CryptoError> {
        if !self.exists() {
            return Err(CryptoError::KeyFileMissing {
                path: self.path.clone(),
            });
        }
        let text = fs::read_to_string(&self.path).map_err(|source| CryptoError::KeyFileIo {
            path: self.path.clone(),
            source,
        })?;
        SecretKey::from_hex(&text)
    }

    fn describe(&self) -> String {
        format!("key file {}", self.path.display())
    }
}
