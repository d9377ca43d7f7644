//! Structural (logic) fingerprints for source files
//!
//! A fingerprint is the SHA-256 of a canonical signature string that keeps the
//! shape of a file (package, imports, declarations, control flow, call
//! targets) and drops everything that only affects formatting. Languages plug
//! in through [`LanguageFingerprinter`] and are looked up by file extension, so
//! adding one never touches the hasher, the aggregator or the signer.

pub mod go;
pub mod rust;

use crate::error::ParseError;
use crate::types::Digest;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One language's canonicalization strategy.
pub trait LanguageFingerprinter: Send + Sync {
    /// Language name, used in logs and parse errors.
    fn language(&self) -> &'static str;

    /// Lowercase file extensions (without the dot) handled by this strategy.
    fn extensions(&self) -> &'static [&'static str];

    /// Produce the canonical signature string for `source`.
    fn canonical_signature(&self, source: &str) -> Result<String, ParseError>;
}

/// Extension-indexed table of fingerprinting strategies.
#[derive(Clone, Default)]
pub struct FingerprintRegistry {
    by_extension: HashMap<String, Arc<dyn LanguageFingerprinter>>,
}

impl FingerprintRegistry {
    /// Registry with no languages; every file is treated as non-source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with all built-in languages (Go, Rust).
    pub fn with_builtin_languages() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(go::GoFingerprinter));
        registry.register(Arc::new(rust::RustFingerprinter));
        registry
    }

    /// Register a strategy for each of its extensions, replacing earlier entries.
    pub fn register(&mut self, strategy: Arc<dyn LanguageFingerprinter>) {
        for ext in strategy.extensions() {
            self.by_extension
                .insert(ext.to_ascii_lowercase(), Arc::clone(&strategy));
        }
    }

    pub fn lookup(&self, path: &Path) -> Option<&dyn LanguageFingerprinter> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.by_extension.get(&ext).map(|s| s.as_ref())
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    /// Fingerprint file bytes. `None` when the extension is unsupported.
    pub fn fingerprint(&self, path: &Path, bytes: &[u8]) -> Option<Result<Digest, ParseError>> {
        let strategy = self.lookup(path)?;
        let result = std::str::from_utf8(bytes)
            .map_err(|_| ParseError::InvalidUtf8 {
                language: strategy.language(),
            })
            .and_then(|source| strategy.canonical_signature(source))
            .map(|signature| logic_hash(&signature));
        Some(result)
    }

    /// Sorted list of registered extensions.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl std::fmt::Debug for FingerprintRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

/// Hash a canonical signature string into a logic fingerprint.
pub fn logic_hash(signature: &str) -> Digest {
    Digest::of(signature.as_bytes())
}

/// Builder for canonical signature strings.
///
/// Every entry is `tag:value;`. Type lists are written as `t1,t2,` so an empty
/// list and a single empty type stay distinguishable.
#[derive(Debug, Default)]
pub struct CanonicalWriter {
    out: String,
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, tag: &str, value: &str) {
        self.out.push_str(tag);
        self.out.push(':');
        self.out.push_str(value);
        self.out.push(';');
    }

    /// A bare token, used for body control-flow kinds.
    pub fn token(&mut self, token: &str) {
        self.out.push_str(token);
        self.out.push(';');
    }

    pub fn types<I, S>(&mut self, tag: &str, types: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.out.push_str(tag);
        self.out.push(':');
        for t in types {
            self.out.push_str(t.as_ref());
            self.out.push(',');
        }
        self.out.push(';');
    }

    /// Sorted, order-independent import entries.
    pub fn imports(&mut self, mut imports: Vec<String>) {
        imports.sort();
        for imp in &imports {
            self.entry("imp", imp);
        }
    }

    pub fn open_body(&mut self) {
        self.out.push_str("body:{");
    }

    pub fn close_body(&mut self) {
        self.out.push_str("};");
    }

    pub fn finish(self) -> String {
        self.out
    }
}
