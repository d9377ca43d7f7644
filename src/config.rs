//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, the workspace
//! file, then environment overrides. An explicit `--config` file replaces
//! file discovery but still sits under the environment layer.

use crate::error::ApiError;
use crate::identity::Network;
use crate::logging::LoggingConfig;
use crate::manifest::{DEFAULT_MANIFEST_FILE, MANIFEST_EXTENSION, MANIFEST_VERSION};
use crate::scan::ScanOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

pub use sources::environment::KEY_PATH_ENV;
pub use sources::global_file::{global_config_dir, global_config_path};
pub use sources::workspace_file::{workspace_config_path, WORKSPACE_DIR};

/// Default key file name under the global config directory.
pub const DEFAULT_KEY_FILE: &str = "author.key";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvmarkConfig {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Author key location and address network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Hex key file; defaults to `<global config dir>/author.key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,

    #[serde(default)]
    pub network: Network,
}

impl IdentityConfig {
    /// Configured key path, or the default under the global config directory.
    pub fn resolve_key_path(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.key_path {
            return Ok(path.clone());
        }
        global_config_dir()
            .map(|dir| dir.join(DEFAULT_KEY_FILE))
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "Cannot locate a home directory; set identity.key_path or {}",
                    KEY_PATH_ENV
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Patterns added to `.provmarkignore` and the built-in defaults
    #[serde(default)]
    pub extra_ignore: Vec<String>,

    /// Hash files on a thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extra_ignore: Vec::new(),
            parallel: true,
        }
    }
}

impl ScanConfig {
    pub fn to_options(&self) -> ScanOptions {
        ScanOptions {
            extra_ignore: self.extra_ignore.clone(),
            parallel: self.parallel,
            ..ScanOptions::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Untagged manifest file name, written to the workspace root
    #[serde(default = "default_file_name")]
    pub file_name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

fn default_file_name() -> String {
    DEFAULT_MANIFEST_FILE.to_string()
}

fn default_version() -> String {
    MANIFEST_VERSION.to_string()
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            version: default_version(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Identity(String),
    Scan(String),
    Manifest(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Identity(msg) => write!(f, "identity: {}", msg),
            ValidationError::Scan(msg) => write!(f, "scan: {}", msg),
            ValidationError::Manifest(msg) => write!(f, "manifest: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ProvmarkConfig {
    /// Validate the entire configuration, reporting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(path) = &self.identity.key_path {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Identity("key_path cannot be empty".to_string()));
            }
        }

        for pattern in &self.scan.extra_ignore {
            if pattern.trim().is_empty() {
                errors.push(ValidationError::Scan("extra_ignore contains an empty pattern".to_string()));
            }
        }

        let file_name = &self.manifest.file_name;
        let suffix = format!(".{}", MANIFEST_EXTENSION);
        if file_name.contains('/') || file_name.contains('\\') {
            errors.push(ValidationError::Manifest(format!(
                "file_name '{}' must be a bare file name",
                file_name
            )));
        }
        if !file_name.ends_with(&suffix) || file_name.len() == suffix.len() {
            // Anything else would be picked up by the next scan.
            errors.push(ValidationError::Manifest(format!(
                "file_name '{}' must end with '{}'",
                file_name, suffix
            )));
        }
        if self.manifest.version.trim().is_empty() {
            errors.push(ValidationError::Manifest("version cannot be empty".to_string()));
        }

        errors.extend(self.logging.problems().into_iter().map(ValidationError::Logging));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Serialize as TOML, the format of every config file.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

/// Loads [`ProvmarkConfig`] from the configured sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults → global file → `<workspace>/.provmark/config.toml` → environment.
    pub fn load(workspace_root: &Path) -> Result<ProvmarkConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder)?;
        Self::finish(builder.build()?)
    }

    /// Defaults → `path` → environment. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<ProvmarkConfig, ApiError> {
        if !path.is_file() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true));
        let builder = sources::environment::add_to_builder(builder)?;
        Self::finish(builder.build()?)
    }

    fn finish(raw: config::Config) -> Result<ProvmarkConfig, ApiError> {
        let config: ProvmarkConfig = raw.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}
