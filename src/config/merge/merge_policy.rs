//! Merge rules: defaults first, then each source in ascending precedence.

use crate::manifest::{DEFAULT_MANIFEST_FILE, MANIFEST_VERSION};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("identity.network", "mainnet")?
        .set_default("scan.parallel", true)?
        .set_default("scan.extra_ignore", Vec::<String>::new())?
        .set_default("manifest.file_name", DEFAULT_MANIFEST_FILE)?
        .set_default("manifest.version", MANIFEST_VERSION)
}
