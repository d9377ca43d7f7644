//! Environment source: `PROVMARK_KEY_PATH` plus `PROVMARK__SECTION__KEY`
//! nested overrides.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Key file override.
pub const KEY_PATH_ENV: &str = "PROVMARK_KEY_PATH";

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("PROVMARK")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scan.extra_ignore"),
    );
    let key_path = std::env::var(KEY_PATH_ENV).ok().filter(|v| !v.is_empty());
    builder.set_override_option("identity.key_path", key_path)
}
