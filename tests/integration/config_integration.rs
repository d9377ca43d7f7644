//! Layered configuration: defaults, global file, workspace file, environment

use super::test_utils::with_isolated_env;
use provmark::config::{global_config_path, workspace_config_path, ConfigLoader, ProvmarkConfig};
use provmark::identity::Network;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(path: &std::path::Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let workspace = temp.path().join("ws");
        std::fs::create_dir_all(&workspace).unwrap();
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config, ProvmarkConfig::default());
        assert_eq!(
            config.identity.resolve_key_path().unwrap(),
            temp.path().join("xdg").join("provmark").join("author.key")
        );
    });
}

#[test]
fn test_workspace_file_overrides_global_file() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let global = global_config_path().unwrap();
        assert!(global.starts_with(temp.path()));
        write(
            &global,
            "[identity]\nnetwork = \"testnet\"\n\n[scan]\nparallel = false\nextra_ignore = [\"dist\"]\n",
        );

        let workspace = temp.path().join("ws");
        write(
            &workspace_config_path(&workspace),
            "[scan]\nextra_ignore = [\"target\", \"vendor\"]\n\n[manifest]\nversion = \"v2\"\n",
        );

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.identity.network, Network::Testnet);
        assert!(!config.scan.parallel);
        assert_eq!(config.scan.extra_ignore, vec!["target", "vendor"]);
        assert_eq!(config.manifest.version, "v2");
        assert_eq!(config.manifest.file_name, "manifest.pmk");
    });
}

#[test]
fn test_environment_overrides_files() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let workspace = temp.path().join("ws");
        write(
            &workspace_config_path(&workspace),
            "[identity]\nkey_path = \"/from/file.key\"\n\n[manifest]\nversion = \"v2\"\n",
        );
        std::env::set_var("PROVMARK_KEY_PATH", "/from/env.key");
        std::env::set_var("PROVMARK__MANIFEST__VERSION", "v3");
        std::env::set_var("PROVMARK__SCAN__PARALLEL", "false");

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.identity.key_path, Some(PathBuf::from("/from/env.key")));
        assert_eq!(config.manifest.version, "v3");
        assert!(!config.scan.parallel);
    });
}

#[test]
fn test_explicit_file_skips_discovery() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let workspace = temp.path().join("ws");
        write(&workspace_config_path(&workspace), "[manifest]\nversion = \"ignored\"\n");
        let explicit = temp.path().join("custom.toml");
        write(&explicit, "[manifest]\nfile_name = \"release.pmk\"\n");

        let config = ConfigLoader::load_from_file(&explicit).unwrap();
        assert_eq!(config.manifest.file_name, "release.pmk");
        assert_eq!(config.manifest.version, "v1");

        assert!(ConfigLoader::load_from_file(&temp.path().join("missing.toml")).is_err());
    });
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let workspace = temp.path().join("ws");
        write(
            &workspace_config_path(&workspace),
            "[manifest]\nfile_name = \"manifest.json\"\n\n[logging]\nlevel = \"loud\"\n",
        );
        let err = ConfigLoader::load(&workspace).unwrap_err().to_string();
        assert!(err.contains("manifest.json"));
        assert!(err.contains("loud"));
    });
}
