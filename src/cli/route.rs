//! CLI route: single route table and run context. Dispatches to library
//! operations and presentation.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_chain_text, format_keygen_summary, format_release_summary, format_scan_json,
    format_scan_text, format_verification_json, format_verification_text,
};
use crate::config::{workspace_config_path, ConfigLoader, ProvmarkConfig};
use crate::error::ApiError;
use crate::fingerprint::FingerprintRegistry;
use crate::identity::{HexKeyFile, Identity, KeySource, Network, Secp256k1Identity};
use crate::manifest::chain::DEFAULT_MAX_DEPTH;
use crate::manifest::{
    file_manifest_path, manifest_file_name, walk_chain, DirectoryChainResolver, Manifest,
    ManifestBuilder,
};
use crate::scan::TreeScanner;
use crate::signing::sign_manifest;
use crate::verify::verify_manifest;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace root and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ProvmarkConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: ProvmarkConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &ProvmarkConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { force } => self.handle_init(*force),
            Commands::Scan { format } => self.handle_scan(*format),
            Commands::Keygen { force } => self.handle_keygen(*force),
            Commands::Release {
                tag,
                dry_run,
                no_parent,
            } => self.handle_release(tag.as_deref(), *dry_run, *no_parent),
            Commands::Sign { file, force } => self.handle_sign(file, *force),
            Commands::Verify { manifest, format } => {
                self.handle_verify(manifest.as_deref(), *format)
            }
            Commands::Chain { manifest, search } => self.handle_chain(manifest.as_deref(), search),
        }
    }

    fn scanner(&self) -> TreeScanner {
        TreeScanner::with_options(
            FingerprintRegistry::with_builtin_languages(),
            self.config.scan.to_options(),
        )
    }

    fn key_file(&self) -> Result<HexKeyFile, ApiError> {
        Ok(HexKeyFile::new(self.config.identity.resolve_key_path()?))
    }

    fn identity(&self) -> Secp256k1Identity {
        Secp256k1Identity::new(self.config.identity.network)
    }

    fn manifest_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.workspace_root.join(&self.config.manifest.file_name))
    }

    fn load_manifest(&self, explicit: Option<&Path>) -> Result<(PathBuf, Manifest), ApiError> {
        let path = self.manifest_path(explicit);
        if !path.is_file() {
            return Err(ApiError::ManifestNotFound(path));
        }
        let manifest = Manifest::load(&path)?;
        Ok((path, manifest))
    }

    fn handle_init(&self, force: bool) -> Result<String, ApiError> {
        let path = workspace_config_path(&self.workspace_root);
        if path.exists() && !force {
            return Err(ApiError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::ConfigError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let text = ProvmarkConfig::default().to_toml()?;
        std::fs::write(&path, text).map_err(|e| {
            ApiError::ConfigError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Wrote workspace config");
        Ok(format!("Wrote {}", path.display()))
    }

    fn handle_scan(&self, format: OutputFormat) -> Result<String, ApiError> {
        let scan = self.scanner().scan(&self.workspace_root)?;
        match format {
            OutputFormat::Text => Ok(format_scan_text(&scan)),
            OutputFormat::Json => format_scan_json(&scan),
        }
    }

    fn handle_keygen(&self, force: bool) -> Result<String, ApiError> {
        let key_file = self.key_file()?;
        let secret = key_file.generate(force)?;
        let identity = self.identity();
        let public_key = identity.public_key(&secret)?;
        let address = identity.derive_address(&public_key)?;
        info!(address = %address, "Generated author key");
        Ok(format_keygen_summary(key_file.path(), &public_key, &address))
    }

    fn handle_release(
        &self,
        tag: Option<&str>,
        dry_run: bool,
        no_parent: bool,
    ) -> Result<String, ApiError> {
        let key_file = self.key_file()?;
        let secret = key_file.load_secret()?;
        let identity = self.identity();
        let public_key = identity.public_key(&secret)?;
        let author = identity.derive_address(&public_key)?;

        let scan = self.scanner().scan(&self.workspace_root)?;
        for skipped in &scan.skipped {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "Not included in manifest");
        }

        let file_name = match tag {
            Some(_) => manifest_file_name(tag)?,
            None => self.config.manifest.file_name.clone(),
        };
        let output_path = scan.root.join(file_name);

        let mut builder = ManifestBuilder::from_scan(&scan)
            .version(self.config.manifest.version.clone())
            .author(author, public_key);
        if !no_parent {
            // Parent is the newest manifest already in the root.
            let resolver = DirectoryChainResolver::index([&scan.root])?;
            if let Some(parent) = resolver.latest() {
                builder = builder.link_parent_file(&parent.path)?;
            }
        }

        let mut manifest = builder.build()?;
        sign_manifest(&mut manifest, &identity, &key_file)?;

        if dry_run {
            let mut output = format_release_summary(&manifest, &output_path, false);
            output.push('\n');
            output.push_str(&manifest.to_pretty_json()?);
            return Ok(output);
        }
        manifest.save(&output_path)?;
        info!(path = %output_path.display(), assets = manifest.assets.len(), "Manifest released");
        Ok(format_release_summary(&manifest, &output_path, true))
    }

    fn handle_sign(&self, file: &Path, force: bool) -> Result<String, ApiError> {
        let file = self.workspace_root.join(file);
        if !file.is_file() {
            return Err(ApiError::ConfigError(format!(
                "{} is not a regular file",
                file.display()
            )));
        }
        let output_path = file_manifest_path(&file);
        if output_path.exists() && !force {
            return Err(ApiError::ConfigError(format!(
                "{} already exists (use --force to overwrite)",
                output_path.display()
            )));
        }

        let key_file = self.key_file()?;
        let secret = key_file.load_secret()?;
        let identity = self.identity();
        let public_key = identity.public_key(&secret)?;
        let author = identity.derive_address(&public_key)?;

        let mut manifest = ManifestBuilder::for_file(&file)?
            .version(self.config.manifest.version.clone())
            .author(author, public_key)
            .build()?;
        sign_manifest(&mut manifest, &identity, &key_file)?;
        manifest.save(&output_path)?;
        info!(file = %file.display(), path = %output_path.display(), "File signed");
        Ok(format_release_summary(&manifest, &output_path, true))
    }

    fn handle_verify(
        &self,
        manifest_path: Option<&Path>,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let (path, manifest) = self.load_manifest(manifest_path)?;
        let network = Network::from_address(&manifest.author).unwrap_or(self.config.identity.network);
        let identity = Secp256k1Identity::new(network);

        let report = verify_manifest(&manifest, &self.workspace_root, &identity, &self.scanner())?;
        let rendered = match format {
            OutputFormat::Text => format_verification_text(&report, &path),
            OutputFormat::Json => format_verification_json(&report)?,
        };
        if report.is_ok() {
            Ok(rendered)
        } else {
            Err(ApiError::VerificationFailed(rendered))
        }
    }

    fn handle_chain(
        &self,
        manifest_path: Option<&Path>,
        search: &[PathBuf],
    ) -> Result<String, ApiError> {
        let (path, head) = self.load_manifest(manifest_path)?;
        let mut dirs: Vec<PathBuf> = if search.is_empty() {
            vec![self.workspace_root.clone()]
        } else {
            search.to_vec()
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !dirs.iter().any(|d| d == parent) {
                dirs.push(parent.to_path_buf());
            }
        }

        let resolver = DirectoryChainResolver::index(&dirs)?;
        let chain = walk_chain(&head, &resolver, DEFAULT_MAX_DEPTH)?;
        Ok(format_chain_text(&path, &head, &chain))
    }
}
