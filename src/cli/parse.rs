//! CLI parse: clap types for provmark. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// provmark - signed provenance manifests for directory trees
#[derive(Parser)]
#[command(name = "provmark", version)]
#[command(about = "Signed, content-addressed provenance manifests for directory trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default workspace config to .provmark/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Scan the workspace and print assets with the content hash
    Scan {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate the author key file
    Keygen {
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },
    /// Scan, sign and write a manifest
    Release {
        /// Version tag; writes manifest-<tag>.pmk
        #[arg(long)]
        tag: Option<String>,
        /// Print the signed manifest instead of writing it
        #[arg(long)]
        dry_run: bool,
        /// Do not link to the previous manifest
        #[arg(long)]
        no_parent: bool,
    },
    /// Sign a single file into a `<file>.pmk` sidecar manifest
    Sign {
        /// File to sign (relative paths resolve against the workspace)
        file: PathBuf,
        /// Replace an existing sidecar manifest
        #[arg(long)]
        force: bool,
    },
    /// Verify authorship and content of a manifest
    Verify {
        /// Manifest file (default: the configured manifest in the workspace root)
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the provenance chain behind a manifest
    Chain {
        /// Manifest file (default: the configured manifest in the workspace root)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Directories searched for ancestor manifests (default: workspace root)
        #[arg(long = "search")]
        search: Vec<PathBuf>,
    },
}
