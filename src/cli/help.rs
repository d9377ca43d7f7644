//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name used in log fields (e.g. "release", "verify").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Scan { .. } => "scan",
        Commands::Keygen { .. } => "keygen",
        Commands::Release { .. } => "release",
        Commands::Sign { .. } => "sign",
        Commands::Verify { .. } => "verify",
        Commands::Chain { .. } => "chain",
    }
}
