//! CLI domain: parse, route, help, output, and presentation only.
//! No engine semantics; the route table dispatches to library operations.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_chain_text, format_keygen_summary, format_release_summary, format_scan_json,
    format_scan_text, format_verification_json, format_verification_text,
};
pub use route::RunContext;
