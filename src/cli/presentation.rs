//! CLI presentation: text and json formatters per command.

use crate::error::{ApiError, ManifestError};
use crate::manifest::{ChainEnd, Manifest, ProvenanceChain};
use crate::scan::TreeScan;
use crate::signing::{IdentityCheck, SignatureCheck};
use crate::verify::{ContentVerdict, VerificationReport};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

fn to_json(value: &serde_json::Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ManifestError::Serialization(e).into())
}

pub fn format_scan_text(scan: &TreeScan) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Path", "Raw Hash", "Logic Hash"]);
    for asset in &scan.assets {
        let logic = asset
            .logic_hash
            .map(|d| d.short())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![asset.path.clone(), asset.raw_hash.short(), logic]);
    }

    let mut output = format!("{}\n\n", table);
    output.push_str(&format!("Root:         {}\n", scan.root.display()));
    output.push_str(&format!("Assets:       {}\n", scan.assets.len()));
    output.push_str(&format!("Content hash: {}\n", scan.content_hash));
    if !scan.skipped.is_empty() {
        output.push_str("\nSkipped:\n");
        for skipped in &scan.skipped {
            output.push_str(&format!("  - {} ({})\n", skipped.path.display(), skipped.reason));
        }
    }
    output
}

pub fn format_scan_json(scan: &TreeScan) -> Result<String, ApiError> {
    let skipped: Vec<serde_json::Value> = scan
        .skipped
        .iter()
        .map(|s| json!({"path": s.path.display().to_string(), "reason": s.reason.to_string()}))
        .collect();
    to_json(&json!({
        "root": scan.root.display().to_string(),
        "content_hash": scan.content_hash,
        "assets": scan.assets,
        "skipped": skipped,
    }))
}

pub fn format_keygen_summary(key_path: &Path, public_key: &str, address: &str) -> String {
    format!(
        "Key file:   {}\nPublic key: {}\nAddress:    {}\n",
        key_path.display(),
        public_key,
        address.bold()
    )
}

pub fn format_release_summary(manifest: &Manifest, path: &Path, written: bool) -> String {
    let mut output = String::new();
    if written {
        output.push_str(&format!("{} {}\n", "Wrote".green(), path.display()));
    } else {
        output.push_str(&format!("Dry run; would write {}\n", path.display()));
    }
    output.push_str(&format!("Author:       {}\n", manifest.author));
    output.push_str(&format!("Assets:       {}\n", manifest.assets.len()));
    output.push_str(&format!("Content hash: {}\n", manifest.content_hash));
    match &manifest.parent_hash {
        Some(parent) => output.push_str(&format!("Parent:       {}\n", parent)),
        None => output.push_str("Parent:       (genesis)\n"),
    }
    output
}

fn verdict_label(verdict: &ContentVerdict) -> &'static str {
    match verdict {
        ContentVerdict::StrictOk => "STRICT_OK",
        ContentVerdict::FuzzyOk { .. } => "FUZZY_OK",
        ContentVerdict::Fail { .. } => "FAIL",
    }
}

pub fn format_verification_text(report: &VerificationReport, manifest_path: &Path) -> String {
    let mut output = format!("Manifest: {}\n\n", manifest_path.display());

    let identity = match &report.authorship.identity {
        IdentityCheck::Bound => format!("{}", "bound".green()),
        IdentityCheck::Mismatch { derived, claimed } => format!(
            "{} (key derives {}, manifest claims {})",
            "MISMATCH".red(),
            derived,
            claimed
        ),
    };
    let signature = match report.authorship.signature {
        SignatureCheck::Valid => format!("{}", "valid".green()),
        SignatureCheck::Invalid => format!("{}", "INVALID".red()),
        SignatureCheck::Malformed => format!("{}", "MALFORMED".red()),
    };
    let label = verdict_label(&report.content);
    let content = if report.content.is_ok() {
        format!("{}", label.green())
    } else {
        format!("{}", label.red())
    };

    output.push_str(&format!("Identity:  {}\n", identity));
    output.push_str(&format!("Signature: {}\n", signature));
    output.push_str(&format!("Content:   {}\n", content));

    match &report.content {
        ContentVerdict::FuzzyOk { compared } => {
            output.push_str(&format!(
                "\n{} source files match structurally; other files were not checked.\n",
                compared
            ));
        }
        ContentVerdict::Fail { divergences } if !divergences.is_empty() => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Path", "Divergence"]);
            for d in divergences {
                table.add_row(vec![d.path.clone(), format!("{:?}", d.reason)]);
            }
            output.push_str(&format!("\n{}\n", table));
        }
        _ => {}
    }
    output
}

pub fn format_verification_json(report: &VerificationReport) -> Result<String, ApiError> {
    let value = serde_json::to_value(report).map_err(ManifestError::Serialization)?;
    to_json(&json!({
        "ok": report.is_ok(),
        "report": value,
    }))
}

pub fn format_chain_text(head_path: &Path, head: &Manifest, chain: &ProvenanceChain) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{}  {}  {}\n",
        "HEAD".bold(),
        head.timestamp,
        head_path.display()
    ));
    for link in &chain.links {
        output.push_str(&format!(
            "{}  {}  {}\n",
            link.file_hash.short(),
            link.manifest.timestamp,
            link.path.display()
        ));
    }
    let end = match &chain.end {
        ChainEnd::Genesis => "reached genesis".to_string(),
        ChainEnd::Unresolved(hash) => format!("parent {} not found", hash.short()),
        ChainEnd::DepthLimit => "stopped at depth limit".to_string(),
    };
    output.push_str(&format!("\n{} ancestors; {}\n", chain.links.len(), end));
    output
}
