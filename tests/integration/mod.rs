//! Integration tests for the provenance manifest engine

mod cli_release;
mod config_integration;
mod content_verification;
mod fingerprint_invariance;
mod scan_determinism;
mod signing_roundtrip;
mod test_utils;
