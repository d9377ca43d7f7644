//! Logic hashes through the full scan pipeline

use super::test_utils::write_files;
use provmark::scan::{scan_tree, ScanOptions, TreeScan};
use tempfile::TempDir;

const GO_ORIGINAL: &str = r#"package main

import (
	"fmt"
	"os"
)

func main() {
	if len(os.Args) > 1 {
		fmt.Println(os.Args[1])
	}
}
"#;

const GO_REFORMATTED: &str = r#"package main

import (
	"os"
	"fmt"
)

// main echoes the first argument.
func main() {
	if len(os.Args) > 1 { fmt.Println(os.Args[1]) } // print it
}
"#;

const GO_CHANGED: &str = r#"package main

import (
	"fmt"
	"os"
)

func main() {
	for _, arg := range os.Args {
		fmt.Println(arg)
	}
}
"#;

fn scan_one(name: &str, contents: &str) -> TreeScan {
    let temp = TempDir::new().unwrap();
    write_files(temp.path(), &[(name, contents)]);
    scan_tree(temp.path(), ScanOptions::default()).unwrap()
}

#[test]
fn test_go_reformat_keeps_logic_hash() {
    let original = scan_one("main.go", GO_ORIGINAL);
    let reformatted = scan_one("main.go", GO_REFORMATTED);

    let a = &original.assets[0];
    let b = &reformatted.assets[0];
    assert_ne!(a.raw_hash, b.raw_hash);
    assert!(a.logic_hash.is_some());
    assert_eq!(a.logic_hash, b.logic_hash);
}

#[test]
fn test_go_behavior_change_changes_logic_hash() {
    let original = scan_one("main.go", GO_ORIGINAL);
    let changed = scan_one("main.go", GO_CHANGED);
    assert_ne!(original.assets[0].logic_hash, changed.assets[0].logic_hash);
}

#[test]
fn test_rust_reformat_keeps_logic_hash() {
    let original = scan_one(
        "lib.rs",
        "use std::fmt;\nuse std::io;\n\npub fn run(x: u32) -> io::Result<()> {\n    if x > 2 {\n        println!(\"{}\", x);\n    }\n    Ok(())\n}\n",
    );
    let reformatted = scan_one(
        "lib.rs",
        "use std::io;\nuse std::fmt;\n/// Runs.\npub fn run(x: u32) -> io::Result<()> { if x > 7 { println!(\"value {}\", x); } Ok(()) }\n",
    );
    assert!(original.assets[0].logic_hash.is_some());
    assert_eq!(original.assets[0].logic_hash, reformatted.assets[0].logic_hash);
}

#[test]
fn test_unparseable_source_is_still_an_asset() {
    let scan = scan_one("broken.go", "package main\n\nfunc main( {\n");
    assert_eq!(scan.assets.len(), 1);
    assert!(scan.assets[0].logic_hash.is_none());
    assert!(scan.skipped.is_empty());
}

#[test]
fn test_unsupported_extension_has_no_logic_hash() {
    let scan = scan_one("script.py", "def main():\n    pass\n");
    assert!(scan.assets[0].logic_hash.is_none());
}
