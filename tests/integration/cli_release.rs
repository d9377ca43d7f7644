//! End-to-end command flow through the run context

use super::test_utils::{with_isolated_env, write_files};
use provmark::cli::{Commands, OutputFormat, RunContext};
use provmark::error::ApiError;
use tempfile::TempDir;

fn release(tag: Option<&str>) -> Commands {
    Commands::Release {
        tag: tag.map(str::to_string),
        dry_run: false,
        no_parent: false,
    }
}

fn verify(manifest: Option<std::path::PathBuf>) -> Commands {
    Commands::Verify {
        manifest,
        format: OutputFormat::Json,
    }
}

#[test]
fn test_keygen_release_verify_chain() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let key_path = temp.path().join("secrets").join("me.key");
        std::env::set_var("PROVMARK_KEY_PATH", &key_path);

        let workspace = temp.path().join("project");
        write_files(
            &workspace,
            &[
                ("src/main.go", "package main\n\nfunc main() {\n\trun()\n}\n"),
                ("README.md", "readme"),
            ],
        );
        let ctx = RunContext::new(workspace.clone(), None).unwrap();

        let keygen = ctx.execute(&Commands::Keygen { force: false }).unwrap();
        assert!(key_path.is_file());
        assert!(keygen.contains("bc1q"));
        assert!(ctx.execute(&Commands::Keygen { force: false }).is_err());

        ctx.execute(&release(Some("v1"))).unwrap();
        let v1 = workspace.join("manifest-v1.pmk");
        assert!(v1.is_file());

        let out = ctx.execute(&verify(Some(v1.clone()))).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["report"]["content"]["result"], "strict_ok");

        // Formatting-only edit stays verifiable.
        write_files(
            &workspace,
            &[("src/main.go", "package main\n\n// main runs.\nfunc main() { run() }\n")],
        );
        let out = ctx.execute(&verify(Some(v1.clone()))).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["report"]["content"]["result"], "fuzzy_ok");

        ctx.execute(&release(Some("v2"))).unwrap();
        let v2 = workspace.join("manifest-v2.pmk");
        let head = provmark::Manifest::load(&v2).unwrap();
        assert_eq!(
            head.parent_hash,
            Some(provmark::manifest::file_digest(&v1).unwrap())
        );

        let chain = ctx
            .execute(&Commands::Chain {
                manifest: Some(v2),
                search: Vec::new(),
            })
            .unwrap();
        assert!(chain.contains("manifest-v1.pmk"));
        assert!(chain.contains("1 ancestors; reached genesis"));

        write_files(
            &workspace,
            &[("src/main.go", "package main\n\nfunc main() {\n\tstop()\n}\n")],
        );
        let err = ctx.execute(&verify(Some(v1))).unwrap_err();
        match err {
            ApiError::VerificationFailed(rendered) => {
                assert!(rendered.contains("logic_changed"));
            }
            other => panic!("unexpected error: {}", other),
        }
    });
}

#[test]
fn test_no_parent_starts_a_new_chain() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        std::env::set_var("PROVMARK_KEY_PATH", temp.path().join("k.key"));
        let workspace = temp.path().join("project");
        write_files(&workspace, &[("a.txt", "hello")]);
        let ctx = RunContext::new(workspace.clone(), None).unwrap();
        ctx.execute(&Commands::Keygen { force: false }).unwrap();

        ctx.execute(&release(None)).unwrap();
        ctx.execute(&Commands::Release {
            tag: Some("fresh".to_string()),
            dry_run: false,
            no_parent: true,
        })
        .unwrap();
        let fresh = provmark::Manifest::load(&workspace.join("manifest-fresh.pmk")).unwrap();
        assert!(fresh.parent_hash.is_none());
    });
}

#[test]
fn test_init_writes_loadable_config() {
    let temp = TempDir::new().unwrap();
    with_isolated_env(&temp, || {
        let workspace = temp.path().join("project");
        std::fs::create_dir_all(&workspace).unwrap();
        let ctx = RunContext::new(workspace.clone(), None).unwrap();
        ctx.execute(&Commands::Init { force: false }).unwrap();

        let reloaded = RunContext::new(workspace, None).unwrap();
        assert_eq!(reloaded.config(), ctx.config());
    });
}
