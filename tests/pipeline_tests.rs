//! End-to-end Pipeline Tests
//!
//! Runs the full kinds pipeline over a fixture repository copied into a
//! scratch directory.

use std::fs;
use std::path::Path;

use kinds_codegen::vfs::normalize_path;
use kinds_codegen::{generate, run, CodegenError, GenConfig, Mode, PipelineConfig, RunOutcome};
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/repo").leak()
}

/// Copy the fixture repository into a fresh scratch directory
fn scratch_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    for entry in WalkDir::new(fixtures_path()) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(fixtures_path()).unwrap();
        let target = dir.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
    dir
}

fn write_mode(root: &Path) -> PipelineConfig {
    PipelineConfig::new(root, Mode::Write)
}

fn verify_mode(root: &Path) -> PipelineConfig {
    PipelineConfig::new(root, Mode::Verify)
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_expected_outputs() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();

    assert_eq!(
        tree.paths().collect::<Vec<_>>(),
        vec![
            "packages/schema/src/common/common.gen.ts",
            "packages/schema/src/index.gen.ts",
            "packages/schema/src/raw/dashboard_bundle/x/DashboardBundle_types.gen.ts",
            "packages/schema/src/raw/library_panel/v2/LibraryPanel_types.gen.ts",
            "packages/schema/src/raw/playlist/x/Playlist_types.gen.ts",
            "packages/schema/src/raw/team/v1/Team_types.gen.ts",
            "pkg/kinds/library_panel/library_panel_gen.rs",
            "pkg/kinds/library_panel/library_panel_spec_gen.rs",
            "pkg/kinds/playlist/playlist_gen.rs",
            "pkg/kinds/playlist/playlist_spec_gen.rs",
            "pkg/kinds/team/team_gen.rs",
            "pkg/kinds/team/team_spec_gen.rs",
            "pkg/registry/corekind/registry_gen.rs",
        ]
    );
}

#[test]
fn test_resource_wraps_spec() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();

    let team = tree.get("pkg/kinds/team/team_gen.rs").unwrap();
    assert_eq!(team.origin, "K8sResourceJenny");
    let text = team.text().unwrap();
    assert!(text.contains("use super::team_spec_gen::Spec;\n"));
    assert!(text.contains("pub const API_VERSION: &str = \"core.kinds.io/v1\";\n"));
    assert!(text.contains("pub const KIND: &str = \"Team\";\n"));
    assert!(text.contains("    pub spec: Spec,\n"));

    let playlist = tree.get("pkg/kinds/playlist/playlist_gen.rs").unwrap().text().unwrap();
    assert!(playlist.contains("pub const API_VERSION: &str = \"core.kinds.io/v0alpha1\";\n"));

    assert!(tree.get("pkg/kinds/dashboard_bundle/dashboard_bundle_gen.rs").is_none());
}

#[test]
fn test_generation_is_deterministic() {
    let repo = scratch_repo();
    let config = GenConfig::default();
    let first = generate(&config, repo.path()).unwrap();
    let second = generate(&config, repo.path()).unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn test_every_file_carries_header_and_origin() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();

    for file in tree.iter() {
        let text = file.text().unwrap();
        assert!(
            text.starts_with("// Code generated - EDITING IS FUTILE. DO NOT EDIT.\n"),
            "{} has no header",
            file.path
        );
        assert!(text.contains(&format!("//     {}\n", file.origin)), "{}", file.path);
        assert!(text.contains("// Run 'make gen-kinds' from repository root to regenerate.\n"));
    }
}

#[test]
fn test_index_lists_kinds_in_name_order() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();
    let index = tree.get("packages/schema/src/index.gen.ts").unwrap().text().unwrap();
    let exports: Vec<&str> = index.lines().filter(|l| l.starts_with("export")).collect();
    assert_eq!(
        exports,
        vec![
            "export * as dashboard_bundle from './raw/dashboard_bundle/x/DashboardBundle_types.gen';",
            "export * as library_panel from './raw/library_panel/v2/LibraryPanel_types.gen';",
            "export * as playlist from './raw/playlist/x/Playlist_types.gen';",
            "export * as team from './raw/team/v1/Team_types.gen';",
        ]
    );
}

#[test]
fn test_common_schema_is_renamed() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();
    let common = tree.get("packages/schema/src/common/common.gen.ts").unwrap();
    assert_eq!(common.origin, "CommonSchemaJenny");

    let text = common.text().unwrap();
    assert!(text.contains("\n\nexport namespace common {\n"));
    assert!(text.contains("  export interface DataSourceRef {\n"));
    assert!(text.contains("  export interface TimeRange {\n"));
    assert!(!text.contains("kindsys"));
}

#[test]
fn test_toml_kind_and_registry() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();

    let team = tree.get("pkg/kinds/team/team_spec_gen.rs").unwrap().text().unwrap();
    assert!(team.contains("pub const KIND_VERSION: &str = \"1.2.0\";"));
    assert!(team.contains("    #[serde(rename = \"memberCount\")]\n    pub member_count: i64,\n"));

    let registry = tree.get("pkg/registry/corekind/registry_gen.rs").unwrap().text().unwrap();
    assert!(registry.contains(
        "pub enum CoreKind {\n    DashboardBundle,\n    LibraryPanel,\n    Playlist,\n    Team,\n}"
    ));
    assert!(registry.contains("            Self::DashboardBundle => true,\n"));
}

#[test]
fn test_name_normalization() {
    let repo = scratch_repo();
    let tree = generate(&GenConfig::default(), repo.path()).unwrap();
    let spec = tree.get("pkg/kinds/library_panel/library_panel_spec_gen.rs").unwrap().text().unwrap();
    assert!(spec.contains("pub const KIND_NAME: &str = \"library_panel\";"));
}

// =============================================================================
// Write and Verify
// =============================================================================

#[test]
fn test_write_then_verify_round_trip() {
    let repo = scratch_repo();
    let config = GenConfig::default();

    match run(&config, &write_mode(repo.path())).unwrap() {
        RunOutcome::Written(stats) => {
            assert_eq!(stats.written, 13);
            assert_eq!(stats.unchanged, 0);
        }
        other => panic!("Expected Written, got {:?}", other),
    }

    assert_eq!(
        run(&config, &verify_mode(repo.path())).unwrap(),
        RunOutcome::Verified { files: 13 }
    );

    match run(&config, &write_mode(repo.path())).unwrap() {
        RunOutcome::Written(stats) => assert_eq!(stats.unchanged, 13),
        other => panic!("Expected Written, got {:?}", other),
    }
}

#[test]
fn test_verify_reports_missing_files() {
    let repo = scratch_repo();
    let err = run(&GenConfig::default(), &verify_mode(repo.path())).unwrap_err();
    match err {
        CodegenError::OutOfSync { report, hint } => {
            assert_eq!(report.missing.len(), 13);
            assert!(report.differing.is_empty());
            assert_eq!(hint, "make gen-kinds");
        }
        other => panic!("Expected OutOfSync, got {:?}", other),
    }
    assert!(!repo.path().join("pkg").exists());
}

#[test]
fn test_verify_detects_drift() {
    let repo = scratch_repo();
    let config = GenConfig::default();
    run(&config, &write_mode(repo.path())).unwrap();

    let edited = repo.path().join("pkg/kinds/playlist/playlist_spec_gen.rs");
    let mut content = fs::read_to_string(&edited).unwrap();
    content.push_str("// hand edit\n");
    fs::write(&edited, content).unwrap();

    let err = run(&config, &verify_mode(repo.path())).unwrap_err();
    let message = err.to_string();
    match err {
        CodegenError::OutOfSync { report, .. } => {
            assert_eq!(report.paths(), vec!["pkg/kinds/playlist/playlist_spec_gen.rs"]);
            let diff = report.differing[0].diff.as_deref().unwrap();
            assert!(diff.contains("-// hand edit"));
        }
        other => panic!("Expected OutOfSync, got {:?}", other),
    }
    assert!(message.starts_with("generated code is out of sync with inputs:\n"));
    assert!(message.contains("  modified: pkg/kinds/playlist/playlist_spec_gen.rs"));
    assert!(message.ends_with("run `make gen-kinds` to regenerate"));

    // Verify never repairs
    assert!(fs::read_to_string(&edited).unwrap().ends_with("// hand edit\n"));
}

#[test]
fn test_verify_reports_stale_generated_files() {
    let repo = scratch_repo();
    let config = GenConfig::default();
    run(&config, &write_mode(repo.path())).unwrap();

    fs::write(
        repo.path().join("pkg/kinds/playlist/old_spec_gen.rs"),
        "// Code generated - EDITING IS FUTILE. DO NOT EDIT.\npub struct Old;\n",
    )
    .unwrap();
    fs::write(repo.path().join("pkg/kinds/playlist/notes.rs"), "// hand written\n").unwrap();

    match run(&config, &verify_mode(repo.path())).unwrap_err() {
        CodegenError::OutOfSync { report, .. } => {
            assert_eq!(report.extra, vec!["pkg/kinds/playlist/old_spec_gen.rs"]);
            assert!(report.missing.is_empty());
            assert!(report.differing.is_empty());
        }
        other => panic!("Expected OutOfSync, got {:?}", other),
    }

    let mut lenient = GenConfig::default();
    lenient.verify.detect_stale = false;
    assert!(run(&lenient, &verify_mode(repo.path())).is_ok());
}

#[test]
fn test_verify_reports_outputs_of_deleted_kind() {
    let repo = scratch_repo();
    let config = GenConfig::default();
    run(&config, &write_mode(repo.path())).unwrap();

    fs::remove_dir_all(repo.path().join("kinds/playlist")).unwrap();

    match run(&config, &verify_mode(repo.path())).unwrap_err() {
        CodegenError::OutOfSync { report, .. } => {
            assert_eq!(
                report.extra,
                vec![
                    "packages/schema/src/raw/playlist/x/Playlist_types.gen.ts",
                    "pkg/kinds/playlist/playlist_gen.rs",
                    "pkg/kinds/playlist/playlist_spec_gen.rs",
                ]
            );
            assert!(report.missing.is_empty());
            let differing: Vec<&str> = report.differing.iter().map(|d| d.path.as_str()).collect();
            assert_eq!(
                differing,
                vec!["packages/schema/src/index.gen.ts", "pkg/registry/corekind/registry_gen.rs"]
            );
        }
        other => panic!("Expected OutOfSync, got {:?}", other),
    }
}

#[test]
fn test_verify_reports_outputs_of_previous_version() {
    let repo = scratch_repo();
    let config = GenConfig::default();
    run(&config, &write_mode(repo.path())).unwrap();

    let team = repo.path().join("kinds/team/team.toml");
    let bumped = fs::read_to_string(&team).unwrap().replace("1.2.0", "2.0.0");
    fs::write(&team, bumped).unwrap();

    match run(&config, &verify_mode(repo.path())).unwrap_err() {
        CodegenError::OutOfSync { report, .. } => {
            assert_eq!(report.extra, vec!["packages/schema/src/raw/team/v1/Team_types.gen.ts"]);
            assert_eq!(report.missing, vec!["packages/schema/src/raw/team/v2/Team_types.gen.ts"]);
            let differing: Vec<&str> = report.differing.iter().map(|d| d.path.as_str()).collect();
            assert!(differing.contains(&"pkg/kinds/team/team_gen.rs"));
            assert!(differing.contains(&"pkg/kinds/team/team_spec_gen.rs"));
        }
        other => panic!("Expected OutOfSync, got {:?}", other),
    }
}

// =============================================================================
// Failure Modes
// =============================================================================

#[test]
fn test_missing_name_aborts_without_output() {
    let repo = scratch_repo();
    let broken = repo.path().join("kinds/broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("broken.json"), r#"{"spec": {"uid": "string"}}"#).unwrap();

    let err = run(&GenConfig::default(), &write_mode(repo.path())).unwrap_err();
    assert!(matches!(err, CodegenError::MissingName { .. }));
    assert!(err.is_load_error());
    assert!(!repo.path().join("pkg").exists());
    assert!(!repo.path().join("packages/schema/src/index.gen.ts").exists());
}

#[test]
fn test_collision_aborts_without_output() {
    let repo = scratch_repo();
    let mut config = GenConfig::default();
    config.outputs.registry_file = config.outputs.ts_index_file.clone();

    match run(&config, &write_mode(repo.path())).unwrap_err() {
        CodegenError::Collision { path, existing, incoming } => {
            assert_eq!(path, "packages/schema/src/index.gen.ts");
            assert_eq!(existing, "CoreRegistryJenny");
            assert_eq!(incoming, "TsIndexJenny");
        }
        other => panic!("Expected Collision, got {:?}", other),
    }
    assert!(!repo.path().join("pkg").exists());
}

#[test]
fn test_invalid_field_type_names_jenny_and_kind() {
    let repo = scratch_repo();
    fs::write(
        repo.path().join("kinds/playlist/playlist.json"),
        r#"{"name": "playlist", "spec": {"uid": "map[int]string"}}"#,
    )
    .unwrap();

    match run(&GenConfig::default(), &write_mode(repo.path())).unwrap_err() {
        CodegenError::Generation { jenny, unit, .. } => {
            assert_eq!(jenny, "RustSpecJenny");
            assert_eq!(unit.as_deref(), Some("playlist"));
        }
        other => panic!("Expected Generation, got {:?}", other),
    }
}

#[test]
fn test_empty_kind_set() {
    let repo = scratch_repo();
    for kind in ["playlist", "team", "library-panel", "bundle"] {
        fs::remove_dir_all(repo.path().join("kinds").join(kind)).unwrap();
    }

    let tree = generate(&GenConfig::default(), repo.path()).unwrap();
    assert_eq!(
        tree.paths().collect::<Vec<_>>(),
        vec![
            "packages/schema/src/common/common.gen.ts",
            "packages/schema/src/index.gen.ts",
            "pkg/registry/corekind/registry_gen.rs",
        ]
    );
    let index = tree.get("packages/schema/src/index.gen.ts").unwrap().text().unwrap();
    assert!(!index.contains("export *"));

    assert!(run(&GenConfig::default(), &write_mode(repo.path())).is_ok());
}

#[test]
fn test_normalize_path_rejects_parent_segments() {
    assert!(normalize_path("../outside.rs").is_err());
    assert_eq!(normalize_path("pkg\\kinds\\.\\team.rs").unwrap(), "pkg/kinds/team.rs");
}
