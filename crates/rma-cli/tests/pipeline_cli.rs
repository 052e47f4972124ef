//! Integration tests for the `rma` binary: stage runs, bootstrap, dry runs
//! and failure exit codes.

mod common;

use std::fs;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{rma_cmd, setup_workspace};

#[test]
fn test_unknown_stage_exits_with_failure() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("units.bogus")
        .arg("1S72")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown stage"));
}

#[test]
fn test_missing_config_exits_with_failure() {
    let temp = TempDir::new().expect("create temp dir");

    rma_cmd()
        .arg("--config")
        .arg(temp.path().join("nope.yaml"))
        .arg("run")
        .arg("units.info")
        .arg("1S72")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_run_units_info_succeeds() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("units.info")
        .arg("1S72")
        .assert()
        .success();

    // Rerunning is a no-op, not an error.
    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("units.info")
        .arg("1S72")
        .assert()
        .success();
}

#[test]
fn test_run_update_exports_loops() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("update")
        .arg("1S72")
        .assert()
        .success();

    let export = temp.path().join("export").join("1S72.csv");
    assert!(export.exists(), "update run should export loops");
    let content = fs::read_to_string(&export).expect("read export");
    assert!(content.contains("IL_1S72_001"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("update")
        .arg("1S72")
        .arg("--dry-run")
        .assert()
        .success();

    assert!(
        !temp.path().join("export").join("1S72.csv").exists(),
        "dry run must not write exports"
    );
}

#[test]
fn test_bootstrap_seeds_database() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("bootstrap")
        .assert()
        .success();

    assert!(temp.path().join("atlas.db").exists());
    assert!(temp.path().join("export").join("1S72.csv").exists());
}

#[test]
fn test_run_with_staged_release_commits_motifs() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    let il_dir = temp.path().join("search").join("IL");
    fs::create_dir_all(&il_dir).expect("create search dir");
    fs::write(
        il_dir.join("MotifList.csv"),
        "IL_1S72_001,Group_001\n",
    )
    .expect("stage grouping");

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("update")
        .arg("1S72")
        .arg("--seed")
        .arg("1")
        .assert()
        .success();
}

#[test]
fn test_ss_import_stages_diagram() {
    let temp = TempDir::new().expect("create temp dir");
    let config = setup_workspace(temp.path());

    let diagram = temp.path().join("Group_001.png");
    fs::write(&diagram, b"png").expect("write diagram");

    rma_cmd()
        .arg("--config")
        .arg(&config)
        .arg("ss")
        .arg("import")
        .arg(&diagram)
        .assert()
        .success();

    assert!(temp.path().join("2ds").join("Group_001.png").exists());
}
