//! Integration tests for picvault-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use picvault_core::test_utils::write_zip_fixture;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn picvault_cmd(data_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("picvault");
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn zip_fixture(dir: &TempDir, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.path().join(name);
    write_zip_fixture(&path, entries);
    path
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("picvault")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("picvault"));
}

#[test]
fn test_help_flag() {
    cargo_bin_cmd!("picvault")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Load an archive"));
}

#[test]
fn test_load_requires_placement_for_foreign_file() {
    let temp = TempDir::new().unwrap();
    let archive = zip_fixture(&temp, "cats.zip", &[("a.jpg", b"a")]);

    picvault_cmd(&temp.path().join("data"))
        .arg("load")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--copy"));
}

#[test]
fn test_load_copy_and_list() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let archive = zip_fixture(&temp, "cats.zip", &[("a.jpg", b"aa"), ("b.png", b"bb")]);

    picvault_cmd(&data)
        .arg("load")
        .arg(&archive)
        .arg("--copy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Images: 2"));

    picvault_cmd(&data)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("cats.zip"));
}

#[test]
fn test_load_json_output() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let archive = zip_fixture(&temp, "cats.zip", &[("a.jpg", b"aa")]);

    let output = picvault_cmd(&data)
        .arg("--json")
        .arg("load")
        .arg(&archive)
        .arg("--copy")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["operation"], "load");
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["data"]["imageCount"], 1);
    assert_eq!(parsed["data"]["alreadyInLibrary"], false);
}

#[test]
fn test_reload_reports_library_hit() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let archive = zip_fixture(&temp, "cats.zip", &[("a.jpg", b"aa")]);

    picvault_cmd(&data)
        .arg("load")
        .arg(&archive)
        .arg("--copy")
        .assert()
        .success();

    let output = picvault_cmd(&data)
        .arg("--json")
        .arg("load")
        .arg(&archive)
        .arg("--copy")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["data"]["alreadyInLibrary"], true);
}

#[test]
fn test_star_and_clear_keep_starred() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let keep = zip_fixture(&temp, "keep.zip", &[("a.jpg", b"a")]);
    let drop = zip_fixture(&temp, "drop.zip", &[("b.jpg", b"b")]);

    for archive in [&keep, &drop] {
        picvault_cmd(&data)
            .arg("load")
            .arg(archive)
            .arg("--copy")
            .assert()
            .success();
    }

    let output = picvault_cmd(&data)
        .arg("--json")
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let keep_id = parsed["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["displayName"] == "keep.zip")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    picvault_cmd(&data)
        .arg("star")
        .arg(&keep_id)
        .assert()
        .success()
        .stdout(predicate::str::contains("Starred"));

    picvault_cmd(&data)
        .arg("clear")
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 removed"));

    picvault_cmd(&data)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("keep.zip"))
        .stdout(predicate::str::contains("drop.zip").not());
}

#[test]
fn test_clear_refuses_without_confirmation() {
    let temp = TempDir::new().unwrap();
    picvault_cmd(&temp.path().join("data"))
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_extract_single_image() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let archive = zip_fixture(&temp, "cats.zip", &[("album/cat.jpg", b"meow")]);

    picvault_cmd(&data)
        .arg("load")
        .arg(&archive)
        .arg("--copy")
        .assert()
        .success();

    let output = picvault_cmd(&data)
        .arg("--json")
        .arg("list")
        .arg("--images")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let archive_id = parsed["data"][0]["id"].as_str().unwrap().to_string();
    let image_id = parsed["data"][0]["images"][0]["id"].as_str().unwrap().to_string();

    let extracted = picvault_cmd(&data)
        .arg("extract")
        .arg(&archive_id)
        .arg(&image_id)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let path = String::from_utf8(extracted).unwrap().trim().to_string();
    assert_eq!(std::fs::read(&path).unwrap(), b"meow");
}

#[test]
fn test_usage_reports_budget() {
    let temp = TempDir::new().unwrap();
    picvault_cmd(&temp.path().join("data"))
        .arg("usage")
        .assert()
        .success()
        .stdout(predicate::str::contains("Library usage"));
}

#[test]
fn test_config_roundtrip() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    picvault_cmd(&data)
        .arg("config")
        .arg("--library-size-gb")
        .arg("4.5")
        .assert()
        .success()
        .stdout(predicate::str::contains("4.5"));

    picvault_cmd(&data)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("4.5"));
}

#[test]
fn test_history_records_loads() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let archive = zip_fixture(&temp, "cats.zip", &[("a.jpg", b"a")]);

    picvault_cmd(&data)
        .arg("load")
        .arg(&archive)
        .arg("--copy")
        .assert()
        .success();

    picvault_cmd(&data)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("cats.zip"));
}

#[test]
fn test_unsupported_format_fails_with_hint() {
    let temp = TempDir::new().unwrap();
    let bogus = temp.path().join("notes.txt");
    std::fs::write(&bogus, b"text").unwrap();

    picvault_cmd(&temp.path().join("data"))
        .arg("load")
        .arg(&bogus)
        .arg("--copy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_sweep_runs_on_empty_state() {
    let temp = TempDir::new().unwrap();
    picvault_cmd(&temp.path().join("data"))
        .arg("sweep")
        .assert()
        .success();
}
