//! Integration tests for the `sakemap` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

fn write_json(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(format!("{name}.json")), value.to_string()).unwrap();
}

fn write_catalog(dir: &Path) {
    write_json(
        dir,
        "brands",
        &json!({"brands": [
            {"id": 1, "name": "花陽浴", "breweryId": 10},
            {"id": 2, "name": "新政", "breweryId": 11},
            {"id": 3, "name": "黒龍", "breweryId": 12},
            {"id": 4, "name": "而今", "breweryId": 13}
        ]}),
    );
    write_json(dir, "flavor-tags", &json!({"tags": [{"id": 1, "tag": "旨味"}]}));
    write_json(
        dir,
        "brand-flavor-tags",
        &json!({"flavorTags": [{"brandId": 3, "tagIds": [1]}]}),
    );
    write_json(
        dir,
        "breweries",
        &json!({"breweries": [{"id": 10, "name": "南陽醸造"}]}),
    );
    write_json(dir, "areas", &json!({"areas": []}));
    write_json(
        dir,
        "flavor-charts",
        &json!({"flavorCharts": [
            {"brandId": 1, "f1": 0.9, "f2": 0.2, "f3": 0.1, "f4": 0.2, "f5": 0.1, "f6": 0.9},
            {"brandId": 2, "f1": 0.8, "f2": 0.3, "f3": 0.2, "f4": 0.3, "f5": 0.2, "f6": 0.8},
            {"brandId": 3, "f1": 0.1, "f2": 0.8, "f3": 0.9, "f4": 0.8, "f5": 0.9, "f6": 0.1},
            {"brandId": 4, "f1": 0.2, "f2": 0.7, "f3": 0.8, "f4": 0.7, "f5": 0.8, "f6": 0.2}
        ]}),
    );
}

fn sakemap(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sakemap").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("SAKEMAP_CONFIG")
        .arg("--data-dir")
        .arg(dir)
        .arg("--seed")
        .arg("5");
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("sakemap")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("recommend"))
        .stdout(predicate::str::contains("clusters"));
}

#[test]
fn test_recommend_json() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    let output = sakemap(dir.path())
        .args(["--format", "json", "recommend", "-a", "aroma=華やか", "-a", "richness=軽い"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["strategy"], "clustered");
    let mut ids: Vec<&str> = value["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn test_recommend_table_shows_brewery() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    sakemap(dir.path())
        .args(["recommend", "-a", "aroma=華やか"])
        .assert()
        .success()
        .stdout(predicate::str::contains("花陽浴"))
        .stdout(predicate::str::contains("南陽醸造"));
}

#[test]
fn test_recommend_rejects_malformed_answer() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    sakemap(dir.path())
        .args(["recommend", "-a", "aroma"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("QUESTION=VALUE"));
}

#[test]
fn test_recommend_saves_preference() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    let prefs = dir.path().join("prefs");

    sakemap(dir.path())
        .arg("--preference-dir")
        .arg(&prefs)
        .args(["recommend", "-a", "aroma=華やか"])
        .assert()
        .success();

    let stored: Value =
        serde_json::from_str(&fs::read_to_string(prefs.join("userPreferenceVector6.json")).unwrap())
            .unwrap();
    assert_eq!(stored, json!([1.0, 0.5, 0.5, 0.5, 0.5, 0.5]));
}

#[test]
fn test_clusters_json() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    let output = sakemap(dir.path())
        .args(["--format", "json", "clusters"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["k"], 2);
    assert_eq!(value["sizes"], json!([2, 2]));
}

#[test]
fn test_export_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    let out = dir.path().join("clusters.csv");

    sakemap(dir.path())
        .arg("export")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("id,name,cluster,feat_0"));
    assert!(lines[1].starts_with("1,花陽浴,"));
}

#[test]
fn test_missing_catalog_fails() {
    let dir = tempfile::tempdir().unwrap();

    sakemap(dir.path())
        .arg("clusters")
        .assert()
        .failure()
        .stderr(predicate::str::contains("brands"));
}

#[test]
fn test_questions_follow_pairing() {
    let dir = tempfile::tempdir().unwrap();

    sakemap(dir.path())
        .args(["questions", "-a", "pairing=食事と一緒に"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rice_detail"))
        .stdout(predicate::str::contains("dessert_detail").not());
}

#[test]
fn test_preference_set_show_clear() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs");

    sakemap(dir.path())
        .arg("--preference-dir")
        .arg(&prefs)
        .args(["preference", "set", "0.1", "2", "0.3", "0.4", "-1", "0.6"])
        .assert()
        .success();

    let output = sakemap(dir.path())
        .arg("--preference-dir")
        .arg(&prefs)
        .args(["--format", "json", "preference", "show"])
        .output()
        .unwrap();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    let stored: Vec<f64> = value["preference"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(stored.len(), 6);
    assert!((stored[1] - 1.0).abs() < 1e-6);
    assert!(stored[4].abs() < 1e-6);

    sakemap(dir.path())
        .arg("--preference-dir")
        .arg(&prefs)
        .args(["preference", "clear"])
        .assert()
        .success();
    sakemap(dir.path())
        .arg("--preference-dir")
        .arg(&prefs)
        .args(["preference", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No preference stored."));
}

#[test]
fn test_preference_requires_directory() {
    let dir = tempfile::tempdir().unwrap();

    sakemap(dir.path())
        .args(["preference", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("preference directory"));
}

#[test]
fn test_config_prints_effective_toml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sakemap.toml"),
        "[clustering]\nmax_iterations = 12\n",
    )
    .unwrap();

    sakemap(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_iterations = 12"))
        .stdout(predicate::str::contains("seed = 5"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sakemap.toml"),
        "[clustering]\nmin_clusters = 9\nmax_clusters = 3\n",
    )
    .unwrap();

    sakemap(dir.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_clusters"));
}
