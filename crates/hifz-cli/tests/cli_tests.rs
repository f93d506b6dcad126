//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hifz() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("hifz").unwrap()
}

#[test]
fn validate_valid_passage() {
    hifz()
        .arg("validate")
        .arg("--passage")
        .arg("../../passages/al-fatiha.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Al-Fatiha (7 units, 29 words)"))
        .stdout(predicate::str::contains("All passages valid"));
}

#[test]
fn validate_directory() {
    hifz()
        .arg("validate")
        .arg("--passage")
        .arg("../../passages")
        .assert()
        .success()
        .stdout(predicate::str::contains("Al-Fatiha"))
        .stdout(predicate::str::contains("Al-Baqarah 1-7 (7 units, 59 words)"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("messy.toml");
    std::fs::write(
        &path,
        r#"
[passage]
id = "messy"
name = "Messy"

[[units]]
key = "2:2"
page = 2
words = ["a"]

[[units]]
key = "2:2"
page = 2
words = []
"#,
    )
    .unwrap();

    hifz()
        .arg("validate")
        .arg("--passage")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[2:2] WARNING: duplicate unit key"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    hifz()
        .arg("validate")
        .arg("--passage")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn preview_is_deterministic() {
    for _ in 0..2 {
        hifz()
            .args(["preview", "--unit", "2:5", "--words", "10", "--difficulty", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("threshold 20%"))
            .stdout(predicate::str::contains("Hidden (1 of 10): 2:5:4"));
    }
}

#[test]
fn preview_difficulty_extremes() {
    hifz()
        .args(["preview", "--unit", "2:255", "--words", "6", "--difficulty", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hidden (6 of 6)"));

    hifz()
        .args(["preview", "--unit", "2:255", "--words", "6", "--difficulty", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No words hidden."));
}

#[test]
fn preview_rejects_bad_unit() {
    hifz()
        .args(["preview", "--unit", "2-5", "--words", "3", "--difficulty", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --unit"));
}

#[test]
fn resolve_scenario_text() {
    hifz()
        .arg("resolve")
        .arg("--passage")
        .arg("../../passages/al-baqarah-1-7.toml")
        .arg("--session")
        .arg("../../sessions/sample.toml")
        .arg("--format")
        .arg("text")
        .assert()
        .success()
        .stdout(predicate::str::contains("unit 2:5, mode full_hide"))
        .stdout(predicate::str::contains("(said: إلى)"))
        .stdout(predicate::str::contains(
            "3 hidden, 0 hinted, 1 mistake(s), 2 correct, 2 revealed",
        ));
}

#[test]
fn resolve_scenario_json() {
    hifz()
        .arg("resolve")
        .arg("--passage")
        .arg("../../passages/al-baqarah-1-7.toml")
        .arg("--session")
        .arg("../../sessions/sample.toml")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"full_hide\""))
        .stdout(predicate::str::contains("\"current\": \"2:5:3\""));
}

#[test]
fn resolve_with_recitation_scores_current_unit() {
    hifz()
        .arg("resolve")
        .arg("--passage")
        .arg("../../passages/al-baqarah-1-7.toml")
        .arg("--session")
        .arg("../../sessions/sample.toml")
        .arg("--format")
        .arg("text")
        .arg("--recite")
        .arg("أولئك على هدى من ربهم وأولئك هم المفلحون")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 hidden, 0 hinted, 0 mistake(s), 8 correct, 0 revealed",
        ));
}

#[test]
fn resolve_missing_session() {
    hifz()
        .arg("resolve")
        .arg("--passage")
        .arg("../../passages/al-fatiha.toml")
        .arg("--session")
        .arg("no_such_session.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read scenario file"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    hifz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created hifz.toml"))
        .stdout(predicate::str::contains("Created passages/al-fatiha.toml"))
        .stdout(predicate::str::contains("Created sessions/example.toml"));

    assert!(dir.path().join("hifz.toml").exists());
    assert!(dir.path().join("passages/al-fatiha.toml").exists());
    assert!(dir.path().join("sessions/example.toml").exists());
}

#[test]
fn init_output_resolves() {
    let dir = TempDir::new().unwrap();

    hifz().current_dir(dir.path()).arg("init").assert().success();

    hifz()
        .current_dir(dir.path())
        .arg("resolve")
        .arg("--passage")
        .arg("passages/al-fatiha.toml")
        .arg("--session")
        .arg("sessions/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("mode first_letter"))
        .stdout(predicate::str::contains(
            "0 hidden, 3 hinted, 0 mistake(s), 1 correct, 0 revealed",
        ));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    hifz().current_dir(dir.path()).arg("init").assert().success();

    // Second init should skip
    hifz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    hifz()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Progressive recall engine"));
}

#[test]
fn version_output() {
    hifz()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hifz"));
}
