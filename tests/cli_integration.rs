// tests/cli_integration.rs
//! Integration tests for the holesmith binary.

use std::process::Command;

fn holesmith() -> Command {
    Command::new(env!("CARGO_BIN_EXE_holesmith"))
}

#[test]
fn generate_writes_variants_and_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let output = holesmith()
        .args(["generate", "scenario-a", "--profile", "systematic", "--output-dir"])
        .arg(tmp.path())
        .output()
        .expect("failed to run holesmith");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("--- Search Summary ---"), "stdout: {stdout}");
    assert!(stdout.contains("  Variants:            3"), "stdout: {stdout}");
    assert!(tmp.path().join("ScenarioAGen3.java").exists());
}

#[test]
fn dry_run_lists_class_names() {
    let output = holesmith()
        .args(["generate", "scenario-b", "-p", "systematic", "--dry-run"])
        .output()
        .expect("failed to run holesmith");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for index in 1..=4 {
        assert!(stdout.contains(&format!("ScenarioBGen{index}\n")), "stdout: {stdout}");
    }
}

#[test]
fn unknown_profile_fails_with_code() {
    let output = holesmith()
        .args(["--color", "never", "generate", "scenario-a", "--profile", "turbo", "--dry-run"])
        .output()
        .expect("failed to run holesmith");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("H2001"), "stderr: {stderr}");
}

#[test]
fn templates_lists_demos() {
    let output = holesmith()
        .arg("templates")
        .output()
        .expect("failed to run holesmith");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for name in ["scenario-a", "scenario-b", "arrays"] {
        assert!(stdout.contains(name), "missing {name}: {stdout}");
    }
}

#[test]
fn version_prints_package_version() {
    let output = holesmith()
        .arg("version")
        .output()
        .expect("failed to run holesmith");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("holesmith {}", env!("CARGO_PKG_VERSION"))));
}
