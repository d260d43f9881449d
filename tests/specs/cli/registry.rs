use assert_cmd::Command;
use tempfile::TempDir;

#[test]
fn worker_list_is_empty_in_a_fresh_config_dir() {
    let dir = TempDir::new().expect("tempdir");
    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd
        .env("ORCH_CONFIG_DIR", dir.path())
        .args(["worker", "list"])
        .output()
        .expect("run orch worker list");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No workers found"), "unexpected stdout: {stdout}");
}

#[test]
fn registry_show_json_is_an_empty_array_in_a_fresh_config_dir() {
    let dir = TempDir::new().expect("tempdir");
    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd
        .env("ORCH_CONFIG_DIR", dir.path())
        .args(["--format", "json", "registry", "show"])
        .output()
        .expect("run orch registry show");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value, serde_json::json!([]));
}

#[test]
fn worker_stop_for_unknown_profile_fails() {
    let dir = TempDir::new().expect("tempdir");
    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd
        .env("ORCH_CONFIG_DIR", dir.path())
        .args(["worker", "stop", "does-not-exist"])
        .output()
        .expect("run orch worker stop");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no running worker"), "unexpected stderr: {stderr}");
}
