use assert_cmd::Command;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn run_fails_when_workflow_file_is_missing() {
    let dir = TempDir::new().expect("tempdir");
    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd
        .env("ORCH_CONFIG_DIR", dir.path())
        .args(["workflow", "run", "--file", "/no/such/workflow.json", "--task", "hello"])
        .output()
        .expect("run orch workflow run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reading workflow definition"), "unexpected stderr: {stderr}");
}

#[test]
fn run_fails_when_workflow_file_is_not_valid_json() {
    let dir = TempDir::new().expect("tempdir");
    let mut file = tempfile::NamedTempFile::new().expect("named temp file");
    writeln!(file, "not json").expect("write");

    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd
        .env("ORCH_CONFIG_DIR", dir.path())
        .args(["workflow", "run", "--file", file.path().to_str().unwrap(), "--task", "hello"])
        .output()
        .expect("run orch workflow run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parsing workflow definition"), "unexpected stderr: {stderr}");
}

#[test]
fn run_records_a_failed_step_when_the_worker_does_not_exist() {
    let dir = TempDir::new().expect("tempdir");
    let mut file = tempfile::NamedTempFile::new().expect("named temp file");
    writeln!(
        file,
        r#"{{
            "id": "wf-1",
            "name": "smoke",
            "description": "smoke test",
            "steps": [
                {{ "id": "s1", "title": "first", "workerId": "missing-worker", "template": "{{task}}", "carry": false }}
            ]
        }}"#
    )
    .expect("write");

    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd
        .env("ORCH_CONFIG_DIR", dir.path())
        .args(["workflow", "run", "--file", file.path().to_str().unwrap(), "--task", "hello"])
        .output()
        .expect("run orch workflow run");
    // The CLI submits the run successfully — a missing worker is a failed
    // step recorded in the result, not a CLI-level error.
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[fail]"), "unexpected stdout: {stdout}");
}
