use assert_cmd::Command;

#[test]
fn top_level_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    cmd.arg("--help");
    let output = cmd.output().expect("run orch --help");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("worker"), "help text missing 'worker': {stdout}");
    assert!(stdout.contains("workflow"), "help text missing 'workflow': {stdout}");
    assert!(stdout.contains("registry"), "help text missing 'registry': {stdout}");
}

#[test]
fn missing_subcommand_is_an_error() {
    let mut cmd = Command::cargo_bin("orch").expect("binary built");
    let output = cmd.output().expect("run orch with no args");
    assert!(!output.status.success());
}
