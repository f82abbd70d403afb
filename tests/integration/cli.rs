use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

const FAST_CONFIG: &str = r#"
name = "cli"
requests = 8
workers = 4
seed = 9
monitor_resources = false

[[workload]]
kind = "io"
ratio = 0.5
params = { latency_ms = 2 }

[[workload]]
kind = "calculation"
ratio = 0.5
"#;

fn loadprobe() -> Command {
    let mut cmd = Command::cargo_bin("loadprobe").unwrap();
    cmd.env("NO_COLOR", "1")
        .env("LOADPROBE_NO_PROGRESS", "1")
        .env_remove("LOADPROBE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// `init` writes a configuration that `validate` accepts
#[test]
fn test_init_then_validate() {
    let project = TestProject::new().unwrap();

    project.run_loadprobe(&["init"]).unwrap().assert_success().assert_stdout_contains("Created");
    assert!(project.project_path().join("loadprobe.toml").exists());

    project
        .run_loadprobe(&["validate"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("is valid")
        .assert_stdout_contains("cpu");
}

/// `init` refuses to clobber an existing file
#[test]
fn test_init_twice_fails_without_force() {
    let project = TestProject::new().unwrap();
    project.run_loadprobe(&["init"]).unwrap().assert_success();

    loadprobe()
        .current_dir(project.project_path())
        .arg("init")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--force"))
        .stderr(predicate::str::contains("Failed to build target operation").not());

    loadprobe().current_dir(project.project_path()).args(["init", "--force"]).assert().success();
}

/// A passing run exits 0 and prints the summary
#[test]
fn test_run_passes_with_exit_zero() {
    let project = TestProject::new().unwrap();
    project.write_config(FAST_CONFIG).unwrap();

    loadprobe()
        .current_dir(project.project_path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Load run 'cli' (fan-out)"))
        .stdout(predicate::str::contains("8 invocations"))
        .stdout(predicate::str::contains("Result: PASSED"));
}

/// Missing the SLA exits 2 rather than 1
#[test]
fn test_sla_failure_exits_two() {
    let project = TestProject::new().unwrap();
    project
        .write_config(
            r#"
requests = 4
workers = 4
monitor_resources = false

[sla]
max_error_rate = 0.0

[[workload]]
kind = "fail"
ratio = 1.0
"#,
        )
        .unwrap();

    project
        .run_loadprobe(&["run"])
        .unwrap()
        .assert_code(2)
        .assert_stdout_contains("SLA NOT MET")
        .assert_stdout_contains("error rate");
}

/// An impossible workload is a fatal error with a suggestion
#[test]
fn test_invalid_workload_exits_one() {
    let project = TestProject::new().unwrap();
    project
        .write_config(
            r#"
[[workload]]
kind = "cpu"
ratio = 0.9

[[workload]]
kind = "io"
ratio = 0.9
"#,
        )
        .unwrap();

    project
        .run_loadprobe(&["run"])
        .unwrap()
        .assert_code(1)
        .assert_stderr_contains("Invalid workload")
        .assert_stderr_contains("suggestion");
}

/// `--config` pointing nowhere is reported as not found
#[test]
fn test_missing_explicit_config() {
    let project = TestProject::new().unwrap();

    loadprobe()
        .current_dir(project.project_path())
        .args(["--config", "nope.toml", "validate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("loadprobe init"));
}

/// The config path can come from the environment
#[test]
fn test_config_from_environment() {
    let project = TestProject::new().unwrap();
    let path = project.write_config(FAST_CONFIG).unwrap();
    let elsewhere = TestProject::new().unwrap();

    loadprobe()
        .current_dir(elsewhere.project_path())
        .env("LOADPROBE_CONFIG", &path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration 'cli' is valid"));
}

/// Flags override the file and `--output` writes a JSON report
#[test]
fn test_run_overrides_and_json_output() {
    let project = TestProject::new().unwrap();
    project.write_config(FAST_CONFIG).unwrap();

    project
        .run_loadprobe(&["--quiet", "run", "-n", "12", "--name", "override", "--output", "reports"])
        .unwrap()
        .assert_success();

    let files = project.list_files("reports");
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("override_") && name.ends_with(".json"), "unexpected file {name}");

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(value["report"]["summary"]["total"], 12);
}

/// `sustained` forces sustained mode for the given duration
#[test]
fn test_sustained_command() {
    let project = TestProject::new().unwrap();
    project.write_config(FAST_CONFIG).unwrap();

    loadprobe()
        .current_dir(project.project_path())
        .args(["sustained", "--duration", "1", "--pause-ms", "100"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("(sustained)"));
}

/// `--verbose` and `--quiet` cannot be combined
#[test]
fn test_verbose_conflicts_with_quiet() {
    loadprobe()
        .args(["--verbose", "--quiet", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
