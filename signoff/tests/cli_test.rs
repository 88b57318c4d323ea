//! Runs the built binary against throwaway configuration directories.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use signoff_config::{Global, RejectionPolicy};
use tempfile::TempDir;

fn signoff(config_dir: &TempDir, args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_signoff"))
        .args(args)
        .env("SIGNOFF_CONFIG_DIR", config_dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).unwrap();
        }
    }
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_demo_shows_partial_approval() {
    let dir = TempDir::new().unwrap();
    let out = stdout(&signoff(&dir, &["demo"], None));
    assert!(out.contains("Implement Security Protocol"));
    assert!(out.contains("Pending (1/3)"));
    assert!(out.contains("Requested by Project Manager"));
    assert!(out.contains("Tasks: 1 (1 pending, 0 approved, 0 rejected)"));

    let out = stdout(&signoff(&dir, &["demo", "--complete"], None));
    assert!(out.contains("Status: Approved (100%)"));
}

#[test]
fn test_replay_plain() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "ids = \"sequence\"\n").unwrap();
    let requests = r#"{"type":"CreateTask","data":{"title":"t","description":"d","requester":"r","approvers":["a","b"]}}

{"type":"RejectTask","data":{"taskId":"1","approver":"b"}}
{"type":"ApproveTask","data":{"taskId":"1","approver":"b"}}
not json
"#;
    let out = stdout(&signoff(
        &dir,
        &["replay", "-", "--output-format", "plain"],
        Some(requests),
    ));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "task 1 Pending (0/2)");
    assert_eq!(lines[1], "Task rejected: task 1 Rejected");
    assert!(lines[2].starts_with("error TASK_004"));
    assert!(lines[3].starts_with("error MSG_001"));
}

#[test]
fn test_replay_json_from_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("requests.jsonl");
    std::fs::write(&input, "{\"type\":\"HealthCheck\"}\n").unwrap();
    let out = stdout(&signoff(&dir, &["replay", input.to_str().unwrap()], None));
    let reply: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(reply["payload"]["type"], "HealthStatus");
    assert_eq!(reply["payload"]["data"]["status"], "OK");
    assert!(reply["correlationId"].is_string());
}

#[test]
fn test_users_from_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(
        &config,
        "[[users]]\nemail = \"ops@company.com\"\nname = \"Operations\"\n",
    )
    .unwrap();
    let out = stdout(&signoff(
        &dir,
        &["users", "--config", config.to_str().unwrap()],
        None,
    ));
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("ops@company.com"));
    assert!(out.contains("Operations"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    let out = stdout(&signoff(&dir, &["config"], None));
    assert!(out.contains("[policy]"));
    let printed = Global::parse(&out).unwrap();
    assert_eq!(printed, Global::default());
    assert_eq!(printed.policy.rejection, RejectionPolicy::Overridable);
    assert_eq!(printed.policy.default_reject_reason, "Rejected by approver");
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "ids = \"dice\"\n").unwrap();
    let output = signoff(&dir, &["users"], None);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid configuration file"));
}
