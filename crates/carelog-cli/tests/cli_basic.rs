//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run (against the dev data directory)
//! and verify exit codes and output shapes.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "carelog-cli", "--quiet", "--"])
        .args(args)
        .env("CARELOG_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn resident_ids(list_stdout: &str) -> Vec<String> {
    serde_json::from_str::<serde_json::Value>(list_stdout)
        .ok()
        .and_then(|v| {
            v.as_array().map(|rows| {
                rows.iter()
                    .filter_map(|r| r["id"].as_str().map(str::to_string))
                    .collect()
            })
        })
        .unwrap_or_default()
}

#[test]
fn resident_add_and_list() {
    let (stdout, _, code) = run_cli(&[
        "resident",
        "add",
        "Ama Mensah",
        "--mobility",
        "low",
        "--diet",
        "low-sodium",
        "--allergies",
        "shellfish",
    ]);
    assert_eq!(code, 0, "resident add failed");
    assert!(stdout.contains("Resident created:"));

    let (stdout, _, code) = run_cli(&["resident", "list"]);
    assert_eq!(code, 0, "resident list failed");
    assert!(!resident_ids(&stdout).is_empty());
}

#[test]
fn resident_add_rejects_empty_name() {
    let (_, stderr, code) = run_cli(&["resident", "add", "  "]);
    assert_ne!(code, 0);
    assert!(stderr.contains("name"));
}

#[test]
fn reposition_interval_status_and_complete() {
    let (stdout, _, code) = run_cli(&["resident", "add", "Interval Test"]);
    assert_eq!(code, 0);
    let id = stdout.trim().rsplit(' ').next().unwrap().to_string();

    let (_, _, code) = run_cli(&["reposition", "set-interval", &id, "120"]);
    assert_eq!(code, 0, "set-interval failed");

    // Invalid interval is rejected at the boundary
    let (_, _, code) = run_cli(&["reposition", "set-interval", &id, "0"]);
    assert_ne!(code, 0);

    let (stdout, _, code) = run_cli(&["reposition", "status", &id]);
    assert_eq!(code, 0, "status failed");
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // No completion history: immediately due
    assert_eq!(status["overdue"], true);

    let (_, _, code) = run_cli(&["reposition", "complete", &id]);
    assert_eq!(code, 0, "complete failed");

    let (stdout, _, code) = run_cli(&["reposition", "status", &id]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["overdue"], false);
}

#[test]
fn reposition_rounds_lists_tracked_residents() {
    let (stdout, _, code) = run_cli(&["resident", "add", "Rounds Test"]);
    assert_eq!(code, 0);
    let id = stdout.trim().rsplit(' ').next().unwrap().to_string();
    let (_, _, code) = run_cli(&["reposition", "set-interval", &id, "60"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&["reposition", "rounds", "--resident", &id]);
    assert_eq!(code, 0, "rounds failed");
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
}

#[test]
fn stats_adherence_and_summary() {
    let (_, _, code) = run_cli(&["stats", "adherence"]);
    assert_eq!(code, 0, "stats adherence failed");

    let (stdout, _, code) = run_cli(&["stats", "adherence", "--csv", "--full"]);
    assert_eq!(code, 0, "stats adherence csv failed");
    assert!(stdout.starts_with("Resident,Adherence,OnTimePct,Hour00"));

    let (stdout, _, code) = run_cli(&["stats", "summary"]);
    assert_eq!(code, 0, "stats summary failed");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(summary["residents"].is_number());
}

#[test]
fn notify_tick_outputs_json() {
    let (stdout, _, code) = run_cli(&["notify", "tick"]);
    assert_eq!(code, 0, "notify tick failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout)
        .unwrap()
        .is_array());
}

#[test]
fn assistant_send_and_transcript() {
    let (stdout, _, code) = run_cli(&["assistant", "send", "I feel cold"]);
    assert_eq!(code, 0, "assistant send failed");
    assert!(stdout.contains("blanket"));

    let (stdout, _, code) = run_cli(&["assistant", "transcript", "--limit", "5"]);
    assert_eq!(code, 0, "assistant transcript failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout)
        .unwrap()
        .is_array());
}

#[test]
fn config_get_set_and_list() {
    let (_, _, code) = run_cli(&["config", "set", "facility.name", "North Wing"]);
    assert_eq!(code, 0, "config set failed");

    let (stdout, _, code) = run_cli(&["config", "get", "facility.name"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "North Wing");

    let (_, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");

    let (_, _, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn careplan_add_list_complete() {
    let (stdout, _, code) = run_cli(&["resident", "add", "Plan Test"]);
    assert_eq!(code, 0);
    let rid = stdout.trim().rsplit(' ').next().unwrap().to_string();

    let (stdout, _, code) = run_cli(&[
        "careplan", "add", &rid, "Turn schedule", "--frequency", "q2h",
    ]);
    assert_eq!(code, 0, "careplan add failed");
    let plan_id = stdout.trim().rsplit(' ').next().unwrap().to_string();

    // Bad frequency notation is rejected
    let (_, _, code) = run_cli(&["careplan", "add", &rid, "Bad", "--frequency", "2h"]);
    assert_ne!(code, 0);

    let (_, _, code) = run_cli(&["careplan", "complete", &plan_id, "--note", "done"]);
    assert_eq!(code, 0, "careplan complete failed");

    let (stdout, _, code) = run_cli(&["careplan", "list", "--resident", &rid]);
    assert_eq!(code, 0, "careplan list failed");
    assert!(stdout.contains("Turn schedule"));
}

#[test]
fn guide_flow_enforces_checks() {
    let (stdout, _, code) = run_cli(&["resident", "add", "Guide Test"]);
    assert_eq!(code, 0);
    let rid = stdout.trim().rsplit(' ').next().unwrap().to_string();

    let (_, _, code) = run_cli(&["reposition", "guide", "start", &rid]);
    assert_eq!(code, 0, "guide start failed");

    // Advancing before the checks are confirmed must fail
    let (_, _, code) = run_cli(&["reposition", "guide", "next"]);
    assert_ne!(code, 0);

    for check in ["brakes", "height", "clear"] {
        let (_, _, code) = run_cli(&["reposition", "guide", "check", check]);
        assert_eq!(code, 0, "guide check {check} failed");
    }
    let (_, _, code) = run_cli(&["reposition", "guide", "next"]);
    assert_eq!(code, 0, "guide next failed");
}
