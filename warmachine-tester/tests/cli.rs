use std::process::Command;

use tempfile::TempDir;

fn exe() -> &'static str {
    env!("CARGO_BIN_EXE_warmachine-tester")
}

#[test]
fn cli_writes_json_report_to_output() {
    let dir = TempDir::new().expect("temp dir");
    let output_path = dir.path().join("report.json");
    let output = Command::new(exe())
        .args([
            "--report",
            "json",
            "--seeds",
            "1,2",
            "--policy",
            "bold",
            "--max-actions",
            "25",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("War Machine Delve Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let records: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let records = records.as_array().expect("array");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["policy"] == "bold" && r["passed"] == true));
}

#[test]
fn cli_persists_state_and_exports_envelopes() {
    let dir = TempDir::new().expect("temp dir");
    let state_dir = dir.path().join("state");
    let export_dir = dir.path().join("exports");
    let status = Command::new(exe())
        .args(["--seeds", "9", "--policy", "cautious", "--report", "markdown"])
        .arg("--state-dir")
        .arg(&state_dir)
        .arg("--export")
        .arg(&export_dir)
        .arg("--output")
        .arg(dir.path().join("report.md"))
        .status()
        .expect("run cli");
    assert!(status.success());

    assert!(state_dir.join("cautious-seed-9").is_dir());
    let envelope = std::fs::read_to_string(export_dir.join("cautious-seed-9.json")).expect("export");
    assert!(envelope.contains("\"schemaVersion\""));
    let report = std::fs::read_to_string(dir.path().join("report.md")).expect("report");
    assert!(report.starts_with("# War Machine Delve Results"));
}

#[test]
fn cli_imports_an_exported_party() {
    let dir = TempDir::new().expect("temp dir");
    let export_dir = dir.path().join("exports");
    let status = Command::new(exe())
        .args(["--seeds", "4", "--policy", "bold", "--max-actions", "5"])
        .arg("--export")
        .arg(&export_dir)
        .arg("--output")
        .arg(dir.path().join("first.txt"))
        .status()
        .expect("run cli");
    assert!(status.success());

    let output_path = dir.path().join("second.json");
    let status = Command::new(exe())
        .args(["--seeds", "4", "--policy", "bold", "--report", "json", "--import"])
        .arg(export_dir.join("bold-seed-4.json"))
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("\"partySize\": 4"));
}

#[test]
fn cli_rejects_out_of_range_rules() {
    let dir = TempDir::new().expect("temp dir");
    let rules = dir.path().join("rules.json");
    std::fs::write(&rules, r#"{ "searchChance": 1.5 }"#).expect("write rules");
    let output = Command::new(exe())
        .arg("--rules")
        .arg(&rules)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid rules"));
}

#[test]
fn cli_rejects_unknown_policy() {
    let output = Command::new(exe())
        .args(["--policy", "reckless"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown policy"));
}
