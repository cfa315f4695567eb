//! End-to-end tests driving the `wt` binary.
//!
//! Each test gets its own database through a temporary config file, so state
//! only carries over between invocations within one test.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn wt_binary() -> String {
    env!("CARGO_BIN_EXE_wt").to_string()
}

/// Writes a config pointing at a database inside `temp`.
fn write_config(temp: &Path) -> PathBuf {
    let db_file = temp.join("wt.db");
    let config_file = temp.join("config.toml");
    std::fs::write(
        &config_file,
        format!(r#"database_path = "{}""#, db_file.display()),
    )
    .unwrap();
    config_file
}

fn wt(config: &Path, args: &[&str]) -> Output {
    Command::new(wt_binary())
        .env_remove("WT_DATABASE_PATH")
        .env_remove("WT_RULES_PATH")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run wt")
}

fn wt_with_stdin(config: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(wt_binary())
        .env_remove("WT_DATABASE_PATH")
        .env_remove("WT_RULES_PATH")
        .arg("--config")
        .arg(config)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin.write_all(input.as_bytes()).unwrap();
    }

    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "wt failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

/// Tab events in, daily totals out.
#[test]
fn test_ingest_then_stats() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let today = chrono::Utc::now().date_naive().to_string();

    let events = r#"{"type":"activated","tabId":1,"url":"https://github.com/org/repo","timestamp":"DAYT09:00:00Z"}
{"type":"tick","timestamp":"DAYT09:01:00Z"}
{"type":"navigated","tabId":1,"url":"https://www.reddit.com/r/rust","timestamp":"DAYT09:10:00Z"}
{"type":"defocused","timestamp":"DAYT09:15:00Z"}
"#
    .replace("DAY", &today);
    let output = stdout(&wt_with_stdin(&config, &["ingest"], &events));
    assert_eq!(output.trim(), "Ingested 4 events: 3 visits recorded");

    let output = stdout(&wt(&config, &["stats", "--date", &today, "--json"]));
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["totalTime"], 15 * 60_000);
    assert_eq!(json["visitCount"], 3);
    assert_eq!(json["categories"][0]["category"], "Work");
    assert_eq!(json["categories"][0]["totalTime"], 10 * 60_000);
    assert_eq!(json["categories"][1]["category"], "Social");
}

/// Replayed events older than the retention window are not stored.
#[test]
fn test_ingest_of_old_history_keeps_nothing() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let events = r#"{"type":"activated","tabId":1,"url":"https://github.com","timestamp":"2020-01-01T09:00:00Z"}
{"type":"defocused","timestamp":"2020-01-01T09:10:00Z"}
"#;
    let output = stdout(&wt_with_stdin(&config, &["ingest"], events));
    assert_eq!(
        output.trim(),
        "Ingested 2 events: 0 visits recorded, 1 outside the retention window"
    );

    let status = stdout(&wt(&config, &["status"]));
    assert!(status.contains("Nothing recorded yet."), "status: {status}");
}

/// Malformed lines are skipped without failing the run.
#[test]
fn test_ingest_tolerates_malformed_lines() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = wt_with_stdin(&config, &["ingest"], "not valid json\n{\"also\":\"incomplete\n");
    assert!(output.status.success(), "ingest should succeed");
    let out = String::from_utf8_lossy(&output.stdout);
    assert!(out.contains("2 malformed"), "unexpected output: {out}");
}

/// Overrides persist and beat the rules.
#[test]
fn test_override_changes_classification() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    assert_eq!(
        stdout(&wt(&config, &["classify", "https://www.youtube.com/watch"])).trim(),
        "Entertainment"
    );

    stdout(&wt(&config, &["override", "set", "WWW.YouTube.com", "Work"]));
    assert_eq!(
        stdout(&wt(&config, &["classify", "https://www.youtube.com/watch"])).trim(),
        "Work"
    );
    assert_eq!(
        stdout(&wt(&config, &["override", "list"])).trim(),
        "www.youtube.com -> Work"
    );
}

/// Rejected input exits non-zero and leaves settings alone.
#[test]
fn test_invalid_override_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = wt(&config, &["override", "set", "not a domain", "Work"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid domain format"), "stderr: {stderr}");

    assert_eq!(
        stdout(&wt(&config, &["override", "list"])).trim(),
        "No overrides."
    );
}

/// Custom patterns are reloaded by later invocations.
#[test]
fn test_custom_pattern_survives_restart() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    stdout(&wt(&config, &["pattern", "add", "Work", r"(^|\.)internal\.corp$"]));
    assert_eq!(
        stdout(&wt(&config, &["classify", "https://wiki.internal.corp/page"])).trim(),
        "Work"
    );
}

/// A configured rule document replaces the built-in rules.
#[test]
fn test_rules_path_replaces_builtin_rules() {
    let temp = TempDir::new().unwrap();
    let rules_file = temp.path().join("rules.json");
    std::fs::write(
        &rules_file,
        r#"{"version":1,"categories":{"Social":{"patterns":["github\\.com$"]}}}"#,
    )
    .unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "database_path = \"{}\"\nrules_path = \"{}\"\n",
            temp.path().join("wt.db").display(),
            rules_file.display()
        ),
    )
    .unwrap();

    assert_eq!(
        stdout(&wt(&config, &["classify", "https://github.com"])).trim(),
        "Social"
    );
    assert_eq!(
        stdout(&wt(&config, &["classify", "https://youtube.com"])).trim(),
        "Other"
    );
}

/// Record and status share the same database.
#[test]
fn test_record_then_status() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = stdout(&wt(&config, &["record", "https://docs.rs/serde", "--duration", "600"]));
    assert_eq!(output.trim(), "Recorded 10m on docs.rs as Work");

    let output = stdout(&wt(&config, &["record", "about:blank", "--duration", "5"]));
    assert_eq!(output.trim(), "Skipped about:blank: not a trackable page");

    let status = stdout(&wt(&config, &["status"]));
    assert!(status.contains("Activities: 1 over 1 day"), "status: {status}");
    assert!(status.contains("Retention: 30 days"), "status: {status}");
}

/// Retention rejects zero days.
#[test]
fn test_retention_zero_rejected() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = wt(&config, &["retention", "0"]);
    assert!(!output.status.success());
    assert_eq!(
        stdout(&wt(&config, &["retention"])).trim(),
        "Keeping 30 days of history"
    );
}
