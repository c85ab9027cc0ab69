//! `--json` mode keeps stdout machine-readable: logs go to stderr.

use std::process::Command;

use vma_fleet::{JsonlLegacySink, LegacyAsgRecord, LegacyAsgSink};

#[tokio::test]
async fn json_stdout_parses_while_logs_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy_asgs.jsonl");
    let sink = JsonlLegacySink::new(&path);
    sink.record_legacy_asg("us-west-2", "legacy-asg").await.unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_vma"))
        .args(["--json", "legacy", "--legacy-log"])
        .arg(&path)
        .env("RUST_LOG", "info")
        .env_remove("VMA_LEGACY_LOG")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<LegacyAsgRecord> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].asg_name, "legacy-asg");

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("legacy log read"));
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        serde_json::from_str::<serde_json::Value>(line).unwrap();
    }
}
