//! Tests for the trace replay binary and its command-line arguments


use serde_json::{json, Value};
use std::{
    path::PathBuf,
    process::{Command, Output},
};
use test_helpers::{frame, HeadPose};

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_posture-monitor"))
}

fn write_trace(name: &str, events: &[Value]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("posture-monitor-{}-{}.jsonl", name, std::process::id()));
    let content: String = events.iter().map(|event| format!("{event}\n")).collect();
    std::fs::write(&path, content).unwrap();
    path
}

fn frame_event(ms: u64, pose: HeadPose) -> Value {
    let mut value = serde_json::to_value(frame(ms, pose)).unwrap();
    value["type"] = json!("frame");
    value
}

fn output_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_print_config() {
    let output = binary().arg("--print-config").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("good_to_bad_frames: 2"));
    assert!(text.contains("yaw_threshold: 30.0"));
}

#[test]
fn test_trace_is_required() {
    let output = binary().output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_replay_with_calibrate_first() {
    // The calibration frame is also classified, so the median needs a clear slouch
    let slouched = HeadPose::upright(50.0).pitch(-30.0);
    let trace = write_trace(
        "calibrate-first",
        &[
            frame_event(0, HeadPose::upright(50.0)),
            frame_event(100, slouched),
            frame_event(200, slouched),
            json!({"type": "statistics"}),
        ],
    );

    let output = binary().arg("--trace").arg(&trace).arg("--calibrate-first").output().unwrap();
    std::fs::remove_file(&trace).ok();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = output_lines(&output);
    let types: Vec<&str> = lines.iter().map(|line| line["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        vec!["calibration", "classification", "classification", "classification", "statistics"]
    );
    assert_eq!(lines[0]["success"], json!(true));
    assert_eq!(lines[2]["is_bad"], json!(false));
    assert_eq!(lines[3]["is_bad"], json!(true));
    assert_eq!(lines[3]["issues"], json!(["head_pitch"]));
}

#[test]
fn test_control_events_and_errors() {
    let trace = write_trace(
        "control",
        &[
            json!({"type": "sensitivity", "pitch": 4.0}),
            json!({"type": "sensitivity", "pitch": 7.0}),
            json!({"type": "thresholds", "head_roll": {"enter": 18.0, "exit": 14.0}}),
            json!({"type": "reset_statistics"}),
            json!({"type": "frame", "width": 0, "height": 480, "timestamp_ms": 0}),
        ],
    );

    let output = binary().arg("--trace").arg(&trace).output().unwrap();
    std::fs::remove_file(&trace).ok();
    assert!(output.status.success());

    let lines = output_lines(&output);
    let types: Vec<&str> = lines.iter().map(|line| line["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["updated", "error", "updated", "updated", "error"]);
    assert_eq!(lines[1]["line"], json!(2));
}

#[test]
fn test_malformed_line_is_reported_and_skipped() {
    let path = std::env::temp_dir().join(format!("posture-monitor-malformed-{}.jsonl", std::process::id()));
    let content = format!(
        "{}\n{}\n{}\n{}\n",
        frame_event(0, HeadPose::upright(50.0)),
        r#"{"type":"frame","width":640,"height""#,
        frame_event(100, HeadPose::upright(50.0)),
        json!({"type": "statistics"}),
    );
    std::fs::write(&path, content).unwrap();

    let output = binary().arg("--trace").arg(&path).output().unwrap();
    std::fs::remove_file(&path).ok();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = output_lines(&output);
    let types: Vec<&str> = lines.iter().map(|line| line["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["classification", "error", "classification", "statistics"]);
    assert_eq!(lines[1]["line"], json!(2));
    assert_eq!(lines[2]["timestamp_ms"], json!(100));
}

#[test]
fn test_missing_config_file_fails() {
    let output = binary()
        .args(["--trace", "unused.jsonl", "--config", "/nonexistent/posture.yaml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
