//! Integration tests for the quadrant binary.
//!
//! Spawns the adjudicator, feeds it command lines on stdin and checks the
//! JSON responses on stdout, one per command.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use serde_json::Value;

/// Runs the binary with `args`, sends `commands`, and returns the parsed
/// response lines together with the exit status.
fn run_with_args(args: &[&str], commands: &[&str]) -> (Vec<Value>, ExitStatus) {
    let exe = env!("CARGO_BIN_EXE_quadrant");
    let mut child = Command::new(exe)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start quadrant");

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let reader = std::io::BufReader::new(stdout);

    for cmd in commands {
        // The process may already have exited on a bad config.
        if writeln!(stdin, "{}", cmd).is_err() {
            break;
        }
    }
    let _ = stdin.flush();
    drop(stdin);

    let lines: Vec<Value> = reader
        .lines()
        .map(|l| serde_json::from_str(&l.unwrap()).expect("response is not JSON"))
        .collect();
    let status = child.wait().expect("failed to wait on child");
    (lines, status)
}

fn run_engine(commands: &[&str]) -> Vec<Value> {
    let (lines, status) = run_with_args(&[], commands);
    assert!(status.success());
    lines
}

fn temp_config(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("quadrant-{}-{name}.toml", std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn newgame_reports_opening_phase() {
    let lines = run_engine(&["newgame", "quit"]);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["response"], "ready");
    assert_eq!(lines[0]["phase"], "spring-2370-orders");
    assert_eq!(lines[0]["players"].as_array().unwrap().len(), 7);
}

#[test]
fn newgame_with_subset_of_factions() {
    let lines = run_engine(&["newgame gorn federation", "status", "quit"]);
    assert_eq!(lines[0]["players"], serde_json::json!(["federation", "gorn"]));
    assert_eq!(lines[1]["response"], "status");
    assert_eq!(lines[1]["board"]["units"].as_object().unwrap().len(), 6);
    assert_eq!(lines[1]["pending"], serde_json::json!(["federation", "gorn"]));
}

#[test]
fn commands_before_newgame_are_errors() {
    let lines = run_engine(&["resolve", "quit"]);
    assert_eq!(lines[0]["response"], "error");
    assert_eq!(lines[0]["fatal"], false);
}

#[test]
fn blank_and_comment_lines_are_skipped() {
    let lines = run_engine(&["", "# setup", "newgame", "   ", "quit"]);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["response"], "ready");
}

#[test]
fn unknown_commands_answer_with_error() {
    let lines = run_engine(&["newgame", "warp 9", "status", "quit"]);
    assert_eq!(lines[1]["response"], "error");
    assert!(lines[1]["message"].as_str().unwrap().contains("warp"));
    // The session continues after a bad line.
    assert_eq!(lines[2]["response"], "status");
}

#[test]
fn orders_are_acknowledged_with_rejections() {
    let lines = run_engine(&[
        "newgame federation klingon",
        "orders federation earth - vega ; vulcan - qonos ; andor H",
        "quit",
    ]);
    let summary = &lines[1];
    assert_eq!(summary["response"], "submission");
    assert_eq!(summary["faction"], "federation");
    assert_eq!(summary["phase"], "spring-2370-orders");
    assert_eq!(summary["accepted"], serde_json::json!(["earth - vega", "andor H"]));
    assert_eq!(summary["rejected"].as_array().unwrap().len(), 1);
    assert_eq!(summary["rejected"][0]["order"], "vulcan - qonos");
}

#[test]
fn unparseable_orders_are_an_error() {
    let lines = run_engine(&["newgame", "orders federation earth ~ vega", "quit"]);
    assert_eq!(lines[1]["response"], "error");
}

#[test]
fn resolve_reports_moves_with_edges() {
    let lines = run_engine(&[
        "newgame federation klingon",
        "orders federation earth - vega",
        "orders klingon qonos H",
        "resolve",
        "quit",
    ]);
    let turn = &lines[3];
    assert_eq!(turn["response"], "turn");
    assert_eq!(turn["phase"], "spring-2370-orders");
    let moved = turn["orders"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["order"] == "earth - vega")
        .unwrap();
    assert_eq!(moved["result"], "succeeded");
    assert_eq!(moved["edge"], "earth~vega");
    assert_eq!(turn["board"]["units"]["vega"], "federation");
    assert_eq!(turn["status"]["status"], "in_progress");
}

#[test]
fn ability_use_through_the_driver() {
    let lines = run_engine(&[
        "newgame federation romulan ferengi klingon",
        "orders federation earth - vega",
        "ability romulan intercept",
        "ability romulan intercept",
        "ability ferengi bribe qonos",
        "ability klingon intercept",
        "ability ferengi bribe nowhere",
        "quit",
    ]);
    assert_eq!(lines[2]["response"], "ability");
    assert_eq!(lines[2]["outcome"]["outcome"], "orders");
    assert_eq!(
        lines[2]["outcome"]["orders"],
        serde_json::json!([["federation", "earth - vega"]])
    );
    // Once per turn.
    assert_eq!(lines[3]["response"], "error");

    // 10 starting + 9 income - 8.
    assert_eq!(lines[4]["outcome"]["outcome"], "queued");
    assert_eq!(lines[4]["outcome"]["balance"], 11);

    assert_eq!(lines[5]["response"], "error");
    assert_eq!(lines[6]["response"], "error");
}

#[test]
fn alliance_commands() {
    let lines = run_engine(&[
        "newgame",
        "ally propose federation klingon",
        "ally accept klingon federation",
        "status",
        "ally break romulan federation",
        "quit",
    ]);
    assert_eq!(lines[1]["response"], "alliance");
    assert_eq!(lines[1]["action"], "propose");
    assert_eq!(lines[2]["action"], "accept");
    let alliances = lines[3]["alliances"].as_array().unwrap();
    assert_eq!(alliances.len(), 1);
    assert_eq!(lines[4]["response"], "error");
}

#[test]
fn quit_stops_reading() {
    let lines = run_engine(&["newgame", "quit", "status"]);
    assert_eq!(lines.len(), 1);
}

#[test]
fn eof_ends_session_cleanly() {
    let lines = run_engine(&["newgame", "status"]);
    assert_eq!(lines.len(), 2);
}

#[test]
fn config_file_sets_start_year() {
    let path = temp_config("year", "[rules]\nstart_year = 2400\n");
    let (lines, status) =
        run_with_args(&["--config", path.to_str().unwrap()], &["newgame", "quit"]);
    std::fs::remove_file(&path).ok();
    assert!(status.success());
    assert_eq!(lines[0]["phase"], "spring-2400-orders");
}

#[test]
fn invalid_config_fails_at_startup() {
    let path = temp_config("bad", "[abilities]\ngorn_survival_probability = 2.0\n");
    let (lines, status) =
        run_with_args(&["--config", path.to_str().unwrap()], &["newgame", "quit"]);
    std::fs::remove_file(&path).ok();
    assert!(!status.success());
    assert!(lines.is_empty());
}

#[test]
fn seeded_runs_are_identical() {
    let script = [
        "newgame gorn klingon",
        "orders klingon qonos - sherman",
        "resolve",
        "orders klingon sherman - vega",
        "resolve",
        "quit",
    ];
    let a = run_with_args(&["--seed", "42"], &script).0;
    let b = run_with_args(&["--seed", "42"], &script).0;
    assert_eq!(a, b);
}
