use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Write a loadtest file where both directions carry the given tx/rx curves.
fn write_loadtest(dir: &Path, name: &str, profile: &str, tx: &[f64], rx: &[f64]) -> PathBuf {
    let stats: serde_json::Map<String, Value> = tx
        .iter()
        .zip(rx)
        .enumerate()
        .map(|(i, (&tx, &rx))| {
            let ch = json!({"tx_pps": tx, "rx_pps": rx, "tx_util": tx / 1e6, "rx_util": rx / 1e6});
            (format!("{}", 1_700_000_000 + i), json!({"0": ch, "1": ch}))
        })
        .collect();
    let doc = json!({
        "vars": {
            "profile_file": profile,
            "warmup_mult": 1,
            "warmup_duration": 5,
            "rampup_target": 100,
            "rampup_duration": 60,
            "hold_duration": 30,
        },
        "stats": stats,
    });
    let path = dir.join(format!("{name}.json"));
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
    path
}

fn fixture() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let a = write_loadtest(
        dir.path(),
        "router-a",
        "imix.py",
        &[1e7, 2e7, 3e7],
        &[1e7, 2e7, 1e7],
    );
    let b = write_loadtest(
        dir.path(),
        "router-b",
        "imix.py",
        &[1e7, 2e7, 3e7],
        &[1e7, 2e7, 3e7],
    );
    (dir, a, b)
}

/// HTML report is written to the requested file
#[test]
fn test_html_report() {
    let (dir, a, b) = fixture();
    let out = dir.path().join("report.html");

    Command::cargo_bin("ltgraph")
        .unwrap()
        .arg("-o")
        .arg(&out)
        .arg("-a")
        .arg("/assets/")
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("<title>Loadtest results</title>"));
    assert!(html.contains("<h2>Profile: imix</h2>"));
    assert!(html.contains("src=\"/assets/loadtest.js\""));
    assert!(html.contains("Mpps at &lt;0.10% loss"));
    assert!(html.contains("data-ltdata="));
    assert!(html.contains("data-errdata="));
    assert!(!html.contains("Generator warnings"));
    // router-b reaches the higher line rate and is listed first
    let pos_a = html.find("<td class=\"left\">router-a</td>").unwrap();
    let pos_b = html.find("<td class=\"left\">router-b</td>").unwrap();
    assert!(pos_b < pos_a);
}

/// JSON output carries profiles, summaries and breaking points
#[test]
fn test_json_output() {
    let (_dir, a, b) = fixture();

    let output = Command::cargo_bin("ltgraph")
        .unwrap()
        .args(["--format", "json", "-f", "0.1"])
        .arg(&a)
        .arg(&b)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("Invalid JSON output");
    let profile = &json["profiles"][0];
    assert_eq!(profile["name"], "imix");
    assert_eq!(profile["yprefix"], "M");
    assert_eq!(profile["ideal"], json!([10.0, 20.0, 30.0]));

    let runs = profile["runs"].as_array().unwrap();
    assert_eq!(runs[0]["name"], "router-b");
    assert!(runs[0]["breaking_point"][0].is_null());
    assert_eq!(runs[1]["breaking_point"][0]["index"], 2);
    assert_eq!(runs[1]["max_performance"][0]["max_ok_pps"], 10.0);
}

/// Terminal tables go to stdout by default
#[test]
fn test_table_output() {
    let (_dir, a, b) = fixture();

    Command::cargo_bin("ltgraph")
        .unwrap()
        .args(["--format", "table", "-y", "1000:K"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile: imix"))
        .stdout(predicate::str::contains("Kpps"))
        .stdout(predicate::str::contains("hold_duration"));
}

/// Config file values apply and flags override them
#[test]
fn test_config_file() {
    let (dir, a, _b) = fixture();
    let cfg = dir.path().join("ltgraph.toml");
    std::fs::write(&cfg, "fail_threshold = 0.2\nyscaler = \"1000:K\"\n").unwrap();

    let output = Command::cargo_bin("ltgraph")
        .unwrap()
        .args(["--format", "json", "-y", "1:"])
        .arg("-c")
        .arg(&cfg)
        .arg(&a)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["fail_threshold"], 0.2);
    assert_eq!(json["yscaler"], "1:");
}

/// Mismatched runs still produce a report, with warnings
#[test]
fn test_warnings_are_reported() {
    let (dir, a, _b) = fixture();
    let short = write_loadtest(dir.path(), "short", "imix.py", &[1e7], &[1e7]);
    let out = dir.path().join("index.html");

    Command::cargo_bin("ltgraph")
        .unwrap()
        .arg("-o")
        .arg(&out)
        .arg(&a)
        .arg(&short)
        .assert()
        .success()
        .stderr(predicate::str::contains("multiple loadtest datapoint counts"));

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("Generator warnings"));
}

/// Error handling and edge cases
#[test]
fn test_error_handling() {
    let (dir, a, _b) = fixture();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ nope").unwrap();
    let keyless = dir.path().join("keyless.json");
    std::fs::write(&keyless, r#"{"vars": {}}"#).unwrap();

    // every broken input is named, nothing is written
    let out = dir.path().join("never.html");
    let output = Command::cargo_bin("ltgraph")
        .unwrap()
        .arg("-o")
        .arg(&out)
        .arg(&a)
        .arg(&broken)
        .arg(&keyless)
        .output()
        .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("keyless"));
    assert!(stderr.contains("abort"));
    assert!(!out.exists());
    // once from the loader, once as the E: line
    let broken_lines: Vec<&str> = stderr.lines().filter(|l| l.contains("broken")).collect();
    assert_eq!(broken_lines.len(), 2, "{stderr}");
    assert!(broken_lines.iter().any(|l| l.contains("E:") && l.contains("broken:")));

    // threshold out of range
    Command::cargo_bin("ltgraph")
        .unwrap()
        .args(["-f", "1.5"])
        .arg(&a)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fail threshold"));

    // malformed scaler
    Command::cargo_bin("ltgraph")
        .unwrap()
        .args(["-y", "0:M"])
        .arg(&a)
        .assert()
        .code(1);

    // no inputs at all
    Command::cargo_bin("ltgraph").unwrap().assert().code(1);

    // help is not an error
    Command::cargo_bin("ltgraph")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

fn error_series<'a>(profile: &'a Value, label: &str) -> &'a Value {
    profile["error_series"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["label"] == label)
        .map(|s| &s["values"])
        .unwrap()
}

/// Utilization policy and loss representation flags reach the engine
#[test]
fn test_policy_flags() {
    let (_dir, a, b) = fixture();
    let analyze = |extra: &[&str]| -> Value {
        let output = Command::cargo_bin("ltgraph")
            .unwrap()
            .args(["--format", "json"])
            .args(extra)
            .arg(&a)
            .arg(&b)
            .output()
            .expect("Failed to execute command");
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    };
    let run = |json: &Value, name: &str| -> Value {
        json["profiles"][0]["runs"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == name)
            .cloned()
            .unwrap()
    };

    // router-a utilization goes 10, 20, 10
    let default = analyze(&[]);
    assert_eq!(run(&default, "router-a")["max_performance"][0]["max_lr_perc"], 20.0);
    assert_eq!(
        error_series(&default["profiles"][0], "router-a 0→1 err"),
        &json!([0.0, 0.0, 0.667])
    );

    let last = analyze(&["--utilization", "last-observed"]);
    assert_eq!(run(&last, "router-a")["max_performance"][0]["max_lr_perc"], 10.0);
    assert_eq!(run(&last, "router-b")["max_performance"][0]["max_lr_perc"], 30.0);

    // 30 Mpps offered, 10 Mpps received at the last datapoint
    let volume = analyze(&["--error-loss", "volume"]);
    assert_eq!(
        error_series(&volume["profiles"][0], "router-a 0→1 err"),
        &json!([0.0, 0.0, 20.0])
    );
    assert_eq!(
        error_series(&volume["profiles"][0], "router-b 1→0 err"),
        &json!([0.0, 0.0, 0.0])
    );
}
