use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("loclog-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

fn run_loclog(root: &Path, args: &[&str], envs: &[(&str, &Path)]) -> (bool, Vec<u8>, Vec<u8>) {
    let bin = std::env::var("CARGO_BIN_EXE_loclog").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("loclog.exe");
        } else {
            path.push("loclog");
        }
        path.to_string_lossy().into_owned()
    });
    let mut cmd = Command::new(bin);
    cmd.args(args);
    // Keep the user's config and log out of the picture
    cmd.env("HOME", root)
        .env("LOCLOG_CONFIG", root.join("no-config.toml"))
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("LOCLOG_LOG_FILE")
        .env_remove("RUST_LOG");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let output = cmd.output().expect("run loclog");
    (output.status.success(), output.stdout, output.stderr)
}

fn log_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read log")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn record_replay_appends_one_entry_per_fix() {
    let root = unique_temp_dir("replay");
    let log = root.join("Documents").join("location_log.txt");
    let samples = root.join("fixes.txt");
    write_file(&samples, "# test walk\n37.4220,-122.0841\n37.4221,-122.0842\n37.4222 -122.0843\n");

    let (ok, stdout, stderr) = run_loclog(
        &root,
        &[
            "record",
            "--log-file",
            log.to_str().unwrap(),
            "--samples",
            samples.to_str().unwrap(),
            "--interval-ms",
            "1",
            "--fastest-interval-ms",
            "1",
            "--priority",
            "high-accuracy",
            "--accuracy",
        ],
        &[],
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let lines = log_lines(&log);
    assert_eq!(lines.len(), 1 + 3 * 6);
    assert!(lines[0].starts_with("Log start date and time: "));
    assert_eq!(lines[2], "Latitude: 37.422");
    assert_eq!(lines[3], "Longitude: -122.0841");
    assert_eq!(lines[4], "Priority: High Accuracy");
    assert_eq!(lines[5], "Accuracy On: true");
    assert_eq!(lines[6], "----------");
    assert_eq!(lines[14], "Latitude: 37.4222");

    // Read-back is printed after stopping
    let out = String::from_utf8_lossy(&stdout);
    assert_eq!(out.matches("Priority: High Accuracy").count(), 3);
    let err = String::from_utf8_lossy(&stderr);
    assert!(err.contains("Started logging location"), "stderr: {err}");
    assert!(err.contains("Stopped logging location"), "stderr: {err}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn record_json_reports_session() {
    let root = unique_temp_dir("json");
    let log = root.join("location_log.txt");
    let samples = root.join("fixes.txt");
    write_file(&samples, "1.5,2.5\n3.5,4.5\n");

    let (ok, stdout, stderr) = run_loclog(
        &root,
        &[
            "record",
            "-j",
            "--log-file",
            log.to_str().unwrap(),
            "--samples",
            samples.to_str().unwrap(),
            "--batch-size",
            "2",
            "--interval-ms",
            "1",
            "--fastest-interval-ms",
            "1",
        ],
        &[],
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["was_active"].as_bool(), Some(true));
    assert_eq!(json["samples_logged"].as_u64(), Some(2));
    assert_eq!(json["write_failures"].as_u64(), Some(0));
    assert_eq!(json["storage_degraded"].as_bool(), Some(false));
    let lines = json["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 13);
    assert_eq!(lines[4].as_str(), Some("Priority: Balanced Power Accuracy"));
    assert_eq!(lines[5].as_str(), Some("Accuracy On: false"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn denied_location_logs_nothing() {
    let root = unique_temp_dir("denied");
    let log = root.join("location_log.txt");
    let samples = root.join("fixes.txt");
    write_file(&samples, "1,2\n");

    let (ok, stdout, stderr) = run_loclog(
        &root,
        &[
            "record",
            "--deny-location",
            "--log-file",
            log.to_str().unwrap(),
            "--samples",
            samples.to_str().unwrap(),
        ],
        &[],
    );
    assert!(!ok);
    assert!(stdout.is_empty());
    let err = String::from_utf8_lossy(&stderr);
    assert!(err.contains("Permission denied"), "stderr: {err}");
    assert!(!err.contains("Started logging location"));

    // Only the launch marker
    let lines = log_lines(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Log start date and time: "));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn each_launch_adds_a_start_marker() {
    let root = unique_temp_dir("markers");
    let log = root.join("location_log.txt");
    let samples = root.join("fixes.txt");
    write_file(&samples, "10,20\n");
    let args = [
        "record",
        "-q",
        "--log-file",
        log.to_str().unwrap(),
        "--samples",
        samples.to_str().unwrap(),
        "--interval-ms",
        "1",
        "--fastest-interval-ms",
        "1",
    ];

    assert!(run_loclog(&root, &args, &[]).0);
    let (ok, stdout, _) = run_loclog(&root, &args, &[]);
    assert!(ok);
    assert!(stdout.is_empty(), "quiet read-back prints nothing");

    let lines = log_lines(&log);
    let markers = lines
        .iter()
        .filter(|l| l.starts_with("Log start date and time: "))
        .count();
    assert_eq!(markers, 2);
    assert_eq!(lines.len(), 2 + 2 * 6);
    assert_eq!(lines[2], "Latitude: 10.0");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn simulated_provider_stops_after_count() {
    let root = unique_temp_dir("simulated");
    let log = root.join("location_log.txt");

    let (ok, _, stderr) = run_loclog(
        &root,
        &[
            "record",
            "-q",
            "--provider",
            "simulated",
            "--origin",
            "51.5,-0.12",
            "-n",
            "4",
            "--interval-ms",
            "1",
            "--fastest-interval-ms",
            "1",
            "--priority",
            "low-power",
            "--log-file",
            log.to_str().unwrap(),
        ],
        &[],
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let lines = log_lines(&log);
    assert_eq!(lines.len(), 1 + 4 * 6);
    assert_eq!(lines[2], "Latitude: 51.5");
    assert_eq!(lines[3], "Longitude: -0.12");
    assert_eq!(
        lines.iter().filter(|l| *l == "Priority: Low Power").count(),
        4
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn invalid_sample_file_is_rejected() {
    let root = unique_temp_dir("bad-samples");
    let log = root.join("location_log.txt");
    let samples = root.join("fixes.txt");
    write_file(&samples, "1,2\nnorth,east\n");

    let (ok, _, stderr) = run_loclog(
        &root,
        &[
            "record",
            "--log-file",
            log.to_str().unwrap(),
            "--samples",
            samples.to_str().unwrap(),
        ],
        &[],
    );
    assert!(!ok);
    let err = String::from_utf8_lossy(&stderr);
    assert!(
        err.contains(r#"Invalid sample on line 2: "north,east""#),
        "stderr: {err}"
    );
    assert!(!log.exists());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn inverted_intervals_are_rejected() {
    let root = unique_temp_dir("intervals");
    let log = root.join("location_log.txt");

    let (ok, _, stderr) = run_loclog(
        &root,
        &[
            "record",
            "--provider",
            "simulated",
            "--interval-ms",
            "100",
            "--fastest-interval-ms",
            "500",
            "--log-file",
            log.to_str().unwrap(),
        ],
        &[],
    );
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Invalid session configuration"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn show_prints_log_and_tail() {
    let root = unique_temp_dir("show");
    let log = root.join("location_log.txt");
    write_file(
        &log,
        "Log start date and time: 19/10/2026 10:00:00\n\
         Timestamp: 19/10/2026 10:00:05\n\
         Latitude: 1.0\n\
         Longitude: 2.0\n\
         Priority: No Power\n\
         Accuracy On: false\n\
         ----------\n",
    );

    let (ok, stdout, _) = run_loclog(&root, &["show", "--log-file", log.to_str().unwrap()], &[]);
    assert!(ok);
    assert_eq!(String::from_utf8_lossy(&stdout).lines().count(), 7);

    let (ok, stdout, _) = run_loclog(
        &root,
        &["show", "--tail", "2", "--log-file", log.to_str().unwrap()],
        &[],
    );
    assert!(ok);
    assert_eq!(
        String::from_utf8_lossy(&stdout),
        "Accuracy On: false\n----------\n"
    );

    let (ok, stdout, _) = run_loclog(
        &root,
        &["show", "--json", "--tail", "1", "--log-file", log.to_str().unwrap()],
        &[],
    );
    assert!(ok);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["lines"][0].as_str(), Some("----------"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn show_missing_log_fails() {
    let root = unique_temp_dir("show-missing");
    let log = root.join("nope.txt");
    let (ok, _, stderr) = run_loclog(&root, &["show", "--log-file", log.to_str().unwrap()], &[]);
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Failed to read log file"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn path_honours_environment_override() {
    let root = unique_temp_dir("path");
    let env_log = root.join("env").join("location_log.txt");

    let (ok, stdout, _) = run_loclog(&root, &["path"], &[("LOCLOG_LOG_FILE", &env_log)]);
    assert!(ok);
    assert_eq!(
        String::from_utf8_lossy(&stdout).trim(),
        env_log.to_string_lossy()
    );

    let cli_log = root.join("cli.txt");
    let (ok, stdout, _) = run_loclog(
        &root,
        &["path", "--log-file", cli_log.to_str().unwrap()],
        &[("LOCLOG_LOG_FILE", &env_log)],
    );
    assert!(ok);
    assert_eq!(
        String::from_utf8_lossy(&stdout).trim(),
        cli_log.to_string_lossy()
    );

    let (ok, stdout, _) = run_loclog(&root, &["path"], &[]);
    assert!(ok);
    assert!(String::from_utf8_lossy(&stdout).trim().ends_with("location_log.txt"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn config_file_supplies_session_defaults() {
    let root = unique_temp_dir("config");
    let log = root.join("location_log.txt");
    let samples = root.join("fixes.txt");
    let config = root.join("loclog.toml");
    write_file(&samples, "5,6\n");
    write_file(
        &config,
        &format!(
            "priority = \"no-power\"\naccuracy = true\ninterval_ms = 1\nfastest_interval_ms = 1\nlog_file = \"{}\"\n",
            log.to_string_lossy().replace('\\', "\\\\")
        ),
    );

    let (ok, _, stderr) = run_loclog(
        &root,
        &["record", "-q", "--samples", samples.to_str().unwrap()],
        &[("LOCLOG_CONFIG", &config)],
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let lines = log_lines(&log);
    assert_eq!(lines[4], "Priority: No Power");
    assert_eq!(lines[5], "Accuracy On: true");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn unwritable_log_is_reported_once() {
    let root = unique_temp_dir("unwritable");
    let blocker = root.join("blocker");
    write_file(&blocker, "x");
    let log = blocker.join("location_log.txt");
    let samples = root.join("fixes.txt");
    write_file(&samples, "1,2\n3,4\n");

    let (ok, _, stderr) = run_loclog(
        &root,
        &[
            "record",
            "-q",
            "--log-file",
            log.to_str().unwrap(),
            "--samples",
            samples.to_str().unwrap(),
            "--interval-ms",
            "1",
            "--fastest-interval-ms",
            "1",
        ],
        &[],
    );
    let err = String::from_utf8_lossy(&stderr);
    assert!(ok, "stderr: {err}");
    assert_eq!(
        err.matches("Log file unavailable; samples are not being saved").count(),
        1,
        "stderr: {err}"
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn show_tolerates_invalid_utf8() {
    let root = unique_temp_dir("show-lossy");
    let log = root.join("location_log.txt");
    fs::write(
        &log,
        b"Log start date and time: 19/10/2026 10:00:00\ncaf\xe9\n",
    )
    .expect("write log");

    let (ok, stdout, stderr) =
        run_loclog(&root, &["show", "--log-file", log.to_str().unwrap()], &[]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let out = String::from_utf8(stdout).expect("utf8 output");
    assert_eq!(out.lines().count(), 2);
    assert!(out.contains("caf\u{FFFD}"));

    let _ = fs::remove_dir_all(root);
}
