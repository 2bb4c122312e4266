use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use vectorscout_core::{Database, RecordStore};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    work: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let work = base.join("work");

        for dir in [&home, &xdg_data, &xdg_config, &xdg_state, &work] {
            fs::create_dir_all(dir).expect("failed to create test directory");
        }

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
            work,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("vectorscout/data.db")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work.join(name);
        fs::write(&path, content).expect("failed to write fixture");
        path
    }
}

const MATCH_PAYLOAD: &str = r#"{
    "v": 1, "e": "Kettering", "m": "12", "rd": "Blue2", "sn": "Sam", "t": "5460",
    "sp": "L3a", "l": true, "ns": false,
    "a": [
        {"p": "AUTON", "at": "Shoot", "d": 1500, "qd": "{\"location\":\"H\"}"},
        {"p": "AUTON", "at": "Defense", "d": 5},
        {"p": "ENDGAME", "at": "Climb", "d": 4000, "qd": "{\"result\":\"L2\",\"phase\":\"ENDGAME\"}"}
    ]
}"#;

const TBA_MATCHES: &str = r#"[
    {"comp_level": "qm", "match_number": 1, "alliances": {
        "red": {"team_keys": ["frc33", "frc67", "frc217"]},
        "blue": {"team_keys": ["frc1", "frc2", "frc3"]}}},
    {"comp_level": "qf", "match_number": 1, "alliances": {
        "red": {"team_keys": ["frc9", "frc9", "frc9"]},
        "blue": {"team_keys": ["frc9", "frc9", "frc9"]}}}
]"#;

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("vscout"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("TBA_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute vscout: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "vscout {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn stdout_of(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn zone_resolves_taps_on_builtin_diagrams() {
    let env = CliTestEnv::new();

    assert_eq!(stdout_of(&env, &["zone", "grid", "0.5", "0.5"]).trim(), "C3");
    assert_eq!(stdout_of(&env, &["zone", "grid", "0.0", "0.99"]).trim(), "E1");
    assert_eq!(stdout_of(&env, &["zone", "grid", "1.2", "0.5"]).trim(), "C5");
    assert_eq!(
        stdout_of(
            &env,
            &["zone", "shoot", "0.6", "0.5", "--designation", "Blue1", "--blue-right"]
        )
        .trim(),
        "MZ"
    );
    assert_eq!(stdout_of(&env, &["zone", "load", "1.5", "1.5"]).trim(), "no zone");
}

#[test]
fn zone_rejects_unknown_diagram_and_designation() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["zone", "climb", "0.5", "0.5"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown diagram"));

    let output = run_bin(&env, &["zone", "grid", "0.5", "0.5", "-d", "Green1"]);
    assert!(!output.status.success());
}

#[test]
fn decode_prints_record_and_warnings() {
    let env = CliTestEnv::new();
    let file = env.write("match.json", MATCH_PAYLOAD);
    let file_arg = file.to_string_lossy().into_owned();

    let args = ["decode", file_arg.as_str()];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Match payload"));
    assert!(stdout.contains("Team:        5460"));
    assert!(stdout.contains("Actions:     2"), "got:\n{stdout}");
    assert!(stdout.contains(r#"{"location":"H"}"#));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning:"), "expected a skipped-action warning");
    assert!(
        !env.db_path().exists(),
        "decode without --save must not create the database"
    );
}

#[test]
fn decode_rejects_non_object_payload() {
    let env = CliTestEnv::new();
    let file = env.write("bad.json", "[1, 2, 3]");

    let output = run_bin(&env, &["decode", &file.to_string_lossy()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to decode payload"));
}

#[test]
fn decoded_record_can_be_saved_listed_and_exported() {
    let env = CliTestEnv::new();
    let file = env.write("match.json", MATCH_PAYLOAD);

    let stdout = stdout_of(&env, &["decode", &file.to_string_lossy(), "--save"]);
    assert!(stdout.contains("Saved as record 1"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let saved = db
        .get_match_scout(1)
        .expect("failed to read record")
        .expect("record should exist");
    assert_eq!(saved.team_number, "5460");
    assert_eq!(saved.action_records.len(), 2);
    drop(db);

    let listed = stdout_of(&env, &["list"]);
    assert!(listed.contains("5460"));
    assert!(stdout_of(&env, &["list", "--pending"]).contains("5460"));

    let out_dir = env.work.join("codes");
    let payload = stdout_of(&env, &["payload", "1", "--out-dir", &out_dir.to_string_lossy()]);
    let value: serde_json::Value =
        serde_json::from_str(payload.trim()).expect("payload should be JSON");
    assert_eq!(value["t"], "5460");
    assert_eq!(value["a"].as_array().map(Vec::len), Some(2));
    assert!(out_dir.join("Kettering_12_Blue2_5460.json").exists());

    assert_eq!(
        stdout_of(&env, &["list", "--pending"]).trim(),
        "No records found."
    );
}

#[test]
fn schedule_import_show_and_delete_work_offline() {
    let env = CliTestEnv::new();
    let file = env.write("matches.json", TBA_MATCHES);

    let stdout = stdout_of(
        &env,
        &["schedule", "import", &file.to_string_lossy(), "2026miket"],
    );
    assert!(stdout.contains("Imported 1 matches from file"));

    assert_eq!(stdout_of(&env, &["schedule", "list"]).trim(), "2026miket");

    let shown = stdout_of(&env, &["schedule", "show", "2026miket", "--match", "1"]);
    assert!(shown.contains("Q1"));
    assert!(shown.contains("217"));

    let loaded = stdout_of(&env, &["schedule", "load", "2026miket"]);
    assert!(loaded.contains("Loaded 1 matches from cache"));

    stdout_of(&env, &["schedule", "delete", "2026miket"]);
    assert_eq!(
        stdout_of(&env, &["schedule", "list"]).trim(),
        "No cached schedules."
    );

    let output = run_bin(&env, &["schedule", "load", "2026miket"]);
    assert!(!output.status.success(), "no cache and no API key should fail");
}

#[test]
fn failed_schedule_refresh_keeps_cached_copy() {
    let env = CliTestEnv::new();
    let file = env.write("matches.json", TBA_MATCHES);
    stdout_of(
        &env,
        &["schedule", "import", &file.to_string_lossy(), "2026miket"],
    );

    let output = run_bin(&env, &["schedule", "load", "2026miket", "--refresh"]);
    assert!(!output.status.success(), "refresh without an API key should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("cached copy kept"));

    let shown = stdout_of(&env, &["schedule", "show", "2026miket", "--match", "1"]);
    assert!(shown.contains("217"));
    assert_eq!(stdout_of(&env, &["schedule", "list"]).trim(), "2026miket");
}

#[test]
fn oversized_payload_leaves_record_pending() {
    let env = CliTestEnv::new();
    let actions = vec![r#"{"p": "TELEOP", "at": "Shoot", "d": 1200, "qd": "{\"location\":\"H\"}"}"#; 80]
        .join(",");
    let payload = format!(
        r#"{{"v": 1, "e": "Kettering", "m": "40", "rd": "Red1", "sn": "Sam", "t": "33",
            "sp": "L1", "l": false, "ns": false, "a": [{actions}]}}"#
    );
    let file = env.write("big.json", &payload);
    stdout_of(&env, &["decode", &file.to_string_lossy(), "--save"]);

    let output = run_bin(&env, &["payload", "1"]);
    assert_success(&["payload", "1"], &output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("more than a transfer code holds"), "got:\n{stderr}");
    assert!(stderr.contains("stays pending"));

    assert!(stdout_of(&env, &["list", "--pending"]).contains("40"));
}

#[test]
fn events_lists_catalog_by_date() {
    let env = CliTestEnv::new();
    let data_dir = env.xdg_data.join("vectorscout");
    fs::create_dir_all(&data_dir).expect("failed to create data dir");
    fs::write(
        data_dir.join("events.json"),
        r#"[
            {"eventName": "Traverse City", "eventCode": "2026mitvc", "date": "2026-03-12"},
            {"eventName": "Kettering", "eventCode": "2026miket", "date": "2026-03-05"}
        ]"#,
    )
    .expect("failed to write catalog");

    let stdout = stdout_of(&env, &["events"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("2026miket") && lines[0].contains("Kettering"));
    assert!(lines[1].contains("2026mitvc"));

    let missing = env.work.join("none.json");
    let output = run_bin(&env, &["events", "--file", &missing.to_string_lossy()]);
    assert!(!output.status.success());
}
