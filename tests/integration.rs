use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn exec_bin(args: &[&str]) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_gutflora"));
    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn run_bin(args: &[&str]) {
    let output = exec_bin(args);

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

fn make_test_dir(name: &str, config_contents: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    fs::write(&config_path, config_contents).expect("failed to write config file");

    test_dir
}

fn read_results(test_dir: &Path, run_idx: usize) -> serde_json::Value {
    let file = test_dir
        .join(format!("run-{run_idx:04}"))
        .join("results.json");
    let contents = fs::read_to_string(file).expect("failed to read results file");
    serde_json::from_str(&contents).expect("failed to parse results file")
}

#[test]
fn basic_workflow() {
    let test_dir = make_test_dir("basic_workflow", "");
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "create", "--seed", "42"]);
    run_bin(&["--sim-dir", test_dir_str, "create"]);

    run_bin(&[
        "--sim-dir",
        test_dir_str,
        "act",
        "--run-idx",
        "0",
        "administer-antibiotics",
    ]);
    run_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "0", "--days", "14"]);
    run_bin(&[
        "--sim-dir",
        test_dir_str,
        "act",
        "--run-idx",
        "0",
        "administer-therapeutic",
    ]);
    run_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "0", "--days", "79"]);

    run_bin(&["--sim-dir", test_dir_str, "act", "--run-idx", "1", "wait-and-monitor"]);
    run_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "1"]);
    run_bin(&[
        "--sim-dir",
        test_dir_str,
        "restart",
        "--run-idx",
        "1",
        "--seed",
        "5",
        "--virulence",
        "9",
    ]);
    run_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "1", "--days", "2"]);

    run_bin(&["--sim-dir", test_dir_str, "analyze"]);

    let results = read_results(&test_dir, 0);
    assert_eq!(results["summary"]["seed"], 42);
    assert_eq!(results["summary"]["outcome"], "durable_cure");
    assert_eq!(results["summary"]["phase"], "resolved");
    assert_eq!(results["summary"]["courses_given"], 1);
    assert_eq!(results["summary"]["therapeutic_applied"], true);

    let results = read_results(&test_dir, 1);
    assert_eq!(results["summary"]["seed"], 5);
    assert_eq!(results["summary"]["virulence"], 9);
    assert_eq!(results["summary"]["tick"], 2);
    assert!(results["summary"]["outcome"].is_null());
    assert_eq!(results["summary"]["score"], 0);

    run_bin(&["--sim-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("run-0000").exists());
    assert!(test_dir.join("config.toml").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn refuses_invalid_requests() {
    let test_dir = make_test_dir("refuses_invalid_requests", "[outcome]\nmax_ticks = 5\n");
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--sim-dir", test_dir_str, "create", "--seed", "7"]);

    // Unknown action.
    let output = exec_bin(&["--sim-dir", test_dir_str, "act", "--run-idx", "0", "surgery"]);
    assert!(!output.status.success());

    // Missing run.
    let output = exec_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "3"]);
    assert!(!output.status.success());

    // Terminal run.
    run_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "0", "--days", "10"]);
    let output = exec_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "0"]);
    assert!(!output.status.success());

    // Restart revives a finished run, but only with a valid virulence.
    let output = exec_bin(&[
        "--sim-dir",
        test_dir_str,
        "restart",
        "--run-idx",
        "0",
        "--virulence",
        "11",
    ]);
    assert!(!output.status.success());
    run_bin(&["--sim-dir", test_dir_str, "restart", "--run-idx", "0", "--seed", "8"]);
    run_bin(&["--sim-dir", test_dir_str, "advance", "--run-idx", "0"]);

    // Changed config.
    fs::write(test_dir.join("config.toml"), "[outcome]\nmax_ticks = 50\n")
        .expect("failed to write config file");
    let output = exec_bin(&["--sim-dir", test_dir_str, "analyze"]);
    assert!(!output.status.success());

    // Invalid config.
    fs::write(test_dir.join("config.toml"), "[pathogen]\nvirulence = 11\n")
        .expect("failed to write config file");
    let output = exec_bin(&["--sim-dir", test_dir_str, "create"]);
    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}
