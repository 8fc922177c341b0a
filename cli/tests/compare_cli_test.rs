use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const LABELS: [&str; 3] = ["Sequential", "4 procs Parallel", "2 procs Parallel twice"];

fn assert_three_timing_lines(stdout: &[u8]) {
    let stdout = String::from_utf8(stdout.to_vec()).expect("utf8 stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected stdout: {:?}", stdout);
    for (line, label) in lines.iter().zip(LABELS) {
        let prefix = format!("  {} - run time: ", label);
        assert!(line.starts_with(&prefix), "{:?}", line);
        assert!(line.ends_with(" seconds"), "{:?}", line);
        let secs = &line[prefix.len()..line.len() - " seconds".len()];
        let (_, frac) = secs.split_once('.').expect("two decimals");
        assert_eq!(frac.len(), 2, "{:?}", line);
        secs.parse::<f64>().expect("numeric run time");
    }
}

#[test]
fn cpu_comparison_uses_worker_processes() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compare-cpu")?;
    cmd.args(["--cycles", "2000"]);
    let output = cmd.assert().success().get_output().clone();
    assert_three_timing_lines(&output.stdout);
    Ok(())
}

#[test]
fn io_comparison_reads_from_given_source() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("random.bin");
    fs::write(&source, vec![0x5a; 8192])?;

    let mut cmd = Command::cargo_bin("compare-io")?;
    cmd.args(["--cycles", "4", "--read-size", "2048", "--source"]).arg(&source);
    let output = cmd.assert().success().get_output().clone();
    assert_three_timing_lines(&output.stdout);
    Ok(())
}

#[cfg(unix)]
#[test]
fn io_comparison_reads_urandom_by_default() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compare-io")?;
    cmd.args(["--cycles", "2", "--read-size", "4096"]);
    let output = cmd.assert().success().get_output().clone();
    assert_three_timing_lines(&output.stdout);
    Ok(())
}

#[test]
fn missing_source_fails_the_run() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("no-such-device");

    let mut cmd = Command::cargo_bin("compare-io")?;
    cmd.args(["--cycles", "1", "--source"]).arg(&missing);
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("open randomness source"));
    Ok(())
}

#[test]
fn worker_subcommand_is_silent_on_success() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compare-cpu")?;
    cmd.args(["worker", "--workload", "cpu", "--cycles", "100"]);
    cmd.assert().success().stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn worker_subcommand_fails_on_missing_source() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compare-io")?;
    cmd.args([
        "worker",
        "--workload",
        "io",
        "--cycles",
        "1",
        "--source",
        "/definitely/not/a/device",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("io worker"));
    Ok(())
}

#[test]
fn json_report_is_written() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let report = dir.path().join("reports").join("cpu.json");

    let mut cmd = Command::cargo_bin("compare-cpu")?;
    cmd.args(["--cycles", "100", "--isolation", "thread", "--json"]).arg(&report);
    cmd.assert().success();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(value["workload"], "cpu");
    assert_eq!(value["cycles"], 100);
    let labels: Vec<&str> = value["strategies"]
        .as_array()
        .expect("strategies array")
        .iter()
        .filter_map(|s| s["label"].as_str())
        .collect();
    assert_eq!(labels, LABELS);
    Ok(())
}

#[test]
fn tracing_goes_to_stderr_only() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compare-cpu")?;
    cmd.env("PROCBENCH_TRACE", "1")
        .args(["--cycles", "100", "--isolation", "thread"]);
    let output = cmd
        .assert()
        .success()
        .stderr(predicate::str::contains("cpu-only processing"))
        .get_output()
        .clone();
    assert_three_timing_lines(&output.stdout);
    Ok(())
}

#[test]
fn cpu_rejects_io_only_flags() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("compare-cpu")?;
    cmd.args(["--source", "/dev/urandom"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("only apply to the io workload"));
    Ok(())
}
