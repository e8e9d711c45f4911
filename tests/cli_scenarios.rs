use std::process::Command;

#[derive(Debug)]
struct Totals {
    windows: usize,
    capacity_fees: f64,
    distribution_fees: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_bills() {
    let baseline = run_and_parse_totals(&["--scenario", "scenarios/baseline.toml"]);
    let evening = run_and_parse_totals(&["--scenario", "scenarios/evening_peak.toml"]);

    assert_eq!(baseline.windows, 6);
    assert_eq!(evening.windows, 4);
    assert!(
        evening.capacity_fees > 0.0,
        "expected evening peaks to be billed: {evening:?}"
    );
    assert!(
        (baseline.distribution_fees - evening.distribution_fees).abs() > 0.01,
        "expected distribution fees to differ: baseline={baseline:?}, evening={evening:?}"
    );
}

#[test]
fn preset_and_seed_override_are_accepted() {
    let a = run_and_parse_totals(&["--preset", "meter_only", "--seed", "3"]);
    let b = run_and_parse_totals(&["--preset", "meter_only", "--seed", "3"]);
    assert_eq!(a.windows, 0);
    assert_eq!(a.capacity_fees, 0.0);
    assert_eq!(a.distribution_fees, b.distribution_fees);
}

#[test]
fn csv_outputs_are_written() {
    let dir = std::env::temp_dir().join("du_sim_cli_test");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let capacity = dir.join("capacity.csv");
    let distribution = dir.join("distribution.csv");

    let output = Command::new(env!("CARGO_BIN_EXE_du-sim"))
        .args(["--preset", "peak_stress", "--capacity-out"])
        .arg(&capacity)
        .arg("--distribution-out")
        .arg(&distribution)
        .output()
        .expect("du-sim process should run");
    assert!(output.status.success());

    let capacity_csv = std::fs::read_to_string(&capacity).expect("capacity CSV exists");
    assert!(capacity_csv.starts_with("broker,peak_timeslot,threshold,kwh,fee"));
    assert!(capacity_csv.lines().count() > 1);
    let distribution_csv = std::fs::read_to_string(&distribution).expect("distribution CSV exists");
    assert!(distribution_csv.starts_with("broker,small_meters,large_meters,kwh,fee"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_du-sim"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("du-sim process should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "stderr={stderr}");
}

fn run_and_parse_totals(args: &[&str]) -> Totals {
    let output = Command::new(env!("CARGO_BIN_EXE_du-sim"))
        .args(args)
        .output()
        .expect("du-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    parse_totals(&stdout)
}

fn parse_totals(stdout: &str) -> Totals {
    let mut windows = None;
    let mut capacity_fees = None;
    let mut distribution_fees = None;

    for line in stdout.lines() {
        if let Some(v) = line.strip_prefix("Windows assessed:") {
            windows = v.trim().parse::<usize>().ok();
        } else if let Some(v) = line.strip_prefix("Capacity fees:") {
            capacity_fees = v.trim().parse::<f64>().ok();
        } else if let Some(v) = line.strip_prefix("Distribution fees:") {
            distribution_fees = v.trim().parse::<f64>().ok();
        }
    }

    Totals {
        windows: windows.expect("billing report should list windows assessed"),
        capacity_fees: capacity_fees.expect("billing report should list capacity fees"),
        distribution_fees: distribution_fees
            .expect("billing report should list distribution fees"),
    }
}
