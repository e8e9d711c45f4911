//! Distribution utility simulator entry point: CLI wiring and scenario run.

use std::path::Path;
use std::process;

use du_sim::config::ScenarioConfig;
use du_sim::io::export::{export_capacity_csv, export_distribution_csv};
use du_sim::runner::run_scenario;
use du_sim::telemetry::init_tracing;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    capacity_out: Option<String>,
    distribution_out: Option<String>,
}

fn print_help() {
    eprintln!("du-sim - Distribution utility capacity and distribution fee simulator");
    eprintln!();
    eprintln!("Usage: du-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>          Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>            Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>               Override random seed");
    eprintln!("  --capacity-out <path>      Export capacity transactions to CSV");
    eprintln!("  --distribution-out <path>  Export meter/transport transactions to CSV");
    eprintln!("  --help                     Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following flag `args[*i]`, exiting if it is missing.
fn flag_value(args: &[String], i: &mut usize, what: &str) -> String {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        capacity_out: None,
        distribution_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => cli.scenario_path = Some(flag_value(&args, &mut i, "path")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "name")),
            "--seed" => {
                let raw = flag_value(&args, &mut i, "u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--capacity-out" => cli.capacity_out = Some(flag_value(&args, &mut i, "path")),
            "--distribution-out" => {
                cli.distribution_out = Some(flag_value(&args, &mut i, "path"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    init_tracing();
    let cli = parse_args();

    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let result = match run_scenario(&scenario) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!("{}", result.billing);

    if let Some(ref path) = cli.capacity_out {
        if let Err(e) = export_capacity_csv(&result.capacity, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Capacity transactions written to {path}");
    }

    if let Some(ref path) = cli.distribution_out {
        if let Err(e) = export_distribution_csv(&result.distribution, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Distribution transactions written to {path}");
    }
}
