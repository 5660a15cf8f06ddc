use anyhow::{anyhow, Result};
use clap::{arg, Command};
use log::{info, warn};
use vpt_challenges::viewpoint_coverage::{Challenge, Instance};
use vpt_structs::core::OutputData;
use vpt_utils::{init_logger, jsonify_pretty, load_json_arg};

/// Reported totals may differ from recomputed ones by this much.
const METRIC_TOLERANCE: f64 = 1e-6;

fn cli() -> Command {
    Command::new("vpt-verifier")
        .about("Verifies a viewpoint coverage tour")
        .arg_required_else_help(true)
        .arg(
            arg!(--"log-level" [LEVEL] "One of error, warn, info, debug, trace")
                .global(true)
                .default_value("info")
                .value_parser(clap::value_parser!(String)),
        )
        .subcommand(
            Command::new("verify_solution")
                .about("Verifies a tour against its instance")
                .arg(
                    arg!(<INSTANCE> "Instance json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<OUTPUT> "Output data json string, path to json or zlib file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| "info".to_string());
    if let Err(e) = init_logger(&log_level) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = match matches.subcommand() {
        Some(("verify_solution", sub_m)) => verify_solution(
            sub_m.get_one::<String>("INSTANCE").unwrap().clone(),
            sub_m.get_one::<String>("OUTPUT").unwrap().clone(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

pub fn verify_solution(instance: String, output: String) -> Result<()> {
    if instance == "-" && output == "-" {
        return Err(anyhow!("Only one of INSTANCE and OUTPUT can be read from stdin"));
    }
    let challenge = Challenge::from_instance(load_json_arg::<Instance>(&instance)?)?;
    let output_data = load_json_arg::<OutputData>(&output)?;
    let reported = output_data
        .to_solution()
        .map_err(|e| anyhow!("Invalid solution. Cannot convert output data: {}", e))?;

    let mut recomputed = reported.clone();
    match challenge.calc_metrics(&mut recomputed) {
        Ok(()) => {
            for (name, claimed, actual) in [
                ("distance", reported.total_distance, recomputed.total_distance),
                ("precision", reported.total_precision, recomputed.total_precision),
            ] {
                if (claimed - actual).abs() > METRIC_TOLERANCE * actual.abs().max(1.0) {
                    warn!(
                        "Reported {} {} does not match recomputed {}",
                        name, claimed, actual
                    );
                }
            }
        }
        Err(e) => warn!("Cannot recompute metrics: {}", e),
    }

    let report = challenge.verify_solution(&reported);
    println!("{}", jsonify_pretty(&report)?);
    if let Err(e) = challenge.ensure_valid(&reported) {
        eprintln!("Verification error: {}", e);
        std::process::exit(1);
    }
    info!(
        "Solution is valid: {} viewpoints, objective {:.3}",
        reported.route.len(),
        recomputed.objective()
    );
    Ok(())
}
