use anyhow::{anyhow, Result};
use clap::{arg, ArgAction, Command};
use log::{error, info, warn};
use std::{fs, path::PathBuf};
use vpt_algorithms::viewpoint_coverage::{solve_challenge, Deadline};
use vpt_challenges::viewpoint_coverage::{Challenge, Instance, Solution, Track};
use vpt_structs::{config::SolverSettings, core::OutputData};
use vpt_utils::{compress_obj, init_logger, jsonify, load_json_arg, seed_from_str};

fn cli() -> Command {
    Command::new("vpt-runtime")
        .about("Generates viewpoint coverage instances or computes tours for them")
        .arg_required_else_help(true)
        .arg(
            arg!(--"log-level" [LEVEL] "One of error, warn, info, debug, trace")
                .global(true)
                .default_value("info")
                .value_parser(clap::value_parser!(String)),
        )
        .subcommand(
            Command::new("generate_instance")
                .about("Generates a random instance")
                .arg(
                    arg!(<SEED> "A string used in seed generation")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--viewpoints <NUM_VIEWPOINTS> "Number of viewpoints")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--samples <NUM_SAMPLE_POINTS> "Number of sample points")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the instance will be saved to this file path")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("compute_solution")
                .about("Builds a tour for an instance")
                .arg(
                    arg!(<INSTANCE> "Instance json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--settings [SETTINGS] "Settings json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"time-budget-ms" [TIME_BUDGET_MS] "Overrides the time budget in settings")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the output data will be saved to this file path (default json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--compress [COMPRESS] "If output file is set, the output data will be compressed as zlib")
                        .action(ArgAction::SetTrue),
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
        Some(("generate_instance", sub_m)) => generate_instance(
            sub_m.get_one::<String>("SEED").unwrap().clone(),
            *sub_m.get_one::<usize>("viewpoints").unwrap(),
            *sub_m.get_one::<usize>("samples").unwrap(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        Some(("compute_solution", sub_m)) => compute_solution(
            sub_m.get_one::<String>("INSTANCE").unwrap().clone(),
            sub_m.get_one::<String>("settings").cloned(),
            sub_m.get_one::<u64>("time-budget-ms").cloned(),
            sub_m.get_one::<PathBuf>("output").cloned(),
            *sub_m.get_one::<bool>("compress").unwrap(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

pub fn generate_instance(
    seed: String,
    num_viewpoints: usize,
    num_sample_points: usize,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let track = Track {
        num_viewpoints,
        num_sample_points,
    };
    let challenge = Challenge::generate_instance(&seed_from_str(&seed), &track)?;
    let instance = jsonify(&challenge.to_instance())?;
    if let Some(path) = output_file {
        fs::write(&path, instance)?;
        info!("instance written to: {:?}", path);
    } else {
        println!("{}", instance);
    }
    Ok(())
}

pub fn compute_solution(
    instance: String,
    settings: Option<String>,
    time_budget_ms: Option<u64>,
    output_file: Option<PathBuf>,
    compress: bool,
) -> Result<()> {
    let challenge = load_challenge(&instance)?;
    let mut settings = match settings {
        Some(settings) => SolverSettings::load(&settings)?,
        None => SolverSettings::default(),
    };
    if time_budget_ms.is_some() {
        settings.time_budget_ms = time_budget_ms;
    }
    info!(
        "Loaded instance with {} viewpoints and {} sample points, time budget {}",
        challenge.num_viewpoints(),
        challenge.sample_points.len(),
        settings
            .time_budget_ms
            .map_or("unbounded".to_string(), |ms| format!("{}ms", ms))
    );

    let deadline = Deadline::new(settings.time_budget());
    let output_data = match solve_challenge(&challenge, &deadline, &|_| Ok(())) {
        Ok(outcome) => {
            if let Some(e) = outcome.timeout_error() {
                warn!("{}", e);
            }
            let report = challenge.verify_solution(&outcome.solution);
            for failure in report.failures() {
                warn!("Tour is not valid: {}", failure);
            }
            OutputData::new(
                &outcome.solution,
                Some(outcome.termination.as_str()),
                Some(report),
                None,
            )
        }
        Err(e) => {
            // construction fails before seeding, so there is no tour to report
            error!("Tour construction failed: {}", e);
            let empty = Solution::new();
            let report = challenge.verify_solution(&empty);
            OutputData::new(&empty, None, Some(report), Some(e.to_string()))
        }
    };

    if let Some(path) = output_file {
        if compress {
            fs::write(&path, compress_obj(&output_data)?)?;
        } else {
            fs::write(&path, jsonify(&output_data)?)?;
        }
        info!("output_data written to: {:?}", path);
    } else {
        println!("{}", jsonify(&output_data)?);
    }
    if let Some(err_msg) = output_data.metadata.error {
        eprintln!("Runtime error: {}", err_msg);
        std::process::exit(86);
    }
    Ok(())
}

fn load_challenge(instance: &str) -> Result<Challenge> {
    let instance = load_json_arg::<Instance>(instance)?;
    Ok(Challenge::from_instance(instance)?)
}
