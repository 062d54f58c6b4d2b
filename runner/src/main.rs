use anyhow::Context;
use clap::Parser;
use fformcore::AnalysisConfig;
use generator::profile::{build_session, SessionProfile};
use std::path::PathBuf;
use workflow::config::{load_missions, save_missions};
use workflow::dispatch::run_missions;
use workflow::offline::write_offline_run;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "F-formation and speech-behaviour mission runner")]
struct Args {
    /// Run the missions listed in a YAML or JSON file
    #[arg(long)]
    missions: Option<PathBuf>,
    /// Generate a synthetic session and analyze it in memory
    #[arg(long, default_value_t = false)]
    offline: bool,
    #[arg(long, default_value_t = 3)]
    devices: usize,
    /// Length of the synthetic session in seconds
    #[arg(long, default_value_t = 300.0)]
    duration: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value = "tools/data/offline")]
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(path) = &args.missions {
        let entries = load_missions(path)?;
        let report = run_missions(&entries);
        println!(
            "Missions -> completed {}, failed {}",
            report.completed,
            report.failures.len()
        );
        if !report.is_clean() {
            for failure in &report.failures {
                println!(
                    "  mission {} ({}): {}",
                    failure.index, failure.mission_type, failure.reason
                );
            }
        }
    }

    if args.offline {
        let profile = SessionProfile {
            devices: args.devices,
            duration_secs: args.duration,
            seed: args.seed,
            ..Default::default()
        };
        let session = build_session(&profile).context("generating synthetic session")?;
        let runner = Runner::new(AnalysisConfig {
            audio_offset: profile.start_timestamp,
            ..Default::default()
        });
        let result = runner.analyze(&session)?;

        println!(
            "Offline run -> devices {}, seconds {}, feature rows {}, computed {}, failed {}",
            result.trajectories.len(),
            result.trajectories.first().map(|t| t.len()).unwrap_or(0),
            result.features.len(),
            result.metrics.computed,
            result.metrics.failed
        );

        let missions = write_offline_run(&args.output_dir, &session, &result, runner.config())?;
        save_missions(args.output_dir.join("missions.yaml"), &missions)?;
    }

    if args.missions.is_none() && !args.offline {
        println!("Nothing to do; pass --missions <file> or --offline.");
    }

    Ok(())
}
