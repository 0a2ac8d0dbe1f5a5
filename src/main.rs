// SPDX-License-Identifier: PMPL-1.0-or-later

//! stress-hall: stress and trace harness for the dining hall exercise
//!
//! `stress` rebuilds the target and runs the scenario battery, exiting 0 only
//! when no trial deadlocked or crashed. `trace` rebuilds the instrumented
//! target and captures one execution log per scenario; it is informational and
//! exits 0 once the runs have started.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use stress_hall::config::{secs_to_duration, BatteryConfig, HarnessProfile, TraceConfig};
use stress_hall::report::{
    self, ConsoleProgress, ConsoleTrace, ReportOutputFormat,
};
use stress_hall::{battery, prepare, trace, verdict};

#[derive(Parser)]
#[command(name = "stress-hall")]
#[command(version)]
#[command(about = "Black-box stress and trace harness for concurrent programs")]
#[command(long_about = None)]
struct Cli {
    /// Profile file (.json, .yaml) overriding built-in defaults
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,

    /// Use the existing binary instead of rebuilding it
    #[arg(long, global = true)]
    skip_build: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stress battery and exit nonzero on any deadlock or crash
    Stress {
        /// Target binary
        #[arg(short, long)]
        binary: Option<PathBuf>,

        /// Trials per scenario
        #[arg(short = 'n', long)]
        trials: Option<usize>,

        /// Seconds before a trial is treated as deadlocked
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Trials to run concurrently within a scenario
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Save the summary to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Summary file format (default: from the output extension)
        #[arg(short, long, value_enum)]
        format: Option<ReportOutputFormat>,
    },

    /// Capture one execution trace per scenario
    Trace {
        /// Instrumented target binary
        #[arg(short, long)]
        binary: Option<PathBuf>,

        /// Directory receiving the trace files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seconds before a run is reported as a suspected deadlock
        #[arg(short, long)]
        timeout: Option<f64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let profile = match &cli.profile {
        Some(path) => HarnessProfile::load(path)?,
        None => HarnessProfile::default(),
    };

    match cli.command {
        Commands::Stress {
            binary,
            trials,
            timeout,
            jobs,
            output,
            format,
        } => {
            let mut config = BatteryConfig::default();
            profile.apply_stress(&mut config)?;
            if let Some(binary) = binary {
                config.binary = binary;
            }
            if let Some(trials) = trials {
                config.trials_per_scenario = trials;
            }
            if let Some(secs) = timeout {
                config.timeout = secs_to_duration(secs)?;
            }
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            config.validate()?;

            if !cli.skip_build {
                println!("{}", "[SETUP] Building target...".magenta());
                prepare::prepare(&config.build)?;
                println!("{}\n", "Build succeeded.".green());
            }

            report::print_header(config.trials_per_scenario, config.timeout);
            let summary = battery::run_battery(&config, &mut ConsoleProgress)?;
            let verdict = verdict::verdict(&summary);
            report::print_report(&summary, &verdict);

            if let Some(path) = output {
                let format = format.unwrap_or_else(|| ReportOutputFormat::from_path(&path));
                report::save_report(&summary, &verdict, format, &path)?;
                println!("Report saved to: {}", path.display());
            }

            std::process::exit(verdict.exit_code());
        }

        Commands::Trace {
            binary,
            output_dir,
            timeout,
        } => {
            let mut config = TraceConfig::default();
            profile.apply_trace(&mut config)?;
            if let Some(binary) = binary {
                config.binary = binary;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(secs) = timeout {
                config.timeout = secs_to_duration(secs)?;
            }
            config.validate()?;

            println!("Preparing environment...");
            if !cli.skip_build {
                prepare::prepare(&config.build)?;
            }

            println!("Writing traces to {} ...", config.output_dir.display());
            let results = trace::capture_traces(&config, &mut ConsoleTrace)?;
            let clean = results.iter().filter(|r| r.outcome.is_success()).count();
            println!(
                "\n{}",
                format!(
                    "Trace generation finished ({}/{} scenarios completed).",
                    clean,
                    results.len()
                )
                .green()
            );
        }
    }

    Ok(())
}
