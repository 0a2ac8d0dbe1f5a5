// SPDX-License-Identifier: PMPL-1.0-or-later

//! Console rendering: live progress, final table, verdict line

use crate::battery::ProgressSink;
use crate::trace::TraceSink;
use crate::types::*;
use colored::*;
use std::io::{self, Write};
use std::path::Path;

/// Prints one colored symbol per trial as it finishes
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn scenario_started(&mut self, scenario: &Scenario) {
        println!(
            "{}",
            format!(
                "Test: {} students - [{}]",
                scenario.concurrency_degree, scenario.label
            )
            .magenta()
        );
        print!("Progress: ");
        let _ = io::stdout().flush();
    }

    fn trial_finished(&mut self, outcome: &TrialOutcome) {
        print!("{}", ReportFormatter::colored_symbol(outcome));
        let _ = io::stdout().flush();
    }

    fn scenario_finished(&mut self, _stats: &ScenarioStatistics) {
        println!("\n");
    }
}

/// Per-scenario lines for the trace driver
pub struct ConsoleTrace;

impl TraceSink for ConsoleTrace {
    fn run_started(&mut self, degree: u32, log_path: &Path) {
        println!(
            "   -> scenario: {} students -> {}",
            degree,
            log_path.display()
        );
    }

    fn run_finished(&mut self, result: &TraceResult) {
        match result.outcome {
            TrialOutcome::Success { .. } => {}
            TrialOutcome::TimeoutDeadlock => println!(
                "      {}",
                format!(
                    "Timeout in scenario {} (deadlock?)",
                    result.concurrency_degree
                )
                .yellow()
            ),
            TrialOutcome::RuntimeError { exit_code } => println!(
                "      {}",
                format!(
                    "Execution error in scenario {} (exit code: {:?})",
                    result.concurrency_degree, exit_code
                )
                .red()
            ),
        }
    }
}

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn colored_symbol(outcome: &TrialOutcome) -> ColoredString {
        let symbol = outcome.symbol().to_string();
        match outcome {
            TrialOutcome::Success { .. } => symbol.green(),
            TrialOutcome::RuntimeError { .. } => symbol.red(),
            TrialOutcome::TimeoutDeadlock => symbol.red().bold(),
        }
    }

    pub fn print_battery_header(&self, trials: usize, timeout_secs: f64) {
        println!(
            "{}",
            format!("[START] Stress battery: {} runs per scenario", trials).bold()
        );
        println!("Timeout: {:.1}s per run\n", timeout_secs);
    }

    pub fn print(&self, summary: &Summary, verdict: &Verdict) {
        println!("\n{}\n", "[FINAL QA REPORT]".bold());
        self.print_table(summary);
        self.print_verdict(verdict);
    }

    fn print_table(&self, summary: &Summary) {
        println!(
            "{:<20} | {:<10} | {:<10} | {:<10} | {:<15}",
            "Scenario", "Success", "Deadlocks", "Failures", "Avg Time (s)"
        );
        println!("{}", "-".repeat(80));

        for stats in &summary.scenarios {
            let scenario = format!("{} students", stats.scenario.concurrency_degree);
            let success = if stats.success_count == summary.trials_per_scenario {
                stats.success_count.to_string().green()
            } else {
                stats.success_count.to_string().yellow()
            };
            let deadlocks = if stats.deadlock_count > 0 {
                stats.deadlock_count.to_string().red()
            } else {
                stats.deadlock_count.to_string().green()
            };
            let failures = if stats.runtime_error_count > 0 {
                stats.runtime_error_count.to_string().red()
            } else {
                stats.runtime_error_count.to_string().normal()
            };

            println!(
                "{:<20} | {:<10} | {:<10} | {:<10} | {:.4}",
                scenario, success, deadlocks, failures, stats.average_success_secs
            );
        }

        println!("{}", "-".repeat(80));
    }

    fn print_verdict(&self, verdict: &Verdict) {
        if verdict.overall_pass {
            println!(
                "\n{}",
                "RESULT: PASSED. No deadlocks or runtime errors in the tested scenarios."
                    .green()
                    .bold()
            );
        } else {
            println!(
                "\n{}",
                "RESULT: FAILED. Stability problems were detected.".red().bold()
            );
        }
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}
