// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scenario iteration: run every scenario's trials and collect the summary.
//!
//! Scenarios always run in declaration order. Within a scenario, trials run
//! one at a time unless `jobs > 1`, in which case they are spread over a
//! rayon pool; outcomes are still stored by trial index, so only the order of
//! progress symbols depends on timing.

use crate::config::BatteryConfig;
use crate::runner::{run_trial, TrialSpec};
use crate::stats::aggregate;
use crate::types::{Scenario, ScenarioStatistics, Summary, TrialOutcome};
use anyhow::{anyhow, Context, Result};
use std::sync::mpsc;

/// Receives progress events on the orchestrating thread
pub trait ProgressSink {
    fn scenario_started(&mut self, _scenario: &Scenario) {}
    fn trial_finished(&mut self, _outcome: &TrialOutcome) {}
    fn scenario_finished(&mut self, _stats: &ScenarioStatistics) {}
}

/// Discards all progress events
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Run the full battery. Any trial that cannot even be started aborts the run.
pub fn run_battery(config: &BatteryConfig, progress: &mut dyn ProgressSink) -> Result<Summary> {
    config.validate()?;

    let pool = if config.jobs > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.jobs)
                .thread_name(|i| format!("trial-{}", i))
                .build()
                .context("building trial pool")?,
        )
    } else {
        None
    };

    let mut scenarios = Vec::with_capacity(config.scenarios.len());
    for scenario in &config.scenarios {
        log::info!(
            "scenario {} ({}): {} trials",
            scenario.concurrency_degree,
            scenario.label,
            config.trials_per_scenario
        );
        progress.scenario_started(scenario);

        let spec = TrialSpec::new(&config.binary, config.timeout)
            .arg(scenario.concurrency_degree.to_string())
            .suppress_stdout(true);

        let outcomes = match &pool {
            Some(pool) => run_parallel(pool, &spec, config.trials_per_scenario, progress)?,
            None => run_sequential(&spec, config.trials_per_scenario, progress)?,
        };

        let stats = aggregate(scenario, &outcomes);
        progress.scenario_finished(&stats);
        scenarios.push(stats);
    }

    Ok(Summary {
        created_at: chrono::Utc::now().to_rfc3339(),
        binary: config.binary.clone(),
        trials_per_scenario: config.trials_per_scenario,
        timeout: config.timeout,
        scenarios,
    })
}

fn run_sequential(
    spec: &TrialSpec,
    trials: usize,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<TrialOutcome>> {
    let mut outcomes = Vec::with_capacity(trials);
    for _ in 0..trials {
        let outcome = run_trial(spec)?;
        progress.trial_finished(&outcome);
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn run_parallel(
    pool: &rayon::ThreadPool,
    spec: &TrialSpec,
    trials: usize,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<TrialOutcome>> {
    let (tx, rx) = mpsc::channel();
    for index in 0..trials {
        let tx = tx.clone();
        let spec = spec.clone();
        pool.spawn(move || {
            let _ = tx.send((index, run_trial(&spec)));
        });
    }
    drop(tx);

    // Every trial must report back, even after a setup failure, so that no
    // child is still running in the pool when the battery returns.
    let mut slots: Vec<Option<TrialOutcome>> = vec![None; trials];
    let mut first_error = None;
    for _ in 0..trials {
        let (index, result) = rx
            .recv()
            .map_err(|_| anyhow!("trial worker exited without reporting"))?;
        match result {
            Ok(outcome) => {
                progress.trial_finished(&outcome);
                slots[index] = Some(outcome);
            }
            Err(err) => {
                log::debug!("trial {} could not start: {:#}", index, err);
                first_error.get_or_insert(err);
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or_else(|| anyhow!("trial {} produced no outcome", index)))
        .collect()
}
