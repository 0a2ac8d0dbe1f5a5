// SPDX-License-Identifier: PMPL-1.0-or-later

//! Folding trial outcomes into per-scenario statistics

use crate::types::{Scenario, ScenarioStatistics, TrialOutcome};

/// Count each outcome kind and average the successful durations.
///
/// Pure and order-independent: the same outcomes in any order give the same
/// statistics.
pub fn aggregate(scenario: &Scenario, outcomes: &[TrialOutcome]) -> ScenarioStatistics {
    let mut success_count = 0;
    let mut runtime_error_count = 0;
    let mut deadlock_count = 0;
    let mut success_secs = 0.0;

    for outcome in outcomes {
        match outcome {
            TrialOutcome::Success { duration } => {
                success_count += 1;
                success_secs += duration.as_secs_f64();
            }
            TrialOutcome::RuntimeError { .. } => runtime_error_count += 1,
            TrialOutcome::TimeoutDeadlock => deadlock_count += 1,
        }
    }

    let average_success_secs = if success_count > 0 {
        success_secs / success_count as f64
    } else {
        0.0
    };

    ScenarioStatistics {
        scenario: scenario.clone(),
        success_count,
        runtime_error_count,
        deadlock_count,
        average_success_secs,
    }
}
