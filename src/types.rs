// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for stress-hall
//!
//! Scenarios describe one configuration point of the target program, trial
//! outcomes classify a single run, and the summary collects one statistics
//! entry per scenario in declaration order.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One configuration point of the target program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Number of concurrent participants, passed as the sole program argument
    pub concurrency_degree: u32,
    pub label: String,
}

impl Scenario {
    pub fn new(concurrency_degree: u32, label: impl Into<String>) -> Self {
        Self {
            concurrency_degree,
            label: label.into(),
        }
    }

    /// Scenario list used by `stress` when no profile overrides it
    pub fn default_battery() -> Vec<Self> {
        vec![
            Scenario::new(2, "Par (Minimal Check)"),
            Scenario::new(3, "Ímpar (Edge Case - Sobra 1?)"),
            Scenario::new(10, "Grupo Pequeno (Concorrência Padrão)"),
            Scenario::new(50, "Carga Alta (Stress Test)"),
        ]
    }
}

/// Classification of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrialOutcome {
    /// Exited with status zero before the timeout
    Success { duration: Duration },
    /// Exited with a nonzero status (or was killed by a signal) before the timeout
    RuntimeError { exit_code: Option<i32> },
    /// Still running when the timeout fired; forcibly terminated
    TimeoutDeadlock,
}

impl TrialOutcome {
    /// Single-character progress marker
    pub fn symbol(&self) -> char {
        match self {
            TrialOutcome::Success { .. } => '.',
            TrialOutcome::RuntimeError { .. } => 'E',
            TrialOutcome::TimeoutDeadlock => 'D',
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TrialOutcome::Success { .. })
    }
}

/// Aggregated outcome counts for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStatistics {
    pub scenario: Scenario,
    pub success_count: usize,
    pub runtime_error_count: usize,
    pub deadlock_count: usize,
    /// Mean duration of successful trials in seconds, 0 when none succeeded
    pub average_success_secs: f64,
}

impl ScenarioStatistics {
    pub fn total_trials(&self) -> usize {
        self.success_count + self.runtime_error_count + self.deadlock_count
    }

    pub fn is_clean(&self) -> bool {
        self.deadlock_count == 0 && self.runtime_error_count == 0
    }
}

/// Ordered results of one battery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub created_at: String,
    pub binary: PathBuf,
    pub trials_per_scenario: usize,
    pub timeout: Duration,
    pub scenarios: Vec<ScenarioStatistics>,
}

/// Pass/fail judgment over a whole summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub overall_pass: bool,
}

impl Verdict {
    pub fn exit_code(&self) -> i32 {
        if self.overall_pass {
            0
        } else {
            1
        }
    }
}

/// Result of one trace-capture run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    pub concurrency_degree: u32,
    pub log_path: PathBuf,
    pub outcome: TrialOutcome,
}
