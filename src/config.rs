// SPDX-License-Identifier: PMPL-1.0-or-later

//! Harness configuration: built-in defaults, optional profile file, CLI overrides.

use crate::types::Scenario;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STRESS_BINARY: &str = "./dining_hall";
pub const DEFAULT_TRIALS: usize = 30;
pub const DEFAULT_STRESS_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_TRACE_BINARY: &str = "./dining_hall_logged";
pub const DEFAULT_TRACE_SOURCE: &str = "dining_hall_logged.c";
pub const DEFAULT_TRACE_DIR: &str = "trace_logs";
pub const DEFAULT_TRACE_DEGREES: [u32; 3] = [2, 3, 10];
pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable the target reads to find its trace destination
pub const LOG_FILE_ENV: &str = "DINING_LOG_FILE";

/// One external command of the build contract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildStep {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// When false, a failing step is logged and ignored (e.g. `make clean`)
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl BuildStep {
    pub fn new(program: &str, args: &[&str], required: bool) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            required,
        }
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub steps: Vec<BuildStep>,
}

impl BuildConfig {
    /// `make clean` followed by `make`
    pub fn make() -> Self {
        Self {
            steps: vec![
                BuildStep::new("make", &["clean"], false),
                BuildStep::new("make", &[], true),
            ],
        }
    }

    /// Direct compile of the instrumented target
    pub fn gcc(source: &str, output: &Path) -> Self {
        let output = output.to_string_lossy().into_owned();
        Self {
            steps: vec![BuildStep::new(
                "gcc",
                &["-Wall", "-pthread", "-O2", "-o", output.as_str(), source],
                true,
            )],
        }
    }
}

/// Settings for the stress battery
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryConfig {
    pub binary: PathBuf,
    pub scenarios: Vec<Scenario>,
    pub trials_per_scenario: usize,
    pub timeout: Duration,
    /// Concurrent trials within one scenario; 1 keeps spawns serialized
    pub jobs: usize,
    pub build: BuildConfig,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_STRESS_BINARY),
            scenarios: Scenario::default_battery(),
            trials_per_scenario: DEFAULT_TRIALS,
            timeout: DEFAULT_STRESS_TIMEOUT,
            jobs: 1,
            build: BuildConfig::make(),
        }
    }
}

impl BatteryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            bail!("battery has no scenarios");
        }
        if let Some(bad) = self.scenarios.iter().find(|s| s.concurrency_degree == 0) {
            bail!("scenario '{}' has a zero concurrency degree", bad.label);
        }
        if self.trials_per_scenario == 0 {
            bail!("trials per scenario must be positive");
        }
        if self.timeout.is_zero() {
            bail!("timeout must be positive");
        }
        if self.jobs == 0 {
            bail!("jobs must be positive");
        }
        Ok(())
    }
}

/// Settings for the trace-capture driver
#[derive(Debug, Clone, PartialEq)]
pub struct TraceConfig {
    pub binary: PathBuf,
    pub degrees: Vec<u32>,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub log_env_var: String,
    pub build: BuildConfig,
}

impl Default for TraceConfig {
    fn default() -> Self {
        let binary = PathBuf::from(DEFAULT_TRACE_BINARY);
        Self {
            build: BuildConfig::gcc(DEFAULT_TRACE_SOURCE, &binary),
            binary,
            degrees: DEFAULT_TRACE_DEGREES.to_vec(),
            output_dir: PathBuf::from(DEFAULT_TRACE_DIR),
            timeout: DEFAULT_TRACE_TIMEOUT,
            log_env_var: LOG_FILE_ENV.to_string(),
        }
    }
}

impl TraceConfig {
    /// Deterministic per-degree destination; reruns overwrite
    pub fn log_path_for(&self, degree: u32) -> PathBuf {
        self.output_dir.join(format!("trace_{}_students.txt", degree))
    }

    pub fn validate(&self) -> Result<()> {
        if self.degrees.contains(&0) {
            bail!("trace degrees must be positive");
        }
        if self.timeout.is_zero() {
            bail!("timeout must be positive");
        }
        if self.log_env_var.is_empty() {
            bail!("log environment variable name is empty");
        }
        Ok(())
    }
}

/// Optional file-based overrides, loaded from JSON or YAML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessProfile {
    #[serde(default)]
    pub stress: StressProfile,
    #[serde(default)]
    pub trace: TraceProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StressProfile {
    pub binary: Option<PathBuf>,
    pub scenarios: Option<Vec<Scenario>>,
    pub trials: Option<usize>,
    pub timeout_secs: Option<f64>,
    pub jobs: Option<usize>,
    pub build: Option<Vec<BuildStep>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceProfile {
    pub binary: Option<PathBuf>,
    pub degrees: Option<Vec<u32>>,
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: Option<f64>,
    pub log_env_var: Option<String>,
    pub build: Option<Vec<BuildStep>>,
}

impl HarnessProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading harness profile {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing json harness profile {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing yaml harness profile {}", path.display())),
            _ => Err(anyhow!(
                "unsupported harness profile extension for {}",
                path.display()
            )),
        }
    }

    pub fn apply_stress(&self, config: &mut BatteryConfig) -> Result<()> {
        let p = &self.stress;
        if let Some(binary) = &p.binary {
            config.binary = binary.clone();
        }
        if let Some(scenarios) = &p.scenarios {
            config.scenarios = scenarios.clone();
        }
        if let Some(trials) = p.trials {
            config.trials_per_scenario = trials;
        }
        if let Some(secs) = p.timeout_secs {
            config.timeout = secs_to_duration(secs)?;
        }
        if let Some(jobs) = p.jobs {
            config.jobs = jobs;
        }
        if let Some(steps) = &p.build {
            config.build = BuildConfig {
                steps: steps.clone(),
            };
        }
        Ok(())
    }

    pub fn apply_trace(&self, config: &mut TraceConfig) -> Result<()> {
        let p = &self.trace;
        if let Some(binary) = &p.binary {
            config.binary = binary.clone();
        }
        if let Some(degrees) = &p.degrees {
            config.degrees = degrees.clone();
        }
        if let Some(dir) = &p.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(secs) = p.timeout_secs {
            config.timeout = secs_to_duration(secs)?;
        }
        if let Some(var) = &p.log_env_var {
            config.log_env_var = var.clone();
        }
        if let Some(steps) = &p.build {
            config.build = BuildConfig {
                steps: steps.clone(),
            };
        }
        Ok(())
    }
}

pub fn secs_to_duration(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| anyhow!("invalid timeout: {} seconds", secs))
}
