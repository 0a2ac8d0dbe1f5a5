// SPDX-License-Identifier: PMPL-1.0-or-later

//! Trace capture: run the instrumented target once per degree, each run
//! writing its own execution log.
//!
//! The log destination reaches the child through an environment variable set
//! on that child only. Timeouts and runtime errors are reported and skipped;
//! this driver is exploratory and never turns them into a failure.

use crate::config::TraceConfig;
use crate::runner::{run_trial, TrialSpec};
use crate::types::{TraceResult, TrialOutcome};
use anyhow::{Context, Result};
use std::fs;

/// Receives per-scenario trace events
pub trait TraceSink {
    fn run_started(&mut self, _degree: u32, _log_path: &std::path::Path) {}
    fn run_finished(&mut self, _result: &TraceResult) {}
}

pub struct NoTraceOutput;

impl TraceSink for NoTraceOutput {}

/// Capture one trace per configured degree.
///
/// Only setup problems (unwritable output directory, unlaunchable binary)
/// return `Err`.
pub fn capture_traces(config: &TraceConfig, sink: &mut dyn TraceSink) -> Result<Vec<TraceResult>> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "creating trace output directory {}",
            config.output_dir.display()
        )
    })?;

    let mut results = Vec::with_capacity(config.degrees.len());
    for &degree in &config.degrees {
        let log_path = config.log_path_for(degree);
        sink.run_started(degree, &log_path);

        let spec = TrialSpec::new(&config.binary, config.timeout)
            .arg(degree.to_string())
            .env(
                config.log_env_var.clone(),
                log_path.to_string_lossy().into_owned(),
            );
        let outcome = run_trial(&spec)?;
        match outcome {
            TrialOutcome::Success { duration } => {
                log::debug!("trace {} finished in {:?}", degree, duration)
            }
            TrialOutcome::RuntimeError { exit_code } => {
                log::warn!("trace {} exited with {:?}", degree, exit_code)
            }
            TrialOutcome::TimeoutDeadlock => {
                log::warn!("trace {} timed out after {:?}", degree, config.timeout)
            }
        }

        let result = TraceResult {
            concurrency_degree: degree,
            log_path,
            outcome,
        };
        sink.run_finished(&result);
        results.push(result);
    }

    Ok(results)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("dining_hall_logged");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config(binary: PathBuf, output_dir: PathBuf) -> TraceConfig {
        TraceConfig {
            binary,
            degrees: vec![2, 3, 10],
            output_dir,
            timeout: Duration::from_secs(5),
            log_env_var: "DINING_LOG_FILE".to_string(),
            build: BuildConfig { steps: Vec::new() },
        }
    }

    #[test]
    fn test_one_log_per_degree() {
        let dir = TempDir::new().unwrap();
        let target = script(dir.path(), "echo \"students=$1\" > \"$DINING_LOG_FILE\"");
        let out = dir.path().join("nested").join("trace_logs");

        let results = capture_traces(&config(target, out.clone()), &mut NoTraceOutput).unwrap();
        assert_eq!(results.len(), 3);
        for (result, degree) in results.iter().zip([2, 3, 10]) {
            assert!(result.outcome.is_success());
            assert_eq!(
                result.log_path,
                out.join(format!("trace_{}_students.txt", degree))
            );
            let content = fs::read_to_string(&result.log_path).unwrap();
            assert_eq!(content.trim(), format!("students={}", degree));
        }
    }

    #[test]
    fn test_existing_directory_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("trace_logs");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("trace_2_students.txt"), "stale").unwrap();

        let target = script(dir.path(), "echo fresh > \"$DINING_LOG_FILE\"");
        capture_traces(&config(target, out.clone()), &mut NoTraceOutput).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("trace_2_students.txt"))
                .unwrap()
                .trim(),
            "fresh"
        );
        assert_eq!(fs::read_dir(&out).unwrap().count(), 3);
    }

    #[test]
    fn test_failures_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let target = script(
            dir.path(),
            "echo run > \"$DINING_LOG_FILE\"\ncase \"$1\" in 3) sleep 30 ;; 10) exit 4 ;; esac",
        );
        let mut cfg = config(target, dir.path().join("logs"));
        cfg.timeout = Duration::from_millis(500);

        let results = capture_traces(&cfg, &mut NoTraceOutput).unwrap();
        let outcomes: Vec<TrialOutcome> = results.iter().map(|r| r.outcome).collect();
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[1], TrialOutcome::TimeoutDeadlock);
        assert_eq!(outcomes[2], TrialOutcome::RuntimeError { exit_code: Some(4) });
    }

    #[test]
    fn test_env_var_is_scoped_to_child() {
        let dir = TempDir::new().unwrap();
        let target = script(dir.path(), "echo ok > \"$DINING_LOG_FILE\"");
        capture_traces(&config(target, dir.path().join("logs")), &mut NoTraceOutput).unwrap();
        assert!(std::env::var_os("DINING_LOG_FILE").is_none());
    }
}
