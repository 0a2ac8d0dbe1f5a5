// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process runner: one trial of the target with a wall-clock deadline.
//!
//! A trial that is still running when the deadline passes is classified as a
//! deadlock. This is a heuristic: a correct but slow run is indistinguishable
//! from a stuck one, and a deadlock that happens to clear just before the
//! deadline counts as a success. The timeout is therefore always a parameter.

mod guard;

use crate::types::TrialOutcome;
use anyhow::{Context, Result};
use guard::ChildGuard;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything needed to launch one trial
#[derive(Debug, Clone)]
pub struct TrialSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Merged over the inherited environment, for this child only
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
    pub suppress_stdout: bool,
}

impl TrialSpec {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout,
            suppress_stdout: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn suppress_stdout(mut self, suppress: bool) -> Self {
        self.suppress_stdout = suppress;
        self
    }
}

/// Run one trial and classify it.
///
/// Returns `Err` only when the program cannot be started at all; that is a
/// setup problem and callers abort the run instead of counting it.
pub fn run_trial(spec: &TrialSpec) -> Result<TrialOutcome> {
    let mut command = Command::new(&spec.program);
    command.args(&spec.args).envs(&spec.env).stdin(Stdio::null());
    if spec.suppress_stdout {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let start = Instant::now();
    let child = command
        .spawn()
        .with_context(|| format!("Failed to execute program {}", spec.program.display()))?;
    let mut guard = ChildGuard::new(child);
    log::trace!(
        "spawned {} {:?} as pid {}",
        spec.program.display(),
        spec.args,
        guard.id()
    );

    loop {
        if let Some(status) = guard
            .try_wait()
            .with_context(|| format!("waiting on {}", spec.program.display()))?
        {
            return Ok(classify(status, start.elapsed()));
        }

        let elapsed = start.elapsed();
        if elapsed >= spec.timeout {
            log::debug!(
                "pid {} exceeded {:?}, treating as deadlock",
                guard.id(),
                spec.timeout
            );
            guard.terminate();
            return Ok(TrialOutcome::TimeoutDeadlock);
        }

        thread::sleep(POLL_INTERVAL.min(spec.timeout - elapsed));
    }
}

fn classify(status: ExitStatus, elapsed: Duration) -> TrialOutcome {
    if status.success() {
        TrialOutcome::Success { duration: elapsed }
    } else {
        TrialOutcome::RuntimeError {
            exit_code: status.code(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> TrialSpec {
        TrialSpec::new("/bin/sh", timeout).arg("-c").arg(script)
    }

    #[test]
    fn test_zero_exit_is_success() {
        let outcome = run_trial(&sh("exit 0", Duration::from_secs(5))).unwrap();
        match outcome {
            TrialOutcome::Success { duration } => assert!(duration < Duration::from_secs(5)),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_nonzero_exit_is_runtime_error() {
        let outcome = run_trial(&sh("exit 3", Duration::from_secs(5))).unwrap();
        assert_eq!(
            outcome,
            TrialOutcome::RuntimeError { exit_code: Some(3) }
        );
    }

    #[test]
    fn test_signal_death_is_runtime_error() {
        let outcome = run_trial(&sh("kill -SEGV $$", Duration::from_secs(5))).unwrap();
        assert_eq!(outcome, TrialOutcome::RuntimeError { exit_code: None });
    }

    #[test]
    fn test_hang_is_deadlock() {
        let start = Instant::now();
        let outcome = run_trial(&sh("sleep 30", Duration::from_millis(200))).unwrap();
        assert_eq!(outcome, TrialOutcome::TimeoutDeadlock);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_env_override_reaches_child() {
        let spec = sh("test \"$STRESS_HALL_PROBE\" = marker", Duration::from_secs(5))
            .env("STRESS_HALL_PROBE", "marker");
        assert!(run_trial(&spec).unwrap().is_success());

        let without = sh("test \"$STRESS_HALL_PROBE\" = marker", Duration::from_secs(5));
        assert!(!run_trial(&without).unwrap().is_success());
    }

    #[test]
    fn test_missing_program_is_setup_error() {
        let spec = TrialSpec::new("/nonexistent/stress-hall-target", Duration::from_secs(1));
        assert!(run_trial(&spec).is_err());
    }

    #[cfg(target_os = "linux")]
    fn assert_gone(pid: &str) {
        let stat = PathBuf::from(format!("/proc/{}/stat", pid.trim()));
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            // Gone, or a zombie awaiting reaping by its new parent
            match std::fs::read_to_string(&stat) {
                Err(_) => break,
                Ok(line) if line.contains(") Z") || line.contains(") X") => break,
                Ok(_) if Instant::now() > deadline => panic!("process {} survived", pid.trim()),
                Ok(_) => thread::sleep(Duration::from_millis(20)),
            }
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_normal_exit_sweeps_background_children() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("background.pid");
        let script = format!("sleep 30 & echo $! > {}; exit 0", pid_file.display());

        let outcome = run_trial(&sh(&script, Duration::from_secs(5))).unwrap();
        assert!(outcome.is_success());
        assert_gone(&std::fs::read_to_string(&pid_file).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_descendants() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("grandchild.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

        let outcome = run_trial(&sh(&script, Duration::from_millis(300))).unwrap();
        assert_eq!(outcome, TrialOutcome::TimeoutDeadlock);

        assert_gone(&std::fs::read_to_string(&pid_file).unwrap());
    }
}
