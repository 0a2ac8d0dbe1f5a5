// SPDX-License-Identifier: PMPL-1.0-or-later

//! Build preparation: produce a fresh target binary before any trial runs.

use crate::config::{BuildConfig, BuildStep};
use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

/// Run every build step in order. A missing tool or a failing required step is
/// fatal; the tool's stderr is carried verbatim in the error.
pub fn prepare(build: &BuildConfig) -> Result<()> {
    for step in &build.steps {
        run_step(step)?;
    }
    Ok(())
}

fn run_step(step: &BuildStep) -> Result<()> {
    let tool = which::which(&step.program)
        .with_context(|| format!("'{}' not found in PATH", step.program))?;
    log::debug!("build step: {} (resolved to {})", step.display(), tool.display());

    let output = Command::new(&tool)
        .args(&step.args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute '{}'", step.display()))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !step.required {
        log::info!("ignoring failed optional step '{}': {}", step.display(), output.status);
        return Ok(());
    }
    bail!(
        "'{}' failed with {}\n{}",
        step.display(),
        output.status,
        stderr.trim_end()
    );
}
