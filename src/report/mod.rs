// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report module: console rendering and summary export

pub mod formatter;
pub mod output;

use crate::types::{Summary, Verdict};
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

pub use formatter::{ConsoleProgress, ConsoleTrace, ReportFormatter};
pub use output::ReportOutputFormat;

/// Print the banner shown before the first scenario
pub fn print_header(trials: usize, timeout: Duration) {
    ReportFormatter::new().print_battery_header(trials, timeout.as_secs_f64());
}

/// Print the final table and verdict line
pub fn print_report(summary: &Summary, verdict: &Verdict) {
    let formatter = ReportFormatter::new();
    formatter.print(summary, verdict);
}

/// Save the summary in the requested format
pub fn save_report<P: AsRef<Path>>(
    summary: &Summary,
    verdict: &Verdict,
    format: ReportOutputFormat,
    path: P,
) -> Result<()> {
    output::write_report(summary, verdict, format, path.as_ref())
}
