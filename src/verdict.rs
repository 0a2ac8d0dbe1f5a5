// SPDX-License-Identifier: PMPL-1.0-or-later

//! Overall pass/fail judgment

use crate::types::{Summary, Verdict};

/// A single deadlock or runtime error in any scenario fails the run.
pub fn verdict(summary: &Summary) -> Verdict {
    Verdict {
        overall_pass: summary.scenarios.iter().all(|stats| stats.is_clean()),
    }
}
