// SPDX-License-Identifier: PMPL-1.0-or-later

//! stress-hall — black-box reliability harness for concurrent programs.
//!
//! The program under test is an opaque subprocess taking a concurrency
//! degree. Correctness is inferred only from exit status and wall-clock
//! duration:
//! 1. **Battery**: many trials per scenario, each bounded by a timeout; a
//!    trial that outlives it is counted as a deadlock.
//! 2. **Verdict**: any deadlock or runtime error in any scenario fails the run.
//! 3. **Trace**: one instrumented run per scenario, each writing its own log.

pub mod battery;
pub mod config;
pub mod prepare;
pub mod report;
pub mod runner;
pub mod stats;
pub mod trace;
pub mod types;
pub mod verdict;
