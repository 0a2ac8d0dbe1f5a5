// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scoped ownership of a spawned trial process.

use std::io;
use std::process::{Child, ExitStatus};

/// Owns a running child and guarantees it is terminated and reaped when dropped.
///
/// On Unix the child is expected to lead its own process group, so termination
/// reaches every descendant that did not leave the group.
pub(crate) struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    pub(crate) fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    pub(crate) fn id(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking status check. Once the leader has exited, any stragglers
    /// left in its group are killed so nothing outlives the trial.
    pub(crate) fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
            // The leader is already reaped; its pid stays reserved only while
            // stragglers keep the group alive. An empty group yields ESRCH,
            // barring reuse of the pid as a new group leader in between.
            kill_process_group(self.child.id());
        }
        Ok(status)
    }

    /// Kill the whole group, then the leader, and reap it.
    pub(crate) fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        log::debug!("terminating process group {}", self.child.id());
        kill_process_group(self.child.id());
        if let Err(err) = self.child.kill() {
            log::trace!("kill({}) after group signal: {}", self.child.id(), err);
        }
        if let Err(err) = self.child.wait() {
            log::warn!("failed to reap process {}: {}", self.child.id(), err);
        }
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => log::warn!("killpg({}) failed: {}", pgid, err),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}
