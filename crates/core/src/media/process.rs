//! Process groups for extractor runs.
//!
//! yt-dlp starts ffmpeg to merge streams. Every run gets a process group of
//! its own so a timeout or an abandoned request stops ffmpeg as well.

use tokio::process::{Child, Command};

/// Makes the spawned process the leader of a new process group.
#[cfg(unix)]
pub fn isolate(command: &mut Command) {
    command.process_group(0);
}

#[cfg(not(unix))]
pub fn isolate(_command: &mut Command) {}

/// Kills the process group led by a child when dropped, unless disarmed.
#[derive(Debug)]
pub struct ProcessGroup {
    leader: Option<u32>,
}

impl ProcessGroup {
    /// Group led by `child`, which must have been spawned after [`isolate`].
    pub fn of(child: &Child) -> Self {
        Self { leader: child.id() }
    }

    /// The leader was reaped after exiting on its own; leave the group be.
    pub fn disarm(&mut self) {
        self.leader = None;
    }

    pub fn kill(&mut self) {
        if let Some(leader) = self.leader.take() {
            kill_group(leader);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(leader: u32) {
    let Ok(pgid) = libc::pid_t::try_from(leader) else {
        return;
    };

    // SAFETY: kill(2) takes no pointers; a negative pid addresses the group
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc == 0 {
        tracing::debug!("Killed process group {}", pgid);
    } else {
        tracing::debug!(
            "Process group {} not signalled: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_group(_leader: u32) {}
