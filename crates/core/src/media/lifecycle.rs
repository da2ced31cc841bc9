//! Per-download state tracking.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info};

use crate::metrics::EXTRACTOR_RUNS;

/// States a download passes through.
///
/// `Idle -> ArgsBuilt -> ProcessRunning -> {Succeeded, Failed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    ArgsBuilt,
    ProcessRunning,
    Succeeded,
    Failed,
    Cancelled,
}

impl DownloadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ArgsBuilt => "args_built",
            Self::ProcessRunning => "process_running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one download and records its outcome.
///
/// If the tracker is dropped before reaching a terminal state, the request
/// future was abandoned (client went away), which is recorded as
/// `Cancelled`.
#[derive(Debug)]
pub struct DownloadLifecycle {
    id: String,
    state: DownloadState,
    started: Instant,
}

impl DownloadLifecycle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: DownloadState::Idle,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    /// Moves to `next`. Transitions out of a terminal state are ignored.
    pub fn advance(&mut self, next: DownloadState) {
        if self.state.is_terminal() {
            return;
        }

        debug!(download = %self.id, from = %self.state, to = %next, "Download state change");
        self.state = next;

        if next.is_terminal() {
            EXTRACTOR_RUNS
                .with_label_values(&["download", next.as_str()])
                .inc();
            info!(
                download = %self.id,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Download {}",
                next
            );
        }
    }
}

impl Drop for DownloadLifecycle {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            self.advance(DownloadState::Cancelled);
        }
    }
}
