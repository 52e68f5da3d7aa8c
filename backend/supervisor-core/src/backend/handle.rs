use crate::error::spawn::SpawnError;

use common::ErrorLocation;
use models::{BackendInfo, ServerState};

use std::panic::Location;

use log::{debug, error, warn};
use tokio::process::Child as TokioChild;

/// The one backend process of an application run.
///
/// Owned by the [`crate::Supervisor`]. The port is assigned once and never
/// changes; the state only moves forward (see [`ServerState`]).
#[derive(Debug, Default)]
pub struct ServerHandle {
    state: ServerState,
    port: Option<u16>,
    info: Option<BackendInfo>,
    child: Option<TokioChild>,
}

impl ServerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn info(&self) -> Option<&BackendInfo> {
        self.info.as_ref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.info.as_ref().map(|info| info.pid)
    }

    /// Whether a child process is still attached (it may have exited unnoticed).
    pub fn has_process(&self) -> bool {
        self.child.is_some()
    }

    /// Poll the child without blocking.
    ///
    /// A `Running` backend whose process has exited moves to `Stopped` and the
    /// exit status is logged. No restart is attempted.
    pub fn check_liveness(&mut self) -> ServerState {
        if self.state != ServerState::Running {
            return self.state;
        }

        let Some(child) = self.child.as_mut() else {
            return self.state;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                error!(
                    "Backend process (PID {}) exited unexpectedly with {status}",
                    self.pid().unwrap_or_default()
                );
                self.child = None;
                self.transition(ServerState::Stopped);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to poll backend process: {e}"),
        }

        self.state
    }

    pub(crate) fn begin_starting(&mut self) {
        self.transition(ServerState::Starting);
    }

    #[track_caller]
    pub(crate) fn assign_port(&mut self, port: u16) -> Result<(), SpawnError> {
        match self.port {
            Some(existing) if existing != port => Err(SpawnError::Validation {
                message: format!("Port already assigned ({existing}), refusing {port}"),
                location: ErrorLocation::from(Location::caller()),
            }),
            _ => {
                self.port = Some(port);
                Ok(())
            }
        }
    }

    pub(crate) fn attach(&mut self, child: TokioChild, info: BackendInfo) {
        self.child = Some(child);
        self.info = Some(info);
    }

    pub(crate) fn take_child(&mut self) -> Option<TokioChild> {
        self.child.take()
    }

    pub(crate) fn mark_running(&mut self) {
        self.transition(ServerState::Running);
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.transition(ServerState::Stopped);
    }

    fn transition(&mut self, next: ServerState) {
        if self.state.can_transition_to(next) {
            if self.state != next {
                debug!("Backend state: {} -> {next}", self.state);
            }
            self.state = next;
        } else {
            warn!("Ignoring backend state change {} -> {next}", self.state);
        }
    }
}
