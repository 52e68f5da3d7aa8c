use serde::Serialize;

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle of the supervised backend.
///
/// `NotStarted -> Starting -> Running -> Stopped`, with `Starting -> Stopped`
/// on a failed start and `NotStarted -> Stopped` when shutdown happens before
/// startup. `Stopped` is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ServerState {
    #[default]
    NotStarted,
    Starting,
    Running,
    Stopped,
}

impl ServerState {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// Re-entering the current state is not a transition and returns `false`,
    /// except for `Stopped`, which stop requests may hit repeatedly.
    pub fn can_transition_to(self, next: ServerState) -> bool {
        use ServerState::*;

        matches!(
            (self, next),
            (NotStarted, Starting)
                | (NotStarted, Stopped)
                | (Starting, Running)
                | (Starting, Stopped)
                | (Running, Stopped)
                | (Stopped, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ServerState::Stopped
    }
}

impl Display for ServerState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            ServerState::NotStarted => "not started",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopped => "stopped",
        };
        formatter.write_str(name)
    }
}
