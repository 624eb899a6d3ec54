//! Worker lifecycle states.

use serde::Serialize;

/// Lifecycle of the agent, from first load to active control.
///
/// `parsed → installing → installed → activating → activated`, with
/// `redundant` after a failed install or activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    /// Install may start from any settled state.
    pub fn can_install(self) -> bool {
        !matches!(self, WorkerState::Installing | WorkerState::Activating)
    }

    /// Activation needs a completed install. Re-activating is allowed.
    pub fn can_activate(self) -> bool {
        matches!(self, WorkerState::Installed | WorkerState::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}
