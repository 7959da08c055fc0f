//! Worker lifecycle state machine

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Worker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
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
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: WorkerState,
    pub action: String,
}

/// Worker lifecycle entity.
///
/// State machine:
///   PARSED -> INSTALLING (begin_install)
///   INSTALLING -> INSTALLED (finish_install)
///   INSTALLED -> ACTIVATING (begin_activation)
///   ACTIVATING -> ACTIVATED (finish_activation)
///   any -> REDUNDANT (retire)
#[derive(Debug, Default)]
pub struct WorkerLifecycle {
    state: WorkerState,
}

impl WorkerLifecycle {
    /// Create a freshly parsed worker
    pub fn new() -> Self {
        Self {
            state: WorkerState::Parsed,
        }
    }

    /// Get the current state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Push and click events are only delivered to an active worker
    pub fn is_active(&self) -> bool {
        self.state == WorkerState::Activated
    }

    pub fn begin_install(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(WorkerState::Parsed, WorkerState::Installing, "install")
    }

    pub fn finish_install(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            WorkerState::Installing,
            WorkerState::Installed,
            "finish install",
        )
    }

    pub fn begin_activation(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(WorkerState::Installed, WorkerState::Activating, "activate")
    }

    pub fn finish_activation(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            WorkerState::Activating,
            WorkerState::Activated,
            "finish activation",
        )
    }

    /// Mark the worker as replaced or shut down
    pub fn retire(&mut self) {
        self.state = WorkerState::Redundant;
    }

    /// Fail unless the worker can handle functional events
    pub fn ensure_active(&self, action: &str) -> Result<(), InvalidStateTransition> {
        if !self.is_active() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        from: WorkerState,
        to: WorkerState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}
