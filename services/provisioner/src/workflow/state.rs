//! Workflow state machine.
//!
//! ```text
//! Init → EngineEnabled → SecretWritten → SecretVerified → Done
//!   ↓          ↓               ↓               ↓
//!   → Failed { at } ← ← ← ← ← ← (failure at any step)
//! ```

use crate::error::{Step, StepError};
use std::fmt;

/// State of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// Client built, nothing sent yet
    Init,
    /// KV v2 engine mounted (or reused)
    EngineEnabled,
    /// Secret written
    SecretWritten,
    /// Secret read back and matched
    SecretVerified,
    /// Token handed off
    Done,
    /// A step failed; no further steps run
    Failed {
        /// Step that failed
        at: Step,
    },
}

impl WorkflowState {
    /// The only state reachable from this one on success.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::EngineEnabled),
            Self::EngineEnabled => Some(Self::SecretWritten),
            Self::SecretWritten => Some(Self::SecretVerified),
            Self::SecretVerified => Some(Self::Done),
            Self::Done | Self::Failed { .. } => None,
        }
    }

    /// Check if transition to the target state is valid.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match target {
            Self::Failed { .. } => !self.is_terminal(),
            _ => self.next() == Some(target),
        }
    }

    /// Validate and perform a state transition.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidTransition`] for a skipped, repeated or
    /// backwards move, or any move out of a terminal state.
    pub fn transition_to(&self, target: Self) -> Result<Self, StepError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(StepError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Check if state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Check if the run failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::EngineEnabled => write!(f, "engine_enabled"),
            Self::SecretWritten => write!(f, "secret_written"),
            Self::SecretVerified => write!(f, "secret_verified"),
            Self::Done => write!(f, "done"),
            Self::Failed { at } => write!(f, "failed({at})"),
        }
    }
}

/// Current state plus every state visited, in order.
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: WorkflowState,
    history: Vec<WorkflowState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            current: WorkflowState::Init,
            history: vec![WorkflowState::Init],
        }
    }
}

impl StateTracker {
    /// Start at [`WorkflowState::Init`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn current(&self) -> WorkflowState {
        self.current
    }

    /// Last state that was not a failure.
    #[must_use]
    pub fn last_completed(&self) -> WorkflowState {
        self.history
            .iter()
            .rev()
            .copied()
            .find(|s| !s.is_failed())
            .unwrap_or(WorkflowState::Init)
    }

    /// States visited so far.
    #[must_use]
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    /// Move to the next state on success.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidTransition`] if `target` is not the
    /// current state's successor.
    pub fn advance(&mut self, target: WorkflowState) -> Result<(), StepError> {
        self.current = self.current.transition_to(target)?;
        self.history.push(self.current);
        Ok(())
    }

    /// Record a failure at `step`. Has no effect once terminal.
    pub fn fail(&mut self, step: Step) {
        if let Ok(state) = self.current.transition_to(WorkflowState::Failed { at: step }) {
            self.current = state;
            self.history.push(state);
        }
    }

    /// Consume the tracker, returning the history.
    #[must_use]
    pub fn into_history(self) -> Vec<WorkflowState> {
        self.history
    }
}
