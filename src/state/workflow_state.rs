//! Per-invocation workflow record

use std::fmt;

use chrono::{DateTime, Utc};

use super::{now_utc, TerminalState};
use crate::error::FailureKind;

/// Workflow state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Input file is being read
    Reading,
    /// Container bytes are in memory
    Loaded,
    /// Container is well formed and unsigned
    PreChecked,
    /// Validator reported success
    Signed,
    /// Digest confirmed present
    PostChecked,
    /// Signed container written to the output path
    Persisted,
    /// Invocation ended with an error
    Failed(FailureKind),
}

impl TerminalState for WorkflowState {
    fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Persisted | WorkflowState::Failed(_))
    }
}

impl WorkflowState {
    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: WorkflowState) -> bool {
        match (self, target) {
            (WorkflowState::Reading, WorkflowState::Loaded) => true,
            (WorkflowState::Loaded, WorkflowState::PreChecked) => true,
            (WorkflowState::PreChecked, WorkflowState::Signed) => true,
            (WorkflowState::Signed, WorkflowState::PostChecked) => true,
            (WorkflowState::PostChecked, WorkflowState::Persisted) => true,

            // Any live state can fail
            (from, WorkflowState::Failed(_)) => !from.is_terminal(),

            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Reading => "READING",
            WorkflowState::Loaded => "LOADED",
            WorkflowState::PreChecked => "PRE_CHECKED",
            WorkflowState::Signed => "SIGNED",
            WorkflowState::PostChecked => "POST_CHECKED",
            WorkflowState::Persisted => "PERSISTED",
            WorkflowState::Failed(_) => "FAILED",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Failed(kind) => write!(f, "FAILED({})", kind.as_str()),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Errors for workflow state operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowStateError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: WorkflowState,
        to: WorkflowState,
    },
}

/// State plus timestamped history for one invocation
#[derive(Debug, Clone)]
pub struct WorkflowRecord {
    state: WorkflowState,
    history: Vec<(WorkflowState, DateTime<Utc>)>,
}

impl WorkflowRecord {
    /// Create a new record in READING state
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Reading,
            history: vec![(WorkflowState::Reading, now_utc())],
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// States visited so far, oldest first
    pub fn history(&self) -> &[(WorkflowState, DateTime<Utc>)] {
        &self.history
    }

    /// When the record was created
    pub fn started_at(&self) -> DateTime<Utc> {
        self.history[0].1
    }

    /// When the current state was entered
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.history[self.history.len() - 1].1
    }

    /// Transition to a new state
    pub fn transition(&mut self, new_state: WorkflowState) -> Result<(), WorkflowStateError> {
        if !self.state.can_transition_to(new_state) {
            return Err(WorkflowStateError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        tracing::debug!(from = %self.state, to = %new_state, "workflow transition");
        self.state = new_state;
        self.history.push((new_state, now_utc()));
        Ok(())
    }

    /// Mark the invocation as failed
    pub fn fail(&mut self, kind: FailureKind) -> Result<(), WorkflowStateError> {
        self.transition(WorkflowState::Failed(kind))
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl Default for WorkflowRecord {
    fn default() -> Self {
        Self::new()
    }
}
