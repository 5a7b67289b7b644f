//! Signing workflow state machine
//!
//! One record per invocation:
//! READING → LOADED → PRE_CHECKED → SIGNED → POST_CHECKED → PERSISTED,
//! with FAILED reachable from every non-terminal state. Nothing is retried,
//! so both PERSISTED and FAILED are final.

mod workflow_state;

pub use workflow_state::{WorkflowRecord, WorkflowState, WorkflowStateError};

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}
