use thiserror::Error;

use crate::environment::Environment;
use crate::ops::{self, OpError, OpState};
use crate::tree::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResumeError {
    /// The record was already consumed by a resume, or never held a
    /// suspended operation. Double-resume is a caller bug, never retried.
    #[error("continuation record was already consumed")]
    StaleContinuation,
}

/// Result value of a settled resumable operation. Operations all report
/// through the same slot so a continuation can stand in for any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpValue {
    Unit,
    Node(NodeId),
    MaybeNode(Option<NodeId>),
}

impl OpValue {
    pub fn node(self) -> Option<NodeId> {
        match self {
            OpValue::Unit => None,
            OpValue::Node(node) => Some(node),
            OpValue::MaybeNode(node) => node,
        }
    }
}

/// What a resumable operation hands back: its settled value, or the
/// continuation record standing in for it while the operation is suspended.
pub enum OpOutcome {
    Complete(OpValue),
    Suspended(Continuation),
}

impl OpOutcome {
    pub fn is_suspended(&self) -> bool {
        matches!(self, OpOutcome::Suspended(_))
    }

    pub fn complete_value(&self) -> Option<OpValue> {
        match self {
            OpOutcome::Complete(value) => Some(*value),
            OpOutcome::Suspended(_) => None,
        }
    }
}

/// Externally stored state of one suspended operation: a progress marker,
/// the operands the next step needs, and any nested record. Created only
/// when a suspension actually happens, owned by the call chain that will
/// re-invoke the operation, and valid for exactly one resume.
pub struct Continuation {
    state: Option<OpState>,
}

impl Continuation {
    pub(crate) fn new(state: OpState) -> Self {
        Self { state: Some(state) }
    }

    /// Re-enter the suspended operation at the step recorded in this
    /// record. Earlier steps are never re-run. A second resume of the same
    /// record fails with `StaleContinuation` instead of re-applying side
    /// effects; a fresh record is issued if the operation suspends again.
    pub fn resume(&mut self, env: &Environment) -> Result<OpOutcome, OpError> {
        let state = self
            .state
            .take()
            .ok_or(ResumeError::StaleContinuation)?;
        ops::step(env, state)
    }
}

/// Trampoline: resume until the operation settles. If the current script
/// thread is (still) blocked, the outstanding continuation is handed back
/// instead of spinning on it.
pub fn drive(env: &Environment, mut outcome: OpOutcome) -> Result<OpOutcome, OpError> {
    loop {
        match outcome {
            OpOutcome::Complete(value) => return Ok(OpOutcome::Complete(value)),
            OpOutcome::Suspended(mut continuation) => {
                if env.scheduler().current_thread().is_blocked() {
                    return Ok(OpOutcome::Suspended(continuation));
                }
                outcome = continuation.resume(env)?;
            }
        }
    }
}
