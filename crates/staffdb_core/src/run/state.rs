//! Run state machine.
//!
//! # Invariants
//! - The happy path is `Start → Connected → SchemaReady → Seeded →
//!   OperationDone → Audited → Closed`.
//! - `Failed` is reachable from every state before `Audited` and only
//!   leads to `Audited`.
//! - No state is entered twice; `Closed` is terminal.

use log::{error, info};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    Connected,
    SchemaReady,
    Seeded,
    OperationDone,
    Failed,
    Audited,
    Closed,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Connected => "connected",
            Self::SchemaReady => "schema_ready",
            Self::Seeded => "seeded",
            Self::OperationDone => "operation_done",
            Self::Failed => "failed",
            Self::Audited => "audited",
            Self::Closed => "closed",
        }
    }

    /// Returns whether `self → next` is a legal transition.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Start, Connected)
                | (Connected, SchemaReady)
                | (SchemaReady, Seeded)
                | (Seeded, OperationDone)
                | (OperationDone, Audited)
                | (Start | Connected | SchemaReady | Seeded | OperationDone, Failed)
                | (Failed, Audited)
                | (Audited, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One human-readable line per completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub state: RunState,
    pub message: String,
}

/// Linear state tracker for one run.
#[derive(Debug)]
pub(crate) struct RunMachine {
    current: RunState,
    trail: Vec<RunState>,
    steps: Vec<StepStatus>,
}

impl RunMachine {
    pub(crate) fn new() -> Self {
        Self {
            current: RunState::Start,
            trail: vec![RunState::Start],
            steps: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> RunState {
        self.current
    }

    /// Moves to `next` and records `message` as its status line.
    ///
    /// An illegal transition is logged and ignored; it indicates a bug in the
    /// orchestrator, not a storage condition.
    pub(crate) fn advance(&mut self, next: RunState, message: impl Into<String>) {
        let message = message.into();
        if !self.current.can_advance_to(next) {
            error!(
                "event=run_state module=run status=error error_code=illegal_transition from={} to={}",
                self.current, next
            );
            debug_assert!(false, "illegal run transition {} -> {}", self.current, next);
            return;
        }
        info!(
            "event=run_state module=run status=ok from={} to={} message={}",
            self.current, next, message
        );
        self.current = next;
        self.trail.push(next);
        self.steps.push(StepStatus {
            state: next,
            message,
        });
    }

    /// Adds a status line without changing state.
    pub(crate) fn note(&mut self, message: impl Into<String>) {
        self.steps.push(StepStatus {
            state: self.current,
            message: message.into(),
        });
    }

    pub(crate) fn into_parts(self) -> (Vec<RunState>, Vec<StepStatus>) {
        (self.trail, self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::{RunMachine, RunState};

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [
            RunState::Start,
            RunState::Connected,
            RunState::SchemaReady,
            RunState::Seeded,
            RunState::OperationDone,
            RunState::Audited,
            RunState::Closed,
        ];
        assert!(path.windows(2).all(|w| w[0].can_advance_to(w[1])));
        assert!(RunState::Closed.is_terminal());
    }

    #[test]
    fn failed_is_reachable_before_audit_only() {
        for state in [
            RunState::Start,
            RunState::Connected,
            RunState::SchemaReady,
            RunState::Seeded,
            RunState::OperationDone,
        ] {
            assert!(state.can_advance_to(RunState::Failed), "{state}");
        }
        assert!(!RunState::Audited.can_advance_to(RunState::Failed));
        assert!(!RunState::Failed.can_advance_to(RunState::Closed));
        assert!(RunState::Failed.can_advance_to(RunState::Audited));
    }

    #[test]
    fn states_are_never_reentered() {
        assert!(!RunState::Connected.can_advance_to(RunState::Connected));
        assert!(!RunState::Seeded.can_advance_to(RunState::SchemaReady));
        assert!(!RunState::Closed.can_advance_to(RunState::Start));
    }

    #[test]
    fn machine_records_trail_and_steps() {
        let mut machine = RunMachine::new();
        machine.advance(RunState::Failed, "could not connect");
        machine.advance(RunState::Audited, "audit written");
        machine.note("marker written");
        machine.advance(RunState::Closed, "closed");

        let (trail, steps) = machine.into_parts();
        assert_eq!(
            trail,
            vec![
                RunState::Start,
                RunState::Failed,
                RunState::Audited,
                RunState::Closed
            ]
        );
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[2].state, RunState::Audited);
    }
}
