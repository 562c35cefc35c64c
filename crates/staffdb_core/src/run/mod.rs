//! Run orchestration for one operation per process invocation.
//!
//! # Responsibility
//! - Sequence connect, schema bootstrap, seed, operation, audit and close.
//! - Expose the visited state trail and status lines to callers.
//!
//! # Invariants
//! - Each run is a single linear pass; no state is re-entered.
//! - Audit and connection release happen on every exit path.

mod operation;
mod orchestrator;
mod state;

pub use operation::{Operation, OperationOutcome, SelectOutcome};
pub use orchestrator::{RunFailure, RunOrchestrator, RunReport};
pub use state::{RunState, StepStatus};
