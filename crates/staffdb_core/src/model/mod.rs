//! Domain model for employee rows and their audit trail.
//!
//! # Invariants
//! - Every employee is identified by a caller-chosen `EmployeeId`.
//! - Rows are never deleted by core; there is no tombstone state.

pub mod audit;
pub mod employee;
