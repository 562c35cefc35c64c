//! Core transactional services.
//!
//! # Responsibility
//! - Own transaction boundaries for seeding and single-row mutations.
//! - Convert storage faults into typed outcomes before they reach the
//!   orchestrator.

pub mod mutator;
pub mod seed;
