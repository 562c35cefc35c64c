//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for employee rows.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories never open or commit transactions; services own the
//!   transaction boundary and hand a `Transaction` in through deref.
//! - Constraint violations on the primary key surface as
//!   `RepoError::DuplicateKey`, never as a generic DB error.

pub mod employee_repo;
