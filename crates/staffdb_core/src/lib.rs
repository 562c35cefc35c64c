//! Core logic for staffdb.
//! This crate owns the employee record invariants and the audit trail contract.

pub mod audit;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod run;
pub mod service;

pub use audit::{AuditSink, AuditWriteMode, CsvAuditSink, SinkError, SinkResult};
pub use config::{ConfigError, RunConfig, StorageConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::audit::{AuditEntry, AuditOperation, AuditRecord, AuditStatus};
pub use model::employee::{Employee, EmployeeId, EmployeeValidationError, Salary};
pub use repo::employee_repo::{
    EmployeeRepository, EmployeeTable, RepoError, RepoResult, SqliteEmployeeRepository,
};
pub use run::{
    Operation, OperationOutcome, RunFailure, RunOrchestrator, RunReport, RunState,
    SelectOutcome, StepStatus,
};
pub use service::mutator::{EmployeeMutator, InsertOutcome, UpdateOutcome};
pub use service::seed::{default_seed_rows, SeedGuard, SeedOutcome, SeedPolicy};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
