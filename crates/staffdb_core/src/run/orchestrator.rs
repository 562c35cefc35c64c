//! Single-pass run orchestration.
//!
//! # Responsibility
//! - Own the storage connection for exactly one run.
//! - Drive schema bootstrap, seeding and the requested operation.
//! - Write the audit entry and release the connection on every exit path.
//!
//! # Invariants
//! - The audit sink is called exactly once per run, after any storage
//!   transaction has committed or rolled back.
//! - Sink, marker and close failures are reported in the `RunReport` and
//!   never change the already-decided result.
//! - The connection is closed exactly once, after the audit step.

use crate::audit::{write_result_marker, AuditSink, CsvAuditSink, SinkError};
use crate::config::RunConfig;
use crate::db::{close_db, ensure_schema, open_db, DbError};
use crate::export::export_employees_csv;
use crate::logging::{panic_payload_text, sanitize_message};
use crate::model::audit::{AuditEntry, AuditRecord, AuditStatus};
use crate::repo::employee_repo::{EmployeeRepository, RepoError, SqliteEmployeeRepository};
use crate::run::operation::{Operation, OperationOutcome, SelectOutcome};
use crate::run::state::{RunMachine, RunState, StepStatus};
use crate::service::mutator::EmployeeMutator;
use crate::service::seed::{SeedGuard, SeedOutcome, SeedPolicy};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};

const MAX_PANIC_MESSAGE_CHARS: usize = 200;

/// Why a run could not decide an operation outcome.
#[derive(Debug)]
pub enum RunFailure {
    ConnectionFailure(DbError),
    SchemaFailure(DbError),
    SeedFailure(RepoError),
    /// The operation path panicked; the message is sanitized.
    Panicked(String),
}

impl Display for RunFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailure(err) => write!(f, "connection failure: {err}"),
            Self::SchemaFailure(err) => write!(f, "schema failure: {err}"),
            Self::SeedFailure(err) => write!(f, "seed failure: {err}"),
            Self::Panicked(message) => write!(f, "run aborted by panic: {message}"),
        }
    }
}

impl Error for RunFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConnectionFailure(err) | Self::SchemaFailure(err) => Some(err),
            Self::SeedFailure(err) => Some(err),
            Self::Panicked(_) => None,
        }
    }
}

/// Everything observable about one finished run.
#[derive(Debug)]
pub struct RunReport {
    /// Visited states, starting at `Start` and ending at `Closed`.
    pub states: Vec<RunState>,
    pub steps: Vec<StepStatus>,
    pub failure: Option<RunFailure>,
    pub outcome: Option<OperationOutcome>,
    /// Entry handed to the audit sink.
    pub entry: AuditEntry,
    /// Record as written; `None` when the sink failed.
    pub audit: Option<AuditRecord>,
    pub audit_error: Option<SinkError>,
    pub marker_error: Option<SinkError>,
    pub close_error: Option<DbError>,
}

impl RunReport {
    pub fn status(&self) -> AuditStatus {
        self.entry.result
    }

    pub fn is_success(&self) -> bool {
        self.status() == AuditStatus::Success
    }
}

/// Runs one operation against the configured store.
pub struct RunOrchestrator<S: AuditSink> {
    config: RunConfig,
    sink: S,
}

impl RunOrchestrator<CsvAuditSink> {
    /// Builds an orchestrator whose sink is the configured audit CSV file.
    pub fn from_config(config: RunConfig) -> Self {
        let sink = CsvAuditSink::new(config.audit.file.clone(), config.audit.mode);
        Self::new(config, sink)
    }
}

impl<S: AuditSink> RunOrchestrator<S> {
    pub fn new(config: RunConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Performs `operation` in one linear pass and reports what happened.
    ///
    /// Never panics on storage or sink failures; every failure is in the
    /// returned report.
    pub fn run(&self, operation: &Operation) -> RunReport {
        let mut machine = RunMachine::new();
        let mut conn: Option<Connection> = None;
        info!(
            "event=run module=run status=start operation={:?}",
            operation.audit_operation()
        );

        let driven = panic::catch_unwind(AssertUnwindSafe(|| {
            self.drive(&mut conn, operation, &mut machine)
        }))
        .unwrap_or_else(|payload| {
            Err(RunFailure::Panicked(sanitize_message(
                &panic_payload_text(&*payload),
                MAX_PANIC_MESSAGE_CHARS,
            )))
        });

        let mut entry = operation.failure_entry();
        let (failure, outcome) = match driven {
            Ok(outcome) => {
                outcome.fill_audit(&mut entry);
                (None, Some(outcome))
            }
            Err(failure) => {
                error!(
                    "event=run module=run status=error state={} error={}",
                    machine.current(),
                    failure
                );
                machine.advance(RunState::Failed, failure.to_string());
                (Some(failure), None)
            }
        };

        let (audit, audit_error) = match self.sink.record(&entry) {
            Ok(record) => {
                machine.advance(
                    RunState::Audited,
                    format!("audit recorded: {}", record.result.as_str()),
                );
                (Some(record), None)
            }
            Err(err) => {
                error!(
                    "event=run module=run status=error error_code=audit_sink_failed error={}",
                    err
                );
                machine.advance(RunState::Audited, format!("audit write failed: {err}"));
                (None, Some(err))
            }
        };

        let marker_error = self.write_marker(entry.result, &mut machine);

        let close_error = match conn.take() {
            Some(conn) => match close_db(conn) {
                Ok(()) => {
                    machine.advance(RunState::Closed, "database connection closed");
                    None
                }
                Err(err) => {
                    machine.advance(
                        RunState::Closed,
                        format!("database connection released with error: {err}"),
                    );
                    Some(err)
                }
            },
            None => {
                machine.advance(RunState::Closed, "no database connection to close");
                None
            }
        };

        info!(
            "event=run module=run status=done result={}",
            entry.result.as_str()
        );
        let (states, steps) = machine.into_parts();
        RunReport {
            states,
            steps,
            failure,
            outcome,
            entry,
            audit,
            audit_error,
            marker_error,
            close_error,
        }
    }

    fn drive(
        &self,
        slot: &mut Option<Connection>,
        operation: &Operation,
        machine: &mut RunMachine,
    ) -> Result<OperationOutcome, RunFailure> {
        let conn = slot.insert(open_db(&self.config.storage).map_err(RunFailure::ConnectionFailure)?);
        machine.advance(
            RunState::Connected,
            format!(
                "connected to {}",
                self.config.storage.database.display()
            ),
        );

        ensure_schema(conn).map_err(RunFailure::SchemaFailure)?;
        machine.advance(RunState::SchemaReady, "employees table ready");

        let (policy, seed_rows) = if self.config.seed.enabled {
            operation.seed_plan()
        } else {
            (SeedPolicy::Never, Vec::new())
        };
        let seeded = SeedGuard::new(conn)
            .ensure_seed(&seed_rows, policy)
            .map_err(RunFailure::SeedFailure)?;
        machine.advance(
            RunState::Seeded,
            match seeded {
                SeedOutcome::Seeded { inserted } => format!("inserted {inserted} seed rows"),
                SeedOutcome::NotSeeded => "seed rows not needed".to_string(),
            },
        );

        let outcome = match operation {
            Operation::InsertEmployee(employee) => {
                OperationOutcome::Insert(EmployeeMutator::new(conn).insert_employee(employee))
            }
            Operation::SelectAllEmployees => OperationOutcome::SelectAll(self.select_all(conn)),
            Operation::UpdateSalary {
                employee_id,
                new_salary,
            } => OperationOutcome::UpdateSalary(
                EmployeeMutator::new(conn).update_salary(*employee_id, *new_salary),
            ),
        };
        machine.advance(RunState::OperationDone, outcome.describe());
        Ok(outcome)
    }

    fn select_all(&self, conn: &Connection) -> SelectOutcome {
        let table = match SqliteEmployeeRepository::new(conn).find_all() {
            Ok(table) => table,
            Err(err) => {
                error!(
                    "event=select_all module=run status=error error={}",
                    err
                );
                return SelectOutcome::StorageError(err);
            }
        };
        info!(
            "event=select_all module=run status=ok rows={}",
            table.len()
        );

        match &self.config.export.file {
            Some(path) => match export_employees_csv(&table, path) {
                Ok(_) => SelectOutcome::Success {
                    table,
                    exported_to: Some(path.clone()),
                },
                Err(cause) => {
                    error!(
                        "event=export module=run status=error error={}",
                        cause
                    );
                    SelectOutcome::ExportFailed { table, cause }
                }
            },
            None => SelectOutcome::Success {
                table,
                exported_to: None,
            },
        }
    }

    fn write_marker(&self, status: AuditStatus, machine: &mut RunMachine) -> Option<SinkError> {
        let path = self.config.audit.result_marker.as_ref()?;
        match write_result_marker(path, status) {
            Ok(()) => {
                machine.note(format!(
                    "result marker {} written to {}",
                    status.as_str(),
                    path.display()
                ));
                None
            }
            Err(err) => {
                warn!(
                    "event=result_marker module=run status=error error={}",
                    err
                );
                machine.note(format!("result marker write failed: {err}"));
                Some(err)
            }
        }
    }
}
