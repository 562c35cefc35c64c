//! Transactional single-row mutations.
//!
//! # Responsibility
//! - Update one employee's salary with a pre-read, keyed write, verifying
//!   re-read and an explicit commit/rollback decision.
//! - Insert one employee with duplicate keys reported as their own outcome.
//!
//! # Invariants
//! - `NotFound` is decided before any transaction is opened.
//! - Every transaction either commits after verification or is rolled back
//!   before the outcome is returned.
//! - `UpdateOutcome::Success` carries a post-image read from storage whose
//!   salary equals the requested value and whose other fields equal the
//!   pre-image.
//! - Storage faults are converted to outcomes here; nothing escapes as `Err`.

use crate::model::employee::{Employee, EmployeeId, EmployeeValidationError, Salary};
use crate::repo::employee_repo::{
    EmployeeRepository, RepoError, RepoResult, SqliteEmployeeRepository,
};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction};
use std::time::Instant;

/// Result of `EmployeeMutator::update_salary`.
#[derive(Debug)]
pub enum UpdateOutcome {
    Success {
        before: Employee,
        after: Employee,
    },
    /// The key was absent at pre-read time; nothing was written.
    NotFound { employee_id: EmployeeId },
    /// The write affected no row, or the re-read did not match the write.
    ConcurrentModification {
        before: Employee,
        observed: Option<Employee>,
    },
    StorageError {
        before: Option<Employee>,
        cause: RepoError,
    },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Pre-image, when the pre-read found the row.
    pub fn before(&self) -> Option<&Employee> {
        match self {
            Self::Success { before, .. } | Self::ConcurrentModification { before, .. } => {
                Some(before)
            }
            Self::StorageError { before, .. } => before.as_ref(),
            Self::NotFound { .. } => None,
        }
    }

    /// Verified post-image; only present on success.
    pub fn after(&self) -> Option<&Employee> {
        match self {
            Self::Success { after, .. } => Some(after),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::NotFound { .. } => "not_found",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::StorageError { .. } => "storage_error",
        }
    }
}

/// Result of `EmployeeMutator::insert_employee`.
#[derive(Debug)]
pub enum InsertOutcome {
    /// Carries the row as read back after the insert.
    Success(Employee),
    DuplicateKey(EmployeeId),
    /// The row failed validation; no SQL was executed.
    Rejected(EmployeeValidationError),
    StorageError(RepoError),
}

impl InsertOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::Rejected(_) => "rejected",
            Self::StorageError(_) => "storage_error",
        }
    }
}

enum SalaryWrite {
    Verified(Employee),
    NoRowsAffected,
    Diverged(Option<Employee>),
}

/// Transactional writer bound to one connection.
pub struct EmployeeMutator<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> EmployeeMutator<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Sets the salary of `employee_id` to `new_salary`.
    ///
    /// # Contract
    /// - Absent key: `NotFound`, no transaction.
    /// - Zero affected rows or a mismatching re-read: rollback,
    ///   `ConcurrentModification`.
    /// - Storage error after the pre-read: rollback, `StorageError`.
    pub fn update_salary(&mut self, employee_id: EmployeeId, new_salary: Salary) -> UpdateOutcome {
        let started_at = Instant::now();

        let before = match SqliteEmployeeRepository::new(self.conn).find_by_key(employee_id) {
            Ok(Some(before)) => before,
            Ok(None) => {
                info!(
                    "event=update_salary module=service status=not_found employee_id={}",
                    employee_id
                );
                return UpdateOutcome::NotFound { employee_id };
            }
            Err(cause) => {
                error!(
                    "event=update_salary module=service status=error stage=pre_read employee_id={} error={}",
                    employee_id, cause
                );
                return UpdateOutcome::StorageError {
                    before: None,
                    cause,
                };
            }
        };

        let tx = match self.conn.transaction() {
            Ok(tx) => tx,
            Err(err) => {
                return UpdateOutcome::StorageError {
                    before: Some(before),
                    cause: err.into(),
                };
            }
        };

        let outcome = match write_salary_in_tx(&tx, &before, new_salary) {
            Ok(SalaryWrite::Verified(after)) => match tx.commit() {
                Ok(()) => UpdateOutcome::Success { before, after },
                Err(err) => UpdateOutcome::StorageError {
                    before: Some(before),
                    cause: err.into(),
                },
            },
            Ok(SalaryWrite::NoRowsAffected) => {
                rollback(tx, "update_salary");
                UpdateOutcome::ConcurrentModification {
                    before,
                    observed: None,
                }
            }
            Ok(SalaryWrite::Diverged(observed)) => {
                rollback(tx, "update_salary");
                UpdateOutcome::ConcurrentModification { before, observed }
            }
            Err(cause) => {
                rollback(tx, "update_salary");
                UpdateOutcome::StorageError {
                    before: Some(before),
                    cause,
                }
            }
        };

        match &outcome {
            UpdateOutcome::Success { before, after } => info!(
                "event=update_salary module=service status=ok employee_id={} before={:?} after={:?} duration_ms={}",
                employee_id,
                before.salary,
                after.salary,
                started_at.elapsed().as_millis()
            ),
            UpdateOutcome::StorageError { cause, .. } => error!(
                "event=update_salary module=service status=error employee_id={} outcome=storage_error error={}",
                employee_id, cause
            ),
            other => warn!(
                "event=update_salary module=service status=rolled_back employee_id={} outcome={}",
                employee_id,
                other.label()
            ),
        }
        outcome
    }

    /// Inserts one new employee row.
    ///
    /// # Contract
    /// - Invalid row: `Rejected`, no SQL.
    /// - Existing key: rollback, `DuplicateKey`; the existing row is untouched.
    /// - Success returns the row read back inside the committed transaction.
    pub fn insert_employee(&mut self, employee: &Employee) -> InsertOutcome {
        if let Err(err) = employee.validate() {
            warn!(
                "event=insert_employee module=service status=rejected employee_id={} error={}",
                employee.employee_id, err
            );
            return InsertOutcome::Rejected(err);
        }

        let tx = match self.conn.transaction() {
            Ok(tx) => tx,
            Err(err) => return InsertOutcome::StorageError(err.into()),
        };

        let outcome = match insert_in_tx(&tx, employee) {
            Ok(stored) => match tx.commit() {
                Ok(()) => InsertOutcome::Success(stored),
                Err(err) => InsertOutcome::StorageError(err.into()),
            },
            Err(RepoError::DuplicateKey(id)) => {
                rollback(tx, "insert_employee");
                InsertOutcome::DuplicateKey(id)
            }
            Err(RepoError::Validation(err)) => {
                rollback(tx, "insert_employee");
                InsertOutcome::Rejected(err)
            }
            Err(cause) => {
                rollback(tx, "insert_employee");
                InsertOutcome::StorageError(cause)
            }
        };

        info!(
            "event=insert_employee module=service status={} employee_id={}",
            outcome.label(),
            employee.employee_id
        );
        outcome
    }
}

fn write_salary_in_tx(
    tx: &Transaction<'_>,
    before: &Employee,
    new_salary: Salary,
) -> RepoResult<SalaryWrite> {
    let repo = SqliteEmployeeRepository::new(tx);
    let changed = repo.set_salary(before.employee_id, new_salary)?;
    if changed == 0 {
        return Ok(SalaryWrite::NoRowsAffected);
    }

    match repo.find_by_key(before.employee_id)? {
        Some(after) if changed == 1 && after.is_salary_change_of(before, new_salary) => {
            Ok(SalaryWrite::Verified(after))
        }
        observed => Ok(SalaryWrite::Diverged(observed)),
    }
}

fn insert_in_tx(tx: &Transaction<'_>, employee: &Employee) -> RepoResult<Employee> {
    let repo = SqliteEmployeeRepository::new(tx);
    repo.insert(employee)?;
    repo.find_by_key(employee.employee_id)?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "employee {} not found in read-back after insert",
            employee.employee_id
        ))
    })
}

fn rollback(tx: Transaction<'_>, event: &str) {
    if let Err(err) = tx.rollback() {
        warn!(
            "event={} module=service status=error error_code=rollback_failed error={}",
            event, err
        );
    }
}
