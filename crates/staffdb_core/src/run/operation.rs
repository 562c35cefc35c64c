//! Operations a run can perform and their decided outcomes.

use crate::audit::SinkError;
use crate::model::audit::{AuditEntry, AuditOperation, AuditStatus};
use crate::model::employee::{Employee, EmployeeId, Salary};
use crate::repo::employee_repo::{EmployeeTable, RepoError};
use crate::service::mutator::{InsertOutcome, UpdateOutcome};
use crate::service::seed::{default_seed_rows, SeedPolicy, SEED_ANCHOR_ID};
use std::path::PathBuf;

/// The single operation of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    InsertEmployee(Employee),
    SelectAllEmployees,
    UpdateSalary {
        employee_id: EmployeeId,
        new_salary: Salary,
    },
}

impl Operation {
    pub fn audit_operation(&self) -> AuditOperation {
        match self {
            Self::InsertEmployee(_) => AuditOperation::InsertEmployee,
            Self::SelectAllEmployees => AuditOperation::SelectAllEmployees,
            Self::UpdateSalary { .. } => AuditOperation::UpdateSalary,
        }
    }

    pub fn subject_key(&self) -> Option<EmployeeId> {
        match self {
            Self::InsertEmployee(employee) => Some(employee.employee_id),
            Self::SelectAllEmployees => None,
            Self::UpdateSalary { employee_id, .. } => Some(*employee_id),
        }
    }

    /// Which rows the seed guard may write before this operation, and when.
    ///
    /// - Bulk read: all default rows into an empty table.
    /// - Salary update: the anchor row into an empty table. A populated
    ///   table is left alone even when the updated key is missing.
    /// - Insert: nothing.
    pub fn seed_plan(&self) -> (SeedPolicy, Vec<Employee>) {
        match self {
            Self::InsertEmployee(_) => (SeedPolicy::Never, Vec::new()),
            Self::SelectAllEmployees => (SeedPolicy::IfEmpty, default_seed_rows()),
            Self::UpdateSalary { .. } => (
                SeedPolicy::IfEmpty,
                default_seed_rows()
                    .into_iter()
                    .filter(|row| row.employee_id == SEED_ANCHOR_ID)
                    .collect(),
            ),
        }
    }

    /// Audit entry written when the run cannot complete the operation.
    pub fn failure_entry(&self) -> AuditEntry {
        let mut entry = AuditEntry::failure(self.audit_operation());
        entry.subject_key = self.subject_key();
        if matches!(self, Self::SelectAllEmployees) {
            entry.record_count = Some(0);
        }
        entry
    }
}

/// Result of the bulk-read path.
#[derive(Debug)]
pub enum SelectOutcome {
    Success {
        table: EmployeeTable,
        exported_to: Option<PathBuf>,
    },
    /// Rows were read but the configured export could not be written.
    ExportFailed {
        table: EmployeeTable,
        cause: SinkError,
    },
    StorageError(RepoError),
}

/// Outcome of whichever operation the run performed.
#[derive(Debug)]
pub enum OperationOutcome {
    Insert(InsertOutcome),
    SelectAll(SelectOutcome),
    UpdateSalary(UpdateOutcome),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Insert(outcome) => outcome.is_success(),
            Self::SelectAll(outcome) => matches!(outcome, SelectOutcome::Success { .. }),
            Self::UpdateSalary(outcome) => outcome.is_success(),
        }
    }

    /// Rows returned by a bulk read, when it got that far.
    pub fn table(&self) -> Option<&EmployeeTable> {
        match self {
            Self::SelectAll(
                SelectOutcome::Success { table, .. } | SelectOutcome::ExportFailed { table, .. },
            ) => Some(table),
            _ => None,
        }
    }

    /// Copies outcome data into `entry` and settles its result.
    pub fn fill_audit(&self, entry: &mut AuditEntry) {
        match self {
            Self::Insert(_) => {}
            Self::SelectAll(_) => {
                entry.record_count = Some(self.table().map_or(0, |table| table.len() as u64));
            }
            Self::UpdateSalary(outcome) => {
                entry.before_value = outcome.before().and_then(|before| before.salary);
                entry.after_value = outcome.after().and_then(|after| after.salary);
            }
        }
        entry.result = AuditStatus::from_success(self.is_success());
    }

    /// One status line for the operation step.
    pub fn describe(&self) -> String {
        match self {
            Self::Insert(InsertOutcome::Success(employee)) => format!(
                "inserted employee {} ({} {})",
                employee.employee_id, employee.first_name, employee.last_name
            ),
            Self::Insert(InsertOutcome::DuplicateKey(id)) => {
                format!("insert rolled back: employee {id} already exists")
            }
            Self::Insert(InsertOutcome::Rejected(err)) => format!("insert rejected: {err}"),
            Self::Insert(InsertOutcome::StorageError(err)) => {
                format!("insert rolled back: {err}")
            }
            Self::SelectAll(SelectOutcome::Success { table, exported_to }) => match exported_to {
                Some(path) => format!(
                    "read {} employees; exported to {}",
                    table.len(),
                    path.display()
                ),
                None => format!("read {} employees", table.len()),
            },
            Self::SelectAll(SelectOutcome::ExportFailed { table, cause }) => {
                format!("read {} employees; export failed: {cause}", table.len())
            }
            Self::SelectAll(SelectOutcome::StorageError(err)) => format!("read failed: {err}"),
            Self::UpdateSalary(UpdateOutcome::Success { before, after }) => format!(
                "salary of employee {} updated from {} to {}",
                after.employee_id,
                display_salary(before.salary),
                display_salary(after.salary)
            ),
            Self::UpdateSalary(UpdateOutcome::NotFound { employee_id }) => {
                format!("employee {employee_id} not found; nothing updated")
            }
            Self::UpdateSalary(UpdateOutcome::ConcurrentModification { before, .. }) => format!(
                "update of employee {} rolled back: row changed or vanished during the write",
                before.employee_id
            ),
            Self::UpdateSalary(UpdateOutcome::StorageError { cause, .. }) => {
                format!("update rolled back: {cause}")
            }
        }
    }
}

fn display_salary(salary: Option<Salary>) -> String {
    salary.map_or_else(|| "NULL".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::Operation;
    use crate::model::audit::{AuditOperation, AuditStatus};
    use crate::model::employee::Employee;
    use crate::service::seed::{SeedPolicy, SEED_ANCHOR_ID};

    #[test]
    fn seed_plan_matches_operation() {
        let insert = Operation::InsertEmployee(Employee::new(3, "Alice", "Smith"));
        assert_eq!(insert.seed_plan(), (SeedPolicy::Never, Vec::new()));

        let (policy, rows) = Operation::SelectAllEmployees.seed_plan();
        assert_eq!(policy, SeedPolicy::IfEmpty);
        assert_eq!(rows.len(), 5);

        let (policy, rows) = Operation::UpdateSalary {
            employee_id: 4,
            new_salary: 1,
        }
        .seed_plan();
        assert_eq!(policy, SeedPolicy::IfEmpty);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, SEED_ANCHOR_ID);
        assert_eq!(rows[0].first_name, "John");
    }

    #[test]
    fn failure_entry_is_best_effort() {
        let entry = Operation::UpdateSalary {
            employee_id: 9,
            new_salary: 10,
        }
        .failure_entry();
        assert_eq!(entry.operation, AuditOperation::UpdateSalary);
        assert_eq!(entry.subject_key, Some(9));
        assert_eq!(entry.before_value, None);
        assert_eq!(entry.result, AuditStatus::Failure);

        let entry = Operation::SelectAllEmployees.failure_entry();
        assert_eq!(entry.record_count, Some(0));
        assert_eq!(entry.subject_key, None);
    }
}
