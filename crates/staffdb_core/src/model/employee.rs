//! Employee domain model.
//!
//! # Responsibility
//! - Define the canonical `employees` row shape.
//! - Validate creation-time invariants before any SQL runs.
//!
//! # Invariants
//! - `employee_id` is stable and never reassigned to another person.
//! - `first_name` and `last_name` are non-blank.
//! - `salary` is the only field mutated after creation.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key of an employee row.
pub type EmployeeId = i64;

/// Salary amount in whole currency units.
pub type Salary = i64;

/// One row of the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    /// Nullable in storage; every write path in core sets it.
    pub salary: Option<Salary>,
}

/// Validation failures for employee rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    BlankFirstName(EmployeeId),
    BlankLastName(EmployeeId),
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstName(id) => write!(f, "employee {id}: first_name must not be blank"),
            Self::BlankLastName(id) => write!(f, "employee {id}: last_name must not be blank"),
        }
    }
}

impl Error for EmployeeValidationError {}

impl Employee {
    /// Creates an employee with no department and no salary.
    pub fn new(
        employee_id: EmployeeId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            employee_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            department: None,
            salary: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_salary(mut self, salary: Salary) -> Self {
        self.salary = Some(salary);
        self
    }

    /// Checks creation-time invariants.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(EmployeeValidationError::BlankFirstName(self.employee_id));
        }
        if self.last_name.trim().is_empty() {
            return Err(EmployeeValidationError::BlankLastName(self.employee_id));
        }
        Ok(())
    }

    /// Returns `true` when `other` is this row with only `salary` changed to
    /// `salary`.
    pub fn is_salary_change_of(&self, other: &Employee, salary: Salary) -> bool {
        self.salary == Some(salary)
            && self.employee_id == other.employee_id
            && self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.department == other.department
    }
}
