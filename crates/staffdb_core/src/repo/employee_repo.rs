//! Employee repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed lookup, ordered full scan, and single-row writes over
//!   the `employees` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every value reaches SQLite as a bound parameter.
//! - Write paths call `Employee::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Absence of a row is `Ok(None)`, never an error.

use crate::db::DbError;
use crate::model::employee::{Employee, EmployeeId, EmployeeValidationError, Salary};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    employee_id,
    first_name,
    last_name,
    department,
    salary
FROM employees";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for employee persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EmployeeValidationError),
    /// Insert hit the `employee_id` primary key.
    DuplicateKey(EmployeeId),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey(id) => write!(f, "employee already exists: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted employee data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<EmployeeValidationError> for RepoError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full-table read result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmployeeTable {
    /// Column names of the query projection, in projection order.
    pub columns: Vec<String>,
    /// Rows ordered by `employee_id ASC`.
    pub rows: Vec<Employee>,
}

impl EmployeeTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Repository interface for employee rows.
pub trait EmployeeRepository {
    fn find_by_key(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn find_all(&self) -> RepoResult<EmployeeTable>;
    fn count(&self) -> RepoResult<u64>;
    fn key_exists(&self, id: EmployeeId) -> RepoResult<bool>;
    fn insert(&self, employee: &Employee) -> RepoResult<()>;
    /// Sets the salary of one row and returns the affected-row count.
    fn set_salary(&self, id: EmployeeId, salary: Salary) -> RepoResult<usize>;
}

/// SQLite-backed employee repository.
///
/// Accepts any connection, including a `rusqlite::Transaction` through
/// deref, so callers decide the transaction boundary.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn find_by_key(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE employee_id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_employee_row(row)?));
        }

        Ok(None)
    }

    fn find_all(&self) -> RepoResult<EmployeeTable> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY employee_id ASC;"))?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row(row)?);
        }

        Ok(EmployeeTable {
            columns,
            rows: employees,
        })
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn key_exists(&self, id: EmployeeId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM employees WHERE employee_id = ?1;",
                [id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&self, employee: &Employee) -> RepoResult<()> {
        employee.validate()?;

        let result = self.conn.execute(
            "INSERT INTO employees (
                employee_id,
                first_name,
                last_name,
                department,
                salary
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                employee.employee_id,
                employee.first_name.as_str(),
                employee.last_name.as_str(),
                employee.department.as_deref(),
                employee.salary,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_violation(&err) => {
                Err(RepoError::DuplicateKey(employee.employee_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn set_salary(&self, id: EmployeeId, salary: Salary) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE employees
             SET salary = ?1
             WHERE employee_id = ?2;",
            params![salary, id],
        )?;
        Ok(changed)
    }
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let employee = Employee {
        employee_id: row.get("employee_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        department: row.get("department")?,
        salary: row.get("salary")?,
    };
    employee.validate().map_err(|err| {
        RepoError::InvalidData(format!("invalid row in employees: {err}"))
    })?;
    Ok(employee)
}
