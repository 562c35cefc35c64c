//! Seed guard for first-run data.
//!
//! # Responsibility
//! - Insert a fixed ordered set of rows exactly once, in one transaction.
//!
//! # Invariants
//! - Existence is decided by `COUNT(*) == 0` or an exact key match, checked
//!   inside the same transaction as the inserts.
//! - A non-empty table is never seeded under `SeedPolicy::IfEmpty`, even if
//!   a row the caller wants is missing.
//! - A failed seed leaves the table untouched.

use crate::model::employee::{Employee, EmployeeId};
use crate::repo::employee_repo::{EmployeeRepository, RepoResult, SqliteEmployeeRepository};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction};

/// Id of the single default row the salary-update flow seeds into an empty table.
pub const SEED_ANCHOR_ID: EmployeeId = 1;

/// Decides when seed rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Seed only when the table has no rows.
    IfEmpty,
    /// Seed only when no row has exactly this key.
    IfKeyAbsent(EmployeeId),
    /// Never seed.
    Never,
}

/// Result of one seed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { inserted: usize },
    NotSeeded,
}

impl SeedOutcome {
    pub fn inserted(self) -> usize {
        match self {
            Self::Seeded { inserted } => inserted,
            Self::NotSeeded => 0,
        }
    }
}

/// Rows written into an empty table by the bulk-read flow.
pub fn default_seed_rows() -> Vec<Employee> {
    vec![
        Employee::new(1, "John", "Doe")
            .with_department("Engineering")
            .with_salary(75000),
        Employee::new(2, "Jane", "Wilson")
            .with_department("Marketing")
            .with_salary(65000),
        Employee::new(3, "Alice", "Smith")
            .with_department("IT")
            .with_salary(55000),
        Employee::new(4, "Bob", "Johnson")
            .with_department("Sales")
            .with_salary(60000),
        Employee::new(5, "Carol", "Brown")
            .with_department("HR")
            .with_salary(50000),
    ]
}

/// Seed guard bound to one connection.
pub struct SeedGuard<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SeedGuard<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Inserts `rows` when `policy` says the table needs them.
    ///
    /// # Errors
    /// - Returns the repository error of the first failing statement; the
    ///   transaction is rolled back before returning.
    pub fn ensure_seed(&mut self, rows: &[Employee], policy: SeedPolicy) -> RepoResult<SeedOutcome> {
        if policy == SeedPolicy::Never || rows.is_empty() {
            return Ok(SeedOutcome::NotSeeded);
        }

        let tx = self.conn.transaction()?;
        match seed_in_tx(&tx, rows, policy) {
            Ok(SeedOutcome::Seeded { inserted }) => {
                tx.commit()?;
                info!(
                    "event=seed module=service status=ok seeded=true inserted={} policy={:?}",
                    inserted, policy
                );
                Ok(SeedOutcome::Seeded { inserted })
            }
            Ok(SeedOutcome::NotSeeded) => {
                tx.rollback()?;
                info!(
                    "event=seed module=service status=ok seeded=false policy={:?}",
                    policy
                );
                Ok(SeedOutcome::NotSeeded)
            }
            Err(err) => {
                error!(
                    "event=seed module=service status=error policy={:?} error={}",
                    policy, err
                );
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=seed module=service status=error error_code=rollback_failed error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

fn seed_in_tx(tx: &Transaction<'_>, rows: &[Employee], policy: SeedPolicy) -> RepoResult<SeedOutcome> {
    let repo = SqliteEmployeeRepository::new(tx);
    let needs_seed = match policy {
        SeedPolicy::IfEmpty => repo.count()? == 0,
        SeedPolicy::IfKeyAbsent(id) => !repo.key_exists(id)?,
        SeedPolicy::Never => false,
    };
    if !needs_seed {
        return Ok(SeedOutcome::NotSeeded);
    }

    for row in rows {
        repo.insert(row)?;
    }
    Ok(SeedOutcome::Seeded {
        inserted: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::{default_seed_rows, SEED_ANCHOR_ID};

    #[test]
    fn default_seed_rows_are_valid_and_ordered() {
        let rows = default_seed_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].employee_id, SEED_ANCHOR_ID);
        assert!(rows.windows(2).all(|w| w[0].employee_id < w[1].employee_id));
        assert!(rows.iter().all(|row| row.validate().is_ok()));
    }
}
