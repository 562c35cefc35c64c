//! Idempotent schema bootstrap for the `employees` table.
//!
//! # Responsibility
//! - Create the `employees` table with its fixed column set.
//! - Report whether the table is already present.
//!
//! # Invariants
//! - `ensure_schema` is safe to call on every run; repeated calls leave the
//!   table shape unchanged and never fail because the table exists.
//! - `employee_id` is the primary key and the only consistency constraint.

use crate::db::DbResult;
use log::{error, info};
use rusqlite::Connection;

/// Fixed name of the managed table.
pub const EMPLOYEES_TABLE: &str = "employees";

const EMPLOYEES_DDL: &str = include_str!("employees.sql");

/// Creates the `employees` table when absent.
///
/// # Errors
/// - Returns the underlying SQLite error when the DDL fails for any reason
///   other than the table already existing.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    let existed = table_exists(conn)?;
    if let Err(err) = conn.execute_batch(EMPLOYEES_DDL) {
        error!(
            "event=schema_ensure module=db status=error table={} error={}",
            EMPLOYEES_TABLE, err
        );
        return Err(err.into());
    }
    info!(
        "event=schema_ensure module=db status=ok table={} created={}",
        EMPLOYEES_TABLE, !existed
    );
    Ok(())
}

/// Returns whether the `employees` table exists.
pub fn table_exists(conn: &Connection) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [EMPLOYEES_TABLE],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
