//! Bulk-read export to CSV.
//!
//! # Invariants
//! - The header row is the projection's column list, in projection order.
//! - The file is replaced on every export.

use crate::audit::{SinkError, SinkResult};
use crate::repo::employee_repo::EmployeeTable;
use log::info;
use std::path::Path;

/// Writes `table` to `path` and returns the number of data rows written.
pub fn export_employees_csv(table: &EmployeeTable, path: &Path) -> SinkResult<usize> {
    crate::audit::ensure_parent_dir(path)?;
    let csv_err = |source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(&table.columns).map_err(csv_err)?;
    for employee in &table.rows {
        writer
            .write_record([
                employee.employee_id.to_string(),
                employee.first_name.clone(),
                employee.last_name.clone(),
                employee.department.clone().unwrap_or_default(),
                employee
                    .salary
                    .map(|salary| salary.to_string())
                    .unwrap_or_default(),
            ])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "event=export module=export status=ok rows={} lines={}",
        table.len(),
        table.len() + 1
    );
    Ok(table.len())
}
