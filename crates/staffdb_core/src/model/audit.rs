//! Audit record model.
//!
//! # Invariants
//! - Serialized field order is fixed: `timestamp, operation, subject_key,
//!   before_value, after_value, record_count, result`.
//! - `timestamp` is taken when the record is written, not when the
//!   mutation happened.

use crate::model::employee::{EmployeeId, Salary};
use serde::{Deserialize, Serialize};

/// Timestamp format used in audit rows.
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Operation tag recorded for each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOperation {
    InsertEmployee,
    SelectAllEmployees,
    UpdateSalary,
}

/// Final result of a run as seen by the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
        }
    }
}

/// Audit content decided by a run, before it is stamped and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub operation: AuditOperation,
    pub subject_key: Option<EmployeeId>,
    pub before_value: Option<Salary>,
    pub after_value: Option<Salary>,
    pub record_count: Option<u64>,
    pub result: AuditStatus,
}

impl AuditEntry {
    /// Starts a `Failure` entry; callers flip `result` once the run succeeds.
    pub fn failure(operation: AuditOperation) -> Self {
        Self {
            operation,
            subject_key: None,
            before_value: None,
            after_value: None,
            record_count: None,
            result: AuditStatus::Failure,
        }
    }

    /// Stamps the entry with `timestamp`.
    pub fn stamp(&self, timestamp: String) -> AuditRecord {
        AuditRecord {
            timestamp,
            operation: self.operation,
            subject_key: self.subject_key,
            before_value: self.before_value,
            after_value: self.after_value,
            record_count: self.record_count,
            result: self.result,
        }
    }
}

/// One written row of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub operation: AuditOperation,
    pub subject_key: Option<EmployeeId>,
    pub before_value: Option<Salary>,
    pub after_value: Option<Salary>,
    pub record_count: Option<u64>,
    pub result: AuditStatus,
}
