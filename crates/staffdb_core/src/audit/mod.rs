//! Audit trail sinks.
//!
//! # Responsibility
//! - Define the port through which a run records its audit entry.
//! - Provide the CSV file sink and the one-cell result marker.
//!
//! # Invariants
//! - A sink stamps the entry at write time and returns the exact record it
//!   wrote.
//! - Sink failures are returned, never panicked; callers decide whether to
//!   surface them.

use crate::model::audit::{AuditEntry, AuditRecord};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod csv_sink;

pub(crate) use csv_sink::ensure_parent_dir;
pub use csv_sink::{read_audit_records, write_result_marker, CsvAuditSink};

pub type SinkResult<T> = Result<T, SinkError>;

/// Failure while writing a durable CSV artifact.
#[derive(Debug)]
pub enum SinkError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot write `{}`: {source}", path.display()),
            Self::Csv { path, source } => {
                write!(f, "cannot encode csv for `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

/// How a sink treats an existing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditWriteMode {
    /// Keep earlier rows; write a header only into a new or empty file.
    #[default]
    Append,
    /// Replace the file with a header and this run's row.
    Overwrite,
}

/// Port for recording one audit entry per run.
pub trait AuditSink {
    fn record(&self, entry: &AuditEntry) -> SinkResult<AuditRecord>;
}

impl<S: AuditSink + ?Sized> AuditSink for &S {
    fn record(&self, entry: &AuditEntry) -> SinkResult<AuditRecord> {
        (**self).record(entry)
    }
}
