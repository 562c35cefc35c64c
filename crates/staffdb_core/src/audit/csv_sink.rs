//! CSV file audit sink.
//!
//! # Invariants
//! - The header row is written when the file is new, empty, or overwritten,
//!   and never in the middle of an appended file.
//! - Parent directories are created on demand.

use super::{AuditSink, AuditWriteMode, SinkError, SinkResult};
use crate::model::audit::{AuditEntry, AuditRecord, AuditStatus, AUDIT_TIMESTAMP_FORMAT};
use log::info;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Audit sink writing one CSV row per record.
#[derive(Debug, Clone)]
pub struct CsvAuditSink {
    path: PathBuf,
    mode: AuditWriteMode,
}

impl CsvAuditSink {
    pub fn new(path: impl Into<PathBuf>, mode: AuditWriteMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> SinkResult<(File, bool)> {
        ensure_parent_dir(&self.path)?;
        let io_err = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };

        match self.mode {
            AuditWriteMode::Overwrite => {
                let file = File::create(&self.path).map_err(io_err)?;
                Ok((file, true))
            }
            AuditWriteMode::Append => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .read(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(io_err)?;
                let is_empty = file.metadata().map_err(io_err)?.len() == 0;
                if !is_empty {
                    terminate_last_line(&mut file).map_err(io_err)?;
                }
                Ok((file, is_empty))
            }
        }
    }
}

impl AuditSink for CsvAuditSink {
    fn record(&self, entry: &AuditEntry) -> SinkResult<AuditRecord> {
        let (file, write_header) = self.open()?;
        let record = entry.stamp(
            chrono::Local::now()
                .format(AUDIT_TIMESTAMP_FORMAT)
                .to_string(),
        );

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(&record).map_err(|source| SinkError::Csv {
            path: self.path.clone(),
            source,
        })?;
        writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            "event=audit_write module=audit status=ok operation={:?} result={} header={}",
            record.operation,
            record.result.as_str(),
            write_header
        );
        Ok(record)
    }
}

/// Overwrites `path` with a single `Success`/`Failure` cell.
pub fn write_result_marker(path: &Path, status: AuditStatus) -> SinkResult<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    writer
        .write_record([status.as_str()])
        .map_err(|source| SinkError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every record of an audit CSV file.
pub fn read_audit_records(path: &Path) -> SinkResult<Vec<AuditRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| SinkError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<AuditRecord>, _>>()
        .map_err(|source| SinkError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Appends a newline when a non-empty file does not end with one, so the
/// next record starts on its own line.
fn terminate_last_line(file: &mut File) -> std::io::Result<()> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> SinkResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
