//! Connection lifecycle utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Release connections with observable close errors.
//!
//! # Invariants
//! - Opening never creates the `employees` table; that is the schema step.
//! - A file database is only created when `create_if_missing` is set.

use super::{DbError, DbResult};
use crate::config::StorageConfig;
use log::{error, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the SQLite database described by `config`.
///
/// # Errors
/// - Returns `DbError::Open` when the file (or its parent directory) is
///   missing, unreadable, or not a database.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(config: &StorageConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file create_if_missing={}",
        config.create_if_missing
    );

    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if config.create_if_missing {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let conn = Connection::open_with_flags(&config.database, flags)
        .and_then(|conn| configure_connection(&conn).map(|()| conn));

    match conn {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(DbError::Open {
                target: config.database.clone(),
                source: err,
            })
        }
    }
}

/// Opens an in-memory SQLite database.
///
/// Used by tests and throwaway runs; the data disappears with the connection.
pub fn open_db_in_memory() -> DbResult<Connection> {
    info!("event=db_open module=db status=start mode=memory");
    let conn = Connection::open_in_memory()
        .and_then(|conn| configure_connection(&conn).map(|()| conn))
        .map_err(|err| {
            error!(
                "event=db_open module=db status=error mode=memory error_code=db_open_failed error={}",
                err
            );
            DbError::Open {
                target: PathBuf::from(":memory:"),
                source: err,
            }
        })?;
    info!("event=db_open module=db status=ok mode=memory");
    Ok(conn)
}

/// Closes a connection, consuming it.
///
/// A failed close still releases the handle: the connection returned by
/// rusqlite is dropped here, which finalizes it.
pub fn close_db(conn: Connection) -> DbResult<()> {
    match conn.close() {
        Ok(()) => {
            info!("event=db_close module=db status=ok");
            Ok(())
        }
        Err((conn, err)) => {
            warn!(
                "event=db_close module=db status=error error_code=db_close_failed error={}",
                err
            );
            drop(conn);
            Err(err.into())
        }
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // Forces SQLite to actually touch the file so that a non-database file
    // fails at open time rather than on the first statement.
    conn.query_row("PRAGMA schema_version;", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}
