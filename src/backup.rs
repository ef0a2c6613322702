//! Byte-for-byte backup and restore of the SQLite file.

use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

use crate::db::open_store;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("No database file found to backup.")]
    MissingStore(PathBuf),
    #[error("No backup file found to restore from.")]
    MissingBackup(PathBuf),
    #[error("An error occurred while copying {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Backup file is not a usable database: {source}")]
    InvalidBackup {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Could not release the database before restoring: {0}")]
    Close(#[source] rusqlite::Error),
    #[error("Could not reopen the database: {0:#}")]
    Reopen(anyhow::Error),
}

/// Copy the live database file over the backup file. Returns the number of
/// bytes written.
pub fn backup_store(database: &Path, backup: &Path) -> Result<u64, BackupError> {
    if !database.exists() {
        return Err(BackupError::MissingStore(database.to_path_buf()));
    }

    if let Some(parent) = backup.parent() {
        fs::create_dir_all(parent).map_err(|source| BackupError::Copy {
            from: database.to_path_buf(),
            to: backup.to_path_buf(),
            source,
        })?;
    }

    let bytes = copy(database, backup)?;
    info!("backed up {} to {} ({bytes} bytes)", database.display(), backup.display());
    Ok(bytes)
}

/// Copy the backup file over the live database. The backup is checked first;
/// an unreadable backup leaves the live file and connection untouched. The
/// connection is closed before the copy and reopened afterwards so no stale
/// pages survive, even when the copy fails.
pub fn restore_store(
    conn: &mut Connection,
    database: &Path,
    backup: &Path,
) -> Result<u64, BackupError> {
    if !backup.exists() {
        return Err(BackupError::MissingBackup(backup.to_path_buf()));
    }
    let rows = check_backup(backup)?;

    let placeholder = Connection::open_in_memory().map_err(BackupError::Close)?;
    let live = mem::replace(conn, placeholder);
    if let Err((live, err)) = live.close() {
        *conn = live;
        return Err(BackupError::Close(err));
    }

    let copied = copy(backup, database);
    *conn = open_store(database).map_err(BackupError::Reopen)?;

    let bytes = copied?;
    info!(
        "restored {} from {} ({bytes} bytes, {rows} components)",
        database.display(),
        backup.display()
    );
    Ok(bytes)
}

/// Open the backup read-only and count its components. A file that is not a
/// SQLite database, or lacks the components table, is rejected before the
/// live file is touched.
fn check_backup(backup: &Path) -> Result<i64, BackupError> {
    let invalid = |source: rusqlite::Error| BackupError::InvalidBackup {
        path: backup.to_path_buf(),
        source,
    };
    let conn = Connection::open_with_flags(backup, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(invalid)?;
    conn.query_row("SELECT COUNT(*) FROM components", [], |row| row.get(0))
        .map_err(invalid)
}

fn copy(from: &Path, to: &Path) -> Result<u64, BackupError> {
    fs::copy(from, to).map_err(|source| {
        warn!("copy {} -> {} failed: {source}", from.display(), to.display());
        BackupError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    })
}
