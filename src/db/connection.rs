use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::Connection;

/// Open (or create) the SQLite file at `path` and make sure the schema exists.
/// The parent directory is created on demand so a fresh base directory only
/// needs the configuration file.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
    init_schema(&conn)?;
    debug!("opened component store at {}", path.display());
    Ok(conn)
}

/// Create the `components` table when it is missing. Safe to run on every
/// startup; there are no migrations.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cus_id TEXT,
            type TEXT,
            part TEXT,
            description TEXT,
            footprint TEXT,
            stock INTEGER,
            datasheetpath TEXT
        )",
        [],
    )
    .context("failed to create components table")?;

    Ok(())
}
