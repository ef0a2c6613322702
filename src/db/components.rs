use anyhow::{anyhow, Context, Result};
use log::info;
use rusqlite::{params, Connection, Row};

use crate::models::{Component, NewComponent};

/// Column list shared by every read so the row mapper can rely on positions.
const SELECT_COLUMNS: &str =
    "SELECT id, cus_id, type, part, description, footprint, stock, datasheetpath FROM components";

/// Retrieve every component in insertion order.
pub fn fetch_components(conn: &Connection) -> Result<Vec<Component>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))
        .context("failed to prepare component query")?;

    let components = stmt
        .query_map([], map_component)
        .context("failed to load components")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect components")?;

    Ok(components)
}

/// Substring search across custom ID, type, part and description. An empty
/// term returns everything, exactly like [`fetch_components`]. `%` and `_`
/// are escaped so the term only ever matches literally.
pub fn search_components(conn: &Connection, term: &str) -> Result<Vec<Component>> {
    let term = term.trim();
    if term.is_empty() {
        return fetch_components(conn);
    }

    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE cus_id LIKE ?1 ESCAPE '\\'
                OR type LIKE ?1 ESCAPE '\\'
                OR part LIKE ?1 ESCAPE '\\'
                OR description LIKE ?1 ESCAPE '\\'
             ORDER BY id"
        ))
        .context("failed to prepare component search")?;

    let pattern = like_pattern(term);
    let components = stmt
        .query_map([pattern], map_component)
        .context("failed to search components")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect search results")?;

    Ok(components)
}

/// Replace the whole table with `rows` in a single transaction. Ids are
/// reassigned by SQLite. If any statement fails the transaction is rolled back
/// on drop and the previous contents stay untouched.
pub fn replace_components(conn: &mut Connection, rows: &[NewComponent]) -> Result<usize> {
    let tx = conn
        .transaction()
        .context("failed to start save transaction")?;

    tx.execute("DELETE FROM components", [])
        .context("failed to clear components")?;

    {
        let mut insert = tx
            .prepare(
                "INSERT INTO components
                    (cus_id, type, part, description, footprint, stock, datasheetpath)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .context("failed to prepare component insert")?;

        for row in rows {
            insert
                .execute(params![
                    row.cus_id,
                    row.kind,
                    row.part,
                    row.description,
                    row.footprint,
                    row.stock,
                    row.datasheet_path,
                ])
                .with_context(|| format!("failed to insert component '{}'", row.part))?;
        }
    }

    tx.commit().context("failed to commit save")?;
    info!("replaced component table with {} rows", rows.len());
    Ok(rows.len())
}

/// Permanently delete one component.
pub fn delete_component(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM components WHERE id = ?1", params![id])
        .context("failed to delete component")?;

    if deleted == 0 {
        Err(anyhow!("Component not found"))
    } else {
        info!("deleted component {id}");
        Ok(())
    }
}

/// Store a datasheet link right away. This is the one field that does not wait
/// for a bulk save.
pub fn update_datasheet_path(conn: &Connection, id: i64, path: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE components SET datasheetpath = ?1 WHERE id = ?2",
            params![path, id],
        )
        .context("failed to update datasheet path")?;

    if updated == 0 {
        Err(anyhow!("Component not found"))
    } else {
        info!("linked datasheet {path} to component {id}");
        Ok(())
    }
}

/// Older databases may hold NULLs; read them as empty text and zero stock.
fn map_component(row: &Row<'_>) -> rusqlite::Result<Component> {
    Ok(Component {
        id: row.get(0)?,
        cus_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        kind: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        part: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        footprint: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        stock: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        datasheet_path: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
