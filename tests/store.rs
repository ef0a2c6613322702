use std::fs;

use labparts::backup::{backup_store, restore_store};
use labparts::datasheet::{self, DatasheetError, DocumentViewer};
use labparts::db::{
    delete_component, fetch_components, replace_components, search_components,
    update_datasheet_path,
};
use labparts::sheet::{RowEdit, Sheet};
use labparts::{open_store, AppPaths, NewComponent};

struct NoopViewer;

impl DocumentViewer for NoopViewer {
    fn open(&self, _path: &std::path::Path) -> std::io::Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "noop".into()
    }
}

fn resistor(part: &str, stock: i64) -> NewComponent {
    NewComponent {
        kind: "Resistor".into(),
        part: part.into(),
        footprint: "0805".into(),
        stock,
        ..NewComponent::default()
    }
}

#[test]
fn datasheet_link_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::from_base(dir.path());
    let sheet_dir = dir.path().join("datasheets");
    fs::create_dir_all(&sheet_dir).unwrap();
    fs::write(sheet_dir.join("ne555.pdf"), b"%PDF").unwrap();

    let mut conn = open_store(&paths.database).unwrap();
    replace_components(&mut conn, &[resistor("NE555", 4)]).unwrap();
    let id = fetch_components(&conn).unwrap()[0].id;

    let relative = datasheet::link_path(&paths.base_dir, &sheet_dir.join("ne555.pdf")).unwrap();
    update_datasheet_path(&conn, id, &relative).unwrap();
    drop(conn);

    let conn = open_store(&paths.database).unwrap();
    let stored = fetch_components(&conn).unwrap();
    assert_eq!(stored[0].datasheet_path, relative);
    let opened = datasheet::view(&paths.base_dir, &stored[0].datasheet_path, &NoopViewer).unwrap();
    assert!(opened.ends_with("datasheets/ne555.pdf"));
}

#[test]
fn sheet_edits_only_land_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_store(&dir.path().join("components.db")).unwrap();
    replace_components(&mut conn, &[resistor("1k", 10), resistor("10k", 5)]).unwrap();

    let mut sheet = Sheet::new(fetch_components(&conn).unwrap());
    let first = sheet.key_at(0).unwrap();
    sheet.update(
        first,
        RowEdit {
            part: "2k2".into(),
            stock: "12".into(),
            ..RowEdit::default()
        },
    );
    assert_eq!(fetch_components(&conn).unwrap()[0].part, "1k");

    replace_components(&mut conn, &sheet.commit()).unwrap();

    let stored = fetch_components(&conn).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].part, "2k2");
    assert_eq!(stored[0].stock, 12);
    assert_eq!(stored[1].part, "10k");
}

#[test]
fn delete_then_search_never_returns_the_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_store(&dir.path().join("components.db")).unwrap();
    replace_components(&mut conn, &[resistor("1k", 1), resistor("1k5", 1)]).unwrap();
    let victim = fetch_components(&conn).unwrap()[0].id;

    delete_component(&conn, victim).unwrap();

    let hits = search_components(&conn, "1k").unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits.iter().all(|c| c.id != victim));
}

#[test]
fn restore_brings_back_the_backed_up_rows() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::from_base(dir.path());
    let mut conn = open_store(&paths.database).unwrap();
    replace_components(&mut conn, &[resistor("47k", 3)]).unwrap();

    backup_store(&paths.database, &paths.backup).unwrap();
    replace_components(&mut conn, &[resistor("scratch", 0), resistor("junk", 0)]).unwrap();

    restore_store(&mut conn, &paths.database, &paths.backup).unwrap();

    let parts: Vec<String> = fetch_components(&conn)
        .unwrap()
        .into_iter()
        .map(|c| c.part)
        .collect();
    assert_eq!(parts, vec!["47k"]);
}

#[test]
fn unlinked_row_reports_no_datasheet() {
    let dir = tempfile::tempdir().unwrap();
    let err = datasheet::view(dir.path(), "   ", &NoopViewer).unwrap_err();
    assert!(matches!(err, DatasheetError::NotLinked));
}
