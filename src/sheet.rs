//! In-memory view of the components table. The TUI edits rows here and only
//! the explicit operations (`commit`, datasheet links, deletes) reach the
//! store. Rows are addressed by [`RowKey`], never by their position, so a
//! deletion cannot make a later action hit the wrong row.

use crate::models::{parse_stock, Component, NewComponent};

/// Stable identity of a row while it is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    /// Row loaded from the store; carries its database id.
    Stored(i64),
    /// Row added in this session and not saved yet.
    Draft(u64),
}

impl RowKey {
    pub fn stored_id(self) -> Option<i64> {
        match self {
            RowKey::Stored(id) => Some(id),
            RowKey::Draft(_) => None,
        }
    }
}

/// The editable text of a row. Stock is kept as typed and only coerced when
/// the sheet is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowEdit {
    pub cus_id: String,
    pub kind: String,
    pub part: String,
    pub description: String,
    pub footprint: String,
    pub stock: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub key: RowKey,
    pub fields: RowEdit,
    pub datasheet_path: String,
}

impl SheetRow {
    fn from_component(component: Component) -> Self {
        Self {
            key: RowKey::Stored(component.id),
            fields: RowEdit {
                cus_id: component.cus_id,
                kind: component.kind,
                part: component.part,
                description: component.description,
                footprint: component.footprint,
                stock: component.stock.to_string(),
            },
            datasheet_path: component.datasheet_path,
        }
    }

    fn to_new(&self) -> NewComponent {
        NewComponent {
            cus_id: self.fields.cus_id.clone(),
            kind: self.fields.kind.clone(),
            part: self.fields.part.clone(),
            description: self.fields.description.clone(),
            footprint: self.fields.footprint.clone(),
            stock: parse_stock(&self.fields.stock),
            datasheet_path: self.datasheet_path.clone(),
        }
    }

    /// Label used in prompts: the store id, or "new" for drafts.
    pub fn id_label(&self) -> String {
        match self.key {
            RowKey::Stored(id) => id.to_string(),
            RowKey::Draft(_) => "new".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Sheet {
    rows: Vec<SheetRow>,
    next_draft: u64,
    dirty: bool,
    filter: Option<String>,
}

impl Sheet {
    pub fn new(components: Vec<Component>) -> Self {
        let mut sheet = Self::default();
        sheet.load(components, None);
        sheet
    }

    /// Replace every row with `components`. Unsaved edits are dropped.
    pub fn load(&mut self, components: Vec<Component>, filter: Option<String>) {
        self.rows = components
            .into_iter()
            .map(SheetRow::from_component)
            .collect();
        self.filter = filter.filter(|term| !term.trim().is_empty());
        self.dirty = false;
    }

    /// Throw away unsaved edits by reloading what the store returned for the
    /// current filter.
    pub fn discard(&mut self, components: Vec<Component>) {
        let filter = self.filter.take();
        self.load(components, filter);
    }

    /// Append an empty draft row and return its key.
    pub fn add_blank(&mut self) -> RowKey {
        let key = RowKey::Draft(self.next_draft);
        self.next_draft += 1;
        self.rows.push(SheetRow {
            key,
            fields: RowEdit::default(),
            datasheet_path: String::new(),
        });
        self.dirty = true;
        key
    }

    /// Overwrite the editable fields of a row. Returns `false` when the key is
    /// no longer on the sheet.
    pub fn update(&mut self, key: RowKey, edit: RowEdit) -> bool {
        match self.row_mut(key) {
            Some(row) => {
                if row.fields != edit {
                    row.fields = edit;
                    self.dirty = true;
                }
                true
            }
            None => false,
        }
    }

    /// Record a datasheet link on a row. Stored rows persist the link
    /// separately, so only drafts become dirty.
    pub fn set_datasheet(&mut self, key: RowKey, path: String) -> bool {
        match self.row_mut(key) {
            Some(row) => {
                row.datasheet_path = path;
                if matches!(key, RowKey::Draft(_)) {
                    self.dirty = true;
                }
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: RowKey) -> Option<SheetRow> {
        let index = self.position(key)?;
        Some(self.rows.remove(index))
    }

    /// Snapshot every row, in order, ready for a full replace of the store.
    pub fn commit(&self) -> Vec<NewComponent> {
        self.rows.iter().map(SheetRow::to_new).collect()
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn row(&self, key: RowKey) -> Option<&SheetRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    fn row_mut(&mut self, key: RowKey) -> Option<&mut SheetRow> {
        self.rows.iter_mut().find(|row| row.key == key)
    }

    pub fn position(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|row| row.key == key)
    }

    pub fn key_at(&self, index: usize) -> Option<RowKey> {
        self.rows.get(index).map(|row| row.key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Search term the rows were loaded with, if any.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: i64, part: &str) -> Component {
        Component {
            id,
            cus_id: format!("C{id}"),
            kind: "Resistor".into(),
            part: part.into(),
            description: String::new(),
            footprint: "0805".into(),
            stock: 5,
            datasheet_path: String::new(),
        }
    }

    #[test]
    fn load_replaces_rows_and_clears_dirty() {
        let mut sheet = Sheet::new(vec![component(1, "a")]);
        sheet.add_blank();
        assert!(sheet.is_dirty());

        sheet.load(vec![component(4, "b"), component(9, "c")], Some("x".into()));

        assert_eq!(sheet.len(), 2);
        assert!(!sheet.is_dirty());
        assert_eq!(sheet.filter(), Some("x"));
        assert_eq!(sheet.key_at(1), Some(RowKey::Stored(9)));
    }

    #[test]
    fn blank_filter_is_not_a_filter() {
        let mut sheet = Sheet::default();
        sheet.load(Vec::new(), Some("  ".into()));
        assert_eq!(sheet.filter(), None);
    }

    #[test]
    fn keys_survive_removal_of_earlier_rows() {
        let mut sheet = Sheet::new(vec![component(1, "a"), component(2, "b"), component(3, "c")]);
        let target = sheet.key_at(2).unwrap();

        sheet.remove(RowKey::Stored(1)).unwrap();

        assert_eq!(sheet.position(target), Some(1));
        assert_eq!(sheet.row(target).unwrap().fields.part, "c");
        assert!(sheet.remove(RowKey::Stored(1)).is_none());
    }

    #[test]
    fn drafts_get_distinct_keys() {
        let mut sheet = Sheet::default();
        let first = sheet.add_blank();
        let second = sheet.add_blank();
        assert_ne!(first, second);
        assert_eq!(first.stored_id(), None);
        assert_eq!(sheet.row(second).unwrap().id_label(), "new");
    }

    #[test]
    fn commit_coerces_bad_stock_to_zero() {
        let mut sheet = Sheet::new(vec![component(1, "a")]);
        let key = sheet.add_blank();
        sheet.update(
            key,
            RowEdit {
                part: "NE555".into(),
                stock: "abc".into(),
                ..RowEdit::default()
            },
        );

        let snapshot = sheet.commit();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].stock, 5);
        assert_eq!(snapshot[1].part, "NE555");
        assert_eq!(snapshot[1].stock, 0);
    }

    #[test]
    fn identical_update_does_not_dirty() {
        let mut sheet = Sheet::new(vec![component(1, "a")]);
        let key = RowKey::Stored(1);
        let same = sheet.row(key).unwrap().fields.clone();

        assert!(sheet.update(key, same));
        assert!(!sheet.is_dirty());
        assert!(!sheet.update(RowKey::Draft(42), RowEdit::default()));
    }

    #[test]
    fn datasheet_on_stored_row_is_not_an_unsaved_edit() {
        let mut sheet = Sheet::new(vec![component(1, "a")]);
        sheet.set_datasheet(RowKey::Stored(1), "ds/a.pdf".into());
        assert!(!sheet.is_dirty());
        assert_eq!(sheet.commit()[0].datasheet_path, "ds/a.pdf");

        let draft = sheet.add_blank();
        sheet.load(vec![component(1, "a")], None);
        assert!(!sheet.set_datasheet(draft, "ds/b.pdf".into()));
    }

    #[test]
    fn discard_keeps_the_filter() {
        let mut sheet = Sheet::default();
        sheet.load(vec![component(1, "a")], Some("a".into()));
        sheet.update(
            RowKey::Stored(1),
            RowEdit {
                part: "changed".into(),
                ..RowEdit::default()
            },
        );
        assert!(sheet.is_dirty());

        sheet.discard(vec![component(1, "a")]);

        assert!(!sheet.is_dirty());
        assert_eq!(sheet.filter(), Some("a"));
        assert_eq!(sheet.rows()[0].fields.part, "a");
    }
}
