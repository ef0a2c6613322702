use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::config::Settings;

use super::helpers::text_width;
use crate::sheet::{RowEdit, RowKey, SheetRow};

/// Fields of the row editor in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RowField {
    CusId,
    Kind,
    Part,
    Description,
    Footprint,
    Stock,
}

impl RowField {
    pub(crate) const ALL: [RowField; 6] = [
        RowField::CusId,
        RowField::Kind,
        RowField::Part,
        RowField::Description,
        RowField::Footprint,
        RowField::Stock,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            RowField::CusId => "Custom ID",
            RowField::Kind => "Type",
            RowField::Part => "Part",
            RowField::Description => "Description",
            RowField::Footprint => "Footprint",
            RowField::Stock => "Stock",
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    /// Whether the field offers quick-pick values from the settings.
    fn has_suggestions(self) -> bool {
        matches!(self, RowField::Kind | RowField::Footprint)
    }
}

/// Editor state for one sheet row, including the type/footprint
/// autocomplete.
#[derive(Clone)]
pub(crate) struct RowForm {
    pub(crate) key: RowKey,
    pub(crate) id_label: String,
    pub(crate) values: RowEdit,
    pub(crate) active: RowField,
    pub(crate) error: Option<String>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl RowForm {
    pub(crate) fn from_row(row: &SheetRow) -> Self {
        Self {
            key: row.key,
            id_label: row.id_label(),
            values: row.fields.clone(),
            active: RowField::CusId,
            error: None,
            suggestion: None,
            autocomplete_disabled: false,
        }
    }

    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % RowField::ALL.len();
        self.focus(RowField::ALL[next]);
    }

    pub(crate) fn previous_field(&mut self) {
        let len = RowField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.focus(RowField::ALL[previous]);
    }

    fn focus(&mut self, field: RowField) {
        self.active = field;
        self.suggestion = None;
        self.autocomplete_disabled = false;
    }

    fn value(&self, field: RowField) -> &String {
        match field {
            RowField::CusId => &self.values.cus_id,
            RowField::Kind => &self.values.kind,
            RowField::Part => &self.values.part,
            RowField::Description => &self.values.description,
            RowField::Footprint => &self.values.footprint,
            RowField::Stock => &self.values.stock,
        }
    }

    fn value_mut(&mut self, field: RowField) -> &mut String {
        match field {
            RowField::CusId => &mut self.values.cus_id,
            RowField::Kind => &mut self.values.kind,
            RowField::Part => &mut self.values.part,
            RowField::Description => &mut self.values.description,
            RowField::Footprint => &mut self.values.footprint,
            RowField::Stock => &mut self.values.stock,
        }
    }

    /// Insert a character into the active field. Stock only takes digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active == RowField::Stock && !ch.is_ascii_digit() {
            return false;
        }
        self.autocomplete_disabled = false;
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
        self.autocomplete_disabled = false;
    }

    fn options<'a>(&self, settings: &'a Settings) -> &'a [String] {
        match self.active {
            RowField::Kind => &settings.types,
            RowField::Footprint => &settings.footprints,
            _ => &[],
        }
    }

    /// Recompute the ghosted prefix suggestion for the type or footprint
    /// field.
    pub(crate) fn update_suggestion(&mut self, settings: &Settings) {
        if !self.active.has_suggestions() || self.autocomplete_disabled {
            self.suggestion = None;
            return;
        }

        let current = self.value(self.active);
        if current.is_empty() {
            self.suggestion = None;
            return;
        }

        let current_lower = current.to_lowercase();
        self.suggestion = self
            .options(settings)
            .iter()
            .find(|candidate| {
                let lower = candidate.to_lowercase();
                lower.starts_with(&current_lower) && lower != current_lower
            })
            .cloned();
    }

    /// Replace the active value with the suggestion.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        match self.suggestion.take() {
            Some(candidate) => {
                let field = self.active;
                *self.value_mut(field) = candidate;
                self.autocomplete_disabled = true;
                true
            }
            None => false,
        }
    }

    /// Dismiss the suggestion until the user types again.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.suggestion.is_some() {
            self.suggestion = None;
            self.autocomplete_disabled = true;
            return true;
        }
        false
    }

    /// Step through the configured values like a drop-down list. Values not
    /// in the list start from the first (or last) entry.
    pub(crate) fn cycle_option(&mut self, settings: &Settings, offset: isize) -> bool {
        let options = self.options(settings);
        if options.is_empty() {
            return false;
        }

        let len = options.len() as isize;
        let current = self.value(self.active);
        let next = match options.iter().position(|option| option == current) {
            Some(index) => (index as isize + offset).rem_euclid(len),
            None if offset >= 0 => 0,
            None => len - 1,
        };

        let choice = options[next as usize].clone();
        let field = self.active;
        *self.value_mut(field) = choice;
        self.suggestion = None;
        self.autocomplete_disabled = true;
        true
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.suggestion.is_some()
    }

    /// Remaining characters of the suggestion, shown greyed after the cursor.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = self.value(self.active).chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    /// Render one `Label: value` line of the editor.
    pub(crate) fn build_line(&self, field: RowField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let display = if value.is_empty() && !is_active {
            "<empty>".to_string()
        } else {
            value.clone()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ];
        if is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }

    /// Cursor column offset and row for the active field.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let prefix = text_width(&format!("{}: ", self.active.label()));
        let typed = text_width(self.value(self.active));
        (
            prefix.saturating_add(typed),
            u16::try_from(self.active.index()).unwrap_or(u16::MAX),
        )
    }
}

/// Text entry for the datasheet file to link.
pub(crate) struct PathForm {
    pub(crate) key: RowKey,
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl PathForm {
    pub(crate) fn new(key: RowKey) -> Self {
        Self {
            key,
            input: String::new(),
            error: None,
        }
    }
}

/// Pending deletion, waiting for a yes/no answer.
pub(crate) struct ConfirmDelete {
    pub(crate) key: RowKey,
    pub(crate) id_label: String,
    pub(crate) part: String,
}

impl ConfirmDelete {
    pub(crate) fn from_row(row: &SheetRow) -> Self {
        Self {
            key: row.key,
            id_label: row.id_label(),
            part: row.fields.part.clone(),
        }
    }
}

/// Saving a filtered view replaces the store with only the visible rows, so
/// that case asks first.
pub(crate) struct ConfirmSave {
    pub(crate) filter: String,
    pub(crate) rows: usize,
}

/// Choice offered when quitting with unsaved edits.
pub(crate) struct ConfirmQuit {
    pub(crate) selection: QuitChoice,
}

impl ConfirmQuit {
    pub(crate) fn new() -> Self {
        Self {
            selection: QuitChoice::Save,
        }
    }

    /// Save → Discard → Cancel.
    pub(crate) fn next(&mut self) {
        self.selection = match self.selection {
            QuitChoice::Save => QuitChoice::Discard,
            QuitChoice::Discard => QuitChoice::Cancel,
            QuitChoice::Cancel => QuitChoice::Save,
        };
    }

    pub(crate) fn previous(&mut self) {
        self.selection = match self.selection {
            QuitChoice::Save => QuitChoice::Cancel,
            QuitChoice::Discard => QuitChoice::Save,
            QuitChoice::Cancel => QuitChoice::Discard,
        };
    }

    pub(crate) fn labels(&self) -> [&'static str; 3] {
        ["Save & Quit", "Discard & Quit", "Cancel"]
    }

    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            QuitChoice::Save => 0,
            QuitChoice::Discard => 1,
            QuitChoice::Cancel => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum QuitChoice {
    Save,
    Discard,
    Cancel,
}

/// Entries of the file menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuItem {
    Backup,
    Restore,
    Exit,
}

impl MenuItem {
    pub(crate) const ALL: [MenuItem; 3] = [MenuItem::Backup, MenuItem::Restore, MenuItem::Exit];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuItem::Backup => "Backup Database",
            MenuItem::Restore => "Restore Database",
            MenuItem::Exit => "Exit",
        }
    }
}

#[derive(Default)]
pub(crate) struct FileMenu {
    pub(crate) selected: usize,
}

impl FileMenu {
    pub(crate) fn move_selection(&mut self, offset: isize) {
        let len = MenuItem::ALL.len() as isize;
        self.selected = (self.selected as isize + offset).rem_euclid(len) as usize;
    }

    pub(crate) fn current(&self) -> MenuItem {
        MenuItem::ALL[self.selected.min(MenuItem::ALL.len() - 1)]
    }
}
