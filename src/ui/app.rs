use std::mem;
use std::path::PathBuf;

use crossterm::event::KeyCode;
use directories::BaseDirs;
use log::{info, warn};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    Wrap,
};
use ratatui::Frame;
use rusqlite::Connection;

use crate::backup::{backup_store, restore_store};
use crate::config::{AppPaths, Settings};
use crate::datasheet::{self, DatasheetError, DocumentViewer};
use crate::db::{
    delete_component, fetch_components, replace_components, search_components,
    update_datasheet_path,
};
use crate::models::Component;
use crate::sheet::{RowKey, Sheet, SheetRow};

use super::forms::{
    ConfirmDelete, ConfirmQuit, ConfirmSave, FileMenu, MenuItem, PathForm, QuitChoice, RowField,
    RowForm,
};
use super::helpers::{centered_rect, count_label, surface_error, text_width};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp / PageDown.
const PAGE_STEP: isize = 10;
/// Column headers of the parts table, in display order.
const COLUMNS: [&str; 8] = [
    "ID",
    "Custom ID",
    "Type",
    "Part",
    "Description",
    "Footprint",
    "Stock",
    "Datasheet",
];

/// Which dialog, if any, currently owns the keyboard.
enum Mode {
    Normal,
    Searching(SearchState),
    EditingRow(RowForm),
    LinkingDatasheet(PathForm),
    ConfirmDelete(ConfirmDelete),
    ConfirmSave(ConfirmSave),
    ConfirmQuit(ConfirmQuit),
    Menu(FileMenu),
}

/// Search term being typed. It only hits the store on Enter.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    paths: AppPaths,
    settings: Settings,
    viewer: Box<dyn DocumentViewer>,
    sheet: Sheet,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        conn: Connection,
        paths: AppPaths,
        settings: Settings,
        viewer: Box<dyn DocumentViewer>,
        components: Vec<Component>,
    ) -> Self {
        Self {
            conn,
            paths,
            settings,
            viewer,
            sheet: Sheet::new(components),
            selected: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Route a key press to the active mode. Returns `true` when the user
    /// asked to leave the application.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::EditingRow(form) => self.handle_edit_row(code, form),
            Mode::LinkingDatasheet(form) => self.handle_link_datasheet(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::ConfirmSave(confirm) => self.handle_confirm_save(code, confirm),
            Mode::ConfirmQuit(confirm) => self.handle_confirm_quit(code, confirm, &mut exit),
            Mode::Menu(menu) => self.handle_menu(code, menu, &mut exit),
        };

        exit
    }

    /// Ctrl+S saves from the table view.
    pub(crate) fn handle_ctrl_s(&mut self) {
        if matches!(self.mode, Mode::Normal) {
            self.mode = self.request_save();
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return self.request_quit(exit),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.sheet.len().saturating_sub(1),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                return Mode::Searching(SearchState {
                    query: self.sheet.filter().unwrap_or_default().to_string(),
                });
            }
            KeyCode::Char('+') | KeyCode::Char('a') => return self.add_row(),
            KeyCode::Char('e') | KeyCode::Enter => match self.current_row() {
                Some(row) => return Mode::EditingRow(RowForm::from_row(row)),
                None => self.set_status("No component selected.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') => match self.current_row() {
                Some(row) => return Mode::ConfirmDelete(ConfirmDelete::from_row(row)),
                None => self.set_status("No component selected.", StatusKind::Error),
            },
            KeyCode::Char('l') => match self.current_row() {
                Some(row) => return Mode::LinkingDatasheet(PathForm::new(row.key)),
                None => self.set_status("No component selected.", StatusKind::Error),
            },
            KeyCode::Char('v') => self.view_datasheet(),
            KeyCode::Char('s') => return self.request_save(),
            KeyCode::Char('r') => self.revert_edits(),
            KeyCode::Char('m') => return Mode::Menu(FileMenu::default()),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                self.run_search(&state.query);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }
        Mode::Searching(state)
    }

    fn handle_edit_row(&mut self, code: KeyCode, mut form: RowForm) -> Mode {
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("Edit cancelled.", StatusKind::Info);
                    return Mode::Normal;
                }
            }
            KeyCode::Tab => {
                let consumed = form.has_active_suggestion() && form.accept_suggestion();
                if !consumed {
                    form.next_field();
                }
                form.update_suggestion(&self.settings);
            }
            KeyCode::BackTab => {
                form.previous_field();
                form.update_suggestion(&self.settings);
            }
            KeyCode::Up => {
                if !form.cycle_option(&self.settings, -1) {
                    form.previous_field();
                    form.update_suggestion(&self.settings);
                }
            }
            KeyCode::Down => {
                if !form.cycle_option(&self.settings, 1) {
                    form.next_field();
                    form.update_suggestion(&self.settings);
                }
            }
            KeyCode::Backspace => {
                form.backspace();
                form.update_suggestion(&self.settings);
            }
            KeyCode::Enter => {
                if self.sheet.update(form.key, form.values.clone()) {
                    self.select_key(form.key);
                    self.set_status("Row updated. Press s to save.", StatusKind::Info);
                } else {
                    self.set_status("That row is no longer on the sheet.", StatusKind::Error);
                }
                return Mode::Normal;
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    form.update_suggestion(&self.settings);
                } else if form.active == RowField::Stock {
                    form.error = Some("Stock only accepts digits.".to_string());
                }
            }
            _ => {}
        }
        Mode::EditingRow(form)
    }

    fn handle_link_datasheet(&mut self, code: KeyCode, mut form: PathForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Datasheet link cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                form.input.pop();
                form.error = None;
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                form.input.push(ch);
                form.error = None;
            }
            KeyCode::Enter => match self.link_datasheet(&form) {
                Ok(message) => {
                    self.set_status(message, StatusKind::Info);
                    return Mode::Normal;
                }
                Err(message) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            _ => {}
        }
        Mode::LinkingDatasheet(form)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.perform_delete(&confirm);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_confirm_save(&mut self, code: KeyCode, confirm: ConfirmSave) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Save cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.save_all();
                Mode::Normal
            }
            _ => Mode::ConfirmSave(confirm),
        }
    }

    fn handle_confirm_quit(
        &mut self,
        code: KeyCode,
        mut confirm: ConfirmQuit,
        exit: &mut bool,
    ) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                confirm.previous();
                Mode::ConfirmQuit(confirm)
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                confirm.next();
                Mode::ConfirmQuit(confirm)
            }
            KeyCode::Enter => {
                match confirm.selection {
                    QuitChoice::Save => *exit = self.save_all(),
                    QuitChoice::Discard => {
                        info!("quitting with unsaved edits discarded");
                        *exit = true;
                    }
                    QuitChoice::Cancel => {}
                }
                Mode::Normal
            }
            _ => Mode::ConfirmQuit(confirm),
        }
    }

    fn handle_menu(&mut self, code: KeyCode, mut menu: FileMenu, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('m') => Mode::Normal,
            KeyCode::Up => {
                menu.move_selection(-1);
                Mode::Menu(menu)
            }
            KeyCode::Down | KeyCode::Tab => {
                menu.move_selection(1);
                Mode::Menu(menu)
            }
            KeyCode::Enter => match menu.current() {
                MenuItem::Backup => {
                    self.backup_database();
                    Mode::Normal
                }
                MenuItem::Restore => {
                    self.restore_database();
                    Mode::Normal
                }
                MenuItem::Exit => self.request_quit(exit),
            },
            _ => Mode::Menu(menu),
        }
    }

    fn request_quit(&mut self, exit: &mut bool) -> Mode {
        if self.sheet.is_dirty() {
            Mode::ConfirmQuit(ConfirmQuit::new())
        } else {
            *exit = true;
            Mode::Normal
        }
    }

    /// Saving a filtered sheet would drop every hidden row, so ask first.
    fn request_save(&mut self) -> Mode {
        match self.sheet.filter() {
            Some(filter) => Mode::ConfirmSave(ConfirmSave {
                filter: filter.to_string(),
                rows: self.sheet.len(),
            }),
            None => {
                self.save_all();
                Mode::Normal
            }
        }
    }

    fn add_row(&mut self) -> Mode {
        let key = self.sheet.add_blank();
        self.select_key(key);
        match self.sheet.row(key) {
            Some(row) => Mode::EditingRow(RowForm::from_row(row)),
            None => Mode::Normal,
        }
    }

    /// Replace the store with the sheet and reload so rows pick up their new
    /// ids. Returns whether the save went through.
    fn save_all(&mut self) -> bool {
        let snapshot = self.sheet.commit();
        match replace_components(&mut self.conn, &snapshot) {
            Ok(saved) => {
                match fetch_components(&self.conn) {
                    Ok(components) => {
                        self.sheet.load(components, None);
                        self.clamp_selection();
                    }
                    Err(err) => warn!("reload after save failed: {err:#}"),
                }
                self.set_status(
                    format!(
                        "Database saved successfully! ({}.)",
                        count_label(saved, "component")
                    ),
                    StatusKind::Info,
                );
                true
            }
            Err(err) => {
                warn!("save failed: {err:#}");
                self.set_status(
                    format!("Save failed, nothing was changed: {}", surface_error(&err)),
                    StatusKind::Error,
                );
                false
            }
        }
    }

    /// Re-run the search against the store. Unsaved edits are dropped.
    fn run_search(&mut self, term: &str) {
        let had_edits = self.sheet.is_dirty();
        match search_components(&self.conn, term) {
            Ok(components) => {
                let count = components.len();
                let term = term.trim();
                self.sheet.load(components, Some(term.to_string()));
                self.selected = 0;

                let mut message = if term.is_empty() {
                    format!("Loaded {}.", count_label(count, "component"))
                } else {
                    format!("{} matching '{term}'.", count_label(count, "component"))
                };
                if had_edits {
                    message.push_str(" Unsaved edits were discarded.");
                }
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => {
                warn!("search for '{term}' failed: {err:#}");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    fn revert_edits(&mut self) {
        if !self.sheet.is_dirty() {
            self.set_status("No unsaved edits.", StatusKind::Info);
            return;
        }

        let filter = self.sheet.filter().unwrap_or_default().to_string();
        match search_components(&self.conn, &filter) {
            Ok(components) => {
                self.sheet.discard(components);
                self.clamp_selection();
                self.set_status("Unsaved edits discarded.", StatusKind::Info);
            }
            Err(err) => {
                warn!("reload failed: {err:#}");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) {
        if let Some(id) = confirm.key.stored_id() {
            if let Err(err) = delete_component(&self.conn, id) {
                warn!("delete of component {id} failed: {err:#}");
                self.set_status(surface_error(&err), StatusKind::Error);
                return;
            }
        }

        self.sheet.remove(confirm.key);
        self.clamp_selection();
        let message = match confirm.key {
            RowKey::Stored(_) => format!(
                "Part ID {} has been deleted successfully!",
                confirm.id_label
            ),
            RowKey::Draft(_) => "Unsaved row removed.".to_string(),
        };
        self.set_status(message, StatusKind::Info);
    }

    /// Validate the chosen file, persist the link for stored rows and mirror
    /// it on the sheet. Errors come back as display text for the dialog.
    fn link_datasheet(&mut self, form: &PathForm) -> Result<String, String> {
        let input = form.input.trim();
        if input.is_empty() {
            return Err("Enter the path of the datasheet file.".to_string());
        }

        let chosen = expand_home(input);
        let relative =
            datasheet::link_path(&self.paths.base_dir, &chosen).map_err(|err| err.to_string())?;

        if let Some(id) = form.key.stored_id() {
            update_datasheet_path(&self.conn, id, &relative).map_err(|err| {
                warn!("linking datasheet to component {id} failed: {err:#}");
                surface_error(&err)
            })?;
        }

        if !self.sheet.set_datasheet(form.key, relative.clone()) {
            return Err("That row is no longer on the sheet.".to_string());
        }
        Ok(format!("Linked datasheet {relative}."))
    }

    fn view_datasheet(&mut self) {
        let Some(row) = self.current_row() else {
            self.set_status("No component selected.", StatusKind::Error);
            return;
        };
        let id_label = row.id_label();
        let stored = row.datasheet_path.clone();

        match datasheet::view(&self.paths.base_dir, &stored, self.viewer.as_ref()) {
            Ok(path) => {
                self.set_status(format!("Opened {}.", path.display()), StatusKind::Info);
            }
            Err(DatasheetError::NotLinked) => {
                self.set_status(
                    format!("No datasheet linked for ID {id_label}."),
                    StatusKind::Info,
                );
            }
            Err(err @ DatasheetError::Launch { .. }) => {
                warn!("viewer failed for component {id_label}: {err}");
                self.set_status(
                    format!("Could not open datasheet for ID {id_label}: {err}"),
                    StatusKind::Error,
                );
            }
            Err(err) => {
                warn!("datasheet for component {id_label} unavailable: {err}");
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
    }

    fn backup_database(&mut self) {
        match backup_store(&self.paths.database, &self.paths.backup) {
            Ok(_) => self.set_status("Database backup created successfully!", StatusKind::Info),
            Err(err) => {
                warn!("backup failed: {err}");
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
    }

    /// Overwrite the live database with the backup and reload everything.
    fn restore_database(&mut self) {
        if let Err(err) = restore_store(&mut self.conn, &self.paths.database, &self.paths.backup) {
            warn!("restore failed: {err}");
            self.set_status(err.to_string(), StatusKind::Error);
            return;
        }

        match fetch_components(&self.conn) {
            Ok(components) => {
                self.sheet.load(components, None);
                self.clamp_selection();
                self.set_status(
                    "Database restored from backup successfully!",
                    StatusKind::Info,
                );
            }
            Err(err) => {
                warn!("reload after restore failed: {err:#}");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_table(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::EditingRow(form) => self.draw_row_form(frame, area, form),
            Mode::LinkingDatasheet(form) => self.draw_link_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmSave(confirm) => self.draw_confirm_save(frame, area, confirm),
            Mode::ConfirmQuit(confirm) => self.draw_confirm_quit(frame, area, confirm),
            Mode::Menu(menu) => self.draw_menu(frame, area, menu),
            Mode::Normal => {}
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let mut title = format!(
            " LabParts v{} | {} ",
            env!("CARGO_PKG_VERSION"),
            count_label(self.sheet.len(), "component")
        );
        if let Some(filter) = self.sheet.filter() {
            title.push_str(&format!("| search: '{filter}' "));
        }
        if self.sheet.is_dirty() {
            title.push_str("| unsaved changes ");
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.sheet.is_empty() {
            let text = match self.sheet.filter() {
                Some(filter) => format!("No components match '{filter}'. Press 'f' to search again."),
                None => "No components yet. Press '+' to add one.".to_string(),
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(COLUMNS).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = self.sheet.rows().iter().map(table_row).collect();
        let widths = [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(18),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(24),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = TableState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match &self.mode {
            Mode::Searching(_) => &[("[Enter]", "Search"), ("[Esc]", "Cancel")],
            Mode::EditingRow(_) => &[
                ("[Tab]", "Accept/Next"),
                ("[↑↓]", "Pick"),
                ("[Enter]", "Apply"),
                ("[Esc]", "Cancel"),
            ],
            Mode::Menu(_) => &[("[↑↓]", "Select"), ("[Enter]", "Run"), ("[Esc]", "Close")],
            Mode::LinkingDatasheet(_) => &[("[Enter]", "Link"), ("[Esc]", "Cancel")],
            Mode::ConfirmDelete(_) | Mode::ConfirmSave(_) => {
                &[("[y]", "Confirm"), ("[n/Esc]", "Cancel")]
            }
            Mode::ConfirmQuit(_) => &[("[←→]", "Choose"), ("[Enter]", "Confirm")],
            Mode::Normal => &[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[l]", "Link Datasheet"),
                ("[v]", "View Datasheet"),
                ("[s]", "Save"),
                ("[r]", "Revert"),
                ("[m]", "Menu"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (key, label) in hints {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner
            .x
            .saturating_add(text_width("Search: "))
            .saturating_add(text_width(&state.query));
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_row_form(&self, frame: &mut Frame, area: Rect, form: &RowForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("Edit Component (ID {})", form.id_label);
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = RowField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to apply • Tab to accept/switch • ↑↓ to pick type/footprint • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let (offset_x, offset_y) = form.cursor_offset();
        frame.set_cursor_position((
            inner.x.saturating_add(offset_x),
            inner.y.saturating_add(offset_y),
        ));
    }

    fn draw_link_form(&self, frame: &mut Frame, area: Rect, form: &PathForm) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Link Datasheet")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("File: "),
                Span::styled(form.input.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!(
                    "Stored relative to {}. Enter to link • Esc to cancel",
                    self.paths.base_dir.display()
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner
            .x
            .saturating_add(text_width("File: "))
            .saturating_add(text_width(&form.input));
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Part").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(format!(
            "Are you sure you want to delete part ID {}?",
            confirm.id_label
        ))];
        if !confirm.part.trim().is_empty() {
            lines.push(Line::from(Span::styled(
                confirm.part.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_save(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSave) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Save Filtered View")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("The table is filtered by '{}'.", confirm.filter)),
            Line::from(format!(
                "Saving replaces the whole database with the {} shown.",
                count_label(confirm.rows, "row")
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to save or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_quit(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmQuit) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Exit Application")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut option_spans = Vec::new();
        for (idx, label) in confirm.labels().iter().enumerate() {
            if idx > 0 {
                option_spans.push(Span::raw("   "));
            }
            let style = if confirm.selected_index() == idx {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            option_spans.push(Span::styled(*label, style));
        }

        let lines = vec![
            Line::from("You have unsaved edits. Save them before quitting?"),
            Line::from(""),
            Line::from(option_spans),
            Line::from(""),
            Line::from(Span::styled(
                "Use ←/→ to choose • Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect, menu: &FileMenu) {
        let popup_area = centered_rect(40, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("File").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let items: Vec<ListItem> = MenuItem::ALL
            .iter()
            .map(|item| ListItem::new(item.label()))
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(menu.selected));
        frame.render_stateful_widget(list, inner, &mut list_state);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn current_row(&self) -> Option<&SheetRow> {
        self.sheet
            .key_at(self.selected)
            .and_then(|key| self.sheet.row(key))
    }

    fn select_key(&mut self, key: RowKey) {
        if let Some(index) = self.sheet.position(key) {
            self.selected = index;
        }
    }

    fn move_selection(&mut self, offset: isize) {
        if self.sheet.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.sheet.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.sheet.len() {
            self.selected = self.sheet.len().saturating_sub(1);
        }
    }
}

/// Render one sheet row. Draft rows show their id greyed out until saved.
fn table_row(row: &SheetRow) -> Row<'static> {
    let id_style = match row.key {
        RowKey::Stored(_) => Style::default(),
        RowKey::Draft(_) => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    };
    let datasheet = if row.datasheet_path.trim().is_empty() {
        Cell::from("-").style(Style::default().fg(Color::DarkGray))
    } else {
        Cell::from(row.datasheet_path.clone()).style(Style::default().fg(Color::Cyan))
    };

    Row::new(vec![
        Cell::from(row.id_label()).style(id_style),
        Cell::from(row.fields.cus_id.clone()),
        Cell::from(row.fields.kind.clone()),
        Cell::from(row.fields.part.clone()),
        Cell::from(row.fields.description.clone()),
        Cell::from(row.fields.footprint.clone()),
        Cell::from(row.fields.stock.clone()),
        datasheet,
    ])
}

/// Expand a leading `~/` to the home directory.
fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(base_dirs) = BaseDirs::new() {
            return base_dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(input)
}
