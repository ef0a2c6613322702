use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::debug;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;

/// Spin up the terminal backend, enter the draw loop, and keep processing input
/// until the user quits.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;

    let result = event_loop(&mut terminal, app);

    cleanup_terminal(&mut terminal)?;
    debug!("terminal restored");
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if event::poll(Duration::from_millis(250)).context("event polling failed")? {
            if let Event::Key(key_event) = event::read().context("failed to read event")? {
                if dispatch_key(app, key_event) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply one key event. Ctrl+S saves and Ctrl+C quits; other Ctrl chords are
/// ignored so they never reach the plain-key bindings. Returns `true` when the
/// loop should end.
fn dispatch_key(app: &mut App, key_event: KeyEvent) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        match key_event.code {
            KeyCode::Char('s') => app.handle_ctrl_s(),
            KeyCode::Char('c') => return true,
            _ => {}
        }
        return false;
    }

    app.handle_key(key_event.code)
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppPaths, Settings};
    use crate::datasheet::SystemViewer;
    use crate::db::open_store;

    fn clean_app(dir: &tempfile::TempDir) -> App {
        let paths = AppPaths::from_base(dir.path());
        let conn = open_store(&paths.database).unwrap();
        App::new(
            conn,
            paths,
            Settings::default(),
            Box::new(SystemViewer),
            Vec::new(),
        )
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn unbound_ctrl_chords_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = clean_app(&dir);

        assert!(!dispatch_key(&mut app, ctrl('q')));
        assert!(dispatch_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)
        ));
    }

    #[test]
    fn ctrl_c_ends_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = clean_app(&dir);
        assert!(dispatch_key(&mut app, ctrl('c')));
    }
}
