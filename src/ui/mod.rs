// Terminal UI - the face of mplaylist
// Built with ratatui; one tab per playlist, popups for everything modal

pub mod app;        // main application state and event loop
pub mod browser;    // file picker popup
pub mod components; // popup and list rendering
pub mod events;     // keyboard/paste event pump
pub mod tab;        // one playlist view per tab

pub use app::App;
pub use events::{AppEvent, EventHandler};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

pub struct TerminalManager {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    _cleanup_guard: CleanupGuard,
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Best-effort restore; running even when setup half-failed.
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableBracketedPaste);
        let _ = execute!(stdout, cursor::Show);
    }
}

impl TerminalManager {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        // Bracketed paste is how file drops reach a terminal app: the
        // emulator pastes the dropped paths as one chunk of text.
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        Ok(Self {
            terminal,
            _cleanup_guard: CleanupGuard,
        })
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}
