// Application state and event loop
// Tabs mostly manage their own playlists; this is the communicator between
// them and the storage backend, and the place where modal state (prompts,
// the file browser, error popups) lives. Everything runs on one event loop:
// keystrokes, pasted file drops, and player completions all arrive here.

use super::{components, AppEvent, EventHandler, TerminalManager};
use crate::config::Config;
use crate::storage::Storage;
use crate::ui::browser::{BrowserFilter, FileBrowser};
use crate::ui::tab::PlaylistTab;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use std::path::PathBuf;
use tracing::{info, warn};

const DEFAULT_PLAYLIST: &str = "default";
const NEW_PLAYLIST: &str = "empty playlist";

enum PromptKind {
    Rename { old: String },
    ImportTitle,
    ExportPath,
}

struct Prompt {
    kind: PromptKind,
    title: String,
    value: String,
}

enum BrowsePurpose {
    /// Pick files to append to the active playlist.
    AddTracks,
    /// Pick one m3u file to import under an already chosen title.
    ImportPick { title: String },
}

enum Mode {
    Normal,
    Prompt(Prompt),
    Browse {
        browser: FileBrowser,
        purpose: BrowsePurpose,
    },
    Error(String),
}

pub struct App {
    config: Config,
    storage: Storage,
    terminal: TerminalManager,
    events: EventHandler,
    tabs: Vec<PlaylistTab>,
    active: usize,
    mode: Mode,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let storage = Storage::new(config.playlist_dir())?;

        let mut tabs: Vec<PlaylistTab> = storage
            .enumerate()
            .into_iter()
            .map(|(title, entries)| PlaylistTab::new(title, entries, &config.player_binary))
            .collect();
        if tabs.is_empty() {
            // first run (or wiped config dir): give the user a playlist to land in
            match storage.add(DEFAULT_PLAYLIST, &[]) {
                Ok(()) => tabs.push(PlaylistTab::new(
                    DEFAULT_PLAYLIST,
                    Vec::new(),
                    &config.player_binary,
                )),
                Err(err) => warn!("creating default playlist: {err}"),
            }
        }
        info!("loaded {} playlists", tabs.len());

        Ok(Self {
            config,
            storage,
            terminal: TerminalManager::new()?,
            events: EventHandler::new(),
            tabs,
            active: 0,
            mode: Mode::Normal,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.events.spawn_input_pump();
        while !self.should_quit {
            self.draw()?;
            match self.events.next_event().await {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
            self.pump_players().await;
        }
        // leave no orphaned player processes behind
        for tab in &mut self.tabs {
            tab.stop().await;
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let Self {
            terminal,
            tabs,
            active,
            mode,
            ..
        } = self;
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2), // tab bar
                    Constraint::Min(0),    // queue
                    Constraint::Length(1), // status / hints
                ])
                .split(f.area());

            let titles: Vec<String> = tabs.iter().map(|t| t.title.clone()).collect();
            components::render_tab_bar(f, chunks[0], &titles, *active);
            match tabs.get(*active) {
                Some(tab) => {
                    components::render_queue(f, chunks[1], tab);
                    components::render_status(f, chunks[2], tab.playing());
                }
                None => components::render_status(f, chunks[2], None),
            }

            match mode {
                Mode::Normal => {}
                Mode::Prompt(prompt) => components::render_prompt(f, &prompt.title, &prompt.value),
                Mode::Browse { browser, .. } => components::render_browser(f, browser),
                Mode::Error(message) => components::render_error(f, message),
            }
        })
    }

    async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key).await;
            }
            AppEvent::Input(Event::Paste(text)) => {
                // file drops arrive as bracketed paste
                if matches!(self.mode, Mode::Normal) {
                    let dropped = parse_dropped_paths(&text);
                    if !dropped.is_empty() {
                        self.add_to_active(dropped).await;
                    }
                }
            }
            _ => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        // Taking the mode out makes modal handlers free to hand it back (or
        // not); an error popup dismisses on any key by simply not doing so.
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal_key(key).await,
            Mode::Error(_) => {}
            Mode::Prompt(prompt) => self.handle_prompt_key(key, prompt).await,
            Mode::Browse { browser, purpose } => {
                self.handle_browser_key(key, browser, purpose).await;
            }
        }
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,

            // tab navigation and ordering
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.prev_tab(),
            KeyCode::Char('<') => self.move_tab_left(),
            KeyCode::Char('>') => self.move_tab_right(),

            // queue navigation
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(tab) = self.active_tab_mut() {
                    tab.select_up();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(tab) = self.active_tab_mut() {
                    tab.select_down();
                }
            }

            // playback
            KeyCode::Enter => {
                if let Some(tab) = self.active_tab_mut() {
                    tab.play_selected().await;
                }
            }
            KeyCode::Char('s') => {
                if let Some(tab) = self.active_tab_mut() {
                    tab.stop().await;
                }
            }

            // queue edits, written through on change
            KeyCode::Char('K') => {
                if self.active_tab_mut().is_some_and(|tab| tab.move_up()) {
                    self.persist(self.active);
                }
            }
            KeyCode::Char('J') => {
                if self.active_tab_mut().is_some_and(|tab| tab.move_down()) {
                    self.persist(self.active);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.active_tab_mut().is_some_and(|tab| tab.remove_selected()) {
                    self.persist(self.active);
                }
            }
            KeyCode::Char('a') => {
                if self.tabs.get(self.active).is_some() {
                    self.mode = Mode::Browse {
                        browser: FileBrowser::open(
                            self.config.browse_directory.clone(),
                            BrowserFilter::AllFiles,
                        ),
                        purpose: BrowsePurpose::AddTracks,
                    };
                }
            }

            // playlist lifecycle
            KeyCode::Char('n') => self.add_playlist(),
            KeyCode::Char('r') => self.start_rename(),
            KeyCode::Char('x') => self.remove_active_playlist().await,
            KeyCode::Char('i') => {
                self.mode = Mode::Prompt(Prompt {
                    kind: PromptKind::ImportTitle,
                    title: "Import - new playlist title".to_string(),
                    value: String::new(),
                });
            }
            KeyCode::Char('e') => {
                if self.tabs.get(self.active).is_some() {
                    self.mode = Mode::Prompt(Prompt {
                        kind: PromptKind::ExportPath,
                        title: "Export to path".to_string(),
                        value: String::new(),
                    });
                }
            }
            _ => {}
        }
    }

    async fn handle_prompt_key(&mut self, key: KeyEvent, mut prompt: Prompt) {
        match key.code {
            KeyCode::Esc => {} // cancelled
            KeyCode::Enter => self.submit_prompt(prompt).await,
            KeyCode::Backspace => {
                prompt.value.pop();
                self.mode = Mode::Prompt(prompt);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.value.push(c);
                self.mode = Mode::Prompt(prompt);
            }
            _ => self.mode = Mode::Prompt(prompt),
        }
    }

    async fn submit_prompt(&mut self, prompt: Prompt) {
        let value = prompt.value.trim().to_string();
        if value.is_empty() {
            return; // same as cancelling
        }
        match prompt.kind {
            PromptKind::Rename { old } => {
                if value == old {
                    return;
                }
                match self.storage.rename(&old, &value) {
                    Ok(()) => {
                        // playback keeps going; only the label changes
                        if let Some(tab) = self.tabs.iter_mut().find(|t| t.title == old) {
                            tab.title = value;
                        }
                        self.save_tab_order();
                    }
                    Err(err) => self.show_error(err.to_string()),
                }
            }
            PromptKind::ImportTitle => {
                self.mode = Mode::Browse {
                    browser: FileBrowser::open(
                        self.config.browse_directory.clone(),
                        BrowserFilter::Playlists,
                    ),
                    purpose: BrowsePurpose::ImportPick { title: value },
                };
            }
            PromptKind::ExportPath => {
                let Some(tab) = self.tabs.get(self.active) else {
                    return;
                };
                if self.storage.export_to(&PathBuf::from(&value), tab.queue()).is_err() {
                    let title = tab.title.clone();
                    self.show_error(format!(
                        "Playlist {title} could not be written to {value}"
                    ));
                }
            }
        }
    }

    async fn handle_browser_key(
        &mut self,
        key: KeyEvent,
        mut browser: FileBrowser,
        purpose: BrowsePurpose,
    ) {
        match key.code {
            KeyCode::Esc => {} // cancelled
            KeyCode::Up | KeyCode::Char('k') => {
                browser.select_up();
                self.mode = Mode::Browse { browser, purpose };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                browser.select_down();
                self.mode = Mode::Browse { browser, purpose };
            }
            KeyCode::Backspace => {
                browser.ascend();
                self.mode = Mode::Browse { browser, purpose };
            }
            KeyCode::Char(' ') => {
                browser.toggle_mark();
                self.mode = Mode::Browse { browser, purpose };
            }
            KeyCode::Enter => match browser.enter() {
                None => self.mode = Mode::Browse { browser, purpose },
                Some(file) => self.finish_browse(browser, purpose, Some(file)).await,
            },
            KeyCode::Char('c') => {
                if browser.picks(None).is_empty() {
                    self.mode = Mode::Browse { browser, purpose };
                } else {
                    self.finish_browse(browser, purpose, None).await;
                }
            }
            _ => self.mode = Mode::Browse { browser, purpose },
        }
    }

    async fn finish_browse(
        &mut self,
        browser: FileBrowser,
        purpose: BrowsePurpose,
        entered: Option<PathBuf>,
    ) {
        match purpose {
            BrowsePurpose::AddTracks => {
                let picks = browser.picks(entered);
                if !picks.is_empty() {
                    self.add_to_active(picks).await;
                }
            }
            BrowsePurpose::ImportPick { title } => {
                let Some(file) = entered.or_else(|| browser.picks(None).into_iter().next())
                else {
                    return;
                };
                match self.storage.import_from(&file, &title) {
                    Ok(entries) => {
                        self.tabs
                            .push(PlaylistTab::new(title, entries, &self.config.player_binary));
                        self.active = self.tabs.len() - 1;
                        self.save_tab_order();
                    }
                    Err(err) => self.show_error(err.to_string()),
                }
            }
        }
    }

    /// Probe-filter and append to the active playlist, then write through.
    async fn add_to_active(&mut self, paths: Vec<PathBuf>) {
        let Some(tab) = self.tabs.get_mut(self.active) else {
            return;
        };
        if tab.add_paths(paths).await {
            self.persist(self.active);
        }
    }

    fn add_playlist(&mut self) {
        match self.storage.add(NEW_PLAYLIST, &[]) {
            Ok(()) => {
                self.tabs.push(PlaylistTab::new(
                    NEW_PLAYLIST,
                    Vec::new(),
                    &self.config.player_binary,
                ));
                self.active = self.tabs.len() - 1;
                self.save_tab_order();
            }
            Err(err) => self.show_error(err.to_string()),
        }
    }

    fn start_rename(&mut self) {
        if let Some(tab) = self.tabs.get(self.active) {
            self.mode = Mode::Prompt(Prompt {
                kind: PromptKind::Rename {
                    old: tab.title.clone(),
                },
                title: "Rename playlist".to_string(),
                value: tab.title.clone(),
            });
        }
    }

    /// Delete the active playlist's file and close its tab.
    async fn remove_active_playlist(&mut self) {
        let Some(title) = self.tabs.get(self.active).map(|t| t.title.clone()) else {
            return;
        };
        match self.storage.remove(&title) {
            Ok(()) => {
                let mut tab = self.tabs.remove(self.active);
                tab.stop().await;
                if self.active > 0 && self.active >= self.tabs.len() {
                    self.active -= 1;
                }
                self.save_tab_order();
            }
            Err(err) => self.show_error(err.to_string()),
        }
    }

    /// Let every tab react to finished playback; write back the ones that
    /// changed their queue.
    async fn pump_players(&mut self) {
        for index in 0..self.tabs.len() {
            if self.tabs[index].pump_playback().await {
                self.persist(index);
            }
        }
    }

    fn persist(&mut self, index: usize) {
        let result = match self.tabs.get(index) {
            Some(tab) => self.storage.update(&tab.title, tab.queue()),
            None => return,
        };
        if let Err(err) = result {
            self.show_error(err.to_string());
        }
    }

    fn save_tab_order(&self) {
        let titles: Vec<String> = self.tabs.iter().map(|t| t.title.clone()).collect();
        self.storage.save_tabs(&titles);
    }

    fn show_error(&mut self, message: String) {
        warn!("{message}");
        self.mode = Mode::Error(message);
    }

    fn active_tab_mut(&mut self) -> Option<&mut PlaylistTab> {
        self.tabs.get_mut(self.active)
    }

    fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + 1) % self.tabs.len();
        }
    }

    fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    fn move_tab_left(&mut self) {
        if self.active > 0 {
            self.tabs.swap(self.active, self.active - 1);
            self.active -= 1;
            self.save_tab_order();
        }
    }

    fn move_tab_right(&mut self) {
        if self.active + 1 < self.tabs.len() {
            self.tabs.swap(self.active, self.active + 1);
            self.active += 1;
            self.save_tab_order();
        }
    }
}

/// Terminal emulators deliver dropped files as pasted text: paths separated
/// by whitespace, possibly shell-quoted or backslash-escaped, occasionally
/// as file:// URIs.
fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if quote != Some('\'') => escaped = true,
            '\'' | '"' => match quote {
                Some(q) if q == ch => quote = None,
                None => quote = Some(ch),
                _ => current.push(ch),
            },
            c if c.is_whitespace() && quote.is_none() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
        .into_iter()
        .map(|token| match token.strip_prefix("file://") {
            Some(stripped) => PathBuf::from(stripped),
            None => PathBuf::from(token),
        })
        .collect()
}
