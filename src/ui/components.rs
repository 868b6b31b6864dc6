// Rendering for the tab bar, queue list, and the modal popups
// All plain widget code; state lives in App and friends.

use crate::ui::browser::FileBrowser;
use crate::ui::tab::PlaylistTab;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
    Frame,
};
use std::path::Path;

pub fn render_tab_bar(f: &mut Frame, area: Rect, titles: &[String], active: usize) {
    let tabs = Tabs::new(titles.iter().map(|t| Line::from(t.as_str())))
        .select(active)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(tabs, area);
}

/// The queue itself. Entries show their file stem, like any sane player;
/// the full path belongs in the status line, not the list.
pub fn render_queue(f: &mut Frame, area: Rect, tab: &PlaylistTab) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} · {} tracks ", tab.title, tab.queue().len()));
    let inner_height = area.height.saturating_sub(2) as usize;

    let queue = tab.queue();
    let mut lines: Vec<Line> = Vec::new();
    if queue.is_empty() {
        lines.push(Line::from(Span::styled(
            "Empty playlist - drop files here or press 'a' to browse",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        let start = tab
            .selected()
            .saturating_sub(inner_height / 2)
            .min(queue.len().saturating_sub(inner_height.max(1)));
        for (offset, path) in queue.iter().skip(start).take(inner_height).enumerate() {
            let index = start + offset;
            let is_selected = index == tab.selected();
            let is_playing = tab.playing() == Some(path.as_path());

            let marker = if is_playing { "♪" } else { " " };
            let style = if is_selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else if is_playing {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} "), style),
                Span::styled(format!("{:>3}  ", index + 1), style),
                Span::styled(display_name(path), style),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_status(f: &mut Frame, area: Rect, playing: Option<&Path>) {
    let line = match playing {
        Some(path) => Line::from(vec![
            Span::styled("▶ ", Style::default().fg(Color::Green)),
            Span::raw(path.display().to_string()),
        ]),
        None => Line::from(Span::styled(
            "Enter play · s stop · J/K move · d remove · a add · n/r/x playlists · i/e import/export · q quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

pub fn render_prompt(f: &mut Frame, title: &str, value: &str) {
    let area = centered(f.area(), 60, 5);
    f.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" > ", Style::default().fg(Color::Green)),
            Span::raw(value.to_string()),
            Span::styled("▌", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Blue))
        .title(format!(" {title} "));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_error(f: &mut Frame, message: &str) {
    let width = (message.len() as u16 + 6).clamp(30, f.area().width.saturating_sub(4));
    let area = centered(f.area(), width, 5);
    f.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Red))
        .title(" Something bad happened ")
        .title_bottom(" any key to dismiss ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_browser(f: &mut Frame, browser: &FileBrowser) {
    let full = f.area();
    let width = (full.width * 8 / 10).clamp(40.min(full.width), full.width);
    let height = (full.height * 8 / 10).clamp(10.min(full.height), full.height);
    let area = centered(full, width, height);
    f.render_widget(Clear, area);

    let inner_height = area.height.saturating_sub(2) as usize;
    let start = browser
        .selected
        .saturating_sub(inner_height / 2)
        .min(browser.entries.len().saturating_sub(inner_height.max(1)));

    let mut lines: Vec<Line> = Vec::new();
    if browser.entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "(empty directory)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (offset, entry) in browser
        .entries
        .iter()
        .skip(start)
        .take(inner_height)
        .enumerate()
    {
        let is_selected = start + offset == browser.selected;
        let mark = if entry.marked { "*" } else { " " };
        let style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else if entry.is_dir {
            Style::default().fg(Color::Blue)
        } else {
            Style::default()
        };
        let suffix = if entry.is_dir { "/" } else { "" };
        lines.push(Line::from(Span::styled(
            format!(" {mark} {}{suffix}", entry.name),
            style,
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {} ", browser.dir.display()))
        .title_bottom(" Enter open · Space mark · c confirm · Backspace up · Esc cancel ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
