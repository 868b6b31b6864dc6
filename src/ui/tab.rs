// One playlist per tab
// Each tab tracks a single queue and its own player. Playback is
// event-based: a fully played file is removed from the queue rather than
// marked as read, and whatever now sits at the same index plays next.

use crate::player::{ExitReason, PlaybackEnd, Player};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct PlaylistTab {
    pub title: String,
    queue: Vec<PathBuf>,
    selected: usize,
    player: Player,
    ends: mpsc::UnboundedReceiver<PlaybackEnd>,
}

impl PlaylistTab {
    pub fn new(title: impl Into<String>, queue: Vec<PathBuf>, player_binary: &str) -> Self {
        let (tx, ends) = mpsc::unbounded_channel();
        Self {
            title: title.into(),
            queue,
            selected: 0,
            player: Player::new(player_binary, tx),
            ends,
        }
    }

    pub fn queue(&self) -> &[PathBuf] {
        &self.queue
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn playing(&self) -> Option<&Path> {
        self.player.playing()
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.queue.len() {
            self.selected += 1;
        }
    }

    /// Swap the selected entry with its predecessor. No-op on the first row.
    pub fn move_up(&mut self) -> bool {
        if self.selected == 0 || self.selected >= self.queue.len() {
            return false;
        }
        self.queue.swap(self.selected, self.selected - 1);
        self.selected -= 1;
        true
    }

    /// Swap the selected entry with its successor. No-op on the last row.
    pub fn move_down(&mut self) -> bool {
        if self.queue.is_empty() || self.selected + 1 >= self.queue.len() {
            return false;
        }
        self.queue.swap(self.selected, self.selected + 1);
        self.selected += 1;
        true
    }

    /// Remove the selected entry, keeping the selection at the same row.
    pub fn remove_selected(&mut self) -> bool {
        if self.selected >= self.queue.len() {
            return false;
        }
        self.queue.remove(self.selected);
        self.clamp_selection();
        true
    }

    /// Probe the candidates and append the ones the player accepts.
    /// Used by both paste-drops and the file browser.
    pub async fn add_paths(&mut self, candidates: Vec<PathBuf>) -> bool {
        let survivors = self.player.filter_playable(candidates).await;
        if survivors.is_empty() {
            return false;
        }
        info!("adding {} entries to {}", survivors.len(), self.title);
        self.queue.extend(survivors);
        true
    }

    pub async fn play_selected(&mut self) {
        if let Some(path) = self.queue.get(self.selected).cloned() {
            if let Err(err) = self.player.play(&path).await {
                warn!("{err:#}");
            }
        }
    }

    pub async fn stop(&mut self) {
        self.player.stop().await;
    }

    /// Drain pending playback outcomes. On a natural finish the played file
    /// is dropped from the queue (every occurrence of it) and the entry that
    /// lands at the same index, if any, starts playing. Everything else is a
    /// diagnostic. Returns true when the queue changed.
    pub async fn pump_playback(&mut self) -> bool {
        let mut changed = false;
        while let Ok(end) = self.ends.try_recv() {
            match end.reason {
                ExitReason::Finished => {
                    info!("finished {}", end.path.display());
                    let index = self.selected;
                    self.queue.retain(|entry| *entry != end.path);
                    self.clamp_selection();
                    changed = true;
                    if index < self.queue.len() {
                        self.selected = index;
                        self.play_selected().await;
                    }
                }
                ExitReason::Quit => info!("player quit on {}", end.path.display()),
                ExitReason::BadFile => warn!("unrecognized media: {}", end.path.display()),
                ExitReason::Nonstarter => warn!("player could not start {}", end.path.display()),
                ExitReason::Halted => warn!("player halted on {}", end.path.display()),
            }
        }
        changed
    }

    fn clamp_selection(&mut self) {
        if self.queue.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.queue.len() {
            self.selected = self.queue.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab_with(paths: &[&str]) -> PlaylistTab {
        PlaylistTab::new(
            "test",
            paths.iter().map(PathBuf::from).collect(),
            "mpv",
        )
    }

    #[test]
    fn move_up_on_first_entry_is_a_noop() {
        let mut tab = tab_with(&["a", "b"]);
        assert!(!tab.move_up());
        assert_eq!(tab.queue(), [PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(tab.selected(), 0);
    }

    #[test]
    fn move_down_on_last_entry_is_a_noop() {
        let mut tab = tab_with(&["a", "b"]);
        tab.select_down();
        assert!(!tab.move_down());
        assert_eq!(tab.queue(), [PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(tab.selected(), 1);
    }

    #[test]
    fn move_down_swaps_and_follows_the_entry() {
        let mut tab = tab_with(&["a", "b", "c"]);
        assert!(tab.move_down());
        assert_eq!(
            tab.queue(),
            [PathBuf::from("b"), PathBuf::from("a"), PathBuf::from("c")]
        );
        assert_eq!(tab.selected(), 1);
    }

    #[test]
    fn removing_the_only_entry_leaves_a_valid_empty_queue() {
        let mut tab = tab_with(&["a"]);
        assert!(tab.remove_selected());
        assert!(tab.queue().is_empty());
        assert_eq!(tab.selected(), 0);
        // and removing again does nothing
        assert!(!tab.remove_selected());
    }

    #[test]
    fn remove_clamps_selection_to_the_new_last_row() {
        let mut tab = tab_with(&["a", "b"]);
        tab.select_down();
        assert!(tab.remove_selected());
        assert_eq!(tab.queue(), [PathBuf::from("a")]);
        assert_eq!(tab.selected(), 0);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut tab = tab_with(&["a", "b"]);
        tab.select_up();
        assert_eq!(tab.selected(), 0);
        tab.select_down();
        tab.select_down();
        tab.select_down();
        assert_eq!(tab.selected(), 1);
    }
}
