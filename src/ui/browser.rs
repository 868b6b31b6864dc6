// File picker popup
// A single-level directory listing with marks, not a tree: descend with
// Enter, go up with Backspace, mark with Space, confirm. Probing decides
// what is actually playable, so the browser itself shows every file.

use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFilter {
    /// Show everything; the probe filters later.
    AllFiles,
    /// Only `.m3u` files (import picker).
    Playlists,
}

pub struct BrowserEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub marked: bool,
}

pub struct FileBrowser {
    pub dir: PathBuf,
    pub entries: Vec<BrowserEntry>,
    pub selected: usize,
    filter: BrowserFilter,
}

impl FileBrowser {
    pub fn open(dir: PathBuf, filter: BrowserFilter) -> Self {
        let mut browser = Self {
            dir,
            entries: Vec::new(),
            selected: 0,
            filter,
        };
        browser.reload();
        browser
    }

    fn reload(&mut self) {
        self.entries.clear();
        self.selected = 0;

        let read = match fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(_) => return,
        };
        for entry in read.filter_map(|e| e.ok()) {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = path.is_dir();
            if !is_dir && !self.admits(&path) {
                continue;
            }
            self.entries.push(BrowserEntry {
                path,
                name,
                is_dir,
                marked: false,
            });
        }
        // directories first, then case-insensitive by name
        self.entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
    }

    fn admits(&self, path: &std::path::Path) -> bool {
        match self.filter {
            BrowserFilter::AllFiles => true,
            BrowserFilter::Playlists => path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("m3u")),
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    /// Mark or unmark the selected file for a multi-pick.
    pub fn toggle_mark(&mut self) {
        if let Some(entry) = self.entries.get_mut(self.selected) {
            if !entry.is_dir {
                entry.marked = !entry.marked;
            }
        }
    }

    /// Descend into the selected directory, or return the selected file.
    pub fn enter(&mut self) -> Option<PathBuf> {
        let entry = self.entries.get(self.selected)?;
        if entry.is_dir {
            self.dir = entry.path.clone();
            self.reload();
            None
        } else {
            Some(entry.path.clone())
        }
    }

    pub fn ascend(&mut self) {
        if let Some(parent) = self.dir.parent() {
            self.dir = parent.to_path_buf();
            self.reload();
        }
    }

    /// Everything marked, in listing order, plus `also` if not already in.
    pub fn picks(&self, also: Option<PathBuf>) -> Vec<PathBuf> {
        let mut picks: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|e| e.marked)
            .map(|e| e.path.clone())
            .collect();
        if let Some(extra) = also {
            if !picks.contains(&extra) {
                picks.push(extra);
            }
        }
        picks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed(dir: &std::path::Path) {
        fs::create_dir(dir.join("albums")).unwrap();
        fs::write(dir.join("zebra.mp3"), b"x").unwrap();
        fs::write(dir.join("Alpha.ogg"), b"x").unwrap();
        fs::write(dir.join("lists.m3u"), b"#EXTM3U\n").unwrap();
        fs::write(dir.join(".hidden"), b"x").unwrap();
    }

    #[test]
    fn lists_directories_first_then_names() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let browser = FileBrowser::open(dir.path().to_path_buf(), BrowserFilter::AllFiles);
        let names: Vec<&str> = browser.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["albums", "Alpha.ogg", "lists.m3u", "zebra.mp3"]);
    }

    #[test]
    fn playlist_filter_only_admits_m3u() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let browser = FileBrowser::open(dir.path().to_path_buf(), BrowserFilter::Playlists);
        let names: Vec<&str> = browser.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["albums", "lists.m3u"]);
    }

    #[test]
    fn enter_descends_and_ascend_returns() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut browser = FileBrowser::open(dir.path().to_path_buf(), BrowserFilter::AllFiles);
        assert!(browser.enter().is_none()); // "albums" is first
        assert_eq!(browser.dir, dir.path().join("albums"));
        browser.ascend();
        assert_eq!(browser.dir, dir.path());
    }

    #[test]
    fn marked_files_collect_in_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut browser = FileBrowser::open(dir.path().to_path_buf(), BrowserFilter::AllFiles);
        browser.select_down(); // Alpha.ogg
        browser.toggle_mark();
        browser.select_down(); // lists.m3u
        browser.select_down(); // zebra.mp3
        browser.toggle_mark();
        let picks = browser.picks(None);
        assert_eq!(
            picks,
            [dir.path().join("Alpha.ogg"), dir.path().join("zebra.mp3")]
        );
    }

    #[test]
    fn entered_file_joins_the_picks_once() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut browser = FileBrowser::open(dir.path().to_path_buf(), BrowserFilter::AllFiles);
        browser.select_down();
        browser.toggle_mark();
        let file = browser.enter().unwrap();
        assert_eq!(browser.picks(Some(file)).len(), 1);
    }
}
