// Filesystem-backed playlist store
// No in-memory copy, no sync step: every mutation is written straight through
// to disk, so a crash at any point loses nothing. Each playlist is an m3u
// file in the config directory and its title is the file name stem.

pub mod m3u;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const TAB_FILE: &str = "tabs.txt";
const M3U_EXT: &str = "m3u";

/// Everything that can go wrong talking to the store. All of these are
/// recoverable: the caller shows a warning and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Playlist {0} already exists")]
    AlreadyExists(String),
    #[error("Playlist {0} no longer exists on the filesystem")]
    NoLongerExists(String),
    #[error("Playlist {0} could not be written")]
    WriteFailed(String),
    #[error("File {0} could not be read")]
    ReadFailed(String),
    #[error("Playlist {0} could not be renamed")]
    RenameFailed(String),
    #[error("Playlist {0} could not be removed")]
    RemoveFailed(String),
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a playlist. Refuses to clobber one that already has a file.
    pub fn add(&self, title: &str, entries: &[PathBuf]) -> Result<(), StoreError> {
        if self.playlist_exists(title) {
            return Err(StoreError::AlreadyExists(title.to_string()));
        }
        self.write_entries(&self.playlist_path(title), entries)
            .map_err(|err| {
                warn!("writing playlist {title}: {err}");
                StoreError::WriteFailed(title.to_string())
            })?;
        info!("created playlist {title} ({} entries)", entries.len());
        Ok(())
    }

    pub fn rename(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let from = self.playlist_path(old);
        if !from.exists() {
            // sneakily removed behind our back
            return Err(StoreError::NoLongerExists(old.to_string()));
        }
        let to = self.playlist_path(new);
        if to.exists() {
            // fs::rename would silently clobber an existing target
            return Err(StoreError::RenameFailed(old.to_string()));
        }
        fs::rename(&from, &to).map_err(|err| {
            warn!("renaming playlist {old} -> {new}: {err}");
            StoreError::RenameFailed(old.to_string())
        })?;
        info!("renamed playlist {old} -> {new}");
        Ok(())
    }

    pub fn remove(&self, title: &str) -> Result<(), StoreError> {
        let path = self.playlist_path(title);
        if !path.exists() {
            return Err(StoreError::NoLongerExists(title.to_string()));
        }
        fs::remove_file(&path).map_err(|err| {
            warn!("removing playlist {title}: {err}");
            StoreError::RemoveFailed(title.to_string())
        })?;
        info!("removed playlist {title}");
        Ok(())
    }

    /// Read an arbitrary m3u file and store it under `title`.
    /// Returns the (existence-filtered) entries for the new playlist.
    pub fn import_from(&self, path: &Path, title: &str) -> Result<Vec<PathBuf>, StoreError> {
        let entries = self
            .read_playlist(path)
            .map_err(|err| {
                warn!("importing {}: {err}", path.display());
                StoreError::ReadFailed(path.display().to_string())
            })?;
        self.add(title, &entries)?;
        Ok(entries)
    }

    /// Write entries to an arbitrary path outside the store.
    pub fn export_to(&self, path: &Path, entries: &[PathBuf]) -> Result<(), StoreError> {
        self.write_entries(path, entries).map_err(|err| {
            warn!("exporting to {}: {err}", path.display());
            StoreError::WriteFailed(path.display().to_string())
        })
    }

    /// Overwrite a playlist in place. Called after every queue mutation.
    pub fn update(&self, title: &str, entries: &[PathBuf]) -> Result<(), StoreError> {
        self.write_entries(&self.playlist_path(title), entries)
            .map_err(|err| {
                warn!("updating playlist {title}: {err}");
                StoreError::WriteFailed(title.to_string())
            })?;
        debug!("updated playlist {title} ({} entries)", entries.len());
        Ok(())
    }

    /// Every playlist on disk, in saved tab order where known.
    ///
    /// The tab order file is only a hint: titles it lists are loaded first,
    /// anything else found on disk follows alphabetically, and a title that
    /// has no file produces nothing. Unreadable files are skipped.
    pub fn enumerate(&self) -> Vec<(String, Vec<PathBuf>)> {
        let mut on_disk: Vec<String> = self.list_playlist_titles();
        on_disk.sort();

        let mut ordered: Vec<String> = Vec::new();
        for title in self.read_tabs() {
            if on_disk.contains(&title) && !ordered.contains(&title) {
                ordered.push(title);
            }
        }
        for title in on_disk {
            if !ordered.contains(&title) {
                ordered.push(title);
            }
        }

        let mut playlists = Vec::new();
        for title in ordered {
            match self.read_playlist(&self.playlist_path(&title)) {
                Ok(entries) => playlists.push((title, entries)),
                Err(err) => warn!("skipping unreadable playlist {title}: {err}"),
            }
        }
        playlists
    }

    /// Persist tab order. Best-effort: losing the hint only costs ordering.
    pub fn save_tabs(&self, titles: &[String]) {
        let content = titles.join("\n");
        if let Err(err) = fs::write(self.root.join(TAB_FILE), content) {
            warn!("saving tab order: {err}");
        }
    }

    fn read_tabs(&self) -> Vec<String> {
        match fs::read_to_string(self.root.join(TAB_FILE)) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn list_playlist_titles(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("listing {}: {err}", self.root.display());
                return Vec::new();
            }
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(M3U_EXT))
            })
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect()
    }

    fn playlist_path(&self, title: &str) -> PathBuf {
        self.root.join(format!("{title}.{M3U_EXT}"))
    }

    fn playlist_exists(&self, title: &str) -> bool {
        self.playlist_path(title).exists()
    }

    fn read_playlist(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let content = fs::read_to_string(path)?;
        Ok(m3u::from_m3u(&content))
    }

    fn write_entries(&self, path: &Path, entries: &[PathBuf]) -> io::Result<()> {
        fs::write(path, m3u::to_m3u(entries))
    }
}
