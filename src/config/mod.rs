// Configuration management for mplaylist
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mplaylist";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Binary invoked as `<player> <file>` for playback and
    /// `<player> --no-config --no-video --no-audio <file>` for probing.
    pub player_binary: String,
    /// Where the file browser opens.
    pub browse_directory: PathBuf,
    /// Playlists normally live next to config.toml; this overrides that.
    pub playlist_directory: Option<PathBuf>,

    #[serde(skip)]
    app_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_binary: "mpv".to_string(),
            browse_directory: dirs::audio_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            playlist_directory: None,
            app_dir: default_app_dir(),
        }
    }
}

fn default_app_dir() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    /// Load config.toml from the app directory (or `dir_override`), writing
    /// defaults on first run so the user has a file to edit.
    pub fn load(dir_override: Option<&Path>) -> Result<Self> {
        let app_dir = match dir_override {
            Some(dir) => dir.to_path_buf(),
            None => default_app_dir(),
        };
        fs::create_dir_all(&app_dir)?;

        let config_path = app_dir.join("config.toml");
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.app_dir = app_dir;
            Ok(config)
        } else {
            let mut config = Config::default();
            config.app_dir = app_dir;
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(self.app_dir.join("config.toml"), content)?;
        Ok(())
    }

    /// Directory the playlist store works in.
    pub fn playlist_dir(&self) -> PathBuf {
        self.playlist_directory
            .clone()
            .unwrap_or_else(|| self.app_dir.clone())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.app_dir.join("logs")
    }
}
