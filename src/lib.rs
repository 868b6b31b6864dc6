// mplaylist library - core modules for the playlist manager
// The filesystem is the database: playlists live as m3u files, mpv does the playing

pub mod config;  // settings and config directory layout
pub mod player;  // external player process lifecycle
pub mod storage; // m3u persistence backend
pub mod ui;      // terminal interface

// Export the stuff other modules actually use
pub use config::Config;
pub use player::{ExitReason, PlaybackEnd, Player};
pub use storage::{Storage, StoreError};
