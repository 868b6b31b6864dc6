// M3U reading and writing
// The format here is the lowest common denominator: a header line and one
// path per line. Extended attributes from other tools are treated as comments.

use std::path::PathBuf;
use tracing::debug;

pub const HEADER: &str = "#EXTM3U";

/// Render entries as m3u file content.
pub fn to_m3u(entries: &[PathBuf]) -> String {
    let mut content = String::from(HEADER);
    content.push('\n');
    for entry in entries {
        content.push_str(&entry.to_string_lossy());
        content.push('\n');
    }
    content
}

/// Parse m3u content into entries. Blank lines and `#` comments are skipped,
/// and so is every path that no longer resolves on disk - playlists heal
/// themselves from stale entries on every load.
pub fn from_m3u(content: &str) -> Vec<PathBuf> {
    let mut entries = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let path = PathBuf::from(line);
        if path.exists() {
            entries.push(path);
        } else {
            debug!("dropping stale m3u entry: {}", path.display());
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn to_m3u_empty() {
        assert_eq!(to_m3u(&[]), "#EXTM3U\n");
    }

    #[test]
    fn to_m3u_writes_one_path_per_line() {
        let entries = vec![PathBuf::from("/a/one.mp3"), PathBuf::from("/a/two.mp3")];
        assert_eq!(to_m3u(&entries), "#EXTM3U\n/a/one.mp3\n/a/two.mp3\n");
    }

    #[test]
    fn from_m3u_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let track = dir.path().join("song.mp3");
        fs::write(&track, b"x").unwrap();

        let content = format!(
            "#EXTM3U\n\n# a comment\n  {}  \n#EXTINF:123,ignored\n",
            track.display()
        );
        assert_eq!(from_m3u(&content), vec![track]);
    }

    #[test]
    fn from_m3u_drops_paths_that_do_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept.mp3");
        fs::write(&kept, b"x").unwrap();
        let gone = dir.path().join("gone.mp3");

        let content = format!("#EXTM3U\n{}\n{}\n", gone.display(), kept.display());
        assert_eq!(from_m3u(&content), vec![kept]);
    }
}
