// External player control
// mpv owns decoding and output; we own the process lifecycle. Status comes
// from scanning console output for known exit phrases, which is fragile by
// nature - the honest fix is linking libmpv and asking it directly. Until
// then the matching table lives in one place (`interpret_output`) so at
// least the fragility is data, not scattered conditionals.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Why a playback session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Natural end of file - the cue to advance.
    Finished,
    /// Process died without printing anything we recognize.
    Halted,
    /// User quit the player themselves.
    Quit,
    /// Unrecognized or unparseable media.
    BadFile,
    /// Fatal load error, e.g. an unavailable output device.
    Nonstarter,
}

/// Emitted exactly once per session when the player process terminates on
/// its own. Deliberately stopped sessions emit nothing.
#[derive(Debug, Clone)]
pub struct PlaybackEnd {
    pub path: PathBuf,
    pub reason: ExitReason,
}

const BAD_FORMAT_PHRASE: &str = "Failed to recognize file format.";

/// The phrases mpv prints on the way out. Substring match, in this order;
/// the last phrase seen across the whole output wins.
const EXIT_PHRASES: &[(&str, ExitReason)] = &[
    ("Exiting... (End of file)", ExitReason::Finished),
    ("Exiting... (Quit)", ExitReason::Quit),
    (BAD_FORMAT_PHRASE, ExitReason::BadFile),
    ("Exiting... (Errors when loading file)", ExitReason::Nonstarter),
];

/// Classify one line of player output, if it means anything to us.
pub fn interpret_output(line: &str) -> Option<ExitReason> {
    let mut hit = None;
    for (phrase, reason) in EXIT_PHRASES {
        if line.contains(phrase) {
            hit = Some(*reason);
        }
    }
    hit
}

struct Session {
    path: PathBuf,
    kill_tx: oneshot::Sender<()>,
    watcher: JoinHandle<()>,
}

/// One playback session at a time, per owner. Starting a new session always
/// kills and awaits the old process first - no fire-and-forget teardown, so
/// two live player processes can never belong to the same `Player`.
pub struct Player {
    binary: String,
    events: mpsc::UnboundedSender<PlaybackEnd>,
    session: Option<Session>,
}

impl Player {
    pub fn new(binary: impl Into<String>, events: mpsc::UnboundedSender<PlaybackEnd>) -> Self {
        Self {
            binary: binary.into(),
            events,
            session: None,
        }
    }

    /// File of the live session, if any.
    pub fn playing(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Kill any live session, then spawn `<binary> <path>` and watch it.
    pub async fn play(&mut self, path: &Path) -> Result<()> {
        self.shutdown().await;

        let mut child = Command::new(&self.binary)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawning {} for {}", self.binary, path.display()))?;
        info!("playing {} via {}", path.display(), self.binary);

        let mut lines = child.stdout.take().map(|out| BufReader::new(out).lines());
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        let session_path = path.to_path_buf();

        let watcher = tokio::spawn(async move {
            let mut pending = None;
            loop {
                tokio::select! {
                    _ = &mut kill_rx => {
                        // Deliberate stop: reap the process, emit nothing.
                        let _ = child.kill().await;
                        debug!("killed player for {}", session_path.display());
                        return;
                    }
                    line = next_line(&mut lines) => {
                        match line {
                            Ok(Some(text)) => {
                                if let Some(reason) = interpret_output(&text) {
                                    pending = Some(reason);
                                }
                            }
                            // stdout closed: the process is gone or going.
                            _ => {
                                let status = tokio::select! {
                                    status = child.wait() => status,
                                    _ = &mut kill_rx => {
                                        let _ = child.kill().await;
                                        debug!("killed player for {}", session_path.display());
                                        return;
                                    }
                                };
                                let reason = pending.unwrap_or(ExitReason::Halted);
                                debug!(
                                    "player exited ({:?}, status {:?}) for {}",
                                    reason,
                                    status.ok(),
                                    session_path.display()
                                );
                                let _ = events.send(PlaybackEnd {
                                    path: session_path,
                                    reason,
                                });
                                return;
                            }
                        }
                    }
                }
            }
        });

        self.session = Some(Session {
            path: path.to_path_buf(),
            kill_tx,
            watcher,
        });
        Ok(())
    }

    /// Kill the live session and wait until the process is confirmed dead.
    /// Clears the current file. No-op when idle.
    pub async fn stop(&mut self) {
        if self.session.is_some() {
            info!("stopping playback");
        }
        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            // Send may fail when the watcher already finished; either way the
            // join below only returns once the process has been reaped.
            let _ = session.kill_tx.send(());
            let _ = session.watcher.await;
        }
    }

    /// Check whether the player recognizes a file, without playing it.
    /// Runs a disposable process to completion with all output disabled, so
    /// a playing session is never disturbed. Blocking and without a timeout:
    /// a hung probe stalls the caller.
    pub async fn probe(&self, path: &Path) -> bool {
        let output = Command::new(&self.binary)
            .args(["--no-config", "--no-video", "--no-audio"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await;
        match output {
            Ok(out) => !String::from_utf8_lossy(&out.stdout).contains(BAD_FORMAT_PHRASE),
            Err(err) => {
                warn!("probe failed to run {}: {err}", self.binary);
                false
            }
        }
    }

    /// Probe a batch, keeping only the files the player accepts.
    pub async fn filter_playable(&self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut kept = Vec::with_capacity(paths.len());
        for path in paths {
            if self.probe(&path).await {
                kept.push(path);
            } else {
                info!("probe rejected {}", path.display());
            }
        }
        kept
    }
}

async fn next_line(
    lines: &mut Option<Lines<BufReader<ChildStdout>>>,
) -> std::io::Result<Option<String>> {
    match lines {
        Some(lines) => lines.next_line().await,
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_exit_phrase() {
        assert_eq!(
            interpret_output("Exiting... (End of file)"),
            Some(ExitReason::Finished)
        );
        assert_eq!(interpret_output("Exiting... (Quit)"), Some(ExitReason::Quit));
        assert_eq!(
            interpret_output("Failed to recognize file format."),
            Some(ExitReason::BadFile)
        );
        assert_eq!(
            interpret_output("Exiting... (Errors when loading file)"),
            Some(ExitReason::Nonstarter)
        );
    }

    #[test]
    fn matches_phrases_inside_noise() {
        let line = "[cplayer] Exiting... (End of file) and some trailing junk";
        assert_eq!(interpret_output(line), Some(ExitReason::Finished));
    }

    #[test]
    fn unknown_output_means_nothing() {
        assert_eq!(interpret_output("AO: [pulse] 44100Hz stereo"), None);
        assert_eq!(interpret_output(""), None);
    }

    #[test]
    fn last_phrase_wins_within_a_line() {
        let line = "Exiting... (End of file) Exiting... (Quit)";
        assert_eq!(interpret_output(line), Some(ExitReason::Quit));
    }
}
