// Player process lifecycle tests, driven by fake players.
// Playback tests run the controller with `sh` as the "player", so the file
// being played is itself the script deciding what the player prints. Probe
// tests need control over the binary instead, so they use executable stubs.

#![cfg(unix)]

use mplaylist::{ExitReason, PlaybackEnd, Player};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn stub_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn sh_player() -> (Player, mpsc::UnboundedReceiver<PlaybackEnd>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Player::new("sh", tx), rx)
}

async fn next_end(rx: &mut mpsc::UnboundedReceiver<PlaybackEnd>) -> PlaybackEnd {
    timeout(WAIT, rx.recv())
        .await
        .expect("player event within deadline")
        .expect("event channel open")
}

#[tokio::test]
async fn end_of_file_output_classifies_as_finished() {
    let dir = tempfile::tempdir().unwrap();
    let track = script(dir.path(), "track", "echo 'Exiting... (End of file)'\n");
    let (mut player, mut rx) = sh_player();

    player.play(&track).await.unwrap();
    let end = next_end(&mut rx).await;
    assert_eq!(end.path, track);
    assert_eq!(end.reason, ExitReason::Finished);
}

#[tokio::test]
async fn silent_exit_classifies_as_halted() {
    let dir = tempfile::tempdir().unwrap();
    let track = script(dir.path(), "track", "exit 0\n");
    let (mut player, mut rx) = sh_player();

    player.play(&track).await.unwrap();
    assert_eq!(next_end(&mut rx).await.reason, ExitReason::Halted);
}

#[tokio::test]
async fn format_failure_classifies_as_bad_file() {
    let dir = tempfile::tempdir().unwrap();
    let track = script(
        dir.path(),
        "track",
        "echo 'Failed to recognize file format.'\nexit 1\n",
    );
    let (mut player, mut rx) = sh_player();

    player.play(&track).await.unwrap();
    assert_eq!(next_end(&mut rx).await.reason, ExitReason::BadFile);
}

#[tokio::test]
async fn quit_and_load_error_phrases_classify() {
    let dir = tempfile::tempdir().unwrap();
    let (mut player, mut rx) = sh_player();

    let quit = script(dir.path(), "quit", "echo 'Exiting... (Quit)'\n");
    player.play(&quit).await.unwrap();
    assert_eq!(next_end(&mut rx).await.reason, ExitReason::Quit);

    let nonstarter = script(
        dir.path(),
        "nonstarter",
        "echo 'Exiting... (Errors when loading file)'\n",
    );
    player.play(&nonstarter).await.unwrap();
    assert_eq!(next_end(&mut rx).await.reason, ExitReason::Nonstarter);
}

#[tokio::test]
async fn last_recognized_phrase_wins() {
    let dir = tempfile::tempdir().unwrap();
    let track = script(
        dir.path(),
        "track",
        "echo 'Failed to recognize file format.'\necho 'Exiting... (End of file)'\n",
    );
    let (mut player, mut rx) = sh_player();

    player.play(&track).await.unwrap();
    assert_eq!(next_end(&mut rx).await.reason, ExitReason::Finished);
}

#[tokio::test]
async fn starting_a_new_session_kills_and_awaits_the_old_one() {
    let dir = tempfile::tempdir().unwrap();
    let sleeper = script(dir.path(), "sleeper", "sleep 30\n");
    let quick = script(dir.path(), "quick", "echo 'Exiting... (End of file)'\n");
    let (mut player, mut rx) = sh_player();

    let started = Instant::now();
    player.play(&sleeper).await.unwrap();
    assert_eq!(player.playing(), Some(sleeper.as_path()));

    // must not take anywhere near the sleeper's 30s
    player.play(&quick).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    // the only completion is the quick track's; the killed one stays silent
    let end = next_end(&mut rx).await;
    assert_eq!(end.path, quick);
    assert_eq!(end.reason, ExitReason::Finished);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stop_kills_waits_and_emits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sleeper = script(dir.path(), "sleeper", "sleep 30\n");
    let (mut player, mut rx) = sh_player();

    let started = Instant::now();
    player.play(&sleeper).await.unwrap();
    player.stop().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(player.playing(), None);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn probe_accepts_when_the_player_stays_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let binary = stub_binary(dir.path(), "fake-player", "exit 0");
    let (tx, _rx) = mpsc::unbounded_channel();
    let player = Player::new(binary.to_string_lossy(), tx);

    assert!(player.probe(Path::new("/anything/at/all")).await);
}

#[tokio::test]
async fn probe_rejects_on_format_failure_output() {
    let dir = tempfile::tempdir().unwrap();
    let binary = stub_binary(
        dir.path(),
        "fake-player",
        "echo 'Failed to recognize file format.'",
    );
    let (tx, _rx) = mpsc::unbounded_channel();
    let player = Player::new(binary.to_string_lossy(), tx);

    assert!(!player.probe(Path::new("/anything/at/all")).await);
}

#[tokio::test]
async fn probe_rejects_when_the_binary_cannot_run() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let player = Player::new("/definitely/not/a/player", tx);

    assert!(!player.probe(Path::new("/anything")).await);
}

#[tokio::test]
async fn filter_playable_keeps_only_accepted_files() {
    let dir = tempfile::tempdir().unwrap();
    // probe passes the candidate as the fourth argument, after the three
    // output-disabling flags
    let binary = stub_binary(
        dir.path(),
        "fake-player",
        r#"case "$4" in *.good) ;; *) echo 'Failed to recognize file format.' ;; esac"#,
    );
    let (tx, _rx) = mpsc::unbounded_channel();
    let player = Player::new(binary.to_string_lossy(), tx);

    let good = dir.path().join("one.good");
    let bad = dir.path().join("two.bad");
    let kept = player.filter_playable(vec![good.clone(), bad]).await;
    assert_eq!(kept, vec![good]);
}
