// mplaylist - tabbed m3u playlists in the terminal
// Keeps playlists as plain files, hands the actual playing to mpv, and
// advances the queue when mpv reports the end of a file.

use anyhow::Result;
use clap::Parser;
use mplaylist::{ui::App, Config};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mplaylist")]
#[command(about = "A tabbed m3u playlist manager that plays through mpv")]
struct Args {
    /// Enable developer logging (keep stderr noisy)
    #[arg(long)]
    dev: bool,

    /// Use this directory for config and playlists instead of the default
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Player binary to launch (overrides config.toml)
    #[arg(long)]
    player: Option<String>,
}

fn init_logging(log_dir: &std::path::Path, dev: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender; the terminal itself is busy being a UI
    let file_appender = tracing_appender::rolling::daily(log_dir, "mplaylist.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mplaylist=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("dev mode: logs in {}", log_dir.display());
    }

    // Keep the appender guard alive for the life of the process
    std::mem::forget(guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config_dir.as_deref())?;
    if let Some(player) = args.player {
        config.player_binary = player;
    }

    init_logging(&config.log_dir(), args.dev)?;
    info!("mplaylist starting, playlists in {}", config.playlist_dir().display());

    let mut app = App::new(config)?;
    app.run().await?;

    info!("clean shutdown");
    Ok(())
}
