mod app;
mod config;
mod db;
mod domain;
mod logging;
mod network;
mod repository;
mod ui;
mod viewmodel;
mod work;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::work::WorkResult;

#[derive(Parser, Debug)]
#[command(name = "devbytes")]
#[command(about = "Offline-first DevBytes video playlist")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/devbytes/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Path to the video cache database
  #[arg(short, long, global = true)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
  /// Show the cached playlist and refresh it in the background (default)
  Watch,
  /// Refresh the cache once and report the job outcome
  Refresh,
  /// Run the daily refresh schedule until interrupted
  Daemon,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();
  let command = args.command.unwrap_or(Command::Watch);

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override database if specified on command line
  if let Some(database) = args.database {
    config.database.path = Some(database);
  }

  let _log_guard = logging::init(&db::data_dir()?.join("logs"), command != Command::Watch)?;

  let app = app::DevByteApplication::new(config)?;

  match command {
    Command::Watch => app.watch().await?,
    Command::Refresh => match app.refresh_once().await? {
      WorkResult::Success => println!("Playlist refreshed"),
      WorkResult::Retry => {
        println!("Playlist server unreachable, try again later");
        return Ok(ExitCode::from(75));
      }
    },
    Command::Daemon => app.run_daemon().await?,
  }

  Ok(ExitCode::SUCCESS)
}
