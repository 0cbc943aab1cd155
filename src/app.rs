use chrono::Utc;
use color_eyre::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::db::VideosDatabase;
use crate::network::{DevByteClient, PlaylistService};
use crate::repository::VideosRepository;
use crate::ui;
use crate::viewmodel::DevByteViewModel;
use crate::work::{
  ExistingPeriodicWorkPolicy, PeriodicWorkRequest, RefreshDataWork, WorkManager, WorkResult,
};

/// Composition root: wires the network client, the shared database and the
/// background refresh work together.
pub struct DevByteApplication {
  config: Config,
  database_path: PathBuf,
  network: Arc<dyn PlaylistService>,
  work_manager: Arc<WorkManager>,
}

impl DevByteApplication {
  pub fn new(config: Config) -> Result<Self> {
    let database_path = config.database.resolve_path()?;
    let client = DevByteClient::new(&config.network)?;
    info!(endpoint = %client.endpoint(), "Using playlist server");

    Ok(Self {
      config,
      database_path,
      network: Arc::new(client),
      work_manager: Arc::new(WorkManager::new()),
    })
  }

  /// Schedule the recurring refresh without holding up startup. The first
  /// run waits `first_run_in`.
  pub fn delayed_init(&self, first_run_in: Duration) {
    let work_manager = Arc::clone(&self.work_manager);
    let worker = Arc::new(self.refresh_work());
    let request = self.refresh_request().with_initial_delay(first_run_in);

    tokio::spawn(async move {
      if let Err(e) = work_manager.enqueue_unique_periodic_work(
        RefreshDataWork::WORK_NAME,
        ExistingPeriodicWorkPolicy::Keep,
        request,
        worker,
      ) {
        error!(error = ?e, "Failed to schedule playlist refresh");
      }
    });
  }

  /// Show the playlist, redrawing on every change, until Ctrl-C.
  pub async fn watch(&self) -> Result<()> {
    // The view-model refreshes on open, so the scheduler starts a period later
    self.delayed_init(self.config.refresh.interval());

    let database = VideosDatabase::instance(&self.database_path)?;
    let repository = VideosRepository::new(database, Arc::clone(&self.network));
    let mut view_model = DevByteViewModel::new(repository, self.config.refresh.error_policy);

    let mut playlist = view_model.playlist();
    let mut refresh_error = view_model.refresh_error();
    print_screen(&ui::render_playlist(&playlist.current()))?;

    loop {
      tokio::select! {
        videos = playlist.changed() => match videos {
          Some(videos) => print_screen(&ui::render_playlist(&videos))?,
          None => break,
        },
        changed = refresh_error.changed() => {
          if changed.is_err() {
            break;
          }
          let message = refresh_error.borrow_and_update().clone();
          if let Some(message) = message {
            print_screen(&format!("Refresh failed: {}\n", message))?;
          }
        },
        _ = tokio::signal::ctrl_c() => break,
      }
    }

    view_model.clear();
    self.work_manager.shutdown();
    Ok(())
  }

  /// Run the refresh job once, as the scheduler would.
  pub async fn refresh_once(&self) -> Result<WorkResult> {
    self.refresh_work().run().await
  }

  /// Keep the refresh schedule running until Ctrl-C.
  pub async fn run_daemon(&self) -> Result<()> {
    let first_run_in = self
      .refresh_work()
      .due_in(self.config.refresh.interval(), Utc::now());
    self.delayed_init(first_run_in);
    info!("Refresh scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    self.work_manager.shutdown();
    info!("Refresh scheduler stopped");
    Ok(())
  }

  fn refresh_work(&self) -> RefreshDataWork {
    RefreshDataWork::new(self.database_path.clone(), Arc::clone(&self.network))
  }

  fn refresh_request(&self) -> PeriodicWorkRequest {
    let refresh = &self.config.refresh;
    PeriodicWorkRequest::new(refresh.interval())
      .with_constraints(refresh.constraints)
      .with_initial_backoff(refresh.initial_backoff())
  }
}

fn print_screen(text: &str) -> Result<()> {
  let mut stdout = std::io::stdout().lock();
  stdout.write_all(text.as_bytes())?;
  stdout.flush()?;
  Ok(())
}
