//! Repository for fetching DevBytes videos from the network and keeping them
//! on disk.
//!
//! Readers observe the cache through [`PlaylistWatch`]; [`VideosRepository::refresh_videos`]
//! is the only way new data enters it.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::db::{as_domain_model, DatabaseVideo, VideosDatabase};
use crate::domain::Video;
use crate::network::PlaylistService;

pub struct VideosRepository {
  database: Arc<VideosDatabase>,
  network: Arc<dyn PlaylistService>,
}

impl VideosRepository {
  pub fn new(database: Arc<VideosDatabase>, network: Arc<dyn PlaylistService>) -> Self {
    Self { database, network }
  }

  /// A live view of the cached playlist.
  pub fn videos(&self) -> PlaylistWatch {
    PlaylistWatch {
      rx: self.database.video_dao().get_videos(),
      _database: Arc::clone(&self.database),
    }
  }

  /// Fetch the whole playlist and upsert it into the cache.
  ///
  /// The write only happens once the response has been received and decoded,
  /// so a failed fetch leaves the cache untouched. Concurrent calls are not
  /// deduplicated; the last write wins.
  pub async fn refresh_videos(&self) -> Result<()> {
    info!("Refreshing video playlist");

    let playlist = self.network.get_playlist().await?;
    let videos = playlist.as_database_model();
    let count = videos.len();

    let database = Arc::clone(&self.database);
    tokio::task::spawn_blocking(move || database.video_dao().insert_all(&videos))
      .await
      .map_err(|e| eyre!("Cache write task failed: {}", e))??;

    info!(count, "Video playlist refreshed");
    Ok(())
  }
}

/// Observable playlist, projected from the cached rows.
///
/// Holds the database alive, so the stream never ends while a watcher exists.
#[derive(Clone)]
pub struct PlaylistWatch {
  rx: watch::Receiver<Vec<DatabaseVideo>>,
  _database: Arc<VideosDatabase>,
}

impl PlaylistWatch {
  /// The latest playlist snapshot
  pub fn current(&self) -> Vec<Video> {
    as_domain_model(&self.rx.borrow())
  }

  /// Wait for the next write and return the new snapshot.
  pub async fn changed(&mut self) -> Option<Vec<Video>> {
    self.rx.changed().await.ok()?;
    Some(as_domain_model(&self.rx.borrow_and_update()))
  }
}
