//! Screen-facing state for the playlist.

use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::repository::{PlaylistWatch, VideosRepository};

/// What the view-model does with a failed refresh.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshErrorPolicy {
  /// Log at debug level and keep showing the cached playlist
  #[default]
  Silent,
  /// Publish the error on [`DevByteViewModel::refresh_error`]
  Surface,
}

/// Owns the playlist for one screen and every task started on its behalf.
///
/// Creating it starts exactly one refresh. Dropping it, or calling
/// [`clear`](Self::clear), cancels whatever is still running.
pub struct DevByteViewModel {
  repository: Arc<VideosRepository>,
  playlist: PlaylistWatch,
  policy: RefreshErrorPolicy,
  refresh_error: Arc<watch::Sender<Option<String>>>,
  tasks: JoinSet<()>,
}

impl DevByteViewModel {
  /// Must be called from within a tokio runtime.
  pub fn new(repository: VideosRepository, policy: RefreshErrorPolicy) -> Self {
    let playlist = repository.videos();
    let (refresh_error, _) = watch::channel(None);

    let mut view_model = Self {
      repository: Arc::new(repository),
      playlist,
      policy,
      refresh_error: Arc::new(refresh_error),
      tasks: JoinSet::new(),
    };
    view_model.refresh();
    view_model
  }

  /// The playlist to show on screen
  pub fn playlist(&self) -> PlaylistWatch {
    self.playlist.clone()
  }

  /// Last refresh failure, only ever set with [`RefreshErrorPolicy::Surface`].
  pub fn refresh_error(&self) -> watch::Receiver<Option<String>> {
    self.refresh_error.subscribe()
  }

  /// Start another refresh owned by this view-model.
  pub fn refresh(&mut self) {
    // Reap finished tasks so the set doesn't grow with every refresh
    while self.tasks.try_join_next().is_some() {}

    let repository = Arc::clone(&self.repository);
    let refresh_error = Arc::clone(&self.refresh_error);
    let policy = self.policy;

    self.tasks.spawn(async move {
      match repository.refresh_videos().await {
        Ok(()) => {
          refresh_error.send_replace(None);
        }
        Err(e) => match policy {
          RefreshErrorPolicy::Silent => {
            debug!(error = %e, "Playlist refresh failed, showing cached videos");
          }
          RefreshErrorPolicy::Surface => {
            warn!(error = %e, "Playlist refresh failed");
            refresh_error.send_replace(Some(e.to_string()));
          }
        },
      }
    });
  }

  /// Cancel every task started by this view-model.
  pub fn clear(&mut self) {
    self.tasks.abort_all();
  }
}

impl Drop for DevByteViewModel {
  fn drop(&mut self) {
    self.clear();
  }
}
