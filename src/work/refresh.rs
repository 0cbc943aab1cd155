use chrono::{DateTime, Utc};
use color_eyre::{
  eyre::{eyre, Report},
  Result,
};
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::db::VideosDatabase;
use crate::network::{NetworkError, PlaylistService};
use crate::repository::VideosRepository;

use super::{WorkResult, Worker};

/// Pre-fetches the playlist in the background so the cache is fresh the
/// next time the playlist is opened.
pub struct RefreshDataWork {
  database_path: PathBuf,
  network: Arc<dyn PlaylistService>,
}

impl RefreshDataWork {
  /// Unique name the work is registered under.
  pub const WORK_NAME: &'static str = "RefreshDataWorker";

  pub fn new(database_path: PathBuf, network: Arc<dyn PlaylistService>) -> Self {
    Self {
      database_path,
      network,
    }
  }

  /// Sync the cache with the network.
  ///
  /// Transport failures ask the scheduler for a retry; any other failure is
  /// returned as an error.
  pub async fn run(&self) -> Result<WorkResult> {
    let database = VideosDatabase::instance(&self.database_path)?;
    let repository = VideosRepository::new(database, Arc::clone(&self.network));

    match repository.refresh_videos().await {
      Ok(()) => {
        if let Err(e) = self.record_success(Utc::now()) {
          warn!(error = %e, "Playlist refreshed but the run was not recorded");
        }
        Ok(WorkResult::Success)
      }
      Err(e) if is_transport_failure(&e) => {
        warn!(error = %e, "Playlist fetch failed, asking for retry");
        Ok(WorkResult::Retry)
      }
      Err(e) => Err(e),
    }
  }

  /// When the job last synced the cache, as recorded beside the database.
  pub fn last_success(&self) -> Option<DateTime<Utc>> {
    let stamp = std::fs::read_to_string(self.stamp_path()).ok()?;
    DateTime::parse_from_rfc3339(stamp.trim())
      .ok()
      .map(|t| t.with_timezone(&Utc))
  }

  /// Time left until the next run is due, zero if it never succeeded.
  pub fn due_in(&self, interval: Duration, now: DateTime<Utc>) -> Duration {
    time_until_due(self.last_success(), interval, now)
  }

  fn record_success(&self, at: DateTime<Utc>) -> Result<()> {
    std::fs::write(self.stamp_path(), at.to_rfc3339())
      .map_err(|e| eyre!("Failed to record refresh time: {}", e))
  }

  fn stamp_path(&self) -> PathBuf {
    let mut path = self.database_path.clone().into_os_string();
    path.push(".last-refresh");
    PathBuf::from(path)
  }
}

fn time_until_due(
  last_success: Option<DateTime<Utc>>,
  interval: Duration,
  now: DateTime<Utc>,
) -> Duration {
  let Some(last) = last_success else {
    return Duration::ZERO;
  };
  // A stamp in the future counts as a run just now
  let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
  interval.saturating_sub(elapsed)
}

impl Worker for RefreshDataWork {
  fn do_work(&self) -> BoxFuture<'_, Result<WorkResult>> {
    self.run().boxed()
  }
}

fn is_transport_failure(report: &Report) -> bool {
  report.chain().any(|cause| cause.is::<NetworkError>())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::shared_test_path;
  use crate::repository::tests::{Canned, FakePlaylistService, PLAYLIST_A};
  use color_eyre::eyre::{eyre, WrapErr};

  #[tokio::test]
  async fn test_success() {
    let work = RefreshDataWork::new(
      shared_test_path(),
      FakePlaylistService::new(vec![Canned::Body(PLAYLIST_A)]),
    );

    assert_eq!(work.run().await.unwrap(), WorkResult::Success);

    let database = VideosDatabase::instance(&shared_test_path()).unwrap();
    let videos = database.video_dao().get_videos().borrow().clone();
    assert!(videos.iter().any(|v| v.url == "u1"));
    assert!(work.last_success().is_some());
  }

  #[test]
  fn test_recorded_run_delays_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let work = RefreshDataWork::new(
      dir.path().join("videos.db"),
      FakePlaylistService::new(vec![Canned::Unavailable]),
    );
    let day = Duration::from_secs(24 * 60 * 60);
    let now = Utc::now();

    assert_eq!(work.due_in(day, now), Duration::ZERO);

    work.record_success(now - chrono::Duration::hours(6)).unwrap();
    let due_in = work.due_in(day, now);
    assert!(due_in <= Duration::from_secs(18 * 60 * 60));
    assert!(due_in > Duration::from_secs(18 * 60 * 60 - 5));
  }

  #[test]
  fn test_time_until_due() {
    let day = Duration::from_secs(24 * 60 * 60);
    let now = Utc::now();

    assert_eq!(time_until_due(None, day, now), Duration::ZERO);
    assert_eq!(
      time_until_due(Some(now - chrono::Duration::days(2)), day, now),
      Duration::ZERO
    );
    assert_eq!(
      time_until_due(Some(now + chrono::Duration::hours(1)), day, now),
      day
    );
  }

  #[tokio::test]
  async fn test_transport_failure_is_retry() {
    let work = RefreshDataWork::new(
      shared_test_path(),
      FakePlaylistService::new(vec![Canned::Unavailable]),
    );

    assert_eq!(work.do_work().await.unwrap(), WorkResult::Retry);
  }

  #[tokio::test]
  async fn test_decode_failure_is_fault() {
    let work = RefreshDataWork::new(
      shared_test_path(),
      FakePlaylistService::new(vec![Canned::Body("not json")]),
    );

    assert!(work.run().await.is_err());
  }

  #[test]
  fn test_wrapped_transport_failure_is_detected() {
    let report = Err::<(), _>(NetworkError::Status {
      url: "http://fake/devbytes".to_string(),
      status: reqwest::StatusCode::BAD_GATEWAY,
    })
    .wrap_err("Failed to refresh")
    .unwrap_err();

    assert!(is_transport_failure(&report));
    assert!(!is_transport_failure(&eyre!("disk full")));
  }
}
