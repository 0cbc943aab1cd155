//! Data access for the cached video table.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

use super::entities::DatabaseVideo;

/// Access to `video_database_table`.
///
/// Every successful write republishes the full row-set to all subscribers of
/// [`VideoDao::get_videos`], so readers never have to poll.
pub struct VideoDao {
  conn: Mutex<Connection>,
  videos: watch::Sender<Vec<DatabaseVideo>>,
}

impl VideoDao {
  pub(super) fn new(conn: Connection) -> Result<Self> {
    let current = select_all(&conn)?;
    let (videos, _) = watch::channel(current);

    Ok(Self {
      conn: Mutex::new(conn),
      videos,
    })
  }

  /// Subscribe to all cached videos in insertion order.
  ///
  /// The receiver starts with the current rows and sees every later write.
  pub fn get_videos(&self) -> watch::Receiver<Vec<DatabaseVideo>> {
    self.videos.subscribe()
  }

  /// Insert or replace a batch of videos by `url`, as one transaction.
  ///
  /// A replaced row takes every column from the new value. If any statement
  /// fails nothing is written and subscribers are not notified.
  pub fn insert_all(&self, videos: &[DatabaseVideo]) -> Result<()> {
    if videos.is_empty() {
      return Ok(());
    }

    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    {
      let mut stmt = tx
        .prepare_cached(
          "INSERT OR REPLACE INTO video_database_table
             (url, updated, title, description, thumbnail, closed_captions)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(|e| eyre!("Failed to prepare insert: {}", e))?;

      for video in videos {
        stmt
          .execute(params![
            video.url,
            video.updated,
            video.title,
            video.description,
            video.thumbnail,
            video.closed_captions,
          ])
          .map_err(|e| eyre!("Failed to store video {}: {}", video.url, e))?;
      }
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    // Publish while still holding the lock so snapshots follow commit order.
    let snapshot = select_all(&conn)?;
    debug!(rows = snapshot.len(), "Publishing cached videos");
    self.videos.send_replace(snapshot);

    Ok(())
  }
}

fn select_all(conn: &Connection) -> Result<Vec<DatabaseVideo>> {
  let mut stmt = conn
    .prepare_cached(&format!(
      "SELECT {} FROM video_database_table ORDER BY rowid",
      DatabaseVideo::COLUMNS
    ))
    .map_err(|e| eyre!("Failed to prepare video query: {}", e))?;

  let videos = stmt
    .query_map([], DatabaseVideo::from_row)
    .map_err(|e| eyre!("Failed to query videos: {}", e))?
    .collect::<rusqlite::Result<Vec<_>>>()
    .map_err(|e| eyre!("Failed to read video row: {}", e))?;

  Ok(videos)
}
