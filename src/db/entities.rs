use rusqlite::Row;

use crate::domain::Video;

/// A row of `video_database_table`, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseVideo {
  pub url: String,
  pub updated: String,
  pub title: String,
  pub description: String,
  pub thumbnail: String,
  pub closed_captions: Option<String>,
}

impl DatabaseVideo {
  pub(super) const COLUMNS: &'static str =
    "url, updated, title, description, thumbnail, closed_captions";

  pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      url: row.get(0)?,
      updated: row.get(1)?,
      title: row.get(2)?,
      description: row.get(3)?,
      thumbnail: row.get(4)?,
      closed_captions: row.get(5)?,
    })
  }
}

impl From<&DatabaseVideo> for Video {
  fn from(row: &DatabaseVideo) -> Self {
    Video {
      url: row.url.clone(),
      title: row.title.clone(),
      description: row.description.clone(),
      thumbnail: row.thumbnail.clone(),
      updated: row.updated.clone(),
      closed_captions: row.closed_captions.clone(),
    }
  }
}

/// Convert database rows to domain objects, keeping their order.
pub fn as_domain_model(rows: &[DatabaseVideo]) -> Vec<Video> {
  rows.iter().map(Video::from).collect()
}
