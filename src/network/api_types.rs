//! Serde types matching the DevBytes playlist response.
//!
//! These are kept apart from the domain and database types so that the wire
//! format can change without touching the rest of the application. Convert
//! them with [`NetworkVideoContainer::as_database_model`] before use.

use serde::{Deserialize, Serialize};

use crate::db::DatabaseVideo;
use crate::domain::Video;

/// First level of the network result:
///
/// ```json
/// { "videos": [] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkVideoContainer {
  pub videos: Vec<NetworkVideo>,
}

/// A devbyte that can be played.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkVideo {
  pub title: String,
  pub description: String,
  pub url: String,
  pub updated: String,
  pub thumbnail: String,
  #[serde(rename = "closedCaptions", default)]
  pub closed_captions: Option<String>,
}

impl NetworkVideoContainer {
  /// Convert network results to domain objects, preserving order.
  #[cfg(test)]
  pub fn as_domain_model(&self) -> Vec<Video> {
    self
      .videos
      .iter()
      .map(|video| Video {
        url: video.url.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        thumbnail: video.thumbnail.clone(),
        updated: video.updated.clone(),
        closed_captions: video.closed_captions.clone(),
      })
      .collect()
  }

  /// Convert network results to database rows, preserving order.
  pub fn as_database_model(&self) -> Vec<DatabaseVideo> {
    self
      .videos
      .iter()
      .map(|video| DatabaseVideo {
        url: video.url.clone(),
        updated: video.updated.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        thumbnail: video.thumbnail.clone(),
        closed_captions: video.closed_captions.clone(),
      })
      .collect()
  }
}

/// Decode a raw playlist body.
pub fn parse_playlist(body: &[u8]) -> serde_json::Result<NetworkVideoContainer> {
  serde_json::from_slice(body)
}

#[cfg(test)]
mod tests {
  use super::*;

  const PLAYLIST: &str = r#"{
    "videos": [
      {
        "title": "Android Jetpack: EmojiCompat",
        "description": "With EmojiCompat you can display emoji.",
        "url": "https://www.youtube.com/watch?v=sYGKUtM2ga8",
        "updated": "2018-06-07T17:09:43+00:00",
        "thumbnail": "https://i4.ytimg.com/vi/sYGKUtM2ga8/hqdefault.jpg",
        "closedCaptions": null
      },
      {
        "title": "Android Jetpack: Slices",
        "description": "Slices are UI templates.",
        "url": "https://www.youtube.com/watch?v=3PzyxI4Q2I4",
        "updated": "2018-06-06T12:00:00+00:00",
        "thumbnail": "https://i4.ytimg.com/vi/3PzyxI4Q2I4/hqdefault.jpg",
        "closedCaptions": "https://example.com/captions.vtt"
      }
    ]
  }"#;

  #[test]
  fn test_parse_and_map_preserves_order_and_fields() {
    let container = parse_playlist(PLAYLIST.as_bytes()).unwrap();
    let videos = container.as_domain_model();

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].title, "Android Jetpack: EmojiCompat");
    assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=sYGKUtM2ga8");
    assert_eq!(videos[0].updated, "2018-06-07T17:09:43+00:00");
    assert_eq!(videos[0].closed_captions, None);
    assert_eq!(videos[1].title, "Android Jetpack: Slices");
    assert_eq!(
      videos[1].closed_captions.as_deref(),
      Some("https://example.com/captions.vtt")
    );
  }

  #[test]
  fn test_database_model_matches_domain_model() {
    let container = parse_playlist(PLAYLIST.as_bytes()).unwrap();
    let rows = container.as_database_model();
    let videos = container.as_domain_model();

    assert_eq!(rows.len(), videos.len());
    for (row, video) in rows.iter().zip(&videos) {
      assert_eq!(Video::from(row), *video);
    }
  }

  #[test]
  fn test_reencoding_yields_equivalent_payload() {
    let container = parse_playlist(PLAYLIST.as_bytes()).unwrap();
    let original: serde_json::Value = serde_json::from_str(PLAYLIST).unwrap();

    assert_eq!(serde_json::to_value(&container).unwrap(), original);
  }

  #[test]
  fn test_missing_closed_captions_is_none() {
    let body = br#"{"videos":[{"title":"A","description":"d","url":"u1","updated":"1","thumbnail":"t"}]}"#;
    let container = parse_playlist(body).unwrap();

    assert_eq!(container.videos[0].closed_captions, None);
  }

  #[test]
  fn test_empty_playlist() {
    let container = parse_playlist(br#"{"videos":[]}"#).unwrap();
    assert!(container.as_domain_model().is_empty());
  }

  #[test]
  fn test_malformed_payload_is_error() {
    assert!(parse_playlist(br#"{"videos":[{"title":"A"}]}"#).is_err());
    assert!(parse_playlist(b"<html>").is_err());
  }
}
