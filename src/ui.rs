//! Plain-text rendering of the playlist for the terminal.

use crate::domain::Video;

const TITLE_WIDTH: usize = 48;

/// Render one line per video: title, then url, then the first line of the
/// description.
pub fn render_playlist(videos: &[Video]) -> String {
  if videos.is_empty() {
    return "No videos cached yet.\n".to_string();
  }

  let mut out = format!("{} video(s)\n", videos.len());
  for video in videos {
    out.push_str(&format!(
      "  {:<width$}  {}\n",
      truncate(&video.title, TITLE_WIDTH),
      video.url,
      width = TITLE_WIDTH
    ));
    let description = video.short_description();
    if !description.is_empty() {
      out.push_str(&format!("    {}\n", truncate(description, 76)));
    }
  }
  out
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn video(title: &str, description: &str) -> Video {
    Video {
      url: "u1".to_string(),
      title: title.to_string(),
      description: description.to_string(),
      thumbnail: "t".to_string(),
      updated: "1".to_string(),
      closed_captions: None,
    }
  }

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ééééééé", 5), "éé...");
  }

  #[test]
  fn test_render_empty_playlist() {
    assert_eq!(render_playlist(&[]), "No videos cached yet.\n");
  }

  #[test]
  fn test_render_lists_each_video() {
    let out = render_playlist(&[video("A", "first\nsecond"), video("B", "")]);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "2 video(s)");
    assert!(lines[1].trim_start().starts_with('A'));
    assert!(lines[1].ends_with("u1"));
    assert_eq!(lines[2], "    first");
    assert!(lines[3].trim_start().starts_with('B'));
    assert_eq!(lines.len(), 4);
  }
}
