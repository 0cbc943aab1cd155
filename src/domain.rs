/// A DevByte video that can be played.
///
/// `updated` is an opaque freshness stamp from the server and is never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
  pub url: String,
  pub title: String,
  pub description: String,
  pub thumbnail: String,
  pub updated: String,
  pub closed_captions: Option<String>,
}

impl Video {
  /// Short description suitable for a single list row
  pub fn short_description(&self) -> &str {
    self.description.lines().next().unwrap_or("").trim()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn video(description: &str) -> Video {
    Video {
      url: "https://example.com/v".to_string(),
      title: "Title".to_string(),
      description: description.to_string(),
      thumbnail: "https://example.com/t.png".to_string(),
      updated: "2018-06-07T17:09:43+00:00".to_string(),
      closed_captions: None,
    }
  }

  #[test]
  fn test_short_description_first_line() {
    assert_eq!(video("  first line \nsecond").short_description(), "first line");
  }

  #[test]
  fn test_short_description_empty() {
    assert_eq!(video("").short_description(), "");
  }
}
