use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::VideosDatabase;
use crate::viewmodel::RefreshErrorPolicy;
use crate::work::Constraints;

pub const DEFAULT_BASE_URL: &str = "https://android-kotlin-fun-mars-server.appspot.com";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub network: NetworkConfig,
  #[serde(default)]
  pub database: DatabaseConfig,
  #[serde(default)]
  pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
  /// Server root; the playlist lives at `<base_url>/devbytes`
  pub base_url: String,
  pub timeout_secs: u64,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
  /// Cache file location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl DatabaseConfig {
  pub fn resolve_path(&self) -> Result<PathBuf> {
    match &self.path {
      Some(path) => Ok(path.clone()),
      None => VideosDatabase::default_path(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
  pub interval_hours: u64,
  pub initial_backoff_secs: u64,
  pub constraints: Constraints,
  /// What the playlist screen does with a failed refresh
  pub error_policy: RefreshErrorPolicy,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      interval_hours: 24,
      initial_backoff_secs: 30,
      constraints: Constraints::default(),
      error_policy: RefreshErrorPolicy::default(),
    }
  }
}

impl RefreshConfig {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_hours.max(1).saturating_mul(60 * 60))
  }

  pub fn initial_backoff(&self) -> Duration {
    Duration::from_secs(self.initial_backoff_secs.max(1))
  }
}

impl Config {
  /// Load configuration from file, falling back to defaults.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./devbytes.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/devbytes/config.yaml
  ///
  /// `DEVBYTES_BASE_URL` overrides `network.base_url` in every case.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(base_url) = std::env::var("DEVBYTES_BASE_URL") {
      config.network.base_url = base_url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("devbytes.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("devbytes").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_document_uses_defaults() {
    let config = Config::parse("{}").unwrap();

    assert_eq!(config.network.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.network.timeout_secs, 30);
    assert_eq!(config.database.path, None);
    assert_eq!(config.refresh.interval(), Duration::from_secs(24 * 60 * 60));
    assert_eq!(config.refresh.constraints, Constraints::default());
    assert_eq!(config.refresh.error_policy, RefreshErrorPolicy::Silent);
  }

  #[test]
  fn test_partial_sections() {
    let config = Config::parse(
      r#"
network:
  base_url: http://localhost:8080
database:
  path: /tmp/videos.db
refresh:
  interval_hours: 6
  error_policy: surface
  constraints:
    requires_charging: false
"#,
    )
    .unwrap();

    assert_eq!(config.network.base_url, "http://localhost:8080");
    assert_eq!(config.network.timeout_secs, 30);
    assert_eq!(
      config.database.resolve_path().unwrap(),
      PathBuf::from("/tmp/videos.db")
    );
    assert_eq!(config.refresh.interval(), Duration::from_secs(6 * 60 * 60));
    assert_eq!(config.refresh.error_policy, RefreshErrorPolicy::Surface);
    assert!(!config.refresh.constraints.requires_charging);
    assert!(config.refresh.constraints.requires_unmetered_network);
  }

  #[test]
  fn test_unknown_policy_is_rejected() {
    assert!(Config::parse("refresh:\n  error_policy: loud\n").is_err());
  }

  #[test]
  fn test_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("missing.yaml"))).is_err());
  }

  #[test]
  fn test_zero_interval_is_clamped() {
    let config = Config::parse("refresh:\n  interval_hours: 0\n").unwrap();
    assert_eq!(config.refresh.interval(), Duration::from_secs(60 * 60));
  }

  #[test]
  fn test_huge_interval_saturates() {
    let config = Config::parse("refresh:\n  interval_hours: 18446744073709551615\n").unwrap();
    assert_eq!(config.refresh.interval(), Duration::from_secs(u64::MAX));
  }
}
