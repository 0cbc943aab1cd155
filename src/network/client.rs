use color_eyre::{
  eyre::{eyre, WrapErr},
  Result,
};
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::NetworkConfig;

use super::api_types::{parse_playlist, NetworkVideoContainer};

/// Transport-level failure while talking to the playlist server.
///
/// Decode failures are not represented here; they surface as
/// `serde_json::Error` so callers can tell the two apart.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },
  #[error("{url} returned HTTP {status}")]
  Status {
    url: String,
    status: reqwest::StatusCode,
  },
}

/// Source of the full DevBytes playlist.
pub trait PlaylistService: Send + Sync {
  /// Fetch the whole playlist in one request.
  fn get_playlist(&self) -> BoxFuture<'_, Result<NetworkVideoContainer>>;
}

/// HTTP client for the DevBytes server
#[derive(Clone)]
pub struct DevByteClient {
  http: reqwest::Client,
  endpoint: Url,
}

impl DevByteClient {
  pub fn new(config: &NetworkConfig) -> Result<Self> {
    let endpoint = playlist_endpoint(&config.base_url)?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .gzip(true)
      .deflate(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, endpoint })
  }

  /// The resolved playlist URL
  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  async fn fetch_playlist(&self) -> Result<NetworkVideoContainer> {
    let url = self.endpoint.to_string();
    debug!(%url, "Fetching playlist");

    let response = self
      .http
      .get(self.endpoint.clone())
      .send()
      .await
      .map_err(|source| NetworkError::Request {
        url: url.clone(),
        source,
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(NetworkError::Status { url, status }.into());
    }

    let body = response
      .bytes()
      .await
      .map_err(|source| NetworkError::Request {
        url: url.clone(),
        source,
      })?;

    let playlist =
      parse_playlist(&body).wrap_err_with(|| format!("Failed to decode playlist from {}", url))?;

    Ok(playlist)
  }
}

impl PlaylistService for DevByteClient {
  fn get_playlist(&self) -> BoxFuture<'_, Result<NetworkVideoContainer>> {
    self.fetch_playlist().boxed()
  }
}

/// Resolve `<base>/devbytes`, tolerating a base with or without a trailing slash.
fn playlist_endpoint(base_url: &str) -> Result<Url> {
  let mut base = base_url.trim().to_string();
  if !base.ends_with('/') {
    base.push('/');
  }

  Url::parse(&base)
    .and_then(|url| url.join("devbytes"))
    .map_err(|e| eyre!("Invalid playlist base URL '{}': {}", base_url, e))
}
