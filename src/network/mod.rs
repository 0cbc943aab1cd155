//! Network access to the DevBytes playlist.

mod api_types;
mod client;

pub use api_types::{parse_playlist, NetworkVideo, NetworkVideoContainer};
pub use client::{DevByteClient, NetworkError, PlaylistService};
