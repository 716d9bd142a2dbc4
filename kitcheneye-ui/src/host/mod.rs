//! Host environment capabilities
//!
//! Everything the workflow needs from the platform it runs in: camera
//! access, still-frame capture, and minting/revoking displayable URLs for
//! binary image data. The controller only talks to [`MediaHost`], so the
//! same workflow runs against the native host, a browser binding, or a test
//! double.

pub mod native;

use crate::error::HostError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use native::{load_file, NativeHost};

/// Media type produced by frame capture
pub const CAPTURE_MEDIA_TYPE: &str = "image/jpeg";

/// Revocable URL under which the host serves a blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a live camera stream
///
/// `width`/`height` are the dimensions reported by the video surface; zero
/// means the surface has not reported any yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraStream {
    pub id: Uuid,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Encoded image bytes plus their media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Arc<[u8]>,
    pub media_type: String,
}

impl EncodedImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    /// File extension matching the media type, for writing to disk
    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

/// A file chosen by the user (picker or drag-and-drop)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// `"<name> (<size> KB)"` line shown under the upload area
    pub fn info_line(&self) -> String {
        format!("{} ({:.2} KB)", self.name, self.bytes.len() as f64 / 1024.0)
    }
}

/// Platform capabilities consumed by the workflow
///
/// Release operations (`stop_camera`, `revoke_object_url`) must be
/// infallible and idempotent.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Request camera access; resolves on grant or denial
    async fn open_camera(&self) -> Result<CameraStream, HostError>;

    /// Snapshot the current frame of a live stream as a JPEG still
    fn capture_still(&self, stream: &CameraStream) -> Result<EncodedImage, HostError>;

    /// Stop every track of the stream
    fn stop_camera(&self, stream: &CameraStream);

    /// Mint a displayable URL for the bytes
    fn create_object_url(&self, image: &EncodedImage) -> ObjectUrl;

    /// Revoke a URL minted by [`MediaHost::create_object_url`]
    fn revoke_object_url(&self, url: &ObjectUrl);

    /// Bytes behind a live URL; `None` once revoked
    fn resolve_object_url(&self, url: &ObjectUrl) -> Option<EncodedImage>;
}
