//! Native host for the terminal front-end
//!
//! Object URLs are `blob:kitcheneye/<uuid>` keys into an in-memory registry.
//! The camera is a still-frame source on disk: opening it decodes the file,
//! capturing re-encodes the frame as JPEG at the surface size.

use super::{CameraStream, EncodedImage, MediaHost, ObjectUrl, SelectedFile, CAPTURE_MEDIA_TYPE};
use crate::error::HostError;
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

const URL_PREFIX: &str = "blob:kitcheneye/";
const JPEG_QUALITY: u8 = 90;
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Host backed by local files and an in-process URL registry
pub struct NativeHost {
    frame_source: Option<PathBuf>,
    default_frame_size: (u32, u32),
    urls: Mutex<HashMap<String, EncodedImage>>,
    streams: Mutex<HashMap<Uuid, DynamicImage>>,
}

impl NativeHost {
    /// `frame_source` is the still image served as the live camera feed;
    /// `None` makes every camera request fail as unavailable.
    pub fn new(frame_source: Option<PathBuf>, default_frame_size: (u32, u32)) -> Self {
        Self {
            frame_source,
            default_frame_size,
            urls: Mutex::new(HashMap::new()),
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Number of URLs minted and not yet revoked
    pub fn live_url_count(&self) -> usize {
        lock(&self.urls).len()
    }

    /// Number of camera streams not yet stopped
    pub fn live_stream_count(&self) -> usize {
        lock(&self.streams).len()
    }
}

/// Poisoning only means another thread panicked mid-update; the maps stay usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl MediaHost for NativeHost {
    async fn open_camera(&self) -> Result<CameraStream, HostError> {
        let path = self
            .frame_source
            .as_ref()
            .ok_or_else(|| HostError::Unavailable("no camera frame source configured".to_string()))?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            HostError::Unavailable(format!("frame source {}: {}", path.display(), e))
        })?;
        let frame = image::load_from_memory(&bytes).map_err(|e| {
            HostError::Unavailable(format!("frame source {} is not an image: {}", path.display(), e))
        })?;

        let stream = CameraStream {
            id: Uuid::new_v4(),
            label: path.display().to_string(),
            width: frame.width(),
            height: frame.height(),
        };
        lock(&self.streams).insert(stream.id, frame);

        info!(stream_id = %stream.id, width = stream.width, height = stream.height, "Camera stream opened");
        Ok(stream)
    }

    fn capture_still(&self, stream: &CameraStream) -> Result<EncodedImage, HostError> {
        let frame = lock(&self.streams)
            .get(&stream.id)
            .cloned()
            .ok_or_else(|| HostError::Capture("camera stream is not live".to_string()))?;

        let (width, height) = if stream.width == 0 || stream.height == 0 {
            self.default_frame_size
        } else {
            (stream.width, stream.height)
        };
        let frame = if frame.width() != width || frame.height() != height {
            frame.resize_exact(width, height, FilterType::Triangle)
        } else {
            frame
        };

        let rgb = frame.to_rgb8();
        let mut buf = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
            .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| HostError::Capture(e.to_string()))?;

        debug!(stream_id = %stream.id, bytes = buf.len(), "Captured still frame");
        Ok(EncodedImage::new(buf, CAPTURE_MEDIA_TYPE))
    }

    fn stop_camera(&self, stream: &CameraStream) {
        if lock(&self.streams).remove(&stream.id).is_some() {
            info!(stream_id = %stream.id, "Camera stream stopped");
        }
    }

    fn create_object_url(&self, image: &EncodedImage) -> ObjectUrl {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        lock(&self.urls).insert(url.clone(), image.clone());
        debug!(url = %url, bytes = image.bytes.len(), "Minted object URL");
        ObjectUrl::new(url)
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        if lock(&self.urls).remove(url.as_str()).is_some() {
            debug!(url = %url, "Revoked object URL");
        }
    }

    fn resolve_object_url(&self, url: &ObjectUrl) -> Option<EncodedImage> {
        lock(&self.urls).get(url.as_str()).cloned()
    }
}

/// Read a local file as a user selection
///
/// The media type is sniffed from the content signature.
pub fn load_file(path: &Path) -> Result<SelectedFile, HostError> {
    let bytes = std::fs::read(path)
        .map_err(|e| HostError::Io(format!("{}: {}", path.display(), e)))?;

    let media_type = match infer::get(&bytes) {
        Some(kind) => kind.mime_type().to_string(),
        None => {
            warn!(path = %path.display(), "Unknown file signature");
            FALLBACK_MEDIA_TYPE.to_string()
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(SelectedFile::new(name, media_type, bytes))
}
