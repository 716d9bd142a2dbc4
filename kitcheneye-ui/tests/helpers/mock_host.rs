//! Recording MediaHost double
//!
//! Tracks every URL minted/revoked and every stream started/stopped so tests
//! can assert that nothing leaks.

use async_trait::async_trait;
use kitcheneye_ui::error::HostError;
use kitcheneye_ui::host::{CameraStream, EncodedImage, MediaHost, ObjectUrl};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

pub const CAPTURED_BYTES: &[u8] = b"captured-frame";

pub struct MockHost {
    grant_camera: AtomicBool,
    capture_fails: AtomicBool,
    camera_delay: Mutex<Duration>,
    next_url: AtomicUsize,
    urls: Mutex<HashMap<ObjectUrl, EncodedImage>>,
    minted: Mutex<Vec<ObjectUrl>>,
    revoked: Mutex<Vec<ObjectUrl>>,
    started: Mutex<Vec<CameraStream>>,
    stopped: Mutex<Vec<Uuid>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            grant_camera: AtomicBool::new(true),
            capture_fails: AtomicBool::new(false),
            camera_delay: Mutex::new(Duration::ZERO),
            next_url: AtomicUsize::new(1),
            urls: Mutex::new(HashMap::new()),
            minted: Mutex::new(Vec::new()),
            revoked: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
        }
    }

    /// Host whose camera permission prompt is always refused
    pub fn denying() -> Self {
        let host = Self::new();
        host.grant_camera.store(false, Ordering::SeqCst);
        host
    }

    pub fn set_capture_fails(&self, fails: bool) {
        self.capture_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_camera_delay(&self, delay: Duration) {
        *self.camera_delay.lock().unwrap() = delay;
    }

    pub fn minted(&self) -> Vec<ObjectUrl> {
        self.minted.lock().unwrap().clone()
    }

    pub fn revoked(&self) -> Vec<ObjectUrl> {
        self.revoked.lock().unwrap().clone()
    }

    pub fn live_url_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn started_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    /// Bytes behind a live URL
    pub fn resolve_object_url_bytes(&self, url: &ObjectUrl) -> Option<Vec<u8>> {
        self.urls
            .lock()
            .unwrap()
            .get(url)
            .map(|image| image.bytes.to_vec())
    }

    /// Streams started and not yet stopped
    pub fn live_stream_count(&self) -> usize {
        let stopped = self.stopped.lock().unwrap();
        self.started
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !stopped.contains(&s.id))
            .count()
    }
}

#[async_trait]
impl MediaHost for MockHost {
    async fn open_camera(&self) -> Result<CameraStream, HostError> {
        let delay = *self.camera_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if !self.grant_camera.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied("user dismissed prompt".to_string()));
        }

        let stream = CameraStream {
            id: Uuid::new_v4(),
            label: "mock camera".to_string(),
            width: 4,
            height: 3,
        };
        self.started.lock().unwrap().push(stream.clone());
        Ok(stream)
    }

    fn capture_still(&self, stream: &CameraStream) -> Result<EncodedImage, HostError> {
        if self.capture_fails.load(Ordering::SeqCst) {
            return Err(HostError::Capture("encoder unavailable".to_string()));
        }
        if self.stopped.lock().unwrap().contains(&stream.id) {
            return Err(HostError::Unavailable("stream stopped".to_string()));
        }
        Ok(EncodedImage::new(CAPTURED_BYTES.to_vec(), "image/jpeg"))
    }

    fn stop_camera(&self, stream: &CameraStream) {
        let mut stopped = self.stopped.lock().unwrap();
        if !stopped.contains(&stream.id) {
            stopped.push(stream.id);
        }
    }

    fn create_object_url(&self, image: &EncodedImage) -> ObjectUrl {
        let n = self.next_url.fetch_add(1, Ordering::SeqCst);
        let url = ObjectUrl::new(format!("blob:mock/{}", n));
        self.urls.lock().unwrap().insert(url.clone(), image.clone());
        self.minted.lock().unwrap().push(url.clone());
        url
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        if self.urls.lock().unwrap().remove(url).is_some() {
            self.revoked.lock().unwrap().push(url.clone());
        }
    }

    fn resolve_object_url(&self, url: &ObjectUrl) -> Option<EncodedImage> {
        self.urls.lock().unwrap().get(url).cloned()
    }
}
