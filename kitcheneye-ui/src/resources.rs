//! Resource Lifecycle Manager
//!
//! Owns every locally minted transient resource (preview object URLs, the
//! camera stream). At most one resource of each kind is live: acquiring a
//! new one releases the previous one of that kind first. Releasing never
//! fails and releasing twice is a no-op. Dropping the manager releases
//! everything still live.

use crate::host::{CameraStream, MediaHost, ObjectUrl};
use kitcheneye_common::events::{EventBus, KitchenEvent, ResourceKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A revocable resource the manager can own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientResource {
    Preview(ObjectUrl),
    Camera(CameraStream),
}

impl TransientResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            TransientResource::Preview(_) => ResourceKind::Preview,
            TransientResource::Camera(_) => ResourceKind::Camera,
        }
    }
}

/// Identifies one acquisition; stale once its resource is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: u64,
}

impl ResourceHandle {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

struct LiveResource {
    handle: ResourceHandle,
    resource: TransientResource,
}

pub struct ResourceManager {
    host: Arc<dyn MediaHost>,
    events: Option<EventBus>,
    live: HashMap<ResourceKind, LiveResource>,
    next_id: u64,
}

impl ResourceManager {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self {
            host,
            events: None,
            live: HashMap::new(),
            next_id: 1,
        }
    }

    /// Publish a `ResourceReleased` event for every release
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Register `resource` as the live resource of its kind
    ///
    /// The previous resource of the same kind is released before the new
    /// one is installed.
    pub fn acquire(&mut self, resource: TransientResource) -> ResourceHandle {
        let kind = resource.kind();
        self.release(kind);

        let handle = ResourceHandle {
            kind,
            id: self.next_id,
        };
        self.next_id += 1;

        debug!(kind = %kind, id = handle.id, "Acquired transient resource");
        self.live.insert(kind, LiveResource { handle, resource });
        handle
    }

    /// Release the live resource of `kind`; returns false if none was live
    pub fn release(&mut self, kind: ResourceKind) -> bool {
        match self.live.remove(&kind) {
            Some(entry) => {
                self.dispose(entry);
                true
            }
            None => false,
        }
    }

    /// Release every live resource; returns how many were released
    pub fn release_all(&mut self) -> usize {
        let entries: Vec<LiveResource> = self.live.drain().map(|(_, entry)| entry).collect();
        let count = entries.len();
        for entry in entries {
            self.dispose(entry);
        }
        count
    }

    pub fn is_live(&self, handle: ResourceHandle) -> bool {
        self.live
            .get(&handle.kind)
            .map(|entry| entry.handle == handle)
            .unwrap_or(false)
    }

    pub fn preview_url(&self) -> Option<&ObjectUrl> {
        match self.live.get(&ResourceKind::Preview).map(|e| &e.resource) {
            Some(TransientResource::Preview(url)) => Some(url),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&CameraStream> {
        match self.live.get(&ResourceKind::Camera).map(|e| &e.resource) {
            Some(TransientResource::Camera(stream)) => Some(stream),
            _ => None,
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn dispose(&self, entry: LiveResource) {
        match &entry.resource {
            TransientResource::Preview(url) => self.host.revoke_object_url(url),
            TransientResource::Camera(stream) => self.host.stop_camera(stream),
        }
        debug!(kind = %entry.handle.kind, id = entry.handle.id, "Released transient resource");

        if let Some(events) = &self.events {
            events.emit_lossy(KitchenEvent::ResourceReleased {
                kind: entry.handle.kind,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EncodedImage, NativeHost};

    fn preview(host: &NativeHost) -> TransientResource {
        TransientResource::Preview(
            host.create_object_url(&EncodedImage::new(vec![0u8; 8], "image/png")),
        )
    }

    #[test]
    fn test_acquire_releases_previous_of_same_kind() {
        let host = Arc::new(NativeHost::new(None, (320, 240)));
        let mut manager = ResourceManager::new(host.clone());

        let first = manager.acquire(preview(&host));
        let second = manager.acquire(preview(&host));

        assert!(!manager.is_live(first));
        assert!(manager.is_live(second));
        assert_eq!(manager.live_count(), 1);
        assert_eq!(host.live_url_count(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let host = Arc::new(NativeHost::new(None, (320, 240)));
        let mut manager = ResourceManager::new(host.clone());

        let handle = manager.acquire(preview(&host));
        assert!(manager.release(ResourceKind::Preview));
        assert!(!manager.is_live(handle));
        assert!(!manager.release(ResourceKind::Preview));
        assert_eq!(manager.release_all(), 0);
        assert_eq!(host.live_url_count(), 0);
    }

    #[test]
    fn test_kinds_are_tracked_independently() {
        let host = Arc::new(NativeHost::new(None, (320, 240)));
        let mut manager = ResourceManager::new(host.clone());

        let url = manager.acquire(preview(&host));
        manager.release(ResourceKind::Camera);

        assert!(manager.is_live(url));
        assert!(manager.preview_url().is_some());
        assert!(manager.camera().is_none());
    }

    #[test]
    fn test_drop_releases_everything() {
        let host = Arc::new(NativeHost::new(None, (320, 240)));
        {
            let mut manager = ResourceManager::new(host.clone());
            manager.acquire(preview(&host));
        }
        assert_eq!(host.live_url_count(), 0);
    }

    #[tokio::test]
    async fn test_release_emits_event() {
        let host = Arc::new(NativeHost::new(None, (320, 240)));
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let mut manager = ResourceManager::new(host.clone()).with_events(bus);

        manager.acquire(preview(&host));
        manager.release_all();

        match rx.recv().await.unwrap() {
            KitchenEvent::ResourceReleased { kind, .. } => assert_eq!(kind, ResourceKind::Preview),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
