//! Event types and the EventBus
//!
//! The controller publishes every state transition, status change and
//! resource release here so front-ends and tests can observe the workflow
//! without reaching into it.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Workflow state of the acquisition/detection/recipe controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowState {
    /// No image; upload affordance visible
    Idle,
    /// An image payload exists and is shown
    Previewing,
    /// Live camera feed is up
    Capturing,
    /// Detection request in flight
    Detecting,
    /// Detection result available
    Detected,
    /// Recipe request in flight
    GeneratingRecipe,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Previewing => "previewing",
            WorkflowState::Capturing => "capturing",
            WorkflowState::Detecting => "detecting",
            WorkflowState::Detected => "detected",
            WorkflowState::GeneratingRecipe => "generating-recipe",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity class of a user-visible status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Success,
    Loading,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Success => f.write_str("success"),
            Severity::Loading => f.write_str("loading"),
        }
    }
}

/// Kind of locally minted, revocable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Object URL for the displayed preview image
    Preview,
    /// Live camera media stream
    Camera,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Preview => f.write_str("preview"),
            ResourceKind::Camera => f.write_str("camera"),
        }
    }
}

/// KitchenEye event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KitchenEvent {
    /// Controller moved between workflow states
    WorkflowStateChanged {
        old_state: WorkflowState,
        new_state: WorkflowState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Status line replaced or cleared (`text` is `None` when hidden)
    StatusChanged {
        text: Option<String>,
        severity: Option<Severity>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A transient resource was released back to the host
    ResourceReleased {
        kind: ResourceKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Detection finished; `labels` is empty when nothing was found
    ObjectsDetected {
        labels: Vec<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recipe content arrived (`rich` is true for HTML content)
    RecipeReady {
        rich: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally: publishing never blocks, slow
/// subscribers observe `Lagged` instead of stalling the controller.
///
/// # Examples
///
/// ```
/// use kitcheneye_common::events::{EventBus, KitchenEvent, ResourceKind};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(KitchenEvent::ResourceReleased {
///     kind: ResourceKind::Preview,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(
///     rx.try_recv(),
///     Ok(KitchenEvent::ResourceReleased { kind: ResourceKind::Preview, .. })
/// ));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<KitchenEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<KitchenEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: KitchenEvent,
    ) -> Result<usize, broadcast::error::SendError<KitchenEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: KitchenEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
