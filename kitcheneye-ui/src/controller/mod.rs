//! Acquisition/detection/recipe workflow controller
//!
//! One controller instance owns all workflow state. It behaves as a single
//! actor: user operations run synchronously against `&mut self`, and the
//! three suspension points (camera grant, detection, recipe) are spawned
//! tasks that post a [`Completion`] back to the controller's inbox. The
//! owner applies completions with [`WorkflowController::settle`].
//!
//! Every request carries a [`RequestTicket`]. A completion is applied only
//! while its ticket is still the in-flight ticket of its kind; `reset`
//! invalidates all tickets, so late responses are discarded instead of
//! overwriting the fresh state.

mod acquisition;
mod detection;
mod recipe;

use crate::client::{DetectionResponse, KitchenApi};
use crate::error::{ApiError, HostError, WorkflowError};
use crate::host::{CameraStream, MediaHost, ObjectUrl};
use crate::resources::ResourceManager;
use crate::types::{DetectionResult, ImagePayload, RecipeOutcome, StatusMessage};
use kitcheneye_common::api::RecipeResponse;
use kitcheneye_common::config::ClientConfig;
use kitcheneye_common::events::{EventBus, KitchenEvent, ResourceKind, WorkflowState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) const STATUS_PROCESSING: &str = "Processing...";
pub(crate) const STATUS_DETECTED: &str = "Detection completed!";
pub(crate) const STATUS_GENERATING: &str = "Generating recipe...";
pub(crate) const STATUS_RECIPE_READY: &str = "Recipe generated!";
pub(crate) const STATUS_RESET: &str = "Reset completed. Ready for a new image.";
pub(crate) const NO_RUNTIME: &str = "no async runtime available";

const EVENT_CAPACITY: usize = 64;

/// Controller tuning taken from the client configuration
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Delay before the reset confirmation disappears
    pub status_dismiss: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for ControllerSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            status_dismiss: config.status_dismiss,
        }
    }
}

/// Identifies one asynchronous request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

/// Result of an asynchronous request, delivered to the inbox
pub(crate) enum Completion {
    Camera {
        ticket: RequestTicket,
        result: Result<CameraStream, HostError>,
    },
    Detection {
        ticket: RequestTicket,
        result: Result<DetectionResponse, ApiError>,
    },
    Recipe {
        ticket: RequestTicket,
        result: Result<RecipeResponse, ApiError>,
    },
    StatusExpired {
        ticket: RequestTicket,
    },
}

/// Which kind of completion was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Camera,
    Detection,
    Recipe,
    StatusDismissal,
}

/// What applying a completion did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    /// Completion applied successfully
    Applied(CompletionKind),
    /// Completion applied and reported a failure
    Failed(CompletionKind, WorkflowError),
    /// Completion belonged to a superseded request and was ignored
    Discarded(CompletionKind),
}

pub struct WorkflowController {
    api: Arc<dyn KitchenApi>,
    host: Arc<dyn MediaHost>,
    resources: ResourceManager,
    events: EventBus,
    settings: ControllerSettings,

    state: WorkflowState,
    payload: Option<ImagePayload>,
    detection: Option<DetectionResult>,
    recipe: Option<RecipeOutcome>,
    status: Option<StatusMessage>,
    file_info: Option<String>,
    drop_zone_active: bool,

    camera_request: Option<RequestTicket>,
    detect_request: Option<RequestTicket>,
    recipe_request: Option<RequestTicket>,
    status_timer: Option<RequestTicket>,
    next_ticket: u64,

    inbox_tx: mpsc::UnboundedSender<Completion>,
    inbox_rx: mpsc::UnboundedReceiver<Completion>,
    disposed: bool,
}

impl WorkflowController {
    pub fn new(
        api: Arc<dyn KitchenApi>,
        host: Arc<dyn MediaHost>,
        settings: ControllerSettings,
    ) -> Self {
        Self::with_events(api, host, settings, EventBus::new(EVENT_CAPACITY))
    }

    /// Create a controller publishing to an existing event bus
    pub fn with_events(
        api: Arc<dyn KitchenApi>,
        host: Arc<dyn MediaHost>,
        settings: ControllerSettings,
        events: EventBus,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let resources = ResourceManager::new(host.clone()).with_events(events.clone());

        Self {
            api,
            host,
            resources,
            events,
            settings,
            state: WorkflowState::Idle,
            payload: None,
            detection: None,
            recipe: None,
            status: None,
            file_info: None,
            drop_zone_active: false,
            camera_request: None,
            detect_request: None,
            recipe_request: None,
            status_timer: None,
            next_ticket: 1,
            inbox_tx,
            inbox_rx,
            disposed: false,
        }
    }

    // ========================================
    // Read-only view
    // ========================================

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn payload(&self) -> Option<&ImagePayload> {
        self.payload.as_ref()
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.detection.as_ref()
    }

    /// Whether the live preview is the annotated image of the current result
    pub fn preview_is_annotated(&self) -> bool {
        self.detection
            .as_ref()
            .is_some_and(|d| self.resources.is_live(d.annotated))
    }

    /// Labels of the current detection result; empty if there is none
    pub fn labels(&self) -> &[String] {
        self.detection
            .as_ref()
            .map(|d| d.labels.as_slice())
            .unwrap_or(&[])
    }

    pub fn recipe(&self) -> Option<&RecipeOutcome> {
        self.recipe.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn file_info(&self) -> Option<&str> {
        self.file_info.as_deref()
    }

    pub fn drop_zone_active(&self) -> bool {
        self.drop_zone_active
    }

    pub fn camera_pending(&self) -> bool {
        self.camera_request.is_some()
    }

    pub fn preview_url(&self) -> Option<&ObjectUrl> {
        self.resources.preview_url()
    }

    pub fn camera_stream(&self) -> Option<&CameraStream> {
        self.resources.camera()
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn host(&self) -> &Arc<dyn MediaHost> {
        &self.host
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Recipe generation is possible only with a non-empty result
    pub fn recipe_enabled(&self) -> bool {
        self.state == WorkflowState::Detected && !self.labels().is_empty()
    }

    /// True while any request or timer may still post a completion
    pub fn has_pending(&self) -> bool {
        self.camera_request.is_some()
            || self.detect_request.is_some()
            || self.recipe_request.is_some()
            || self.status_timer.is_some()
    }

    // ========================================
    // Completion processing
    // ========================================

    /// Wait for the next completion and apply it
    pub async fn settle(&mut self) -> Settled {
        match self.inbox_rx.recv().await {
            Some(completion) => self.apply(completion),
            // Closed only by dispose; nothing will arrive any more
            None => std::future::pending().await,
        }
    }

    /// Apply a completion if one is already queued
    pub fn try_settle(&mut self) -> Option<Settled> {
        self.inbox_rx
            .try_recv()
            .ok()
            .map(|completion| self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> Settled {
        match completion {
            Completion::Camera { ticket, result } => self.apply_camera(ticket, result),
            Completion::Detection { ticket, result } => self.apply_detection(ticket, result),
            Completion::Recipe { ticket, result } => self.apply_recipe(ticket, result),
            Completion::StatusExpired { ticket } => self.apply_status_expired(ticket),
        }
    }

    fn apply_status_expired(&mut self, ticket: RequestTicket) -> Settled {
        if self.status_timer != Some(ticket) {
            return Settled::Discarded(CompletionKind::StatusDismissal);
        }
        self.status_timer = None;
        self.clear_status();
        Settled::Applied(CompletionKind::StatusDismissal)
    }

    // ========================================
    // Reset / dispose
    // ========================================

    /// Return to `idle` from any state
    ///
    /// Clears payload, result and recipe, releases every transient resource
    /// (stopping the camera) and invalidates all in-flight requests. Safe to
    /// call repeatedly.
    pub fn reset(&mut self) {
        if self.disposed {
            return;
        }

        self.invalidate_requests();
        self.clear_workflow_data();
        let released = self.resources.release_all();
        self.transition_to(WorkflowState::Idle);

        self.set_status(StatusMessage::success(STATUS_RESET));
        let ticket = self.next_ticket();
        let delay = self.settings.status_dismiss;
        let spawned = self.spawn_completion(async move {
            tokio::time::sleep(delay).await;
            Completion::StatusExpired { ticket }
        });
        if spawned {
            self.status_timer = Some(ticket);
        }

        info!(released, "Workflow reset");
    }

    /// Tear down for good; later operations are ignored
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.invalidate_requests();
        self.status_timer = None;
        self.clear_workflow_data();
        let released = self.resources.release_all();
        self.state = WorkflowState::Idle;
        self.disposed = true;
        let orphaned = self.close_inbox();
        info!(released, orphaned, "Workflow controller disposed");
    }

    /// Refuse further completions and release whatever is already queued
    ///
    /// Tasks that finish later see the closed inbox and release their own
    /// result through [`release_orphan`].
    fn close_inbox(&mut self) -> usize {
        self.inbox_rx.close();
        let mut orphaned = 0;
        while let Ok(completion) = self.inbox_rx.try_recv() {
            if release_orphan(self.host.as_ref(), completion) {
                orphaned += 1;
            }
        }
        orphaned
    }

    // ========================================
    // Internal helpers
    // ========================================

    fn invalidate_requests(&mut self) {
        self.camera_request = None;
        self.detect_request = None;
        self.recipe_request = None;
    }

    fn clear_workflow_data(&mut self) {
        self.payload = None;
        self.detection = None;
        self.recipe = None;
        self.file_info = None;
        self.drop_zone_active = false;
    }

    /// Workflow states in which a new image may be acquired
    fn acquisition_allowed(&self) -> bool {
        !self.disposed
            && self.camera_request.is_none()
            && matches!(
                self.state,
                WorkflowState::Idle | WorkflowState::Previewing | WorkflowState::Detected
            )
    }

    fn next_ticket(&mut self) -> RequestTicket {
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Run `work` on the current runtime and post its result to the inbox
    ///
    /// Returns false when called outside a tokio runtime; nothing is spawned.
    fn spawn_completion<F>(&self, work: F) -> bool
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "No async runtime, request not started");
                return false;
            }
        };

        let tx = self.inbox_tx.clone();
        let host = self.host.clone();
        runtime.spawn(async move {
            if let Err(mpsc::error::SendError(completion)) = tx.send(work.await) {
                release_orphan(host.as_ref(), completion);
            }
        });
        true
    }

    fn transition_to(&mut self, new_state: WorkflowState) {
        if self.state == new_state {
            return;
        }
        let old_state = self.state;
        self.state = new_state;
        debug!(old = %old_state, new = %new_state, "Workflow state transition");
        self.events.emit_lossy(KitchenEvent::WorkflowStateChanged {
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
    }

    fn set_status(&mut self, status: StatusMessage) {
        // A newer message must not be hidden by an older timer
        self.status_timer = None;
        self.events.emit_lossy(KitchenEvent::StatusChanged {
            text: Some(status.text.clone()),
            severity: Some(status.severity),
            timestamp: chrono::Utc::now(),
        });
        self.status = Some(status);
    }

    fn clear_status(&mut self) {
        if self.status.take().is_some() {
            self.events.emit_lossy(KitchenEvent::StatusChanged {
                text: None,
                severity: None,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Surface an error in the status line and hand it back to the caller
    fn report(&mut self, error: WorkflowError) -> WorkflowError {
        self.set_status(StatusMessage::error(error.status_text()));
        error
    }

    fn release_camera(&mut self) -> bool {
        self.resources.release(ResourceKind::Camera)
    }
}

/// Release the resource carried by a completion nobody will apply
///
/// Only a camera grant holds one. Returns true if a stream was stopped.
fn release_orphan(host: &dyn MediaHost, completion: Completion) -> bool {
    match completion {
        Completion::Camera {
            result: Ok(stream), ..
        } => {
            debug!(stream_id = %stream.id, "Stopping stream granted after teardown");
            host.stop_camera(&stream);
            true
        }
        _ => false,
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        self.dispose();
    }
}
