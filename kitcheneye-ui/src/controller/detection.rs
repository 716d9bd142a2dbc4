//! Detection workflow
//!
//! `previewing`/`detected` → `detecting` → `detected` on success, back to
//! `previewing` on failure with the payload kept for a retry.

use super::{
    Completion, CompletionKind, RequestTicket, Settled, WorkflowController, NO_RUNTIME,
    STATUS_DETECTED, STATUS_PROCESSING,
};
use crate::client::DetectionResponse;
use crate::error::{ApiError, WorkflowError};
use crate::resources::TransientResource;
use crate::types::{DetectionResult, StatusMessage};
use kitcheneye_common::events::{KitchenEvent, WorkflowState};
use tracing::{debug, info, warn};

impl WorkflowController {
    /// Submit the current image to the detection service
    ///
    /// A call while a detection is in flight is a no-op. Without an image
    /// `NoPayload` is reported and nothing is sent.
    pub fn detect(&mut self) -> Result<(), WorkflowError> {
        if self.disposed {
            return Ok(());
        }
        match self.state {
            WorkflowState::Detecting => {
                debug!("Detection already in flight");
                return Ok(());
            }
            WorkflowState::GeneratingRecipe | WorkflowState::Capturing => {
                debug!(state = %self.state, "Detection ignored in current state");
                return Ok(());
            }
            _ => {}
        }

        let payload = match self.payload.clone() {
            Some(payload) => payload,
            None => return Err(self.report(WorkflowError::NoPayload)),
        };

        // Drop the previous result; the preview goes back to the input image
        if self.detection.take().is_some() {
            let url = self.host.create_object_url(&payload.to_encoded());
            self.resources.acquire(TransientResource::Preview(url));
        }
        self.recipe = None;

        self.set_status(StatusMessage::loading(STATUS_PROCESSING));
        self.transition_to(WorkflowState::Detecting);

        let ticket = self.next_ticket();
        let api = self.api.clone();
        let spawned = self.spawn_completion(async move {
            let result = api.detect(&payload).await;
            Completion::Detection { ticket, result }
        });
        if !spawned {
            self.transition_to(WorkflowState::Previewing);
            return Err(self.report(WorkflowError::DetectionFailed(NO_RUNTIME.to_string())));
        }
        self.detect_request = Some(ticket);

        info!("Detection requested");
        Ok(())
    }

    pub(super) fn apply_detection(
        &mut self,
        ticket: RequestTicket,
        result: Result<DetectionResponse, ApiError>,
    ) -> Settled {
        if self.detect_request != Some(ticket) {
            debug!("Discarding detection response for a superseded request");
            return Settled::Discarded(CompletionKind::Detection);
        }
        self.detect_request = None;

        match result {
            Ok(response) => {
                let url = self.host.create_object_url(&response.annotated);
                let annotated = self.resources.acquire(TransientResource::Preview(url));

                if response.labels.is_empty() {
                    info!("Detection finished: no objects detected");
                } else {
                    info!(labels = ?response.labels, "Detection finished");
                }
                self.events.emit_lossy(KitchenEvent::ObjectsDetected {
                    labels: response.labels.clone(),
                    timestamp: chrono::Utc::now(),
                });

                self.detection = Some(DetectionResult {
                    labels: response.labels,
                    annotated,
                });
                self.transition_to(WorkflowState::Detected);
                self.set_status(StatusMessage::success(STATUS_DETECTED));
                Settled::Applied(CompletionKind::Detection)
            }
            Err(e) => {
                warn!(error = %e, "Detection failed");
                self.transition_to(WorkflowState::Previewing);
                let error = self.report(WorkflowError::DetectionFailed(e.description()));
                Settled::Failed(CompletionKind::Detection, error)
            }
        }
    }
}
