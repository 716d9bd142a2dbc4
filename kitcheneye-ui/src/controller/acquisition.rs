//! Acquisition: file selection, drag-and-drop and live camera capture
//!
//! Both producers end in [`WorkflowController::install_payload`], so the
//! detection path never needs to know where an image came from.

use super::{Completion, CompletionKind, RequestTicket, Settled, WorkflowController, NO_RUNTIME};
use crate::error::{HostError, WorkflowError};
use crate::host::{CameraStream, SelectedFile, CAPTURE_MEDIA_TYPE};
use crate::resources::TransientResource;
use crate::types::{ImagePayload, PayloadOrigin};
use kitcheneye_common::events::{ResourceKind, WorkflowState};
use tracing::{debug, info, warn};

/// File name given to captured frames
pub const CAPTURE_FILE_NAME: &str = "capture.jpg";

impl WorkflowController {
    /// Use `file` as the new image
    ///
    /// `None` reports `NoFileSelected` and leaves the workflow untouched.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Result<(), WorkflowError> {
        if !self.acquisition_allowed() {
            debug!(state = %self.state, "File selection ignored while busy");
            return Ok(());
        }

        let file = match file {
            Some(file) => file,
            None => return Err(self.report(WorkflowError::NoFileSelected)),
        };

        info!(name = %file.name, bytes = file.bytes.len(), "File selected");
        self.install_payload(file, PayloadOrigin::Upload);
        Ok(())
    }

    /// Dragged content entered the upload area
    pub fn drag_over(&mut self) {
        if self.acquisition_allowed() {
            self.drop_zone_active = true;
        }
    }

    /// Dragged content left the upload area
    pub fn drag_leave(&mut self) {
        self.drop_zone_active = false;
    }

    /// Files dropped on the upload area; only the first is used
    pub fn drop_files(&mut self, files: Vec<SelectedFile>) -> Result<(), WorkflowError> {
        self.drop_zone_active = false;
        if files.len() > 1 {
            debug!(count = files.len(), "Multiple files dropped, using the first");
        }
        self.select_file(files.into_iter().next())
    }

    /// Ask the host for camera access
    ///
    /// The current image and results are discarded immediately; the camera
    /// feed replaces the preview once access is granted.
    pub fn start_camera(&mut self) -> Result<(), WorkflowError> {
        if !self.acquisition_allowed() {
            debug!(state = %self.state, pending = self.camera_pending(), "Camera request ignored");
            return Ok(());
        }

        self.clear_workflow_data();
        self.resources.release(ResourceKind::Preview);
        self.clear_status();
        self.transition_to(WorkflowState::Idle);

        let ticket = self.next_ticket();
        let host = self.host.clone();
        let spawned = self.spawn_completion(async move {
            let result = host.open_camera().await;
            Completion::Camera { ticket, result }
        });
        if !spawned {
            return Err(self.report(WorkflowError::CameraUnavailable(
                NO_RUNTIME.to_string(),
            )));
        }
        self.camera_request = Some(ticket);

        info!("Camera access requested");
        Ok(())
    }

    /// Snapshot the live feed and use it as the new image
    pub fn capture_frame(&mut self) -> Result<(), WorkflowError> {
        if self.disposed || self.state != WorkflowState::Capturing {
            debug!(state = %self.state, "Capture ignored outside capturing");
            return Ok(());
        }

        let stream = match self.resources.camera().cloned() {
            Some(stream) => stream,
            None => {
                warn!("Capturing without a live camera stream");
                self.transition_to(WorkflowState::Idle);
                return Err(self.report(WorkflowError::CameraUnavailable(
                    "camera stream is gone".to_string(),
                )));
            }
        };

        let still = match self.host.capture_still(&stream) {
            Ok(still) => still,
            Err(e) => {
                warn!(error = %e, "Frame capture failed");
                return Err(self.report(WorkflowError::CaptureFailed(e.to_string())));
            }
        };

        self.release_camera();
        let media_type = if still.media_type.is_empty() {
            CAPTURE_MEDIA_TYPE.to_string()
        } else {
            still.media_type
        };
        let file = SelectedFile::new(CAPTURE_FILE_NAME, media_type, still.bytes);
        info!(bytes = file.bytes.len(), "Frame captured");
        self.install_payload(file, PayloadOrigin::Capture);
        Ok(())
    }

    /// Stop the camera without producing an image
    ///
    /// Also abandons a camera request that has not been answered yet.
    pub fn close_camera(&mut self) {
        if self.disposed {
            return;
        }
        if self.camera_request.take().is_some() {
            info!("Pending camera request abandoned");
        }
        if self.state != WorkflowState::Capturing {
            return;
        }

        self.release_camera();
        self.transition_to(WorkflowState::Idle);
        info!("Camera closed");
    }

    pub(super) fn apply_camera(
        &mut self,
        ticket: RequestTicket,
        result: Result<CameraStream, HostError>,
    ) -> Settled {
        if self.camera_request != Some(ticket) {
            if let Ok(stream) = result {
                debug!(stream_id = %stream.id, "Stopping stream granted after its request was abandoned");
                self.host.stop_camera(&stream);
            }
            return Settled::Discarded(CompletionKind::Camera);
        }
        self.camera_request = None;

        match result {
            Ok(stream) => {
                info!(stream_id = %stream.id, "Camera access granted");
                self.resources.acquire(TransientResource::Camera(stream));
                self.transition_to(WorkflowState::Capturing);
                Settled::Applied(CompletionKind::Camera)
            }
            Err(e) => {
                warn!(error = %e, "Camera access failed");
                self.transition_to(WorkflowState::Idle);
                let error = self.report(WorkflowError::CameraUnavailable(e.to_string()));
                Settled::Failed(CompletionKind::Camera, error)
            }
        }
    }

    /// Replace the current image, preview and results with `file`
    pub(super) fn install_payload(&mut self, file: SelectedFile, origin: PayloadOrigin) {
        self.detection = None;
        self.recipe = None;
        self.file_info = Some(file.info_line());
        self.clear_status();

        let payload = ImagePayload::from_file(file, origin);
        let url = self.host.create_object_url(&payload.to_encoded());
        self.resources.acquire(TransientResource::Preview(url));
        self.payload = Some(payload);

        self.transition_to(WorkflowState::Previewing);
    }
}
