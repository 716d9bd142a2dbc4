//! Error types for kitcheneye-ui
//!
//! Every workflow error is recoverable: the controller converts it into a
//! status message and stays in a state from which the user can retry or reset.

use thiserror::Error;

/// Errors surfaced by the workflow controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// File selection produced no file
    #[error("No file selected")]
    NoFileSelected,

    /// Detection requested before any image was acquired
    #[error("No image to detect")]
    NoPayload,

    /// Camera denied or missing
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Live frame could not be turned into a still image
    #[error("Frame capture failed: {0}")]
    CaptureFailed(String),

    /// Detection service rejected the request or was unreachable
    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    /// Recipe service rejected the request or was unreachable
    #[error("Recipe generation failed: {0}")]
    RecipeFailed(String),
}

impl WorkflowError {
    /// Text shown in the status line for this error
    pub fn status_text(&self) -> String {
        match self {
            WorkflowError::NoFileSelected => "No file selected.".to_string(),
            WorkflowError::NoPayload => "Please select or capture an image first".to_string(),
            WorkflowError::CameraUnavailable(_) => {
                "Camera access denied or not available.".to_string()
            }
            WorkflowError::CaptureFailed(reason) => format!("Could not capture image: {}", reason),
            WorkflowError::DetectionFailed(description) => description.clone(),
            WorkflowError::RecipeFailed(description) => description.clone(),
        }
    }
}

/// Detection/recipe service client errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status; `description` comes from the response body
    #[error("API error {status}: {description}")]
    Api { status: u16, description: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message suitable for the status line
    pub fn description(&self) -> String {
        match self {
            ApiError::Api { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }
}

/// Host environment (camera, object URLs) errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// User or platform refused camera access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No camera device / frame source
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    /// Encoding the still frame failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(String),
}
