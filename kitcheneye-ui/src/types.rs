//! Workflow data model

use crate::host::{EncodedImage, SelectedFile};
use crate::resources::ResourceHandle;
use kitcheneye_common::api::RecipeContent;
use kitcheneye_common::events::Severity;
use serde::Serialize;
use std::sync::Arc;

/// Where an image payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadOrigin {
    Upload,
    Capture,
}

/// Immutable image handed to the detection service
///
/// Upload and capture both normalize into this type so detection never
/// branches on origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    file_name: String,
    media_type: String,
    bytes: Arc<[u8]>,
    origin: PayloadOrigin,
}

impl ImagePayload {
    pub fn from_file(file: SelectedFile, origin: PayloadOrigin) -> Self {
        Self {
            file_name: file.name,
            media_type: file.media_type,
            bytes: file.bytes,
            origin,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn origin(&self) -> PayloadOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_encoded(&self) -> EncodedImage {
        EncodedImage {
            bytes: self.bytes.clone(),
            media_type: self.media_type.clone(),
        }
    }
}

/// Outcome of a successful detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    /// Server-reported order, duplicates kept; empty means nothing detected
    pub labels: Vec<String>,
    /// Preview resource holding the annotated image
    pub annotated: ResourceHandle,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// User-visible status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Loading,
        }
    }
}

/// What the last recipe request produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeOutcome {
    Ready(RecipeContent),
    Failed,
}
