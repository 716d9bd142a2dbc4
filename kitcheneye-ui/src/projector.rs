//! UI State Projector
//!
//! Pure projection from controller state to the visible affordances. Any
//! front-end renders a [`Projection`]; none of them decide visibility or
//! enablement on their own.

use crate::controller::WorkflowController;
use crate::host::ObjectUrl;
use crate::types::{RecipeOutcome, StatusMessage};
use kitcheneye_common::api::RecipeContent;
use kitcheneye_common::events::WorkflowState;
use serde::Serialize;

pub const DETECT_LABEL: &str = "Detect Objects";
pub const DETECT_BUSY_LABEL: &str = "Processing...";
pub const RECIPE_LABEL: &str = "Generate Recipe";
pub const RECIPE_BUSY_LABEL: &str = "Generating...";
pub const NO_OBJECTS_TEXT: &str = "No objects detected.";
pub const NO_RECIPE_TEXT: &str = "No recipe found.";
pub const RECIPE_ERROR_TEXT: &str = "Error generating recipe.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub label: &'static str,
    pub enabled: bool,
}

/// Detected-objects panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "labels", rename_all = "kebab-case")]
pub enum ObjectsView {
    Labels(Vec<String>),
    /// Explicit empty outcome, distinct from an error
    NoneDetected,
}

/// Recipe panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "kebab-case")]
pub enum RecipeView {
    Html(String),
    Text(String),
    NotFound,
    Error,
}

impl RecipeView {
    /// Text to display; HTML is returned as markup
    pub fn display_text(&self) -> &str {
        match self {
            RecipeView::Html(html) => html,
            RecipeView::Text(text) => text,
            RecipeView::NotFound => NO_RECIPE_TEXT,
            RecipeView::Error => RECIPE_ERROR_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub state: WorkflowState,
    pub upload_area_visible: bool,
    pub drop_zone_active: bool,
    pub file_info: Option<String>,
    pub camera_area_visible: bool,
    /// Live feed plus capture/close buttons
    pub camera_controls_visible: bool,
    pub preview: Option<ObjectUrl>,
    /// Preview shows the server's annotated image rather than the input
    pub preview_annotated: bool,
    pub detect_button: ButtonView,
    pub reset_enabled: bool,
    pub detected_objects: Option<ObjectsView>,
    pub recipe_button: ButtonView,
    pub recipe: Option<RecipeView>,
    pub status: Option<StatusMessage>,
}

impl Projection {
    pub fn of(controller: &WorkflowController) -> Self {
        let state = controller.state();
        let busy = matches!(
            state,
            WorkflowState::Detecting | WorkflowState::GeneratingRecipe
        );
        let camera_area_visible = state == WorkflowState::Capturing || controller.camera_pending();
        let upload_area_visible = !camera_area_visible
            && !controller.is_disposed()
            && matches!(
                state,
                WorkflowState::Idle | WorkflowState::Previewing | WorkflowState::Detected
            );

        let preview = match state {
            WorkflowState::Previewing | WorkflowState::Detected | WorkflowState::GeneratingRecipe => {
                controller.preview_url().cloned()
            }
            _ => None,
        };

        let preview_annotated = preview.is_some() && controller.preview_is_annotated();

        let detected_objects = controller.detection().map(|detection| {
            if detection.is_empty() {
                ObjectsView::NoneDetected
            } else {
                ObjectsView::Labels(detection.labels.clone())
            }
        });

        let recipe = controller.recipe().map(|outcome| match outcome {
            RecipeOutcome::Ready(RecipeContent::Html(html)) => RecipeView::Html(html.clone()),
            RecipeOutcome::Ready(RecipeContent::Text(text)) => RecipeView::Text(text.clone()),
            RecipeOutcome::Ready(RecipeContent::NotFound) => RecipeView::NotFound,
            RecipeOutcome::Failed => RecipeView::Error,
        });

        Self {
            state,
            upload_area_visible,
            drop_zone_active: controller.drop_zone_active(),
            file_info: controller.file_info().map(str::to_string),
            camera_area_visible,
            camera_controls_visible: state == WorkflowState::Capturing,
            preview,
            preview_annotated,
            detect_button: ButtonView {
                label: if state == WorkflowState::Detecting {
                    DETECT_BUSY_LABEL
                } else {
                    DETECT_LABEL
                },
                enabled: !busy && !camera_area_visible && !controller.is_disposed(),
            },
            reset_enabled: !controller.is_disposed(),
            detected_objects,
            recipe_button: ButtonView {
                label: if state == WorkflowState::GeneratingRecipe {
                    RECIPE_BUSY_LABEL
                } else {
                    RECIPE_LABEL
                },
                enabled: controller.recipe_enabled(),
            },
            recipe,
            status: controller.status().cloned(),
        }
    }
}
