//! Recipe workflow: `detected` → `generating-recipe` → `detected`

use super::{
    Completion, CompletionKind, RequestTicket, Settled, WorkflowController, NO_RUNTIME,
    STATUS_GENERATING, STATUS_RECIPE_READY,
};
use crate::error::{ApiError, WorkflowError};
use crate::types::{RecipeOutcome, StatusMessage};
use kitcheneye_common::api::{RecipeContent, RecipeResponse};
use kitcheneye_common::events::{KitchenEvent, WorkflowState};
use tracing::{debug, info, warn};

impl WorkflowController {
    /// Ask for a recipe built from the detected labels
    ///
    /// No-op unless the state is `detected` with at least one label.
    pub fn generate_recipe(&mut self) {
        if self.disposed || !self.recipe_enabled() {
            debug!(state = %self.state, labels = self.labels().len(), "Recipe request ignored");
            return;
        }

        let items = self.labels().to_vec();
        self.recipe = None;
        self.set_status(StatusMessage::loading(STATUS_GENERATING));
        self.transition_to(WorkflowState::GeneratingRecipe);

        let ticket = self.next_ticket();
        let api = self.api.clone();
        let spawned = self.spawn_completion(async move {
            let result = api.recipe(&items).await;
            Completion::Recipe { ticket, result }
        });
        if !spawned {
            self.transition_to(WorkflowState::Detected);
            self.recipe = Some(RecipeOutcome::Failed);
            self.report(WorkflowError::RecipeFailed(NO_RUNTIME.to_string()));
            return;
        }
        self.recipe_request = Some(ticket);

        info!("Recipe requested");
    }

    pub(super) fn apply_recipe(
        &mut self,
        ticket: RequestTicket,
        result: Result<RecipeResponse, ApiError>,
    ) -> Settled {
        if self.recipe_request != Some(ticket) {
            debug!("Discarding recipe response for a superseded request");
            return Settled::Discarded(CompletionKind::Recipe);
        }
        self.recipe_request = None;
        self.transition_to(WorkflowState::Detected);

        match result {
            Ok(response) => {
                let content = response.into_content();
                let rich = matches!(content, RecipeContent::Html(_));
                if content == RecipeContent::NotFound {
                    info!("Recipe service returned no recipe");
                }
                self.events.emit_lossy(KitchenEvent::RecipeReady {
                    rich,
                    timestamp: chrono::Utc::now(),
                });
                self.recipe = Some(RecipeOutcome::Ready(content));
                self.set_status(StatusMessage::success(STATUS_RECIPE_READY));
                Settled::Applied(CompletionKind::Recipe)
            }
            Err(e) => {
                warn!(error = %e, "Recipe generation failed");
                self.recipe = Some(RecipeOutcome::Failed);
                let error = self.report(WorkflowError::RecipeFailed(e.description()));
                Settled::Failed(CompletionKind::Recipe, error)
            }
        }
    }
}
