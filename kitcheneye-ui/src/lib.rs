//! kitcheneye-ui library interface
//!
//! Client-side workflow for photographing ingredients, sending them to the
//! detection service and asking the recipe service what to cook:
//! - `resources`: Resource Lifecycle Manager for preview URLs and the camera
//! - `controller`: acquisition, detection, recipe and reset workflow
//! - `projector`: pure projection from workflow state to visible affordances
//! - `client`: HTTP client for `/detect` and `/recipe/`
//! - `host`: platform capabilities (camera, object URLs) behind one trait

pub mod client;
pub mod console;
pub mod controller;
pub mod error;
pub mod host;
pub mod projector;
pub mod resources;
pub mod types;

pub use crate::client::{DetectionResponse, HttpKitchenApi, KitchenApi};
pub use crate::controller::{
    CompletionKind, ControllerSettings, RequestTicket, Settled, WorkflowController,
};
pub use crate::error::{ApiError, HostError, WorkflowError};
pub use crate::projector::Projection;
