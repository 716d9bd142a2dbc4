//! Test Helper Utilities
//!
//! Shared utilities for testing kitcheneye-ui

#![allow(dead_code)]

pub mod mock_host;
pub mod stub_server;

pub use mock_host::MockHost;
pub use stub_server::{DetectReply, RecipeReply, StubServer};

use kitcheneye_ui::host::SelectedFile;
use kitcheneye_ui::{ControllerSettings, HttpKitchenApi, Settled, WorkflowController};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for any single completion in tests
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize tracing for a test binary; repeated calls are harmless
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitcheneye_ui=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Controller talking to `stub` through the real HTTP client
///
/// The reset status stays up for a minute so it never races test completions.
pub fn create_test_controller(stub: &StubServer, host: Arc<MockHost>) -> WorkflowController {
    create_test_controller_with(
        stub,
        host,
        ControllerSettings {
            status_dismiss: Duration::from_secs(60),
        },
    )
}

pub fn create_test_controller_with(
    stub: &StubServer,
    host: Arc<MockHost>,
    settings: ControllerSettings,
) -> WorkflowController {
    init_test_logging();
    let api = HttpKitchenApi::new(&stub.base_url(), Duration::from_secs(5)).unwrap();
    WorkflowController::new(Arc::new(api), host, settings)
}

/// Apply the next completion, failing the test if none arrives
pub async fn settle(controller: &mut WorkflowController) -> Settled {
    tokio::time::timeout(SETTLE_TIMEOUT, controller.settle())
        .await
        .expect("no completion arrived in time")
}

pub fn test_file(name: &str) -> SelectedFile {
    SelectedFile::new(name, "image/png", format!("bytes of {}", name).into_bytes())
}
