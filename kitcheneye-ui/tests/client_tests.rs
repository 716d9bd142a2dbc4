//! HTTP Client Integration Tests
//! Test File: client_tests.rs
//!
//! Exercises HttpKitchenApi against the stub service.

mod helpers;

use helpers::{init_test_logging, DetectReply, RecipeReply, StubServer};
use kitcheneye_common::api::RecipeContent;
use kitcheneye_ui::error::ApiError;
use kitcheneye_ui::host::SelectedFile;
use kitcheneye_ui::types::{ImagePayload, PayloadOrigin};
use kitcheneye_ui::{HttpKitchenApi, KitchenApi};
use serde_json::json;
use std::time::Duration;

fn client_for(stub: &StubServer) -> HttpKitchenApi {
    init_test_logging();
    HttpKitchenApi::new(&stub.base_url(), Duration::from_secs(5)).unwrap()
}

fn payload() -> ImagePayload {
    ImagePayload::from_file(
        SelectedFile::new("fridge.jpg", "image/jpeg", b"jpeg bytes".to_vec()),
        PayloadOrigin::Upload,
    )
}

/// TC-API-001: Multipart upload, labels header and annotated body
#[tokio::test]
async fn tc_api_001_detect_parses_header_and_body() {
    let stub = StubServer::start().await;
    stub.set_detect(DetectReply::Image {
        labels_header: Some(" apple ,, banana ,".to_string()),
        content_type: "image/png; charset=binary".to_string(),
        body: b"annotated".to_vec(),
    });

    let response = client_for(&stub).detect(&payload()).await.unwrap();

    assert!(stub.multipart_seen());
    assert_eq!(response.labels, vec!["apple", "banana"]);
    assert_eq!(response.annotated.media_type, "image/png");
    assert_eq!(&response.annotated.bytes[..], b"annotated");
}

/// TC-API-002: Missing header means no objects
#[tokio::test]
async fn tc_api_002_detect_without_header() {
    let stub = StubServer::start().await;
    stub.set_detect(DetectReply::no_header());

    let response = client_for(&stub).detect(&payload()).await.unwrap();

    assert!(response.labels.is_empty());
    assert!(!response.annotated.bytes.is_empty());
}

/// TC-API-003: Error detail from a JSON body becomes the description
#[tokio::test]
async fn tc_api_003_detect_error_detail() {
    let stub = StubServer::start().await;
    stub.set_detect(DetectReply::Error {
        status: 422,
        body: json!({ "detail": "Unsupported image format" }).to_string(),
    });

    let err = client_for(&stub).detect(&payload()).await.unwrap_err();

    match err {
        ApiError::Api {
            status,
            description,
        } => {
            assert_eq!(status, 422);
            assert_eq!(description, "Unsupported image format");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

/// TC-API-004: Empty error body falls back to the status code
#[tokio::test]
async fn tc_api_004_detect_error_without_body() {
    let stub = StubServer::start().await;
    stub.set_detect(DetectReply::Error {
        status: 502,
        body: String::new(),
    });

    let err = client_for(&stub).detect(&payload()).await.unwrap_err();

    assert_eq!(err.description(), "HTTP 502");
}

/// TC-API-005: Recipe request carries the labels; both response shapes parse
#[tokio::test]
async fn tc_api_005_recipe_request_and_response() {
    let stub = StubServer::start().await;
    let client = client_for(&stub);
    let items = vec!["egg".to_string(), "flour".to_string()];

    stub.set_recipe(RecipeReply::json(json!({ "recipe": "Make pancakes." })));
    let response = client.recipe(&items).await.unwrap();
    assert_eq!(stub.last_recipe_items(), vec!["egg", "flour"]);
    assert_eq!(
        response.into_content(),
        RecipeContent::Text("Make pancakes.".to_string())
    );

    stub.set_recipe(RecipeReply::json(json!({ "recipe_html": "<p>Crepes</p>" })));
    let response = client.recipe(&items).await.unwrap();
    assert_eq!(
        response.into_content(),
        RecipeContent::Html("<p>Crepes</p>".to_string())
    );
    assert_eq!(stub.recipe_calls(), 2);
}

/// TC-API-006: Non-JSON success body is a parse error
#[tokio::test]
async fn tc_api_006_recipe_malformed_body() {
    let stub = StubServer::start().await;
    stub.set_recipe(RecipeReply {
        status: 200,
        body: "not json".to_string(),
    });

    let err = client_for(&stub)
        .recipe(&["egg".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
}

/// TC-API-007: Unreachable service is a network error
#[tokio::test]
async fn tc_api_007_unreachable_service() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpKitchenApi::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = client.detect(&payload()).await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
}
