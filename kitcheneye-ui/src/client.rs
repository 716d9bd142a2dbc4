//! Detection and recipe service client
//!
//! `POST /detect` takes the image as a single multipart field and answers
//! with the annotated image as the body and the labels in the
//! `X-Detected-Objects` header. `POST /recipe/` takes the labels as JSON.

use crate::error::ApiError;
use crate::host::EncodedImage;
use crate::types::ImagePayload;
use async_trait::async_trait;
use kitcheneye_common::api::{
    error_description, parse_detected_objects, RecipeRequest, RecipeResponse,
    DETECTED_OBJECTS_HEADER, DETECT_FILE_FIELD, DETECT_PATH, RECIPE_PATH,
};
use kitcheneye_common::config::ClientConfig;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("kitcheneye-ui/", env!("CARGO_PKG_VERSION"));
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Successful detection response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResponse {
    pub labels: Vec<String>,
    pub annotated: EncodedImage,
}

/// The two remote operations the workflow drives
#[async_trait]
pub trait KitchenApi: Send + Sync {
    async fn detect(&self, payload: &ImagePayload) -> Result<DetectionResponse, ApiError>;

    async fn recipe(&self, items: &[String]) -> Result<RecipeResponse, ApiError>;
}

/// reqwest-backed client
pub struct HttpKitchenApi {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpKitchenApi {
    /// `base_url` without trailing slash, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.service_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn image_part(payload: &ImagePayload) -> Part {
        let part = Part::bytes(payload.bytes().to_vec()).file_name(payload.file_name().to_string());
        match part.mime_str(payload.media_type()) {
            Ok(part) => part,
            Err(e) => {
                warn!(media_type = %payload.media_type(), error = %e, "Invalid media type, sending untyped part");
                Part::bytes(payload.bytes().to_vec()).file_name(payload.file_name().to_string())
            }
        }
    }

    async fn api_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiError::Api {
            status,
            description: error_description(status, &body),
        }
    }
}

#[async_trait]
impl KitchenApi for HttpKitchenApi {
    async fn detect(&self, payload: &ImagePayload) -> Result<DetectionResponse, ApiError> {
        let url = format!("{}{}", self.base_url, DETECT_PATH);
        debug!(
            url = %url,
            file_name = %payload.file_name(),
            bytes = payload.len(),
            origin = ?payload.origin(),
            "Submitting image for detection"
        );

        let form = Form::new().part(DETECT_FILE_FIELD, Self::image_part(payload));
        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let header = response.headers().get(DETECTED_OBJECTS_HEADER);
        let header = match header.map(|v| v.to_str()) {
            Some(Ok(value)) => Some(value.to_string()),
            Some(Err(_)) => {
                warn!("Detected-objects header is not valid text, treating as empty");
                None
            }
            None => None,
        };
        let labels = parse_detected_objects(header.as_deref());

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        info!(
            labels = ?labels,
            image_bytes = bytes.len(),
            "Detection response received"
        );

        Ok(DetectionResponse {
            labels,
            annotated: EncodedImage::new(bytes.to_vec(), media_type),
        })
    }

    async fn recipe(&self, items: &[String]) -> Result<RecipeResponse, ApiError> {
        let url = format!("{}{}", self.base_url, RECIPE_PATH);
        debug!(url = %url, items = ?items, "Requesting recipe");

        let body = RecipeRequest {
            items: items.to_vec(),
        };
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let recipe: RecipeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        info!(
            has_html = recipe.recipe_html.is_some(),
            has_text = recipe.recipe.is_some(),
            "Recipe response received"
        );
        Ok(recipe)
    }
}
