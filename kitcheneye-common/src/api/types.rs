//! Request/response types for `POST /detect` and `POST /recipe/`

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Detection
// ========================================

/// Detection endpoint path
pub const DETECT_PATH: &str = "/detect";

/// Multipart field carrying the image
pub const DETECT_FILE_FIELD: &str = "file";

/// Response header listing the detected labels, comma separated
pub const DETECTED_OBJECTS_HEADER: &str = "X-Detected-Objects";

/// Parse the `X-Detected-Objects` header value
///
/// Tokens are trimmed and empty tokens dropped. Order and duplicates are
/// preserved. A missing header means nothing was detected.
///
/// # Examples
///
/// ```
/// use kitcheneye_common::api::parse_detected_objects;
///
/// assert_eq!(parse_detected_objects(Some("apple,banana")), vec!["apple", "banana"]);
/// assert!(parse_detected_objects(Some("")).is_empty());
/// assert!(parse_detected_objects(None).is_empty());
/// ```
pub fn parse_detected_objects(header: Option<&str>) -> Vec<String> {
    match header {
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Inverse of [`parse_detected_objects`], as the service writes it
pub fn format_detected_objects(labels: &[String]) -> String {
    labels.join(",")
}

// ========================================
// Recipe
// ========================================

/// Recipe endpoint path
pub const RECIPE_PATH: &str = "/recipe/";

/// `POST /recipe/` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRequest {
    /// Detected labels, in detection order
    pub items: Vec<String>,
}

/// `POST /recipe/` success body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
}

/// What the recipe panel should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeContent {
    /// Pre-formatted HTML
    Html(String),
    /// Plain text fallback
    Text(String),
    /// Response carried neither form
    NotFound,
}

impl RecipeResponse {
    /// Prefer rich content, fall back to plain text
    ///
    /// Empty strings count as absent.
    pub fn into_content(self) -> RecipeContent {
        if let Some(html) = self.recipe_html.filter(|s| !s.is_empty()) {
            return RecipeContent::Html(html);
        }
        match self.recipe.filter(|s| !s.is_empty()) {
            Some(text) => RecipeContent::Text(text),
            None => RecipeContent::NotFound,
        }
    }
}

// ========================================
// Error bodies
// ========================================

/// Human-readable description of a non-success response
///
/// Uses the `detail` string of a JSON error body when present, else the raw
/// body text, else `HTTP <status>`.
pub fn error_description(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", status);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(detail)) = map.get("detail") {
            return detail.clone();
        }
    }

    body.to_string()
}
