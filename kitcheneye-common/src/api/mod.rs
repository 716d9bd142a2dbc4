//! Wire contract of the detection and recipe service
//!
//! Shared by the HTTP client and the stub service used in tests.

pub mod types;

pub use types::{
    error_description, format_detected_objects, parse_detected_objects, RecipeContent,
    RecipeRequest, RecipeResponse, DETECTED_OBJECTS_HEADER, DETECT_FILE_FIELD, DETECT_PATH,
    RECIPE_PATH,
};
