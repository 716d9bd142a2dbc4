//! # KitchenEye Common Library
//!
//! Shared code for the KitchenEye client including:
//! - Configuration loading
//! - Event types (KitchenEvent enum) and the EventBus
//! - Wire types for the detection and recipe endpoints
//! - Common error type

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
