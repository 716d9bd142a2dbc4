//! Configuration loading and resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; the client starts with defaults.
//! A config file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the service base URL
pub const ENV_SERVICE_URL: &str = "KITCHENEYE_SERVICE_URL";
/// Environment variable overriding the camera still-frame source
pub const ENV_FRAME_SOURCE: &str = "KITCHENEYE_FRAME_SOURCE";
/// Environment variable overriding the output directory
pub const ENV_OUTPUT_DIR: &str = "KITCHENEYE_OUTPUT_DIR";

/// Compiled defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub status_dismiss_ms: u64,
    pub output_dir: PathBuf,
    pub frame_width: u32,
    pub frame_height: u32,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 60,
            status_dismiss_ms: 2000,
            output_dir: PathBuf::from("./kitcheneye-out"),
            frame_width: 320,
            frame_height: 240,
            log_level: "info".to_string(),
        }
    }
}

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// `[camera]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Still image served as the live camera frame
    pub frame_source: Option<PathBuf>,
    pub default_width: Option<u32>,
    pub default_height: Option<u32>,
}

/// On-disk TOML configuration; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    pub service_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub status_dismiss_ms: Option<u64>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub service_url: Option<String>,
    pub frame_source: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the detection/recipe service, without trailing slash
    pub service_url: String,
    pub request_timeout: Duration,
    /// How long the "reset completed" status stays visible
    pub status_dismiss: Duration,
    pub output_dir: PathBuf,
    pub frame_source: Option<PathBuf>,
    /// Capture size used when the live surface reports no dimensions
    pub default_frame_size: (u32, u32),
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            service_url: defaults.service_url,
            request_timeout: Duration::from_secs(defaults.request_timeout_secs),
            status_dismiss: Duration::from_millis(defaults.status_dismiss_ms),
            output_dir: defaults.output_dir,
            frame_source: None,
            default_frame_size: (defaults.frame_width, defaults.frame_height),
            log_level: defaults.log_level,
        }
    }
}

/// Platform config file location, if one exists
///
/// Linux checks `~/.config/kitcheneye/config.toml` then
/// `/etc/kitcheneye/config.toml`; other platforms use the user config dir only.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("kitcheneye").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/kitcheneye/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load the TOML config
///
/// An explicit path must exist. Without one the platform default is tried and
/// its absence only produces a warning.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> std::result::Result<TomlConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Read an environment variable, treating empty values as unset
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the final configuration from all sources
pub fn resolve_config(cli: &CliOverrides, toml: &TomlConfig) -> Result<ClientConfig> {
    let defaults = CompiledDefaults::default();

    let service_url = cli
        .service_url
        .clone()
        .or_else(|| env_value(ENV_SERVICE_URL))
        .or_else(|| toml.service_url.clone())
        .unwrap_or(defaults.service_url);
    let service_url = validate_service_url(&service_url)?;

    let frame_source = cli
        .frame_source
        .clone()
        .or_else(|| env_value(ENV_FRAME_SOURCE).map(PathBuf::from))
        .or_else(|| toml.camera.frame_source.clone());

    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| env_value(ENV_OUTPUT_DIR).map(PathBuf::from))
        .or_else(|| toml.output_dir.clone())
        .unwrap_or(defaults.output_dir);

    let timeout_secs = toml
        .request_timeout_secs
        .unwrap_or(defaults.request_timeout_secs);
    if timeout_secs == 0 {
        return Err(Error::Config(
            "request_timeout_secs must be greater than zero".to_string(),
        ));
    }

    let width = toml.camera.default_width.unwrap_or(defaults.frame_width);
    let height = toml.camera.default_height.unwrap_or(defaults.frame_height);
    if width == 0 || height == 0 {
        return Err(Error::Config(format!(
            "camera default size must be non-zero, got {}x{}",
            width, height
        )));
    }

    let config = ClientConfig {
        service_url,
        request_timeout: Duration::from_secs(timeout_secs),
        status_dismiss: Duration::from_millis(
            toml.status_dismiss_ms.unwrap_or(defaults.status_dismiss_ms),
        ),
        output_dir,
        frame_source,
        default_frame_size: (width, height),
        log_level: toml.logging.level.clone().unwrap_or(defaults.log_level),
    };

    debug!(?config, "Resolved configuration");
    Ok(config)
}

/// Check the scheme and strip trailing slashes
pub fn validate_service_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .map(|rest| !rest.is_empty())
        .unwrap_or(false);

    if !has_host {
        return Err(Error::Config(format!(
            "service_url must be an http(s) URL, got '{}'",
            url
        )));
    }
    Ok(trimmed.to_string())
}
