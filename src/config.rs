//! Client configuration module.
//!
//! Handles loading, validating, and layering `courier.toml`. Configuration is
//! resolved in three layers, each overriding the one before:
//!
//! ```text
//! stock defaults  →  courier.toml  →  environment
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! base_url = "http://localhost:5001/api"             # $COURIER_API_BASE_URL
//! refresh_url = "http://localhost:5001/api/user/refresh" # $COURIER_REFRESH_TOKEN_URL
//! timeout_secs = 30
//!
//! [session]
//! redirect_delay_ms = 2000      # Delay before the login redirect
//! login_path = "/login"
//! admin_login_path = "/admin/login"
//! admin_prefix = "/admin"       # Routes under this prefix use the admin login
//!
//! [upload]
//! max_width = 1920              # Compression bounds (never upscales)
//! max_height = 1080
//! quality = 80                  # JPEG quality (1-100)
//! field_name = "image"          # Multipart field the upload endpoint reads
//! reference_field = "weeklyLimitPic"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [api]
//! base_url = "https://api.example.com/api"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding [`ApiConfig::base_url`].
pub const ENV_BASE_URL: &str = "COURIER_API_BASE_URL";
/// Environment variable overriding [`ApiConfig::refresh_url`].
pub const ENV_REFRESH_URL: &str = "COURIER_REFRESH_TOKEN_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `courier.toml`.
///
/// All fields have local-development defaults. User config files need only
/// specify the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Backend addresses and transport settings.
    pub api: ApiConfig,
    /// Session expiry handling.
    pub session: SessionConfig,
    /// Image upload preparation.
    pub upload: UploadConfig,
}

impl ClientConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.refresh_url", &self.api.refresh_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::Validation(format!("{key} is not a URL: {e}")))?;
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be positive".into(),
            ));
        }
        if self.upload.quality == 0 || self.upload.quality > 100 {
            return Err(ConfigError::Validation(
                "upload.quality must be 1-100".into(),
            ));
        }
        if self.upload.max_width == 0 || self.upload.max_height == 0 {
            return Err(ConfigError::Validation(
                "upload.max_width and upload.max_height must be non-zero".into(),
            ));
        }
        if self.upload.field_name.is_empty() {
            return Err(ConfigError::Validation(
                "upload.field_name must not be empty".into(),
            ));
        }
        if !self.session.login_path.starts_with('/')
            || !self.session.admin_login_path.starts_with('/')
        {
            return Err(ConfigError::Validation(
                "session login paths must start with '/'".into(),
            ));
        }
        Ok(())
    }
}

/// Backend addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base address every relative request path is resolved against.
    pub base_url: String,
    /// Absolute address of the token refresh endpoint.
    pub refresh_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            refresh_url: "http://localhost:5001/api/user/refresh".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Where to send the user when the session is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Delay between the expiry notification and the redirect.
    pub redirect_delay_ms: u64,
    pub login_path: String,
    pub admin_login_path: String,
    /// Routes starting with this prefix belong to the admin area.
    pub admin_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: 2000,
            login_path: "/login".to_string(),
            admin_login_path: "/admin/login".to_string(),
            admin_prefix: "/admin".to_string(),
        }
    }
}

/// Image upload preparation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Largest width after compression, in pixels.
    pub max_width: u32,
    /// Largest height after compression, in pixels.
    pub max_height: u32,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Multipart field name expected by the upload endpoint.
    pub field_name: String,
    /// Resource field whose last element is the stored image reference.
    pub reference_field: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 80,
            field_name: "image".to_string(),
            reference_field: "weeklyLimitPic".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ClientConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build the environment layer from a variable lookup.
///
/// Empty variables are ignored so an exported-but-blank variable does not
/// wipe out the file or stock value.
pub fn env_overlay(lookup: impl Fn(&str) -> Option<String>) -> Option<toml::Value> {
    let mut api = toml::Table::new();
    for (var, key) in [(ENV_BASE_URL, "base_url"), (ENV_REFRESH_URL, "refresh_url")] {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            api.insert(key.to_string(), toml::Value::String(value));
        }
    }
    if api.is_empty() {
        return None;
    }
    let mut root = toml::Table::new();
    root.insert("api".to_string(), toml::Value::Table(api));
    Some(toml::Value::Table(root))
}

/// Merge optional overlays onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<ClientConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .flatten()
        .fold(base, merge_toml);
    let config: ClientConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Build the `--base-url` layer.
pub fn base_url_overlay(base_url: Option<&str>) -> Option<toml::Value> {
    let url = base_url?;
    let mut api = toml::Table::new();
    api.insert("base_url".to_string(), toml::Value::String(url.to_string()));
    let mut root = toml::Table::new();
    root.insert("api".to_string(), toml::Value::Table(api));
    Some(toml::Value::Table(root))
}

/// Load config from `path` (if present), the process environment, and an
/// optional base address given on the command line.
pub fn load_config(path: &Path, base_url: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let base = stock_defaults_value();
    let file = load_raw_config(path)?;
    let env = env_overlay(|var| std::env::var(var).ok());
    resolve_config(base, [file, env, base_url_overlay(base_url)])
}

/// Returns a fully-commented stock `courier.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Courier Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Layers, each overriding the previous one:
#   stock defaults -> courier.toml -> environment variables -> --base-url
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Backend
# ---------------------------------------------------------------------------
[api]
# Base address for every request path. Overridden by $COURIER_API_BASE_URL.
base_url = "http://localhost:5001/api"

# Absolute address of the token refresh endpoint.
# Overridden by $COURIER_REFRESH_TOKEN_URL.
refresh_url = "http://localhost:5001/api/user/refresh"

# Per-request timeout in seconds.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Session expiry
# ---------------------------------------------------------------------------
[session]
# Milliseconds between the "session expired" notice and the login redirect.
redirect_delay_ms = 2000

# Login surface for the standard user area.
login_path = "/login"

# Login surface for routes under admin_prefix.
admin_login_path = "/admin/login"
admin_prefix = "/admin"

# ---------------------------------------------------------------------------
# Image upload
# ---------------------------------------------------------------------------
[upload]
# Images are scaled down (never up) to fit within these bounds.
max_width = 1920
max_height = 1080

# JPEG encoding quality (1 = worst, 100 = best). PNG and WebP are lossless.
quality = 80

# Multipart field name the upload endpoint reads the file from.
field_name = "image"

# Field of the returned resource holding the list of stored images.
reference_field = "weeklyLimitPic"
"##
}
