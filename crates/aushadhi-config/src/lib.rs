//! Configuration loading for AushadhiAI.
//! Reads aushadhi.toml from the current directory or the path in AUSHADHI_CONFIG,
//! then applies `.env` and process environment overrides. Loaded once at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Largest accepted image edge in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub data: DataSourceConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_env")]
    pub env: String,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16    { 8000 }
fn default_env()  -> String { "development".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), env: default_env() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_chembl_api_url")]
    pub chembl_api_url: String,
}

fn default_chembl_api_url() -> String { "https://www.ebi.ac.uk/chembl/api/data".to_string() }

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self { database_url: String::new(), chembl_api_url: default_chembl_api_url() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_image_px")]
    pub width: u32,
    #[serde(default = "default_image_px")]
    pub height: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn bool_true()          -> bool { true }
fn default_image_px()   -> u32  { 300 }
fn default_timeout_ms() -> u64  { 5_000 }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            width: default_image_px(),
            height: default_image_px(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [("render.width", self.width), ("render.height", self.height)] {
            if value == 0 || value > MAX_IMAGE_DIMENSION {
                return Err(ConfigError::InvalidValue { key, value: value.to_string() });
            }
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings: config file (optional), then `.env`, then process environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var("AUSHADHI_CONFIG")
            .unwrap_or_else(|_| "aushadhi.toml".to_string());

        let mut settings = if Path::new(&path).exists() {
            info!("Loading configuration from {}", path);
            Self::from_file(&path)?
        } else {
            debug!("No config file at {}, using defaults", path);
            Self::default()
        };

        if let Ok(env_path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_path.display());
        }

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would only fail later, per request.
    pub fn validate(&self) -> Result<()> {
        self.render.validate()
    }

    /// Apply `KEY=value` overrides from an arbitrary lookup (the process
    /// environment in production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.api.port = parse_value("API_PORT", &port)?;
        }
        if let Some(env) = lookup("API_ENV") {
            self.api.env = env;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.data.database_url = url;
        }
        if let Some(url) = lookup("CHEMBL_API_URL") {
            self.data.chembl_api_url = url;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = split_origins(&origins);
        }
        if let Some(enabled) = lookup("RENDER_ENABLED") {
            self.render.enabled = parse_bool("RENDER_ENABLED", &enabled)?;
        }
        if let Some(timeout) = lookup("RENDER_TIMEOUT_MS") {
            self.render.timeout_ms = parse_value("RENDER_TIMEOUT_MS", &timeout)?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value: value.to_string() }),
    }
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
