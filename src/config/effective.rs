//! Effective configuration with full provenance
//!
//! The effective config captures the merged settings plus where each layer
//! came from, so `deep-research config` can show exactly what is in force.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::model::ModelTier;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "deep-research/effective_config@1";

/// Upper bound for a single HTTP request, in seconds.
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 3600;

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &["password", "token", "secret", "api_key", "credential"];

/// `~/.config/deep-research/config.toml` under `home`.
pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("deep-research").join("config.toml")
}

impl EffectiveConfig {
    /// Build effective config from layers.
    ///
    /// A missing user file is skipped unless `require_user` is set (an
    /// explicit `--config` path must exist).
    pub fn build(
        user_config_path: Option<&Path>,
        require_user: bool,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = user_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::User,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            } else if require_user {
                return Err(ConfigError::IoError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let mut merged = merge_layers(layers);
        let redactions = Self::redact_secrets(&mut merged);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
            redactions,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Redact secrets in the config, returning list of redacted paths.
    ///
    /// Credentials belong in the profile file; a key pasted into the config
    /// is never echoed back by `deep-research config`.
    fn redact_secrets(value: &mut Value) -> Vec<String> {
        let mut redactions = Vec::new();
        Self::redact_recursive(value, String::new(), &mut redactions);
        redactions
    }

    fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let current_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));
                    if is_secret && !val.is_object() && !val.is_array() {
                        *val = Value::String("[REDACTED]".to_string());
                        redactions.push(current_path);
                    } else {
                        Self::redact_recursive(val, current_path, redactions);
                    }
                }
            }
            Value::Array(arr) => {
                for (i, val) in arr.iter_mut().enumerate() {
                    Self::redact_recursive(val, format!("{}[{}]", path, i), redactions);
                }
            }
            _ => {}
        }
    }

    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        match config.get("request_timeout_seconds").map(|v| v.as_u64()) {
            Some(Some(t)) if t > 0 && t <= MAX_REQUEST_TIMEOUT_SECONDS => {}
            Some(_) => {
                return Err(ConfigError::ValidationError(format!(
                    "request_timeout_seconds must be in (0, {}]",
                    MAX_REQUEST_TIMEOUT_SECONDS
                )))
            }
            None => {}
        }

        if let Some(url) = config.get("base_url") {
            let ok = url
                .as_str()
                .is_some_and(|u| u.starts_with("https://") || u.starts_with("http://"));
            if !ok {
                return Err(ConfigError::ValidationError(
                    "base_url must be an http(s) URL".to_string(),
                ));
            }
        }

        if let Some(model) = config.get("default_model") {
            let parsed = model.as_str().map(str::parse::<ModelTier>);
            if !matches!(parsed, Some(Ok(_))) {
                return Err(ConfigError::ValidationError(format!(
                    "default_model must be one of: {}",
                    ModelTier::NAMES.join(", ")
                )));
            }
        }

        for key in ["interval_seconds", "max_attempts"] {
            if let Some(v) = config.get("wait").and_then(|w| w.get(key)) {
                if !v.as_u64().is_some_and(|n| n > 0) {
                    return Err(ConfigError::ValidationError(format!(
                        "wait.{} must be a positive integer",
                        key
                    )));
                }
            }
        }

        for key in ["output_dir", "prompts_dir", "profiles_path"] {
            if let Some(v) = config.get(key) {
                if !v.is_null() && !v.is_string() {
                    return Err(ConfigError::ValidationError(format!(
                        "{} must be a path string",
                        key
                    )));
                }
            }
        }

        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    pub fn base_url(&self) -> &str {
        self.get_str("base_url")
            .unwrap_or(research_protocol::DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("request_timeout_seconds").unwrap_or(60))
    }

    /// Validated at build time, so a parse failure falls back to the default.
    pub fn default_model(&self) -> ModelTier {
        self.get_str("default_model")
            .and_then(|m| m.parse().ok())
            .unwrap_or_default()
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.get_str("output_dir")
    }

    pub fn prompts_dir(&self) -> Option<&str> {
        self.get_str("prompts_dir")
    }

    pub fn profiles_path(&self) -> Option<&str> {
        self.get_str("profiles_path")
    }

    pub fn wait_interval(&self) -> Duration {
        Duration::from_secs(self.get_u64("wait.interval_seconds").unwrap_or(30))
    }

    pub fn wait_max_attempts(&self) -> u64 {
        self.get_u64("wait.max_attempts").unwrap_or(120)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
