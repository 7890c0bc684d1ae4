//! Built-in defaults (layer 1)

use research_protocol::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// API base URL
    pub base_url: String,

    /// Per-request HTTP timeout in seconds (default: 60)
    pub request_timeout_seconds: u64,

    /// Model quality selector (default: "high-quality")
    pub default_model: String,

    /// Directory reports are written to when no path is given
    pub output_dir: String,

    /// Seconds between polls in `wait` (default: 30)
    pub wait_interval_seconds: u64,

    /// Poll attempts before `wait` gives up (default: 120, one hour at 30s)
    pub wait_max_attempts: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 60,
            default_model: "high-quality".to_string(),
            output_dir: ".".to_string(),
            wait_interval_seconds: 30,
            wait_max_attempts: 120,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "base_url": self.base_url,
            "request_timeout_seconds": self.request_timeout_seconds,
            "default_model": self.default_model,
            "output_dir": self.output_dir,
            "wait": {
                "interval_seconds": self.wait_interval_seconds,
                "max_attempts": self.wait_max_attempts
            }
        })
    }
}
