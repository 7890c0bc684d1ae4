//! Profile file (`~/.config/openai/profiles.json`)
//!
//! ```json
//! {"default": "work", "profiles": {"work": {"api_key": "sk-..."}}}
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::error::Result;

/// Keys with this prefix are template placeholders, not real keys.
pub const PLACEHOLDER_PREFIX: &str = "sk-proj-REPLACE";

/// `~/.config/openai/profiles.json` under `home`.
pub fn default_profiles_path(home: &Path) -> PathBuf {
    home.join(".config").join("openai").join("profiles.json")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Profile {
    /// The key, unless missing, blank or a placeholder.
    pub fn configured_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.starts_with(PLACEHOLDER_PREFIX))
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

/// Parsed profile file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub path: PathBuf,
    pub default: Option<String>,
    pub profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Load the profile file; `Ok(None)` when it does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: ProfileFile = serde_json::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), profiles = file.profiles.len(), "loaded profile file");
        Ok(Some(Self {
            path: path.to_path_buf(),
            default: file.default,
            profiles: file.profiles,
        }))
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// The profile named by `default`, if it exists.
    pub fn default_profile(&self) -> Option<(&str, &Profile)> {
        let name = self.default.as_deref()?;
        self.profiles.get(name).map(|p| (name, p))
    }
}
