//! Process environment snapshot
//!
//! Captured once in `main` and passed down, so nothing below the CLI reads
//! ambient process state.

use std::path::PathBuf;

/// Environment variable holding the fallback API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Clone, Default)]
pub struct Environment {
    /// Home directory, for `~` expansion and default file locations.
    pub home: Option<PathBuf>,
    /// Value of `OPENAI_API_KEY`, if set and non-empty.
    pub api_key: Option<String>,
}

impl Environment {
    pub fn capture() -> Self {
        Self {
            home: std::env::var_os("HOME")
                .filter(|h| !h.is_empty())
                .map(PathBuf::from),
            api_key: std::env::var(API_KEY_VAR)
                .ok()
                .filter(|k| !k.trim().is_empty()),
        }
    }

    /// Expand a leading `~/` against the home directory.
    pub fn expand_path(&self, raw: &str) -> PathBuf {
        match (raw.strip_prefix("~/"), &self.home) {
            (Some(rest), Some(home)) => home.join(rest),
            _ if raw == "~" => self.home.clone().unwrap_or_else(|| PathBuf::from(raw)),
            _ => PathBuf::from(raw),
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("home", &self.home)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment {
            home: Some(PathBuf::from("/home/ana")),
            api_key: Some("sk-test".to_string()),
        }
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(env().expand_path("~/vault"), PathBuf::from("/home/ana/vault"));
        assert_eq!(env().expand_path("~"), PathBuf::from("/home/ana"));
        assert_eq!(env().expand_path("/abs/x"), PathBuf::from("/abs/x"));
        assert_eq!(
            Environment::default().expand_path("~/vault"),
            PathBuf::from("~/vault")
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", env());
        assert!(!rendered.contains("sk-test"));
    }
}
