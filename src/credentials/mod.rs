//! API credential resolution
//!
//! Order: explicit override, then the profile file, then `OPENAI_API_KEY`.

mod profiles;

pub use profiles::{default_profiles_path, Profile, ProfileStore, PLACEHOLDER_PREFIX};

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::env::{Environment, API_KEY_VAR};
use crate::error::{ResearchError, Result};

/// Where a credential came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum CredentialSource {
    Override,
    Profile(String),
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Override => write!(f, "--api-key"),
            CredentialSource::Profile(name) => write!(f, "profile '{}'", name),
            CredentialSource::Environment => write!(f, "{}", API_KEY_VAR),
        }
    }
}

/// A resolved API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
    pub source: CredentialSource,
}

impl Credential {
    pub fn new(api_key: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            api_key: api_key.into(),
            source,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// Inputs to credential resolution.
#[derive(Debug, Default)]
pub struct CredentialRequest<'a> {
    /// `--api-key`
    pub override_key: Option<&'a str>,
    /// `--profile`
    pub profile: Option<&'a str>,
}

/// Resolve the API key.
///
/// An explicitly named profile must exist and be configured. A placeholder
/// key in the file's default profile falls through to the environment.
pub fn resolve(
    request: &CredentialRequest<'_>,
    store: Option<&ProfileStore>,
    env: &Environment,
) -> Result<Credential> {
    if let Some(key) = override_key(request) {
        return checked(key, CredentialSource::Override);
    }

    if let Some(name) = request.profile {
        let Some(store) = store else {
            return Err(ResearchError::UnknownProfile {
                name: name.to_string(),
                available: "none, no profile file".to_string(),
            });
        };
        let profile = store.get(name).ok_or_else(|| ResearchError::UnknownProfile {
            name: name.to_string(),
            available: store.names().join(", "),
        })?;
        return match profile.configured_key() {
            Some(key) => checked(key, CredentialSource::Profile(name.to_string())),
            None => Err(ResearchError::MissingCredential(format!(
                "API key for profile '{}' is not configured; edit {}",
                name,
                store.path.display()
            ))),
        };
    }

    if let Some(store) = store {
        if let Some((name, profile)) = store.default_profile() {
            match profile.configured_key() {
                Some(key) => return checked(key, CredentialSource::Profile(name.to_string())),
                None => tracing::warn!(
                    profile = name,
                    path = %store.path.display(),
                    "default profile has no configured API key, trying {}",
                    API_KEY_VAR
                ),
            }
        }
    }

    if let Some(key) = &env.api_key {
        return checked(key, CredentialSource::Environment);
    }

    Err(ResearchError::MissingCredential(format!(
        "pass --api-key, configure a profile in {}, or set {}",
        store
            .map(|s| s.path.display().to_string())
            .unwrap_or_else(|| "~/.config/openai/profiles.json".to_string()),
        API_KEY_VAR
    )))
}

/// Resolve the API key, reading the profile file at `profiles_path` only
/// when no override is given. A missing file is not an error.
pub fn resolve_from_file(
    request: &CredentialRequest<'_>,
    profiles_path: Option<&Path>,
    env: &Environment,
) -> Result<Credential> {
    if let Some(key) = override_key(request) {
        return checked(key, CredentialSource::Override);
    }
    let store = match profiles_path {
        Some(path) => ProfileStore::load(path)?,
        None => None,
    };
    resolve(request, store.as_ref(), env)
}

fn override_key<'a>(request: &CredentialRequest<'a>) -> Option<&'a str> {
    request.override_key.map(str::trim).filter(|k| !k.is_empty())
}

/// Keys end up in an HTTP header; control characters can never be sent.
fn checked(key: &str, source: CredentialSource) -> Result<Credential> {
    if key.chars().any(char::is_control) {
        return Err(ResearchError::MissingCredential(format!(
            "API key from {} contains control characters",
            source
        )));
    }
    Ok(Credential::new(key, source))
}
