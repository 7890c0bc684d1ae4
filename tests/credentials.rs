//! Credential resolution order
//!
//! `--api-key` beats the profile file, which beats `OPENAI_API_KEY`.

use deep_research::credentials::{resolve, resolve_from_file, CredentialRequest, ProfileStore};
use deep_research::{CredentialSource, Environment, ResearchError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn env_with_key(key: Option<&str>) -> Environment {
    Environment {
        home: None,
        api_key: key.map(str::to_string),
    }
}

fn store(dir: &Path, json: &str) -> ProfileStore {
    let path = dir.join("profiles.json");
    fs::write(&path, json).unwrap();
    ProfileStore::load(&path).unwrap().unwrap()
}

const PROFILES: &str = r#"{
    "default": "work",
    "profiles": {
        "work": {"api_key": "sk-work"},
        "personal": {"api_key": "sk-personal"},
        "unset": {"api_key": "sk-proj-REPLACE-ME"}
    }
}"#;

#[test]
fn test_override_beats_profile_beats_env() {
    let dir = TempDir::new().unwrap();
    let store = store(dir.path(), PROFILES);
    let env = env_with_key(Some("sk-env"));

    let with_override = CredentialRequest {
        override_key: Some("sk-flag"),
        profile: Some("personal"),
    };
    let cred = resolve(&with_override, Some(&store), &env).unwrap();
    assert_eq!(cred.api_key(), "sk-flag");
    assert_eq!(cred.source, CredentialSource::Override);

    let cred = resolve(&CredentialRequest::default(), Some(&store), &env).unwrap();
    assert_eq!(cred.api_key(), "sk-work");
    assert_eq!(cred.source, CredentialSource::Profile("work".to_string()));

    let cred = resolve(&CredentialRequest::default(), None, &env).unwrap();
    assert_eq!(cred.api_key(), "sk-env");
    assert_eq!(cred.source, CredentialSource::Environment);
}

#[test]
fn test_named_profile() {
    let dir = TempDir::new().unwrap();
    let store = store(dir.path(), PROFILES);
    let request = CredentialRequest {
        override_key: None,
        profile: Some("personal"),
    };

    let cred = resolve(&request, Some(&store), &env_with_key(Some("sk-env"))).unwrap();
    assert_eq!(cred.api_key(), "sk-personal");
}

#[test]
fn test_unknown_profile_lists_available() {
    let dir = TempDir::new().unwrap();
    let store = store(dir.path(), PROFILES);
    let request = CredentialRequest {
        override_key: None,
        profile: Some("nope"),
    };

    match resolve(&request, Some(&store), &env_with_key(Some("sk-env"))) {
        Err(ResearchError::UnknownProfile { name, available }) => {
            assert_eq!(name, "nope");
            assert_eq!(available, "personal, unset, work");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_named_placeholder_profile_is_missing_credential() {
    let dir = TempDir::new().unwrap();
    let store = store(dir.path(), PROFILES);
    let request = CredentialRequest {
        override_key: None,
        profile: Some("unset"),
    };

    let err = resolve(&request, Some(&store), &env_with_key(Some("sk-env"))).unwrap_err();
    assert!(matches!(err, ResearchError::MissingCredential(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_placeholder_default_falls_through_to_env() {
    let dir = TempDir::new().unwrap();
    let store = store(
        dir.path(),
        r#"{"default": "main", "profiles": {"main": {"api_key": "sk-proj-REPLACE_WITH_YOUR_KEY"}}}"#,
    );

    let cred = resolve(
        &CredentialRequest::default(),
        Some(&store),
        &env_with_key(Some("sk-env")),
    )
    .unwrap();
    assert_eq!(cred.source, CredentialSource::Environment);

    let err = resolve(&CredentialRequest::default(), Some(&store), &env_with_key(None)).unwrap_err();
    assert!(matches!(err, ResearchError::MissingCredential(_)));
}

#[test]
fn test_missing_profile_file() {
    let dir = TempDir::new().unwrap();
    assert!(ProfileStore::load(&dir.path().join("absent.json"))
        .unwrap()
        .is_none());

    let err = resolve(&CredentialRequest::default(), None, &env_with_key(None)).unwrap_err();
    assert!(matches!(err, ResearchError::MissingCredential(_)));
}

#[test]
fn test_malformed_profile_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");
    fs::write(&path, "{not json").unwrap();

    let err = ProfileStore::load(&path).unwrap_err();
    assert!(matches!(err, ResearchError::Config(_)));
    assert_eq!(err.exit_code(), 40);
}

#[test]
fn test_key_never_printed() {
    let cred = resolve(
        &CredentialRequest {
            override_key: Some("sk-secret-value"),
            profile: None,
        },
        None,
        &env_with_key(None),
    )
    .unwrap();

    assert!(!format!("{:?}", cred).contains("sk-secret-value"));
    assert!(!format!("{:?}", env_with_key(Some("sk-env-secret"))).contains("sk-env-secret"));
}

#[test]
fn test_override_wins_over_malformed_profile_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");
    fs::write(&path, "{ not json").unwrap();

    let request = CredentialRequest {
        override_key: Some("sk-explicit"),
        profile: None,
    };
    let cred = resolve_from_file(&request, Some(&path), &env_with_key(None)).unwrap();
    assert_eq!(cred.api_key(), "sk-explicit");
    assert_eq!(cred.source, CredentialSource::Override);

    // Without an override the file must be read, and it is broken
    let err = resolve_from_file(&CredentialRequest::default(), Some(&path), &env_with_key(Some("sk-env")))
        .unwrap_err();
    assert!(matches!(err, ResearchError::Config(_)));
}

#[test]
fn test_resolve_from_file_reads_profiles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");
    fs::write(&path, PROFILES).unwrap();

    let cred = resolve_from_file(&CredentialRequest::default(), Some(&path), &env_with_key(Some("sk-env")))
        .unwrap();
    assert_eq!(cred.api_key(), "sk-work");

    let absent = dir.path().join("absent.json");
    let cred = resolve_from_file(&CredentialRequest::default(), Some(&absent), &env_with_key(Some("sk-env")))
        .unwrap();
    assert_eq!(cred.source, CredentialSource::Environment);
}
