//! Shared fixtures for integration tests

#![allow(dead_code)]

use deep_research::mock::MockApi;
use deep_research::{MockTransport, PromptLibrary, ResearchClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Path to the citation rewrite corpus
pub fn citation_corpus_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/citations/corpus.json")
}

/// One rewrite case from corpus.json
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CitationCase {
    pub id: String,
    pub description: String,
    pub input: String,
    #[serde(default)]
    pub sources: Vec<research_citations::SourceCitation>,
    pub expected: CitationExpectation,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CitationExpectation {
    pub text: String,
    pub rewritten: usize,
    pub deduplicated: usize,
    #[serde(default)]
    pub skipped: usize,
}

pub fn load_citation_corpus() -> Vec<CitationCase> {
    let raw = std::fs::read_to_string(citation_corpus_path()).expect("corpus readable");
    serde_json::from_str(&raw).expect("corpus parses")
}

/// Client wired to a fresh mock API.
pub fn mock_client() -> (ResearchClient, MockApi) {
    let api = MockApi::new();
    let transport = Arc::new(MockTransport::with_api(api.clone()));
    (ResearchClient::new(transport, PromptLibrary::builtin()), api)
}
