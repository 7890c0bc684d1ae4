//! Job lifecycle tests
//!
//! Drive submit → status → download against the in-process mock API.

mod fixtures;

use chrono::{NaiveDate, Utc};
use deep_research::mock::{FailureConfig, MockOp, Outcome};
use deep_research::report::{download, DownloadTarget};
use deep_research::{JobHandle, JobRequest, JobState, ModelTier, ResearchError};
use research_citations::RewriteOptions;
use research_protocol::ResponseStatus;
use std::fs;
use tempfile::TempDir;

fn request(template: &str, topic: &str) -> JobRequest {
    JobRequest::builder()
        .template(template)
        .topic(topic)
        .build()
        .unwrap()
}

// =============================================================================
// Submission
// =============================================================================

#[test]
fn test_every_template_submits() {
    let (client, api) = fixtures::mock_client();

    for template in ["company", "person", "product", "custom"] {
        let handle = client.submit(&request(template, "Acme Robotics")).unwrap();
        assert!(!handle.id.is_empty());
    }
    assert_eq!(api.job_ids().len(), 4);
}

#[test]
fn test_invalid_template_makes_no_request() {
    let (_client, api) = fixtures::mock_client();

    let err = JobRequest::builder()
        .template("memoir")
        .topic("Ada Lovelace")
        .build()
        .unwrap_err();

    assert!(matches!(err, ResearchError::InvalidTemplate { .. }));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(api.request_count(), 0);
}

#[test]
fn test_custom_prompt_carries_query_verbatim() {
    let (client, api) = fixtures::mock_client();
    let query = "Compare {topic} handling in three note apps";

    client.submit(&request("custom", query)).unwrap();

    let body = api.requests()[0].body.clone().unwrap();
    let input = body["input"].as_str().unwrap();
    assert!(input.ends_with(&format!("\n\n---\n\n{}", query)));
}

#[test]
fn test_economy_model_is_sent() {
    let (client, api) = fixtures::mock_client();
    let request = JobRequest::builder()
        .template("product")
        .topic("Widget Pro")
        .model(ModelTier::Economy)
        .build()
        .unwrap();

    client.submit(&request).unwrap();

    let body = api.requests()[0].body.clone().unwrap();
    assert_eq!(body["model"], "o4-mini-deep-research");
    assert_eq!(body["metadata"]["model_tier"], "economy");
}

// =============================================================================
// Status
// =============================================================================

#[test]
fn test_status_walks_the_state_machine() {
    let (client, _api) = fixtures::mock_client();
    let handle = client.submit(&request("company", "Acme")).unwrap();

    let mut states = Vec::new();
    loop {
        let status = client.status(&handle).unwrap();
        states.push(status.state);
        if status.state == JobState::Completed {
            break;
        }
        assert!(states.len() < 10, "job never completed");
    }

    assert_eq!(
        states,
        vec![JobState::Queued, JobState::Running, JobState::Completed]
    );
    for pair in states.windows(2) {
        assert!(pair[0] == pair[1] || pair[0].can_transition_to(pair[1]));
    }
}

#[test]
fn test_handle_from_bare_id() {
    let (client, _api) = fixtures::mock_client();
    let submitted = client.submit(&request("person", "Ada Lovelace")).unwrap();

    let handle = JobHandle::from_id(&submitted.id).unwrap();
    let status = client.status(&handle).unwrap();

    assert_eq!(status.id, submitted.id);
    assert_eq!(status.topic.as_deref(), Some("Ada Lovelace"));
    assert_eq!(status.template.as_deref(), Some("person"));
    assert!(status.elapsed(Utc::now()).is_some());
}

#[test]
fn test_invalid_id_rejected_locally() {
    let (_client, api) = fixtures::mock_client();

    let err = JobHandle::from_id("resp_1/../../admin").unwrap_err();
    assert!(matches!(err, ResearchError::InvalidJobId(_)));
    assert_eq!(api.request_count(), 0);
}

#[test]
fn test_incomplete_job_reports_failed() {
    let (client, api) = fixtures::mock_client();
    let handle = client.submit(&request("company", "Acme")).unwrap();
    api.set_outcome(
        &handle.id,
        Outcome::Incomplete {
            reason: "max_output_tokens".to_string(),
        },
    );
    api.finish(&handle.id);

    let status = client.status(&handle).unwrap();
    assert_eq!(status.state, JobState::Failed);
    assert_eq!(status.remote_status, "incomplete");
    assert!(status
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("max_output_tokens"));
}

#[test]
fn test_transient_failure_then_recovery() {
    let (client, api) = fixtures::mock_client();
    let handle = client.submit(&request("company", "Acme")).unwrap();
    api.inject_failure_times(MockOp::Retrieve, FailureConfig::Disconnect, 1);

    let err = client.status(&handle).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.exit_code(), 20);

    assert_eq!(client.status(&handle).unwrap().state, JobState::Queued);
}

// =============================================================================
// Download
// =============================================================================

#[test]
fn test_download_only_when_completed() {
    let (client, api) = fixtures::mock_client();
    let handle = client.submit(&request("company", "Acme")).unwrap();
    api.hold(&handle.id);

    let err = client.fetch_report(&handle).unwrap_err();
    assert!(matches!(err, ResearchError::JobNotReady { .. }));
    assert_eq!(err.exit_code(), 5);

    api.release(&handle.id);
    api.finish(&handle.id);
    assert_eq!(api.status_of(&handle.id), Some(ResponseStatus::Completed));
    assert!(client.fetch_report(&handle).is_ok());
}

#[test]
fn test_download_failed_job() {
    let (client, api) = fixtures::mock_client();
    let handle = client.submit(&request("company", "Acme")).unwrap();
    api.set_outcome(&handle.id, Outcome::Cancel);
    api.finish(&handle.id);

    let err = client.fetch_report(&handle).unwrap_err();
    assert!(matches!(err, ResearchError::JobFailedUpstream { .. }));
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn test_full_workflow_writes_artifact() {
    let dir = TempDir::new().unwrap();
    let vault = dir.path().join("vault/Research/Companies");
    let (client, api) = fixtures::mock_client();

    let request = JobRequest::builder()
        .template("company")
        .topic("Acme Robotics")
        .output_path(&vault)
        .build()
        .unwrap();
    let handle = client.submit(&request).unwrap();
    api.finish(&handle.id);

    let report = client.fetch_report(&handle).unwrap();
    let target = DownloadTarget::Dir(report.output_dir.clone().unwrap().into());
    let today = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
    let outcome = download(report, &target, None, today, Utc::now()).unwrap();

    assert_eq!(
        outcome.path,
        vault.join("acme-robotics-research-2025-05-20.md")
    );
    assert_eq!(outcome.sources_count, 2);
    assert_eq!(outcome.usage.model, "o3-deep-research");
    assert_eq!(outcome.usage.total_tokens, 128_000);
    // 0.12M * $10 + 0.008M * $40
    assert!((outcome.usage.cost_usd - 1.52).abs() < 1e-9);

    let written = fs::read_to_string(&outcome.path).unwrap();
    assert!(written.starts_with("---\ntitle: \"Research: Acme Robotics\"\ndate: 2025-05-20\n"));
    assert!(written.contains(&format!("response_id: {}\n", handle.id)));
    assert!(written.contains("## Sources\n\n1. [Acme coverage](https://technews.example/acme-series-a)\n"));
}

#[test]
fn test_download_with_inline_citations() {
    let dir = TempDir::new().unwrap();
    let (client, api) = fixtures::mock_client();
    let handle = client.submit(&request("company", "Acme Robotics")).unwrap();
    api.finish(&handle.id);

    let report = client.fetch_report(&handle).unwrap();
    let outcome = download(
        report,
        &DownloadTarget::File(dir.path().join("acme.md")),
        Some(&RewriteOptions::default()),
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
        Utc::now(),
    )
    .unwrap();

    let rewrite = outcome.rewrite.unwrap();
    assert!(rewrite.rewritten >= 1);

    let written = fs::read_to_string(dir.path().join("acme.md")).unwrap();
    assert!(written.contains("Revenue grew [40%](data.example/acme)."));
    assert!(!written.contains("40%. (data.example/acme)"));
}
