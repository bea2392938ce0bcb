//! End-to-end pipeline tests with unconfigured or mocked collaborators.
//!
//! These runs use a guaranteed-unresolvable source host, so acquisition
//! always fails fast regardless of whether yt-dlp is installed; the tests
//! pin down the controller's degrade/fail/cancel behavior around that.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use intake_models::TaskStatus;
use intake_runner::config::{TaskParams, WebhookSettings};
use intake_runner::webhook::WebhookNotifier;
use intake_runner::{CancelFlag, Pipeline, RunnerConfig};
use intake_storage::StorageState;

fn config(tolerant: bool) -> RunnerConfig {
    RunnerConfig {
        task: TaskParams {
            source_url: "https://media.invalid/v/1".into(),
            task_name: "Demo".into(),
            row_index: "7".into(),
            assignee: "Sam".into(),
            videographer: "".into(),
            shoot_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            notes: "".into(),
        },
        webhook: WebhookSettings {
            url: None,
            secret: "s3cret".into(),
            test_mode: false,
        },
        tolerant,
        debug_payload: false,
        download_timeout: Duration::from_secs(120),
    }
}

fn pipeline(config: RunnerConfig, cancel: CancelFlag) -> Pipeline {
    let webhook = WebhookNotifier::new(config.webhook.clone(), false);
    Pipeline::new(
        config,
        StorageState::Unconfigured,
        None,
        None,
        webhook,
        cancel,
    )
}

#[tokio::test]
async fn tolerant_run_degrades_to_placeholder_and_cleans_up() {
    let report = pipeline(config(true), CancelFlag::new()).run().await;

    assert_eq!(report.status, TaskStatus::PartiallyCompleted);
    assert_eq!(report.status.exit_code(), 2);

    let acquisition = report.record.acquisition.as_ref().expect("placeholder outcome");
    assert!(acquisition.placeholder_used);
    // Workspace was released after reporting.
    assert!(!acquisition.media_path.exists());

    // Downstream stages still ran on the placeholder.
    let publication = report.record.publication.as_ref().expect("publication outcome");
    assert_eq!(publication.media_url, "https://media.invalid/v/1");
    let synthesis = report.record.synthesis.as_ref().expect("synthesis outcome");
    assert!(synthesis.fallback_used);
    assert!(synthesis.content.validate().is_ok());

    assert!(report.record.error_message.is_some());
}

#[tokio::test]
async fn non_tolerant_run_fails() {
    let report = pipeline(config(false), CancelFlag::new()).run().await;

    assert_eq!(report.status, TaskStatus::Failed);
    assert_eq!(report.status.exit_code(), 1);
    assert!(report.record.acquisition.is_none());
    let message = report.record.error_message.expect("error recorded");
    assert!(message.contains("acquisition failed"));
}

#[tokio::test]
async fn invalid_config_fails_before_any_stage() {
    let mut bad = config(false);
    bad.task.source_url = "".into();

    let report = pipeline(bad, CancelFlag::new()).run().await;

    assert_eq!(report.status, TaskStatus::Failed);
    assert!(report.record.acquisition.is_none());
    assert!(report
        .record
        .error_message
        .expect("error recorded")
        .contains("VIDEO_URL"));
}

#[tokio::test]
async fn pre_cancelled_run_ends_cancelled() {
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = pipeline(config(true), cancel).run().await;

    assert_eq!(report.status, TaskStatus::Cancelled);
    assert_eq!(report.status.exit_code(), 130);
    assert!(report.record.acquisition.is_none());
}

#[tokio::test]
async fn failed_run_delivers_error_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(false);
    cfg.webhook.url = Some(server.uri());
    let report = pipeline(cfg, CancelFlag::new()).run().await;
    assert_eq!(report.status, TaskStatus::Failed);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["secret"], "s3cret");
    assert_eq!(body["row_index"], "7");
    assert_eq!(body["task_id"], report.record.input.task_id.as_str());
    assert!(!body["error_message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn degraded_run_delivers_success_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(true);
    cfg.webhook.url = Some(server.uri());
    let report = pipeline(cfg, CancelFlag::new()).run().await;
    assert_eq!(report.status, TaskStatus::PartiallyCompleted);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["media_url"], "https://media.invalid/v/1");
    assert_eq!(body["stats"]["placeholder_used"], true);
    assert!(body["titles"].as_array().unwrap().iter().any(|t| t
        .as_str()
        .unwrap()
        .contains("Demo")));
}
