use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use archassist::{Error, JobOutcome, ModelClient, PollPolicy};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ModelClient {
    ModelClient::new_with_url(
        "test_api_key".to_string(),
        &server.uri(),
        "https://viewer.test/view/",
    )
    .unwrap()
}

fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        max_attempts,
        interval: Duration::from_millis(10),
    }
}

/// Walks the status endpoint through a fixed sequence, one entry per query.
struct SequenceResponder {
    hits: AtomicUsize,
    statuses: &'static [&'static str],
}

impl SequenceResponder {
    fn new(statuses: &'static [&'static str]) -> Self {
        Self {
            hits: AtomicUsize::new(0),
            statuses,
        }
    }
}

impl wiremock::Respond for SequenceResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let hit = self.hits.fetch_add(1, Ordering::SeqCst);
        let status = self.statuses[hit.min(self.statuses.len() - 1)];
        let progress = if status == "success" { 100 } else { 50 };
        ResponseTemplate::new(200).set_body_json(json!({
            "data": { "task_id": "task-777", "status": status, "progress": progress }
        }))
    }
}

#[tokio::test]
async fn full_workflow_ends_at_the_viewer_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "image_token": "tok-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/task"))
        .and(body_json(json!({
            "type": "image_to_model",
            "file": { "type": "jpg", "file_token": "tok-1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "task_id": "task-777" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/task/task-777"))
        .respond_with(SequenceResponder::new(&["running", "running", "success"]))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (job_id, outcome) = client
        .generate_from_bytes(
            b"dummy jpeg bytes".to_vec(),
            "image/jpeg",
            &fast_policy(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(job_id.as_str(), "task-777");
    assert_eq!(
        outcome,
        JobOutcome::Succeeded {
            viewer_url: "https://viewer.test/view/task-777".to_string()
        }
    );
}

#[tokio::test]
async fn upload_failure_aborts_before_submission_or_polling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "bad file"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Neither the task endpoint nor the status endpoint may ever be hit.
    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .generate_from_bytes(
            b"not an image".to_vec(),
            "image/jpeg",
            &fast_policy(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        Error::Upload { message } => assert_eq!(message, "bad file"),
        other => panic!("expected Upload error, got {other:?}"),
    }
}

#[tokio::test]
async fn timed_out_job_can_be_resumed_without_reuploading() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "image_token": "tok-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "task_id": "task-777" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The job needs three queries to finish; the first invocation only has
    // budget for two.
    Mock::given(method("GET"))
        .and(path("/task/task-777"))
        .respond_with(SequenceResponder::new(&["running", "running", "success"]))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let (job_id, outcome) = client
        .generate_from_bytes(
            b"dummy jpeg bytes".to_vec(),
            "image/jpeg",
            &fast_policy(2),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(outcome, JobOutcome::TimedOut);

    let resumed = client.resume_job(&job_id, &fast_policy(2), &cancel).await;
    assert_eq!(
        resumed,
        JobOutcome::Succeeded {
            viewer_url: "https://viewer.test/view/task-777".to_string()
        }
    );
}

#[tokio::test]
async fn explicit_job_failure_is_reported_as_failed_not_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "image_token": "tok-1" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "task_id": "task-777" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/task/task-777"))
        .respond_with(SequenceResponder::new(&["running", "failed"]))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (_, outcome) = client
        .generate_from_bytes(
            b"dummy jpeg bytes".to_vec(),
            "image/jpeg",
            &fast_policy(10),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, JobOutcome::Failed { .. }));
}
