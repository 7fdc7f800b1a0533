use archassist::{Error, JobId, JobState, ModelClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ModelClient {
    ModelClient::new_with_url(
        "test_api_key".to_string(),
        &server.uri(),
        "https://viewer.test/view/",
    )
    .unwrap()
}

async fn mount_status(server: &MockServer, job: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/task/{job}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "task_id": job, "status": status, "progress": 50 }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn recognized_terminal_statuses_decode_exactly() {
    let server = MockServer::start().await;
    mount_status(&server, "task-ok", "success").await;
    mount_status(&server, "task-bad", "failed").await;

    let client = client_for(&server);
    assert_eq!(
        client.job_status(&JobId::new("task-ok")).await.unwrap(),
        JobState::Success
    );
    assert_eq!(
        client.job_status(&JobId::new("task-bad")).await.unwrap(),
        JobState::Failed
    );
}

#[tokio::test]
async fn any_other_status_string_reads_as_in_progress() {
    let server = MockServer::start().await;
    mount_status(&server, "task-q", "queued").await;
    mount_status(&server, "task-r", "running").await;
    mount_status(&server, "task-x", "banned").await;

    let client = client_for(&server);
    for job in ["task-q", "task-r", "task-x"] {
        assert_eq!(
            client.job_status(&JobId::new(job)).await.unwrap(),
            JobState::InProgress
        );
    }
}

#[tokio::test]
async fn non_success_response_is_a_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/task/task-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "task not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.job_status(&JobId::new("task-gone")).await.unwrap_err();
    match err {
        Error::Status { message } => assert_eq!(message, "task not found"),
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn viewer_url_is_templated_from_the_job_id() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    assert_eq!(
        client.viewer_url(&JobId::new("task-777")),
        "https://viewer.test/view/task-777"
    );
}
