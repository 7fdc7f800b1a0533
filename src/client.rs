use crate::error::Error;
use crate::poll::{poll_job, PollPolicy, StatusSource};
use crate::types::{
    ApiResponse, FileRef, JobCreated, JobId, JobOutcome, JobRequest, JobState, JobStatusData,
    UploadData, UploadToken,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::multipart;
use serde::Deserialize;
use std::env;
use std::path::Path;
use tokio::fs::File;
use tokio_util::codec::{BytesCodec, FramedRead};
use tokio_util::sync::CancellationToken;
use url::Url;

const DEFAULT_API_URL: &str = "https://api.tripo3d.ai/v2/openapi/";
const DEFAULT_VIEWER_URL: &str = "https://www.tripo3d.ai/view/";
const API_KEY_ENV: &str = "TRIPO_API_KEY";

/// The job type descriptor for image-to-model generation.
const JOB_TYPE: &str = "image_to_model";
/// The file format descriptor the task endpoint expects for uploads.
const UPLOAD_FORMAT: &str = "jpg";

/// The client for the 3D-model generation service.
///
/// It holds the shared `reqwest::Client` and the base URLs for all API
/// requests. It is designed to be cloneable and safe to share across threads.
///
/// The full workflow is upload → submit → poll, and each step is exposed on
/// its own so a caller can re-enter at the polling stage after a timeout:
///
/// 1. [`upload_image`](Self::upload_image) turns image bytes into an
///    [`UploadToken`].
/// 2. [`submit_job`](Self::submit_job) trades the token for a [`JobId`].
/// 3. [`resume_job`](Self::resume_job) polls the job until it reaches a
///    terminal [`JobOutcome`].
///
/// [`generate_from_bytes`](Self::generate_from_bytes) and
/// [`generate_from_file`](Self::generate_from_file) run all three steps.
#[derive(Clone)]
pub struct ModelClient {
    client: reqwest::Client,
    base_url: Url,
    viewer_base_url: String,
}

impl ModelClient {
    /// Creates a new `ModelClient`.
    ///
    /// This method initializes the client with an API key. It first checks
    /// for the `api_key` parameter. If it's `None`, it falls back to the
    /// `TRIPO_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// - `Error::MissingApiKey` if the API key is not provided in either way.
    /// - `Error::Transport` if the internal HTTP client fails to build.
    /// - `Error::Url` if the default API URL is invalid.
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        let api_key = api_key
            .or_else(|| env::var(API_KEY_ENV).ok())
            .ok_or(Error::MissingApiKey(API_KEY_ENV))?;
        Self::new_with_url(api_key, DEFAULT_API_URL, DEFAULT_VIEWER_URL)
    }

    /// Creates a new `ModelClient` with custom base URLs.
    ///
    /// This is useful for testing or for connecting to a different API
    /// deployment. `viewer_base_url` is the prefix the job id is appended to
    /// when deriving the result URL of a finished job.
    ///
    /// # Errors
    ///
    /// - `Error::Transport` if the internal HTTP client fails to build.
    /// - `Error::Url` if the provided `base_url` is invalid.
    pub fn new_with_url(
        api_key: String,
        base_url: &str,
        viewer_base_url: &str,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", api_key).parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            base_url,
            viewer_base_url: viewer_base_url.to_string(),
        })
    }

    /// Uploads raw image bytes and returns the content token the task
    /// endpoint consumes.
    ///
    /// A single multipart POST, no retry: a failed attempt propagates
    /// immediately and the caller decides whether to offer a retry.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The image content, already resized/compressed by the caller.
    /// * `content_type` - The declared MIME type, e.g. "image/jpeg".
    ///
    /// # Errors
    ///
    /// `Error::Upload` on a non-2xx response or a payload without a token
    /// field, carrying the server's `message` when it sends one.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadToken, Error> {
        let part = multipart::Part::bytes(bytes)
            .file_name("image.jpg")
            .mime_str(content_type)?;
        self.send_upload(part).await
    }

    /// Uploads a local image file, streaming it from disk.
    ///
    /// Same contract as [`upload_image`](Self::upload_image); the MIME type
    /// is guessed from the file extension.
    pub async fn upload_image_file<P: AsRef<Path>>(
        &self,
        image_path: P,
    ) -> Result<UploadToken, Error> {
        let image_path = image_path.as_ref();

        let file = File::open(image_path).await?;
        let stream = FramedRead::new(file, BytesCodec::new());
        let file_body = reqwest::Body::wrap_stream(stream);

        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Could not determine file name",
                ))
            })?
            .to_string();

        let mime_type = mime_guess::from_path(image_path)
            .first_or_octet_stream()
            .to_string();

        let part = multipart::Part::stream(file_body)
            .file_name(file_name)
            .mime_str(&mime_type)?;
        self.send_upload(part).await
    }

    async fn send_upload(&self, file_part: multipart::Part) -> Result<UploadToken, Error> {
        let url = self.base_url.join("upload")?;
        let form = multipart::Form::new().part("file", file_part);

        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if status.is_success() {
            if let Ok(api_response) = ApiResponse::<UploadData>::deserialize(&body) {
                return Ok(api_response.data.image_token);
            }
        }
        Err(Error::Upload {
            message: server_message(&body, "image upload failed"),
        })
    }

    /// Submits a new image-to-model generation job against an uploaded image.
    ///
    /// A single POST, no retry.
    ///
    /// # Arguments
    ///
    /// * `token` - The content token from a previous upload.
    ///
    /// # Returns
    ///
    /// The [`JobId`] of the newly created job, which is the key for all
    /// subsequent status queries and for manual retry.
    ///
    /// # Errors
    ///
    /// `Error::Submission` on a non-2xx response or a payload without a job
    /// id, carrying the server's `message` when it sends one.
    pub async fn submit_job(&self, token: &UploadToken) -> Result<JobId, Error> {
        let request_body = JobRequest {
            type_: JOB_TYPE,
            file: FileRef {
                type_: UPLOAD_FORMAT,
                file_token: token,
            },
        };

        let url = self.base_url.join("task")?;
        let response = self.client.post(url).json(&request_body).send().await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if status.is_success() {
            if let Ok(api_response) = ApiResponse::<JobCreated>::deserialize(&body) {
                tracing::debug!(job_id = %api_response.data.task_id, "job submitted");
                return Ok(api_response.data.task_id);
            }
        }
        Err(Error::Submission {
            message: server_message(&body, "model generation failed"),
        })
    }

    /// Retrieves the current state of a job with a single status query.
    ///
    /// The recognized terminal statuses are `"success"` and `"failed"`; any
    /// other status string the service reports comes back as
    /// [`JobState::InProgress`]. Polling folds errors from this method into
    /// its attempt budget, see [`poll_job`].
    pub async fn job_status(&self, job_id: &JobId) -> Result<JobState, Error> {
        let url = self.base_url.join(&format!("task/{}", job_id))?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            let api_response: ApiResponse<JobStatusData> = response.json().await?;
            Ok(api_response.data.status)
        } else {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            Err(Error::Status {
                message: server_message(&body, "status query failed"),
            })
        }
    }

    /// The viewer URL a finished job is reachable at.
    ///
    /// The status payload does not carry this URL; it is derived by
    /// appending the job id to the viewer base URL.
    pub fn viewer_url(&self, job_id: &JobId) -> String {
        format!("{}{}", self.viewer_base_url, job_id)
    }

    /// Runs the full workflow for raw image bytes: upload, submit, poll.
    ///
    /// Upload and submission failures abort immediately with an error. Once
    /// a job exists, every further outcome (timeout and explicit failure
    /// included) is reported as a [`JobOutcome`] next to the [`JobId`], so
    /// the caller can offer a retry that re-enters polling via
    /// [`resume_job`](Self::resume_job) without re-uploading.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use archassist::{ModelClient, PollPolicy};
    /// # use tokio_util::sync::CancellationToken;
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// # let client = ModelClient::new(Some("your_api_key".to_string()))?;
    /// let bytes = std::fs::read("building.jpg")?;
    /// let cancel = CancellationToken::new();
    /// let (job_id, outcome) = client
    ///     .generate_from_bytes(bytes, "image/jpeg", &PollPolicy::default(), &cancel)
    ///     .await?;
    /// println!("Job {job_id} finished: {outcome:?}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_from_bytes(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<(JobId, JobOutcome), Error> {
        let token = self.upload_image(bytes, content_type).await?;
        let job_id = self.submit_job(&token).await?;
        let outcome = poll_job(self, &job_id, policy, cancel).await;
        Ok((job_id, outcome))
    }

    /// Runs the full workflow for a local image file: upload, submit, poll.
    ///
    /// See [`generate_from_bytes`](Self::generate_from_bytes).
    pub async fn generate_from_file<P: AsRef<Path>>(
        &self,
        image_path: P,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<(JobId, JobOutcome), Error> {
        let token = self.upload_image_file(image_path).await?;
        let job_id = self.submit_job(&token).await?;
        let outcome = poll_job(self, &job_id, policy, cancel).await;
        Ok((job_id, outcome))
    }

    /// Polls an existing job until a terminal [`JobOutcome`].
    ///
    /// This is the manual-retry entry point: after a `TimedOut` or `Failed`
    /// outcome the same [`JobId`] can be handed back here with a fresh
    /// attempt budget. Nothing is re-uploaded or re-submitted.
    pub async fn resume_job(
        &self,
        job_id: &JobId,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        poll_job(self, job_id, policy, cancel).await
    }
}

#[async_trait]
impl StatusSource for ModelClient {
    async fn job_status(&self, job_id: &JobId) -> Result<JobState, Error> {
        ModelClient::job_status(self, job_id).await
    }

    fn result_url(&self, job_id: &JobId) -> String {
        self.viewer_url(job_id)
    }
}

/// Pulls the server's `message` field out of an error body, falling back to
/// a generic description when the body carries none.
fn server_message(body: &serde_json::Value, fallback: &str) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_string())
}
