use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque token identifying previously-uploaded image content.
///
/// Produced by [`ModelClient::upload_image`](crate::ModelClient::upload_image)
/// and consumed once when submitting a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadToken(String);

impl UploadToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque identifier of a submitted generation job.
///
/// This is the key for every status query, for the derived viewer URL, and
/// for manual retry. It is held in memory only; the service does not expect
/// it to survive a restart of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The wire-level status of a generation job, as reported by one query.
///
/// The service's recognized terminal values are `"success"` and `"failed"`.
/// Every other status string it may report over the life of a job
/// (`"queued"`, `"pending"`, `"running"`, ...) deserializes to
/// [`JobState::InProgress`], so an unexpected value can never fail parsing
/// or silently fall through a string comparison.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// The job completed and its result is viewable.
    Success,
    /// The service gave up on the job.
    Failed,
    /// Any non-terminal status.
    #[serde(other)]
    InProgress,
}

impl JobState {
    /// Whether this state stops polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failed)
    }
}

/// The terminal result of one polling invocation.
///
/// Exactly one of these holds when [`poll_job`](crate::poll_job) returns;
/// all four stop the loop. None of them is an [`Error`](crate::Error):
/// the caller decides whether a non-success outcome deserves a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job finished; `viewer_url` is derived from the job id.
    Succeeded { viewer_url: String },
    /// The service explicitly reported the job as failed.
    Failed { reason: String },
    /// The attempt budget was exhausted without a terminal status.
    TimedOut,
    /// The caller's cancellation token fired before a terminal status.
    Cancelled,
}

/// A request to create an image-to-model generation job.
#[derive(Serialize, Debug)]
pub(crate) struct JobRequest<'a> {
    /// The job type descriptor, always "image_to_model".
    #[serde(rename = "type")]
    pub(crate) type_: &'static str,
    /// The previously-uploaded file the job operates on.
    pub(crate) file: FileRef<'a>,
}

/// References an uploaded file by token within a job request.
#[derive(Serialize, Debug)]
pub(crate) struct FileRef<'a> {
    /// The file format descriptor the service expects, e.g. "jpg".
    #[serde(rename = "type")]
    pub(crate) type_: &'a str,
    pub(crate) file_token: &'a UploadToken,
}

/// The response from an API call that successfully creates a job.
#[derive(Deserialize, Debug)]
pub(crate) struct JobCreated {
    pub(crate) task_id: JobId,
}

/// (Internal) Holds the content token from a multipart upload.
#[derive(Deserialize, Debug)]
pub(crate) struct UploadData {
    pub(crate) image_token: UploadToken,
}

/// (Internal) The status payload of a single poll query.
#[derive(Deserialize, Debug)]
pub(crate) struct JobStatusData {
    pub(crate) status: JobState,
}

/// (Internal) A generic wrapper for API responses where the content is nested under a "data" field.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub(crate) data: T,
}
