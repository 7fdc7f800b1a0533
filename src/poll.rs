//! Bounded fixed-interval polling for long-running generation jobs.
//!
//! The generation service finishes a job minutes after accepting it, so the
//! only way to observe completion is to query its status repeatedly. This
//! module owns that loop: a fixed inter-query delay, a hard attempt budget,
//! and a cancellation token that is honored before every query and during
//! every delay. The status transport is injected through [`StatusSource`],
//! which keeps the loop testable without a network or a real clock.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::types::{JobId, JobOutcome, JobState};

/// The status endpoint reports no failure detail, so every failed job
/// surfaces with this reason.
const FAILURE_REASON: &str = "model generation failed";

/// Tunable parameters for one polling invocation.
///
/// The defaults match the generation service's expected job duration:
/// up to 60 queries, 8 seconds apart. The interval is fixed, with no
/// back-off and no jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of status queries before the loop gives up.
    pub max_attempts: u32,
    /// Delay between consecutive queries.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(8000),
        }
    }
}

/// Where the poller gets job statuses from.
///
/// [`ModelClient`](crate::ModelClient) is the production implementation;
/// tests script one with canned replies.
#[async_trait]
pub trait StatusSource {
    /// Issue a single status query for `job_id`.
    async fn job_status(&self, job_id: &JobId) -> Result<JobState, Error>;

    /// The viewer URL a finished job is reachable at.
    ///
    /// The status payload does not carry this URL; it is templated from the
    /// job id by whoever knows the service's viewer base.
    fn result_url(&self, job_id: &JobId) -> String;
}

/// Polls `job_id` until a terminal outcome, the attempt budget runs out, or
/// `cancel` fires.
///
/// Queries are strictly sequential: each one completes (or errors) before
/// the delay starts, and the delay elapses before the next query is issued.
/// A query that fails at the transport, HTTP, or parse level consumes one
/// attempt and the loop continues, exactly as if the job were still
/// pending. A persistently-broken network therefore exhausts the budget
/// and surfaces as [`JobOutcome::TimedOut`]; each absorbed error is logged
/// so that case is diagnosable.
///
/// Exactly `policy.max_attempts` queries are issued in the worst case,
/// never one more, and no delay follows the final query.
///
/// A `TimedOut` or `Failed` outcome does not invalidate the job id: calling
/// this again with the same id re-enters with a fresh budget and no
/// re-upload or re-submission.
pub async fn poll_job<S>(
    source: &S,
    job_id: &JobId,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> JobOutcome
where
    S: StatusSource + ?Sized,
{
    for attempt in 0..policy.max_attempts {
        if cancel.is_cancelled() {
            tracing::debug!(%job_id, attempt, "polling cancelled");
            return JobOutcome::Cancelled;
        }

        let state = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(%job_id, attempt, "polling cancelled mid-query");
                return JobOutcome::Cancelled;
            }
            result = source.job_status(job_id) => match result {
                Ok(state) => state,
                Err(e) => {
                    // Absorbed into the budget, see above.
                    tracing::warn!(%job_id, attempt, error = %e, "status query failed, counting as in progress");
                    JobState::InProgress
                }
            }
        };

        match state {
            JobState::Success => {
                let viewer_url = source.result_url(job_id);
                tracing::debug!(%job_id, attempt, %viewer_url, "job succeeded");
                return JobOutcome::Succeeded { viewer_url };
            }
            JobState::Failed => {
                tracing::debug!(%job_id, attempt, "job reported failed");
                return JobOutcome::Failed {
                    reason: FAILURE_REASON.to_string(),
                };
            }
            JobState::InProgress => {}
        }

        // No delay after the final query.
        if attempt + 1 < policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%job_id, attempt, "polling cancelled during delay");
                    return JobOutcome::Cancelled;
                }
                _ = sleep(policy.interval) => {}
            }
        }
    }

    tracing::debug!(%job_id, max_attempts = policy.max_attempts, "attempt budget exhausted");
    JobOutcome::TimedOut
}
