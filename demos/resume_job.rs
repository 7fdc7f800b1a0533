//! This example re-enters polling for a job that previously timed out.
//!
//! Nothing is re-uploaded or re-submitted; the existing job id gets a
//! fresh attempt budget.
//!
//! Usage:
//! `cargo run --example resume_job <job_id>`

use archassist::{JobId, JobOutcome, ModelClient, PollPolicy};
use std::env;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let job_id = env::args()
        .nth(1)
        .map(JobId::new)
        .ok_or_else(|| anyhow::anyhow!("usage: resume_job <job_id>"))?;

    let client = ModelClient::new(None)?;
    println!("Resuming job: {}", job_id);

    let outcome = client
        .resume_job(&job_id, &PollPolicy::default(), &CancellationToken::new())
        .await;

    match outcome {
        JobOutcome::Succeeded { viewer_url } => println!("Model ready: {}", viewer_url),
        JobOutcome::Failed { reason } => eprintln!("Job failed: {}", reason),
        JobOutcome::TimedOut => eprintln!("Still processing. Try again later."),
        JobOutcome::Cancelled => eprintln!("Cancelled."),
    }

    Ok(())
}
