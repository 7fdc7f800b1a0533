//! This example runs the full image-to-model workflow: upload a local
//! photo, submit a generation job, and poll until the job finishes.
//!
//! Ctrl-C cancels the polling loop cleanly instead of killing the process
//! mid-request.
//!
//! To run this example, you must have the `TRIPO_API_KEY` environment
//! variable set, and an image file must exist at `assets/image.jpg`.
//!
//! Usage:
//! `cargo run --example generate_model`

use archassist::{JobOutcome, ModelClient, PollPolicy};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file if it exists.
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let client = ModelClient::new(None)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCancelling...");
            trigger.cancel();
        }
    });

    let image_path = "assets/image.jpg";
    println!("Generating 3D model from: '{}'", image_path);

    let (job_id, outcome) = client
        .generate_from_file(image_path, &PollPolicy::default(), &cancel)
        .await?;

    match outcome {
        JobOutcome::Succeeded { viewer_url } => {
            println!("\nModel ready!");
            println!("-> View it at: {}", viewer_url);
        }
        JobOutcome::Failed { reason } => {
            eprintln!("\nJob {} failed: {}", job_id, reason);
        }
        JobOutcome::TimedOut => {
            eprintln!("\nStill processing after the full attempt budget.");
            eprintln!("Resume later with: cargo run --example resume_job {}", job_id);
        }
        JobOutcome::Cancelled => {
            eprintln!("\nCancelled. Job {} keeps running on the service.", job_id);
        }
    }

    Ok(())
}
