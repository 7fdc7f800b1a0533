//! Async Rust client for the Architecture Assistant's external services.
//!
//! This crate is the service-facing half of the app: it turns a building
//! photo into a viewable 3D model through a long-running generation job,
//! and answers landmark and building-issue questions through a
//! language-model chat endpoint. The UI layer stays on the other side of
//! this API.
//!
//! ## Features
//! - Image upload and image-to-model job submission.
//! - A bounded, fixed-interval polling loop with typed terminal outcomes
//!   and explicit cancellation, tracking a generation job from submission
//!   to a viewer URL.
//! - Manual retry that re-enters polling for an existing job without
//!   re-uploading.
//! - Landmark search and building-photo analysis as single-shot chat calls.
//! - Typed error handling for robust applications.
//!
//! ## Quick start
//!
//! ```no_run
//! use archassist::{ModelClient, PollPolicy};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ModelClient::new(None)?; // key from TRIPO_API_KEY
//!     let cancel = CancellationToken::new();
//!     let (job_id, outcome) = client
//!         .generate_from_file("building.jpg", &PollPolicy::default(), &cancel)
//!         .await?;
//!     println!("job {job_id}: {outcome:?}");
//!     Ok(())
//! }
//! ```

mod advisor;
mod client;
mod error;
mod poll;
mod types;

pub use advisor::{AdvisorClient, AnalysisReport, Landmark};
pub use client::ModelClient;
pub use error::Error;
pub use poll::{poll_job, PollPolicy, StatusSource};
pub use types::{JobId, JobOutcome, JobState, UploadToken};
