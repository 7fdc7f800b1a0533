//! This example asks the chat endpoint for famous landmarks in a location
//! and prints each one with its potential issues.
//!
//! To run this example, you must have the `OPENAI_API_KEY` environment
//! variable set.
//!
//! Usage:
//! `cargo run --example search_landmarks "Paris"`

use archassist::AdvisorClient;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let location = env::args().nth(1).unwrap_or_else(|| "Paris".to_string());

    let client = AdvisorClient::new(None)?;
    println!("Searching landmarks in: '{}'", location);

    let landmarks = client.search_landmarks(&location).await?;
    for landmark in landmarks {
        println!("\n{}", landmark.name);
        println!("  {}", landmark.issues);
    }

    Ok(())
}
