//! This example sends a building photo to the chat endpoint and prints the
//! architectural issues it reports.
//!
//! To run this example, you must have the `OPENAI_API_KEY` environment
//! variable set.
//!
//! Usage:
//! `cargo run --example analyze_building assets/image.jpg`

use archassist::AdvisorClient;
use std::env;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let image_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/image.jpg".to_string());
    let bytes = std::fs::read(&image_path)?;
    let format = Path::new(&image_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("jpeg");

    let client = AdvisorClient::new(None)?;
    println!("Analyzing: '{}'", image_path);

    let report = client.analyze_building(&bytes, format).await?;
    match report.issues {
        Some(issues) => {
            println!("\nPotential issues:");
            for issue in issues {
                println!("  {}", issue);
            }
        }
        None => println!("\n{}", report.content),
    }

    Ok(())
}
