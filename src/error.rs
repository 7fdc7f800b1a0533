#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API key is missing. Please provide it or set the {0} environment variable.")]
    MissingApiKey(&'static str),
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Image upload rejected: {message}")]
    Upload { message: String },
    #[error("Job submission rejected: {message}")]
    Submission { message: String },
    #[error("Status query failed: {message}")]
    Status { message: String },
    #[error("Analysis request failed: {message}")]
    Advisor { message: String },
    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}
