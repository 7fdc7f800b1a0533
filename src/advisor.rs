//! Single-shot chat-endpoint queries: landmark search and building analysis.
//!
//! Both calls are plain request/response with no retry and no state. The
//! response's free text is parsed by the line conventions the prompts ask
//! for (`"N. Name: issue"` for searches, `- issue` for image analysis).

use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::Error;

const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

static NUMBERING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

/// A landmark returned by [`AdvisorClient::search_landmarks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmark {
    pub name: String,
    /// Free-text description of maintenance, environmental, or structural issues.
    pub issues: String,
}

/// The result of analyzing a building photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    /// The full text content returned by the analysis.
    pub content: String,
    /// Lines of `content` that name a discrete issue, when any do.
    pub issues: Option<Vec<String>>,
}

/// The client for the language-model chat endpoint.
///
/// One instance serves both query shapes the app needs: a text-only
/// landmark search for a typed location, and a multimodal analysis of a
/// building photo.
pub struct AdvisorClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ChatContent>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl AdvisorClient {
    /// Creates a new `AdvisorClient`.
    ///
    /// Checks the `api_key` parameter first, then the `OPENAI_API_KEY`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// `Error::MissingApiKey` if the key is not provided in either way.
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        let api_key = api_key
            .or_else(|| env::var(API_KEY_ENV).ok())
            .ok_or(Error::MissingApiKey(API_KEY_ENV))?;
        Ok(Self::with_endpoint(api_key, DEFAULT_CHAT_URL))
    }

    /// Creates a client against a custom chat endpoint (used by tests).
    pub fn with_endpoint(api_key: String, endpoint: &str) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Lists famous landmarks in `location` together with their issues.
    ///
    /// One chat request; the model is instructed to answer one landmark per
    /// line as `"N. Name: issue description"`, and each non-empty line of
    /// the reply is parsed by that convention.
    pub async fn search_landmarks(&self, location: &str) -> Result<Vec<Landmark>, Error> {
        let prompt = format!(
            "You are an expert in architecture. Given the location \"{}\", please list three famous architectural landmarks in that location.\n\
             For each landmark, list potential issues related to maintenance, environmental challenges, or structural problems.\n\
             Format your response as follows:\n\
             1. Landmark Name: Issue description\n\
             2. Landmark Name: Issue description\n\
             3. Landmark Name: Issue description",
            location.trim()
        );

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Text(prompt),
            }],
            temperature: 0.5,
            max_tokens: 100,
        };

        let text = self.send_chat(request).await?;
        Ok(parse_landmarks(&text))
    }

    /// Analyzes a building photo for potential architectural issues.
    ///
    /// The image travels as a base64 data URL inside the message content
    /// array. Lines of the reply starting with `-` are pulled out as
    /// discrete issues; the full text is kept either way.
    pub async fn analyze_building(
        &self,
        image: &[u8],
        format: &str,
    ) -> Result<AnalysisReport, Error> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ChatContent::Text {
                        text: "Analyze this architectural image and list potential issues.\n\n1. [Category]: [Issue]"
                            .to_string(),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url(image, format),
                        },
                    },
                ]),
            }],
            temperature: 0.5,
            max_tokens: 500,
        };

        let content = self.send_chat(request).await?;
        let issues = extract_issues(&content);
        Ok(AnalysisReport { content, issues })
    }

    async fn send_chat(&self, request: ChatRequest<'_>) -> Result<String, Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(Error::Advisor { message });
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::Advisor {
                message: "response contained no content".to_string(),
            })
    }
}

/// Encodes image bytes as a data URL for OpenAI-style content arrays.
fn data_url(bytes: &[u8], format: &str) -> String {
    let media_type = match format {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    };
    format!(
        "data:{};base64,{}",
        media_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Parses `"N. Name: issue text"` lines into [`Landmark`]s.
///
/// Numbering is optional and stripped; everything after the first `:` is
/// the issue text, with later colons kept verbatim. A line without a colon
/// becomes a landmark with empty issues rather than being dropped.
fn parse_landmarks(text: &str) -> Vec<Landmark> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (name_part, issues) = match line.split_once(':') {
                Some((head, tail)) => (head, tail.trim().to_string()),
                None => (line, String::new()),
            };
            let name = NUMBERING_RE.replace(name_part.trim(), "").trim().to_string();
            Landmark { name, issues }
        })
        .collect()
}

/// Pulls lines starting with `-` out of an analysis reply.
fn extract_issues(content: &str) -> Option<Vec<String>> {
    let issues: Vec<String> = content
        .lines()
        .filter(|line| line.starts_with('-'))
        .map(str::to_owned)
        .collect();
    if issues.is_empty() {
        None
    } else {
        Some(issues)
    }
}
