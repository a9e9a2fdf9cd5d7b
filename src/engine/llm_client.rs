use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::engine::error::TransportError;
use crate::engine::response_normalizer;
use crate::model::config::{ConfigUpdate, Configuration, CredentialStatus};
use crate::model::turn::CHOICE_COUNT;

pub const TEMPERATURE: f32 = 0.9;
pub const TOP_P: f32 = 0.95;
pub const TOP_K: u32 = 40;
pub const MAX_OUTPUT_TOKENS: u32 = 512;

pub const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
pub const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub const CONNECTIVITY_PROMPT: &str = "This is a connectivity check. Reply with exactly \
this JSON object and nothing else: {\"story\": \"Connection test successful.\", \
\"choices\": [{\"id\": \"1\", \"text\": \"Continue\"}, {\"id\": \"2\", \"text\": \"Look around\"}, \
{\"id\": \"3\", \"text\": \"Wait\"}, {\"id\": \"4\", \"text\": \"Go back\"}]}";

/// Boundary to the text-completion backend.
/// Implementations report failures; they never substitute content.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, TransportError>;

    fn update_config(&self, update: ConfigUpdate);

    fn credential_status(&self) -> CredentialStatus;

    /// True only when a canned prompt comes back as a turn with exactly
    /// four choices. Never fails, and makes no call without a credential.
    fn test_connectivity(&self) -> bool {
        if self.credential_status() == CredentialStatus::Unconfigured {
            log::info!("Connectivity check skipped, no API key configured");
            return false;
        }

        match self.generate(CONNECTIVITY_PROMPT) {
            Ok(raw) => match response_normalizer::inspect(&raw) {
                Ok(turn) => turn.choices.len() == CHOICE_COUNT,
                Err(e) => {
                    log::warn!("Connectivity check got an unusable reply: {e}");
                    false
                }
            },
            Err(e) => {
                log::warn!("Connectivity check failed: {e}");
                false
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

#[derive(Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl GenerateContentRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).into(),
                    threshold: SAFETY_THRESHOLD.into(),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// HTTP client for a Gemini-style `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    config: RwLock<Configuration>,
}

impl GeminiClient {
    pub fn new(config: Configuration) -> Result<Self, TransportError> {
        let http = Client::builder().build()?;

        Ok(Self {
            http,
            config: RwLock::new(config),
        })
    }

    /// Copy of the current settings; each request works from one of these.
    pub fn config(&self) -> Configuration {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        let config = self.config();
        let body = GenerateContentRequest::new(prompt);

        log::debug!("Sending prompt ({} chars) to {}", prompt.len(), config.endpoint);

        let response = self
            .http
            .post(&config.endpoint)
            .header("x-goog-api-key", &config.credential)
            .timeout(Duration::from_secs(config.timeout_secs))
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let parsed: GenerateContentResponse = response.json()?;
        extract_text(parsed)
    }

    fn update_config(&self, update: ConfigUpdate) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.apply(update);
        log::info!("Backend configuration updated");
    }

    fn credential_status(&self) -> CredentialStatus {
        self.config().credential_status()
    }
}

pub fn extract_text(response: GenerateContentResponse) -> Result<String, TransportError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or(TransportError::MissingText)
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope.error.message.unwrap_or_else(|| body.to_string());
            match envelope.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            }
        }
        Err(_) => body.to_string(),
    }
}
