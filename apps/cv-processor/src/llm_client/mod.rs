/// LLM Client — the single point of entry for model inference in the CV processor.
///
/// All model calls go through the `LanguageModel` trait. `LlmClient` is the
/// production implementation and talks to a local Ollama-compatible server.
/// No retries and no backoff: a failed call is returned to the caller as-is.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;

pub mod prompts;

const GENERATE_PATH: &str = "/api/generate";
const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// What gets sent to the model for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// A single pre-formatted prompt, submitted without any chat template.
    Raw(String),
    /// A system message plus one user message.
    Chat { system: String, user: String },
}

/// Opaque text-in, text-out inference capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn infer(&self, prompt: &Prompt) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize)]
struct ModelOptions {
    temperature: f32,
    num_ctx: u32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: &'a ModelOptions,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: &'a ModelOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// HTTP client for a local Ollama server.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
    options: ModelOptions,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: ModelOptions {
                temperature: config.temperature,
                num_ctx: config.context_tokens,
                num_predict: config.max_output_tokens,
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: false,
            options: &self.options,
        };
        let text = self.post(GENERATE_PATH, &body).await?;
        let response: GenerateResponse = serde_json::from_str(&text)?;

        debug!(
            "LLM generate succeeded: prompt_tokens={:?}, output_tokens={:?}",
            response.prompt_eval_count, response.eval_count
        );
        Ok(response.response)
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: &self.options,
        };
        let text = self.post(CHAT_PATH, &body).await?;
        let response: ChatResponse = serde_json::from_str(&text)?;

        debug!(
            "LLM chat succeeded: prompt_tokens={:?}, output_tokens={:?}",
            response.prompt_eval_count, response.eval_count
        );
        Ok(response.message.content.trim().to_string())
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(text),
            });
        }
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn infer(&self, prompt: &Prompt) -> Result<String, LlmError> {
        match prompt {
            Prompt::Raw(text) => self.generate(text).await,
            Prompt::Chat { system, user } => self.chat(system, user).await,
        }
    }
}

/// Pulls the message out of an Ollama `{"error": "..."}` body, else returns the body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<OllamaError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}
