use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::extraction::PromptStyle;

/// Application configuration loaded from environment variables (and `.env`).
/// Every setting has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub cv_folder: PathBuf,
    pub archive_folder: PathBuf,
    pub output_file: PathBuf,
    pub poll_interval: Duration,
    pub llm: LlmConfig,
    /// Input budget for the resume text, in tokens.
    pub max_input_tokens: usize,
    pub chars_per_token: usize,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub prompt_style: PromptStyle,
    pub temperature: f32,
    pub context_tokens: u32,
    pub max_output_tokens: u32,
    /// `None` means a hung model call blocks the pipeline indefinitely.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let prompt_style = env_or("LLM_PROMPT_STYLE", "completion");
        let prompt_style = match prompt_style.as_str() {
            "completion" => PromptStyle::Completion,
            "chat" => PromptStyle::Chat,
            other => bail!("LLM_PROMPT_STYLE must be 'completion' or 'chat', got '{other}'"),
        };

        let timeout = match std::env::var("LLM_TIMEOUT_SECS") {
            Ok(v) => Some(Duration::from_secs(
                v.parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            )),
            Err(_) => None,
        };

        Ok(Config {
            cv_folder: env_or("CV_FOLDER", "cvs").into(),
            archive_folder: env_or("ARCHIVE_FOLDER", "archive").into(),
            output_file: env_or("OUTPUT_FILE", "output.csv").into(),
            poll_interval: Duration::from_secs(parse_env("POLL_INTERVAL_SECS", 30)?),
            llm: LlmConfig {
                base_url: env_or("LLM_BASE_URL", "http://localhost:11434"),
                model: env_or("LLM_MODEL", "llama3.1:8b-instruct-q4_K_M"),
                prompt_style,
                temperature: parse_env("LLM_TEMPERATURE", 0.1)?,
                context_tokens: parse_env("LLM_CONTEXT_TOKENS", 5000)?,
                max_output_tokens: parse_env("LLM_MAX_OUTPUT_TOKENS", 5000)?,
                timeout,
            },
            max_input_tokens: parse_env("MAX_INPUT_TOKENS", 4900)?,
            chars_per_token: parse_env("CHARS_PER_TOKEN", 4)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Character budget for the resume text submitted with each prompt.
    pub fn max_input_chars(&self) -> usize {
        self.max_input_tokens * self.chars_per_token
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
