use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::segment::language_name;
use crate::translation::{TranslationError, Translator};

pub const DEFAULT_LLM_ENDPOINT: &str = "http://127.0.0.1:11434";
pub const DEFAULT_LLM_MODEL: &str = "qwen2.5:3b";
const GENERATE_PATH: &str = "/api/generate";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid translator endpoint `{0}`: expected http:// or https://")]
    InvalidEndpoint(String),
    #[error("failed to build http client: {0}")]
    ClientBuild(String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct LlmTranslator {
    http: reqwest::Client,
    url: String,
    model: String,
    target_language: String,
    timeout: Duration,
}

impl LlmTranslator {
    pub fn new(
        endpoint: &str,
        model: &str,
        target_language: &str,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(NetworkError::InvalidEndpoint(endpoint.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NetworkError::ClientBuild(err.to_string()))?;

        Ok(Self {
            http,
            url: format!("{endpoint}{GENERATE_PATH}"),
            model: model.trim().to_string(),
            target_language: target_language.to_string(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn generate(&self, text: String) -> Result<String, TranslationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(&text, &self.target_language),
            stream: false,
            options: GenerateOptions {
                temperature: DEFAULT_TEMPERATURE,
            },
        };

        debug!(
            model = self.model.as_str(),
            chars = text.chars().count(),
            "sending translation request"
        );
        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "translation backend error: {body}");
            return Err(TranslationError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        parse_generate_response(&body)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> TranslationError {
        if err.is_timeout() {
            TranslationError::Timeout(self.timeout.as_secs())
        } else {
            TranslationError::Network(err.to_string())
        }
    }
}

impl Translator for LlmTranslator {
    fn translate(
        &self,
        text: String,
    ) -> impl Future<Output = Result<String, TranslationError>> + Send {
        self.generate(text)
    }
}

fn build_prompt(text: &str, target_language: &str) -> String {
    let target = language_name(target_language);
    format!(
        "Translate the following text into {target}. Reply with the translation only, \
         without explanations, notes or quotation marks.\n\n{text}"
    )
}

fn parse_generate_response(body: &str) -> Result<String, TranslationError> {
    let parsed = serde_json::from_str::<GenerateResponse>(body)
        .map_err(|err| TranslationError::Decode(err.to_string()))?;
    if let Some(error) = parsed.error.filter(|message| !message.trim().is_empty()) {
        return Err(TranslationError::Network(error));
    }

    let cleaned = strip_think_blocks(&parsed.response);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(TranslationError::EmptyResponse);
    }
    Ok(cleaned.to_string())
}

fn strip_think_blocks(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(THINK_OPEN) {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + THINK_OPEN.len()..];
        match after_open.find(THINK_CLOSE) {
            Some(close) => rest = &after_open[close + THINK_CLOSE.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    output.push_str(rest);
    output
}
