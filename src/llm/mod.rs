//! LLM chat-completion service
//!
//! One network call shape: `POST {endpoint}/chat/completions` with
//! `{model, messages, temperature, max_tokens}` against any
//! OpenAI-compatible server (hosted or local).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::BrandRagError;
use crate::errors::Result;

/// A single message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Result of one completion call
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text; `None` when the response carried no content
    pub text: Option<String>,
    /// Total token usage reported by the API, 0 when absent
    pub total_tokens: u32,
}

/// Text-generation seam of the pipeline
///
/// Implemented by [`LlmService`] in production; tests inject mocks.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion>;
}

/// Chat-completion client for OpenAI-compatible endpoints
pub struct LlmService {
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl LlmService {
    /// Create a new LLM service from configuration
    ///
    /// # Errors
    /// - Missing API key for a non-local endpoint
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let api_key = match config.llm_key() {
            "" => None,
            key => Some(key.to_string()),
        };

        Self::from_parts(
            config.llm_model().to_string(),
            config.llm_endpoint().to_string(),
            api_key,
        )
    }

    /// Create from explicit parts
    pub fn from_parts(model: String, endpoint: String, api_key: Option<String>) -> Result<Self> {
        if api_key.is_none() && !endpoint.contains("localhost") && !endpoint.contains("127.0.0.1") {
            return Err(BrandRagError::ConfigError(
                "LLM API key not provided for remote endpoint".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BrandRagError::HttpError(e.to_string()))?;

        Ok(Self {
            model,
            endpoint,
            api_key,
            client,
        })
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_inner(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion> {
        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<Choice>,
            usage: Option<Usage>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        #[derive(Deserialize)]
        struct Usage {
            total_tokens: u32,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {}", url);

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| BrandRagError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BrandRagError::GenerationError(format!(
                "Chat completions API error ({status}): {error_text}"
            )));
        }

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| BrandRagError::GenerationError(format!("Failed to parse response: {e}")))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(Completion {
            text,
            total_tokens: result.usage.map_or(0, |u| u.total_tokens),
        })
    }
}

#[async_trait]
impl ChatModel for LlmService {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion> {
        self.complete_inner(messages, temperature, max_tokens).await
    }
}
