//! Chat backends: the one seam between the pipeline and an LLM vendor.
//!
//! The pipeline only ever needs "send this prompt, give me the reply text",
//! so [`ChatBackend`] is that and nothing more. Two implementations ship:
//!
//! * [`CohereBackend`]: Cohere's chat endpoint over `reqwest`. Cohere is the
//!   default vendor when `COHERE_API_KEY` is set.
//! * [`EdgequakeBackend`]: any provider edgequake-llm knows (OpenAI,
//!   Anthropic, Gemini, Mistral, Ollama, LM Studio, Azure, …).
//!
//! Tests and embedders can supply their own implementation through
//! [`crate::config::AnalyzerConfigBuilder::backend`].

use crate::config::{AnalyzerConfig, DEFAULT_COHERE_MODEL, DEFAULT_EDGEQUAKE_MODEL};
use crate::error::InfoBaitError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest {
    pub max_tokens: usize,
    pub temperature: f32,
}

/// A text-in, text-out chat completion backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short provider label for logs ("cohere", "openai", …).
    fn name(&self) -> &str;

    /// Send a single user prompt and return the reply text.
    async fn complete(
        &self,
        prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, InfoBaitError>;
}

// ── edgequake-llm ────────────────────────────────────────────────────────

/// Adapter from an edgequake-llm provider to [`ChatBackend`].
pub struct EdgequakeBackend {
    name: String,
    provider: Arc<dyn LLMProvider>,
}

impl EdgequakeBackend {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    /// Instantiate a named provider with the given model.
    pub fn create(provider_name: &str, model: &str) -> Result<Self, InfoBaitError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            InfoBaitError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider_name, provider))
    }
}

#[async_trait]
impl ChatBackend for EdgequakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, InfoBaitError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| InfoBaitError::LlmApiError {
                message: format!("{}: {}", self.name, e),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.name, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

// ── Cohere ───────────────────────────────────────────────────────────────

/// Cohere chat API client (`POST /v1/chat`).
pub struct CohereBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct CohereChatResponse {
    text: String,
}

impl CohereBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, InfoBaitError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InfoBaitError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from config plus an API key; `None` or a blank key is an error.
    pub fn from_config(
        config: &AnalyzerConfig,
        api_key: Option<String>,
    ) -> Result<Self, InfoBaitError> {
        let key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InfoBaitError::ProviderNotConfigured {
                provider: "cohere".to_string(),
                hint: "Set COHERE_API_KEY to a Cohere API key.".to_string(),
            })?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_COHERE_MODEL);
        Self::new(key, model, &config.cohere_base_url, config.api_timeout_secs)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for CohereBackend {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn complete(
        &self,
        prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, InfoBaitError> {
        let start = Instant::now();
        let body = CohereChatRequest {
            model: &self.model,
            message: prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InfoBaitError::ApiTimeout {
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    }
                } else {
                    InfoBaitError::LlmApiError {
                        message: format!("cohere: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => InfoBaitError::AuthError {
                    provider: "cohere".to_string(),
                    detail,
                },
                429 => InfoBaitError::RateLimitExceeded {
                    provider: "cohere".to_string(),
                    retry_after_secs,
                },
                _ => InfoBaitError::LlmApiError {
                    message: format!("cohere: HTTP {status}: {detail}"),
                },
            });
        }

        let parsed: CohereChatResponse =
            response
                .json()
                .await
                .map_err(|e| InfoBaitError::LlmApiError {
                    message: format!("cohere: malformed reply: {e}"),
                })?;

        debug!(
            "cohere: {} chars in {}ms",
            parsed.text.len(),
            start.elapsed().as_millis()
        );
        Ok(parsed.text)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the chat backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`): used as-is.
/// 2. **Named provider** (`config.provider_name`): `"cohere"` builds a
///    [`CohereBackend`]; any other name goes to edgequake-llm's factory,
///    which reads that vendor's API key variable itself.
/// 3. **`COHERE_API_KEY`** present: Cohere.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_backend(config: &AnalyzerConfig) -> Result<Arc<dyn ChatBackend>, InfoBaitError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if let Some(ref name) = config.provider_name {
        if name.eq_ignore_ascii_case("cohere") {
            let backend = CohereBackend::from_config(config, non_empty_env("COHERE_API_KEY"))?;
            info!("Using Cohere model {}", backend.model());
            return Ok(Arc::new(backend));
        }
        let model = config.model.as_deref().unwrap_or(DEFAULT_EDGEQUAKE_MODEL);
        info!("Using {} model {}", name, model);
        return Ok(Arc::new(EdgequakeBackend::create(name, model)?));
    }

    if let Some(key) = non_empty_env("COHERE_API_KEY") {
        let backend = CohereBackend::from_config(config, Some(key))?;
        info!("Using Cohere model {}", backend.model());
        return Ok(Arc::new(backend));
    }

    if let (Some(prov), Some(model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        info!("Using {} model {}", prov, model);
        return Ok(Arc::new(EdgequakeBackend::create(&prov, &model)?));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| InfoBaitError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set COHERE_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    info!("Using auto-detected LLM provider");
    Ok(Arc::new(EdgequakeBackend::new("auto", llm_provider)))
}
