//! Configuration types for screenshot fact-checking.
//!
//! Pipeline behaviour is controlled through [`AnalyzerConfig`], built via its
//! [`AnalyzerConfigBuilder`]; the web listener is described separately by
//! [`ServerConfig`] so the library can be used without a server at all.
//!
//! The binary maps clap arguments (each with an `env` fallback) onto these
//! builders; the library itself never reads configuration variables except
//! for provider API keys during backend resolution.

use crate::error::InfoBaitError;
use crate::provider::ChatBackend;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Cohere model, a small and cheap chat model.
pub const DEFAULT_COHERE_MODEL: &str = "command-r7b-12-2024";

/// Default model for edgequake-llm providers when none is named.
pub const DEFAULT_EDGEQUAKE_MODEL: &str = "gpt-4.1-nano";

/// Default tesseract flags: LSTM engine, fully automatic page segmentation.
pub const DEFAULT_TESSERACT_ARGS: &str = "--oem 1 --psm 3";

/// Default Cohere API root.
pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.ai";

/// Configuration for the OCR + fact-check pipeline.
///
/// Built via [`AnalyzerConfig::builder()`] or using
/// [`AnalyzerConfig::default()`].
///
/// # Example
/// ```rust
/// use infobait::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .max_image_dim(1600)
///     .clean_ocr_text(false)
///     .model("command-r7b-12-2024")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM model identifier. If None, the backend's default is used.
    pub model: Option<String>,

    /// Provider name ("cohere", "openai", "anthropic", "ollama", …).
    /// If None along with `backend`, the provider is resolved from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed chat backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn ChatBackend>>,

    /// Sampling temperature for every LLM call. Default: 0.3.
    pub temperature: f32,

    /// Token budget for the fact-check analysis reply. Default: 350.
    ///
    /// Two to four sentences plus a short SOURCES list fit comfortably.
    pub analysis_max_tokens: usize,

    /// Token budget for the rating reply. Default: 10.
    ///
    /// The reply is a single integer or "N/A".
    pub rating_max_tokens: usize,

    /// Token budget for the OCR cleanup reply. Default: 500.
    pub cleanup_max_tokens: usize,

    /// Ask the LLM to fix OCR spelling before analysis. Default: true.
    pub clean_ocr_text: bool,

    /// Retry attempts per LLM call. Default: 0 (single attempt).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Longest image edge in pixels before OCR. Default: 1200.
    ///
    /// Phone screenshots are often 1170×2532; tesseract gets no more accurate
    /// past this size but takes several times longer.
    pub max_image_dim: u32,

    /// Explicit path to the tesseract binary. If None, well-known install
    /// locations and then `PATH` are searched.
    pub tesseract_cmd: Option<PathBuf>,

    /// Extra tesseract arguments, whitespace separated. Default: `--oem 1 --psm 3`.
    pub tesseract_args: String,

    /// Cohere API root (overridable for proxies and tests).
    pub cohere_base_url: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            backend: None,
            temperature: 0.3,
            analysis_max_tokens: 350,
            rating_max_tokens: 10,
            cleanup_max_tokens: 500,
            clean_ocr_text: true,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            max_image_dim: 1200,
            tesseract_cmd: None,
            tesseract_args: DEFAULT_TESSERACT_ARGS.to_string(),
            cohere_base_url: DEFAULT_COHERE_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("temperature", &self.temperature)
            .field("analysis_max_tokens", &self.analysis_max_tokens)
            .field("rating_max_tokens", &self.rating_max_tokens)
            .field("cleanup_max_tokens", &self.cleanup_max_tokens)
            .field("clean_ocr_text", &self.clean_ocr_text)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_image_dim", &self.max_image_dim)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("tesseract_args", &self.tesseract_args)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Tesseract arguments split on whitespace.
    pub fn tesseract_arg_list(&self) -> Vec<String> {
        self.tesseract_args
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Builder for [`AnalyzerConfig`].
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl fmt::Debug for AnalyzerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn analysis_max_tokens(mut self, n: usize) -> Self {
        self.config.analysis_max_tokens = n;
        self
    }

    pub fn rating_max_tokens(mut self, n: usize) -> Self {
        self.config.rating_max_tokens = n;
        self
    }

    pub fn cleanup_max_tokens(mut self, n: usize) -> Self {
        self.config.cleanup_max_tokens = n;
        self
    }

    pub fn clean_ocr_text(mut self, v: bool) -> Self {
        self.config.clean_ocr_text = v;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_image_dim(mut self, px: u32) -> Self {
        self.config.max_image_dim = px;
        self
    }

    pub fn tesseract_cmd(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = Some(path.into());
        self
    }

    pub fn tesseract_args(mut self, args: impl Into<String>) -> Self {
        self.config.tesseract_args = args.into();
        self
    }

    pub fn cohere_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.cohere_base_url = url.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, InfoBaitError> {
        let c = &self.config;
        if c.max_image_dim < 64 {
            return Err(InfoBaitError::InvalidConfig(format!(
                "max image dimension must be ≥ 64, got {}",
                c.max_image_dim
            )));
        }
        if c.analysis_max_tokens == 0 || c.rating_max_tokens == 0 || c.cleanup_max_tokens == 0 {
            return Err(InfoBaitError::InvalidConfig(
                "token budgets must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(InfoBaitError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Listener settings for the web front end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,

    /// First port to try. Default: 5002.
    pub port: u16,

    /// How many consecutive ports to try when `port` is busy. Default: 20.
    pub port_search: u16,

    /// Largest accepted request body in bytes. Default: 16 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5002,
            port_search: 20,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Candidate ports in the order they are tried.
    pub fn candidate_ports(&self) -> impl Iterator<Item = u16> {
        let first = self.port;
        let count = self.port_search.max(1);
        (0..count).map_while(move |offset| first.checked_add(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.max_image_dim, 1200);
        assert_eq!(c.analysis_max_tokens, 350);
        assert_eq!(c.rating_max_tokens, 10);
        assert_eq!(c.cleanup_max_tokens, 500);
        assert_eq!(c.max_retries, 0);
        assert!(c.clean_ocr_text);
    }

    #[test]
    fn tesseract_args_split_on_whitespace() {
        let c = AnalyzerConfig::builder()
            .tesseract_args("  --oem 1   --psm 6 ")
            .build()
            .unwrap();
        assert_eq!(c.tesseract_arg_list(), vec!["--oem", "1", "--psm", "6"]);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = AnalyzerConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn tiny_image_dim_rejected() {
        let err = AnalyzerConfig::builder().max_image_dim(10).build().unwrap_err();
        assert!(matches!(err, InfoBaitError::InvalidConfig(_)));
    }

    #[test]
    fn zero_token_budget_rejected() {
        assert!(AnalyzerConfig::builder()
            .rating_max_tokens(0)
            .build()
            .is_err());
    }

    #[test]
    fn candidate_ports_stop_at_u16_max() {
        let s = ServerConfig {
            port: u16::MAX - 1,
            port_search: 5,
            ..ServerConfig::default()
        };
        let ports: Vec<u16> = s.candidate_ports().collect();
        assert_eq!(ports, vec![u16::MAX - 1, u16::MAX]);
    }

    #[test]
    fn candidate_ports_default_range() {
        let ports: Vec<u16> = ServerConfig::default().candidate_ports().collect();
        assert_eq!(ports.first(), Some(&5002));
        assert_eq!(ports.len(), 20);
    }
}
