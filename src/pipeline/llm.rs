//! LLM interaction: the cleanup, analysis and rating calls.
//!
//! None of these calls can fail a request. Each step has a fallback (the raw
//! OCR text, an `"AI Error: …"` analysis, or no rating) and reports what
//! happened through a [`StepError`] so the caller can log or surface it.
//!
//! ## Retry Strategy
//!
//! `max_retries` defaults to 0, a single attempt per step. When retries are
//! enabled the wait is `retry_backoff_ms * 2^(attempt-1)`.

use crate::config::AnalyzerConfig;
use crate::error::{InfoBaitError, StepError};
use crate::pipeline::parse::{apply_keyword_caps, parse_rating_token, strip_asterisks};
use crate::prompts::{analysis_prompt, cleanup_prompt, rating_prompt, AI_ERROR_PREFIX};
use crate::provider::{ChatBackend, CompletionRequest};
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Outcome of one LLM step: the value to use plus an optional degradation.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome<T> {
    pub value: T,
    pub error: Option<StepError>,
    /// Backend calls actually made (0 when the step was skipped).
    pub calls: u32,
}

impl<T> StepOutcome<T> {
    fn ok(value: T, calls: u32) -> Self {
        Self {
            value,
            error: None,
            calls,
        }
    }

    fn degraded(value: T, error: StepError, calls: u32) -> Self {
        Self {
            value,
            error: Some(error),
            calls,
        }
    }
}

/// Wait before retry `attempt` (1-based), saturating instead of overflowing.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64.checked_pow(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

/// Call the backend with timeout and retry/backoff.
///
/// Returns the reply and the number of attempts made.
async fn call_with_retry(
    backend: &dyn ChatBackend,
    prompt: &str,
    max_tokens: usize,
    config: &AnalyzerConfig,
    step: &str,
) -> (Result<String, InfoBaitError>, u32) {
    let request = CompletionRequest {
        max_tokens,
        temperature: config.temperature,
    };
    let limit = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = InfoBaitError::Internal("no attempt made".to_string());

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                step, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let start = Instant::now();
        let result = match timeout(limit, backend.complete(prompt, &request)).await {
            Ok(r) => r,
            Err(_) => Err(InfoBaitError::ApiTimeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            }),
        };

        match result {
            Ok(reply) => {
                debug!(
                    "{}: {} via {} in {}ms",
                    step,
                    reply.len(),
                    backend.name(),
                    start.elapsed().as_millis()
                );
                return (Ok(reply), attempt + 1);
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", step, attempt + 1, e);
                last_err = e;
            }
        }
    }

    (Err(last_err), config.max_retries + 1)
}

/// Fix OCR spelling and spacing without rewording.
///
/// Whitespace-only input is returned as-is without a call. A failed call or
/// an empty reply falls back to the raw text.
pub async fn clean_text(
    backend: &dyn ChatBackend,
    raw: &str,
    config: &AnalyzerConfig,
) -> StepOutcome<String> {
    if raw.trim().is_empty() {
        return StepOutcome::ok(raw.to_string(), 0);
    }

    let prompt = cleanup_prompt(raw);
    let (result, calls) =
        call_with_retry(backend, &prompt, config.cleanup_max_tokens, config, "cleanup").await;

    match result {
        Ok(reply) if !reply.trim().is_empty() => StepOutcome::ok(reply.trim().to_string(), calls),
        Ok(_) => StepOutcome::degraded(
            raw.to_string(),
            StepError::CleanupFailed {
                detail: "empty reply".to_string(),
            },
            calls,
        ),
        Err(e) => StepOutcome::degraded(
            raw.to_string(),
            StepError::CleanupFailed {
                detail: e.to_string(),
            },
            calls,
        ),
    }
}

/// Ask for a fact-check analysis followed by a SOURCES block.
///
/// The reply has asterisks stripped. On failure the analysis is the literal
/// `"AI Error: <error>"`, which [`score_analysis`] recognises and skips.
pub async fn analyze_claims(
    backend: &dyn ChatBackend,
    text: &str,
    config: &AnalyzerConfig,
) -> StepOutcome<String> {
    let prompt = analysis_prompt(text);
    let (result, calls) =
        call_with_retry(backend, &prompt, config.analysis_max_tokens, config, "analysis").await;

    match result {
        Ok(reply) => StepOutcome::ok(strip_asterisks(reply.trim()), calls),
        Err(e) => {
            let detail = e.to_string();
            StepOutcome::degraded(
                strip_asterisks(&format!("{AI_ERROR_PREFIX} {detail}")),
                StepError::AnalysisFailed { detail },
                calls,
            )
        }
    }
}

/// Score an analysis 1–10, or `None` for N/A.
///
/// Skipped when the analysis is empty or an "AI Error" placeholder. The
/// model's score is capped by [`apply_keyword_caps`] when it contradicts
/// the analysis wording.
pub async fn score_analysis(
    backend: &dyn ChatBackend,
    analysis: &str,
    config: &AnalyzerConfig,
) -> StepOutcome<Option<u8>> {
    let analysis = analysis.trim();
    if analysis.is_empty() || analysis.starts_with(AI_ERROR_PREFIX) {
        return StepOutcome::ok(None, 0);
    }

    let prompt = rating_prompt(analysis);
    let (result, calls) =
        call_with_retry(backend, &prompt, config.rating_max_tokens, config, "rating").await;

    match result {
        Ok(reply) => {
            let rating = parse_rating_token(&reply).map(|s| apply_keyword_caps(s, analysis));
            debug!("rating reply {:?} → {:?}", reply.trim(), rating);
            StepOutcome::ok(rating, calls)
        }
        Err(e) => StepOutcome::degraded(
            None,
            StepError::RatingFailed {
                detail: e.to_string(),
            },
            calls,
        ),
    }
}
