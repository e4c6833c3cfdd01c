//! Error types for the infobait library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`InfoBaitError`]: **Fatal**: the request cannot produce a result at
//!   all (nothing uploaded, the bytes are not an image, tesseract is missing).
//!   Returned as `Err(InfoBaitError)` from [`crate::analyze::Analyzer`].
//!
//! * [`StepError`]: **Non-fatal**: one of the LLM steps (cleanup, analysis,
//!   rating) failed, but the pipeline substituted a fallback and carried on.
//!   Stored inside [`crate::output::FactCheckReport::warnings`] so callers
//!   can see what was degraded without losing the OCR text.
//!
//! A screenshot whose text was read but whose analysis call hit a rate
//! limit is still worth showing to the user; only the first kind aborts.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the infobait library.
///
/// LLM step failures use [`StepError`] and are stored in the report rather
/// than propagated here.
#[derive(Debug, Error)]
pub enum InfoBaitError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The multipart form carried no field with the expected name.
    #[error("No file uploaded")]
    MissingField { field: String },

    /// The file field was present with an empty filename.
    #[error("No file selected")]
    NoFileSelected,

    /// The upload contained zero bytes.
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// Re-analysis was requested with blank text.
    #[error("Text cannot be empty")]
    EmptyText,

    /// Input file for the CLI was not found.
    #[error("Image file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The uploaded bytes could not be decoded as an image.
    #[error("Could not read image: {detail}")]
    ImageDecode { detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The tesseract binary could not be located or started.
    #[error("OCR engine unavailable: {hint}")]
    OcrUnavailable { hint: String },

    /// Tesseract ran but exited with an error.
    #[error("OCR failed: {detail}")]
    OcrFailed { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned a non-retryable error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// LLM API returned HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// LLM API call did not answer in time.
    #[error("API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// LLM API returned 401/403.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Server errors ─────────────────────────────────────────────────────
    /// An askama template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InfoBaitError {
    /// HTTP status a web handler should answer with for this error.
    ///
    /// Anything the client can fix by sending a different request is a 400;
    /// upstream provider failures are 502; the rest are 500.
    pub fn status_code(&self) -> u16 {
        match self {
            InfoBaitError::MissingField { .. }
            | InfoBaitError::NoFileSelected
            | InfoBaitError::EmptyUpload
            | InfoBaitError::EmptyText
            | InfoBaitError::ImageDecode { .. } => 400,
            InfoBaitError::FileNotFound { .. } => 404,
            InfoBaitError::LlmApiError { .. }
            | InfoBaitError::RateLimitExceeded { .. }
            | InfoBaitError::ApiTimeout { .. }
            | InfoBaitError::AuthError { .. } => 502,
            _ => 500,
        }
    }
}

/// A non-fatal failure of a single LLM step.
///
/// Stored in [`crate::output::FactCheckReport::warnings`] when a step fell
/// back to its default (raw OCR text, `"AI Error: …"`, or no rating).
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum StepError {
    /// OCR cleanup call failed; the raw OCR text was used.
    #[error("text cleanup failed: {detail}")]
    CleanupFailed { detail: String },

    /// Fact-check call failed; the analysis is an "AI Error" placeholder.
    #[error("analysis failed: {detail}")]
    AnalysisFailed { detail: String },

    /// Rating call failed; the result is unrated.
    #[error("rating failed: {detail}")]
    RatingFailed { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(InfoBaitError::EmptyUpload.status_code(), 400);
        assert_eq!(InfoBaitError::NoFileSelected.status_code(), 400);
        assert_eq!(
            InfoBaitError::ImageDecode {
                detail: "bad header".into()
            }
            .status_code(),
            400
        );
    }

    #[test]
    fn provider_errors_map_to_502() {
        let e = InfoBaitError::RateLimitExceeded {
            provider: "cohere".into(),
            retry_after_secs: Some(30),
        };
        assert_eq!(e.status_code(), 502);
        assert!(e.to_string().contains("cohere"));
    }

    #[test]
    fn ocr_unavailable_is_server_side() {
        let e = InfoBaitError::OcrUnavailable {
            hint: "install tesseract-ocr".into(),
        };
        assert_eq!(e.status_code(), 500);
        assert!(e.to_string().contains("tesseract-ocr"));
    }

    #[test]
    fn missing_field_display_matches_form_message() {
        let e = InfoBaitError::MissingField {
            field: "image".into(),
        };
        assert_eq!(e.to_string(), "No file uploaded");
    }

    #[test]
    fn api_timeout_display() {
        let e = InfoBaitError::ApiTimeout { elapsed_ms: 5000 };
        assert!(e.to_string().contains("5000ms"));
    }

    #[test]
    fn step_error_serialises() {
        let e = StepError::RatingFailed {
            detail: "timeout".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("RatingFailed"));
    }
}
