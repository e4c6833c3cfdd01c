//! Result types produced by the fact-check pipeline.
//!
//! Everything here is request-scoped and `Serialize`, so the same values
//! feed the HTML templates, the `/reanalyze` JSON reply, and `check --json`.

use crate::error::StepError;
use serde::{Deserialize, Serialize};

/// An uploaded screenshot as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied filename (display only, never used as a path).
    pub filename: String,
    /// Client-declared MIME type; content sniffing takes precedence.
    pub mime: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// A reference cited by the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    /// May be empty when the model cited a source without a link.
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The URL if it is safe to render as a link (absolute http/https).
    pub fn href(&self) -> Option<&str> {
        let parsed = url::Url::parse(self.url.trim()).ok()?;
        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Some(self.url.trim()),
            _ => None,
        }
    }
}

/// The fact-check verdict for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheck {
    /// Analysis prose with the SOURCES block removed.
    pub analysis: String,
    /// 1–10, or None when the model answered N/A or the rating step failed.
    pub rating: Option<u8>,
    /// `rating * 10`, or 0 when unrated.
    pub rating_percent: u8,
    /// `#rrggbb` bar colour; None exactly when `rating` is None.
    pub bar_color: Option<String>,
    pub sources: Vec<Source>,
}

/// Timing and call counts for one upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub decode_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
    pub llm_calls: u32,
}

/// Everything the result page shows for one uploaded screenshot.
#[derive(Debug, Clone, Serialize)]
pub struct FactCheckReport {
    pub filename: String,
    /// Content-sniffed MIME type used for the inline preview.
    pub mime: String,
    /// Original upload bytes, base64-encoded for a `data:` URI.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_b64: String,
    /// Tesseract output before cleanup.
    pub raw_text: String,
    /// Text that was fact-checked (cleaned when cleanup is enabled).
    pub extracted_text: String,
    pub fact_check: FactCheck,
    /// Degraded LLM steps; empty on a fully successful run.
    pub warnings: Vec<StepError>,
    pub stats: AnalysisStats,
}

impl FactCheckReport {
    /// `data:` URI for embedding the uploaded image in HTML.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.image_b64)
    }
}
