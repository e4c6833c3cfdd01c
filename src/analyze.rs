//! Fact-check entry points.
//!
//! [`Analyzer`] owns the resolved chat backend and OCR engine and is meant to
//! be built once per process and shared (the web server keeps it in an
//! `Arc`). [`check_image`] and [`check_file`] are one-shot conveniences for
//! the CLI and for library callers who analyse a single screenshot.

use crate::config::AnalyzerConfig;
use crate::error::{InfoBaitError, StepError};
use crate::output::{AnalysisStats, FactCheck, FactCheckReport, Upload};
use crate::pipeline::ocr::{TesseractRecognizer, TextRecognizer};
use crate::pipeline::parse::{analysis_for_rating, bar_color, rating_percent, split_sources};
use crate::pipeline::{encode, llm, preprocess};
use crate::provider::{resolve_backend, ChatBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// OCR + LLM fact-checker.
#[derive(Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    backend: Arc<dyn ChatBackend>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Analyzer {
    /// Resolve the chat backend and locate tesseract.
    ///
    /// # Errors
    /// `ProviderNotConfigured` when no LLM provider can be built,
    /// `OcrUnavailable` when tesseract cannot be found.
    pub fn new(config: AnalyzerConfig) -> Result<Self, InfoBaitError> {
        let backend = resolve_backend(&config)?;
        let recognizer: Arc<dyn TextRecognizer> = Arc::new(TesseractRecognizer::from_config(&config)?);
        Ok(Self::with_parts(config, backend, recognizer))
    }

    /// Build from explicit parts (tests, custom OCR engines).
    pub fn with_parts(
        config: AnalyzerConfig,
        backend: Arc<dyn ChatBackend>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            config,
            backend,
            recognizer,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run the whole pipeline on an uploaded screenshot.
    ///
    /// # Errors
    /// Only for fatal problems: empty upload, undecodable image, OCR failure.
    /// LLM failures degrade the report and are listed in `warnings`.
    pub async fn analyze_upload(&self, upload: Upload) -> Result<FactCheckReport, InfoBaitError> {
        let total_start = Instant::now();
        let Upload {
            filename,
            mime,
            bytes,
        } = upload;
        if bytes.is_empty() {
            return Err(InfoBaitError::EmptyUpload);
        }
        info!("Analysing '{}' ({} bytes)", filename, bytes.len());

        let mime = preprocess::sniff_mime(&bytes, Some(&mime));

        // ── Step 1: Decode + downscale ───────────────────────────────────
        let decode_start = Instant::now();
        let max_dim = self.config.max_image_dim;
        let (bytes, prepared) = tokio::task::spawn_blocking(move || {
            let prepared = preprocess::prepare(&bytes, max_dim);
            (bytes, prepared)
        })
        .await
        .map_err(|e| InfoBaitError::Internal(format!("Decode task panicked: {}", e)))?;
        let image = prepared?;
        let decode_duration_ms = decode_start.elapsed().as_millis() as u64;

        // ── Step 2: OCR ──────────────────────────────────────────────────
        let ocr_start = Instant::now();
        let recognizer = Arc::clone(&self.recognizer);
        let raw_text = tokio::task::spawn_blocking(move || recognizer.recognize(&image))
            .await
            .map_err(|e| InfoBaitError::Internal(format!("OCR task panicked: {}", e)))??;
        let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        info!("OCR extracted {} chars in {}ms", raw_text.len(), ocr_duration_ms);

        // ── Step 3: Cleanup ──────────────────────────────────────────────
        let llm_start = Instant::now();
        let mut warnings = Vec::new();
        let mut llm_calls = 0;
        let extracted_text = if self.config.clean_ocr_text {
            let cleaned = llm::clean_text(self.backend.as_ref(), &raw_text, &self.config).await;
            llm_calls += cleaned.calls;
            warnings.extend(cleaned.error);
            cleaned.value
        } else {
            raw_text.clone()
        };

        // ── Step 4: Analysis + rating ────────────────────────────────────
        let fact_check = self
            .fact_check(&extracted_text, &mut warnings, &mut llm_calls)
            .await;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

        for w in &warnings {
            warn!("'{}': {}", filename, w);
        }

        let stats = AnalysisStats {
            decode_duration_ms,
            ocr_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            llm_calls,
        };
        info!(
            "Analysed '{}': rating {:?}, {} sources, {}ms total",
            filename,
            fact_check.rating,
            fact_check.sources.len(),
            stats.total_duration_ms
        );

        Ok(FactCheckReport {
            filename,
            mime,
            image_b64: encode::to_base64(&bytes),
            raw_text,
            extracted_text,
            fact_check,
            warnings,
            stats,
        })
    }

    /// Re-run analysis and rating on (user-edited) text. No OCR, no cleanup.
    ///
    /// # Errors
    /// `EmptyText` when `text` is blank.
    pub async fn reanalyze(&self, text: &str) -> Result<FactCheck, InfoBaitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InfoBaitError::EmptyText);
        }
        info!("Re-analysing {} chars of edited text", text.len());
        let mut warnings = Vec::new();
        let mut calls = 0;
        let fact_check = self.fact_check(text, &mut warnings, &mut calls).await;
        for w in &warnings {
            warn!("reanalyze: {}", w);
        }
        Ok(fact_check)
    }

    /// Analysis call, rating call, then the parsing rules.
    async fn fact_check(
        &self,
        text: &str,
        warnings: &mut Vec<StepError>,
        calls: &mut u32,
    ) -> FactCheck {
        let analysis = llm::analyze_claims(self.backend.as_ref(), text, &self.config).await;
        *calls += analysis.calls;
        warnings.extend(analysis.error);

        let rating = llm::score_analysis(
            self.backend.as_ref(),
            analysis_for_rating(&analysis.value),
            &self.config,
        )
        .await;
        *calls += rating.calls;
        warnings.extend(rating.error);

        assemble_fact_check(&analysis.value, rating.value)
    }
}

/// Combine the analysis reply and rating into display fields.
fn assemble_fact_check(analysis_reply: &str, rating: Option<u8>) -> FactCheck {
    let (analysis, sources) = split_sources(analysis_reply);
    let rating_percent = rating_percent(rating);
    FactCheck {
        analysis,
        rating,
        rating_percent,
        bar_color: rating.map(|_| bar_color(rating_percent).to_string()),
        sources,
    }
}

/// Fact-check one screenshot held in memory.
///
/// Resolves the backend and tesseract on every call; build an [`Analyzer`]
/// once when checking many images.
pub async fn check_image(
    bytes: Vec<u8>,
    filename: impl Into<String>,
    config: &AnalyzerConfig,
) -> Result<FactCheckReport, InfoBaitError> {
    let analyzer = Analyzer::new(config.clone())?;
    let mime = preprocess::sniff_mime(&bytes, None);
    analyzer
        .analyze_upload(Upload {
            filename: filename.into(),
            mime,
            bytes,
        })
        .await
}

/// Fact-check a screenshot on disk.
pub async fn check_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<FactCheckReport, InfoBaitError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            InfoBaitError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            InfoBaitError::Io(e)
        }
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    check_image(bytes, filename, config).await
}
