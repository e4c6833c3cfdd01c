//! # infobait
//!
//! Fact-check screenshots: read the text in an uploaded image with OCR, ask
//! a language model whether it is true, and show a 1–10 truthfulness rating
//! with the sources the model cited.
//!
//! ## Pipeline Overview
//!
//! ```text
//! screenshot
//!  │
//!  ├─ 1. Decode    image crate, longest edge capped at 1200 px (spawn_blocking)
//!  ├─ 2. OCR       tesseract subprocess (spawn_blocking)
//!  ├─ 3. Cleanup   optional LLM pass fixing OCR spelling and spacing
//!  ├─ 4. Analyse   LLM fact-check ending in a SOURCES: block
//!  ├─ 5. Rate      second LLM call, 1–10 or N/A, capped by keyword rules
//!  └─ 6. Render    sources list, bar colour, HTML or JSON
//! ```
//!
//! LLM failures never fail a request: each step has a fallback and the
//! degradation is reported in [`FactCheckReport::warnings`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use infobait::{check_file, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider from COHERE_API_KEY, or OPENAI_API_KEY / ANTHROPIC_API_KEY / ...
//!     let config = AnalyzerConfig::default();
//!     let report = check_file("screenshot.png", &config).await?;
//!     println!("{}", report.fact_check.analysis);
//!     println!("rating: {:?}", report.fact_check.rating);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `infobait` binary (clap + anyhow + tracing-subscriber) |
//!
//! The web server lives in the library ([`server::serve`]) so it can be
//! embedded; only argument parsing and logging setup need `cli`.
//!
//! ## Runtime Requirements
//!
//! `tesseract` 4 or newer must be installed. Set `TESSERACT_CMD` when it is
//! not on `PATH` or in a standard install location.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{check_file, check_image, Analyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, ServerConfig};
pub use error::{InfoBaitError, StepError};
pub use output::{AnalysisStats, FactCheck, FactCheckReport, Source, Upload};
pub use pipeline::ocr::{TesseractRecognizer, TextRecognizer};
pub use provider::{ChatBackend, CohereBackend, CompletionRequest, EdgequakeBackend};
