//! Pipeline stages for screenshot fact-checking.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested without the others (the parsers in particular never need a
//! network or a tesseract install).
//!
//! ## Data Flow
//!
//! ```text
//! preprocess ──▶ ocr ──▶ llm ──▶ parse
//! (decode/resize) (tesseract) (cleanup/analysis/rating) (sources, rating, colour)
//! ```
//!
//! 1. [`preprocess`]: decode the upload and cap its longest edge; runs in
//!    `spawn_blocking` because decoding and Lanczos resampling are CPU-bound
//! 2. [`encode`]: base64 for the inline preview, PNG for tesseract
//! 3. [`ocr`]: tesseract subprocess, also in `spawn_blocking`
//! 4. [`llm`]: the three model calls with their fallbacks; the only
//!    stage with network I/O
//! 5. [`parse`]: deterministic rules over the model replies

pub mod encode;
pub mod llm;
pub mod ocr;
pub mod parse;
pub mod preprocess;
