//! OCR: turn the prepared screenshot into text.
//!
//! Tesseract is driven through its command-line binary (4.0 or newer).
//! The binary is located once, at construction.

use crate::config::AnalyzerConfig;
use crate::error::InfoBaitError;
use crate::pipeline::encode::png_bytes;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, warn};

/// Extracts text from an image. Implementations may block.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, InfoBaitError>;
}

/// Install locations checked before falling back to `PATH`.
#[cfg(target_os = "macos")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/opt/homebrew/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/usr/bin/tesseract",
];
#[cfg(target_os = "windows")]
const WELL_KNOWN_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const WELL_KNOWN_PATHS: &[&str] = &[];

const INSTALL_HINT: &str =
    "tesseract not found (install tesseract-ocr, or set TESSERACT_CMD to its path)";

/// Locate the tesseract binary.
///
/// An explicit path must exist; otherwise well-known install locations are
/// tried, then `PATH`.
pub fn locate_tesseract(explicit: Option<&Path>) -> Result<PathBuf, InfoBaitError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        // A bare command name ("tesseract5") is looked up on PATH.
        return which::which(path).map_err(|_| InfoBaitError::OcrUnavailable {
            hint: format!("configured tesseract '{}' does not exist", path.display()),
        });
    }

    if let Some(found) = WELL_KNOWN_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
    {
        return Ok(found.to_path_buf());
    }

    which::which("tesseract").map_err(|_| InfoBaitError::OcrUnavailable {
        hint: INSTALL_HINT.to_string(),
    })
}

/// Tesseract command-line backend.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    args: Vec<String>,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// Locate the binary and take arguments from the config.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, InfoBaitError> {
        let binary = locate_tesseract(config.tesseract_cmd.as_deref())?;
        debug!("Using tesseract at {}", binary.display());
        Ok(Self::new(binary, config.tesseract_arg_list()))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run tesseract on an image file, returning stdout.
    fn run(&self, image_path: &Path) -> Result<String, InfoBaitError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(&self.args)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(InfoBaitError::OcrFailed {
                    detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(InfoBaitError::OcrUnavailable {
                    hint: INSTALL_HINT.to_string(),
                })
            }
            Err(e) => Err(InfoBaitError::Io(e)),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String, InfoBaitError> {
        let start = Instant::now();
        let png = png_bytes(image).map_err(|e| InfoBaitError::Internal(format!("PNG encode: {e}")))?;

        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
        tmp.write_all(&png)?;
        tmp.flush()?;

        let text = self.run(tmp.path())?;
        if text.trim().is_empty() {
            warn!("tesseract found no text");
        }
        debug!(
            "OCR: {} chars in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
