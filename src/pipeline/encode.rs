//! Encoding: bytes → base64 for the preview, image → PNG for tesseract.
//!
//! The preview embeds the ORIGINAL upload bytes, not the downscaled copy, so
//! the user sees exactly what they sent. Tesseract gets a lossless PNG of
//! the downscaled image; JPEG artefacts around glyph edges cost accuracy.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Base64-encode raw upload bytes for a `data:` URI.
pub fn to_base64(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}

/// Encode an image as PNG.
pub fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}
