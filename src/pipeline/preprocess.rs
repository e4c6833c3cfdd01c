//! Preprocessing: decode the upload and shrink it for OCR.
//!
//! ## Why downscale?
//!
//! Tesseract's runtime grows with pixel count while its accuracy on
//! screen-rendered text plateaus well below phone-screenshot resolution.
//! Capping the longest edge at `max_image_dim` (default 1200 px) keeps a
//! request to roughly a second of OCR without hurting recognition.
//!
//! Colour is preserved: greyscale conversion and thresholding are left to
//! tesseract's own binarisation, which handles dark-mode screenshots better
//! than a fixed threshold would.

use crate::error::InfoBaitError;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

/// Decode uploaded bytes into an image.
///
/// Palette images come out of the decoder already expanded to RGB(A).
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, InfoBaitError> {
    if bytes.is_empty() {
        return Err(InfoBaitError::EmptyUpload);
    }
    let img = image::load_from_memory(bytes).map_err(|e| InfoBaitError::ImageDecode {
        detail: e.to_string(),
    })?;
    debug!(
        "Decoded {}x{} image ({:?})",
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Shrink `img` so neither side exceeds `max_dim`, preserving aspect ratio.
///
/// Images already within bounds are returned untouched; nothing is enlarged.
pub fn downscale(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w <= max_dim && h <= max_dim {
        return img;
    }
    let resized = img.resize(max_dim, max_dim, FilterType::Lanczos3);
    debug!(
        "Downscaled {}x{} → {}x{}",
        w,
        h,
        resized.width(),
        resized.height()
    );
    resized
}

/// Decode and downscale in one step; this is what the pipeline runs.
pub fn prepare(bytes: &[u8], max_dim: u32) -> Result<DynamicImage, InfoBaitError> {
    decode(bytes).map(|img| downscale(img, max_dim))
}

/// MIME type for the inline preview.
///
/// Content sniffing wins over the client's claim (browsers send
/// `application/octet-stream` for pasted images); `image/png` is the last
/// resort.
pub fn sniff_mime(bytes: &[u8], declared: Option<&str>) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }
    match declared {
        Some(m) if m.starts_with("image/") => m.to_string(),
        _ => ImageFormat::Png.to_mime_type().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::png_bytes;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn empty_bytes_rejected() {
        assert!(matches!(decode(&[]), Err(InfoBaitError::EmptyUpload)));
    }

    #[test]
    fn garbage_bytes_rejected() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, InfoBaitError::ImageDecode { .. }));
    }

    #[test]
    fn decode_round_trips_png() {
        let bytes = png_bytes(&solid(8, 4)).unwrap();
        let img = decode(&bytes).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn downscale_preserves_aspect() {
        let img = downscale(solid(2400, 1200), 1200);
        assert_eq!(img.dimensions(), (1200, 600));
    }

    #[test]
    fn downscale_never_enlarges() {
        let img = downscale(solid(300, 200), 1200);
        assert_eq!(img.dimensions(), (300, 200));
    }

    #[test]
    fn sniff_prefers_content() {
        let bytes = png_bytes(&solid(2, 2)).unwrap();
        assert_eq!(sniff_mime(&bytes, Some("image/jpeg")), "image/png");
    }

    #[test]
    fn sniff_falls_back_to_declared_then_png() {
        assert_eq!(sniff_mime(b"??", Some("image/heic")), "image/heic");
        assert_eq!(sniff_mime(b"??", Some("application/octet-stream")), "image/png");
        assert_eq!(sniff_mime(b"??", None), "image/png");
    }
}
