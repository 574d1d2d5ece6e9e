use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Size bounds applied before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessOptions {
    /// Narrower scans are upscaled to this width; small print on a passport
    /// data page is unreadable to Tesseract below roughly 1000 px.
    pub min_width: u32,
    /// Longest side allowed after resizing.
    pub max_dimension: u32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self { min_width: 1000, max_dimension: 2800 }
    }
}

/// Load an image file, normalize it, and return PNG bytes ready for OCR.
pub fn prepare_for_ocr(path: &Path, opts: &PreprocessOptions) -> Result<Vec<u8>, PreprocessError> {
    let img = image::open(path)?;
    encode_as_png(normalize(img, opts))
}

/// Process raw image bytes (JPEG / PNG / BMP / WEBP) and return normalized PNG bytes.
pub fn prepare_for_ocr_from_bytes(
    data: &[u8],
    opts: &PreprocessOptions,
) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img, opts))
}

/// Resize into bounds, grayscale, contrast stretch.
fn normalize(img: DynamicImage, opts: &PreprocessOptions) -> DynamicImage {
    let img = fit(img, opts);
    let gray: GrayImage = img.to_luma8();

    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = (max_px - min_px) as u32;
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    });

    DynamicImage::ImageLuma8(stretched)
}

fn fit(img: DynamicImage, opts: &PreprocessOptions) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img;
    }
    if w.max(h) > opts.max_dimension {
        return img.resize(opts.max_dimension, opts.max_dimension, FilterType::Lanczos3);
    }
    if w < opts.min_width {
        // Keep the aspect ratio, but never push the long side past the cap.
        let scale = (opts.min_width as f64 / w as f64)
            .min(opts.max_dimension as f64 / w.max(h) as f64);
        let nw = ((w as f64 * scale).round() as u32).max(1);
        let nh = ((h as f64 * scale).round() as u32).max(1);
        return img.resize_exact(nw, nh, FilterType::CatmullRom);
    }
    img
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |_, _| Luma([value])))
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn uniform_image_survives() {
        let opts = PreprocessOptions { min_width: 10, max_dimension: 100 };
        let result = normalize(solid_gray(10, 10, 128), &opts);
        assert_eq!((result.width(), result.height()), (10, 10));
    }

    #[test]
    fn gradient_stretches_to_full_range() {
        let img = DynamicImage::ImageLuma8(ImageBuffer::from_fn(1000, 1, |x, _| {
            Luma([(60 + x * 100 / 1000) as u8])
        }));
        let gray = normalize(img, &PreprocessOptions::default()).to_luma8();
        assert_eq!(gray.pixels().map(|p| p[0]).min(), Some(0));
        assert_eq!(gray.pixels().map(|p| p[0]).max(), Some(255));
    }

    #[test]
    fn narrow_scan_is_upscaled_keeping_aspect() {
        let result = fit(solid_gray(500, 350, 90), &PreprocessOptions::default());
        assert_eq!((result.width(), result.height()), (1000, 700));
    }

    #[test]
    fn upscale_respects_dimension_cap() {
        let opts = PreprocessOptions { min_width: 1000, max_dimension: 1200 };
        let result = fit(solid_gray(200, 400, 90), &opts);
        assert_eq!((result.width(), result.height()), (600, 1200));
    }

    #[test]
    fn large_image_is_downscaled() {
        let opts = PreprocessOptions { min_width: 100, max_dimension: 800 };
        let result = fit(solid_gray(1600, 1000, 200), &opts);
        assert!(result.width() <= 800 && result.height() <= 800);
    }

    #[test]
    fn prepare_from_bytes_produces_png_header() {
        let bytes = png_bytes(&solid_gray(4, 4, 100));
        let opts = PreprocessOptions { min_width: 4, max_dimension: 64 };
        let result = prepare_for_ocr_from_bytes(&bytes, &opts).unwrap();
        assert_eq!(&result[..4], b"\x89PNG");
    }

    #[test]
    fn prepare_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, png_bytes(&solid_gray(8, 6, 30))).unwrap();
        let result = prepare_for_ocr(&path, &PreprocessOptions::default()).unwrap();
        let decoded = image::load_from_memory(&result).unwrap();
        assert_eq!(decoded.width(), 1000);
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        let err = prepare_for_ocr_from_bytes(b"not an image", &PreprocessOptions::default());
        assert!(matches!(err, Err(PreprocessError::Load(_))));
    }
}
