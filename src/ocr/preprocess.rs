//! Image preprocessing for OCR.
//!
//! Normalizes a raster image before recognition: grayscale conversion,
//! histogram equalization, then sharpening. A step that can't handle the
//! image's colorspace is skipped and the image passes through unchanged.
//! The processed image lives in a temporary file that is deleted when the
//! returned [`PreparedImage`] is dropped, on success and error paths alike.

use std::io::Write;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tempfile::NamedTempFile;
use tracing::debug;

use super::backend::OcrError;

/// One enhancement applied before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessStep {
    Grayscale,
    NormalizeHistogram,
    Sharpen,
}

impl PreprocessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::NormalizeHistogram => "normalize",
            Self::Sharpen => "sharpen",
        }
    }
}

/// A preprocessed image on disk, ready for an OCR backend.
///
/// Owns its temporary file; dropping the value removes the file.
#[derive(Debug)]
pub struct PreparedImage {
    file: NamedTempFile,
    /// Steps that modified the image, in the order applied.
    pub applied: Vec<PreprocessStep>,
    /// Steps that were skipped, with the reason.
    pub skipped: Vec<(PreprocessStep, String)>,
}

impl PreparedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Image normalizer run ahead of recognition.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    enabled: bool,
    sharpen_sigma: f32,
    sharpen_threshold: i32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            enabled: true,
            sharpen_sigma: 1.0,
            sharpen_threshold: 2,
        }
    }
}

impl ImagePreprocessor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Preprocess raw image bytes into a temporary file.
    ///
    /// Bytes the image decoder can't read are written through untouched so
    /// the OCR engine still gets a chance at them.
    pub fn prepare(&self, content: &[u8], extension: &str) -> Result<PreparedImage, OcrError> {
        if !self.enabled {
            return write_passthrough(content, extension, Vec::new());
        }

        let img = match image::load_from_memory(content) {
            Ok(img) => img,
            Err(e) => {
                debug!("Image decode failed, passing original bytes to OCR: {}", e);
                return write_passthrough(
                    content,
                    extension,
                    vec![
                        (PreprocessStep::Grayscale, format!("undecodable image: {}", e)),
                        (PreprocessStep::NormalizeHistogram, "skipped".to_string()),
                        (PreprocessStep::Sharpen, "skipped".to_string()),
                    ],
                );
            }
        };

        let mut applied = Vec::new();
        let mut skipped = Vec::new();
        let mut img = img;

        for step in [
            PreprocessStep::Grayscale,
            PreprocessStep::NormalizeHistogram,
            PreprocessStep::Sharpen,
        ] {
            match self.apply(step, &img) {
                Ok(processed) => {
                    img = processed;
                    applied.push(step);
                }
                Err(reason) => {
                    debug!("Skipping {} step: {}", step.as_str(), reason);
                    skipped.push((step, reason));
                }
            }
        }

        let mut file = temp_image_file("png")?;
        match img.write_to(file.as_file_mut(), ImageFormat::Png) {
            Ok(()) => {
                file.as_file_mut().flush()?;
                Ok(PreparedImage {
                    file,
                    applied,
                    skipped,
                })
            }
            Err(e) => {
                // e.g. float images PNG can't hold; the engine gets the original instead.
                debug!("Encoding processed image failed, using original: {}", e);
                drop(file);
                write_passthrough(content, extension, Vec::new())
            }
        }
    }

    fn apply(&self, step: PreprocessStep, img: &DynamicImage) -> Result<DynamicImage, String> {
        match step {
            PreprocessStep::Grayscale => match img {
                DynamicImage::ImageLuma8(_)
                | DynamicImage::ImageLuma16(_)
                | DynamicImage::ImageLumaA8(_)
                | DynamicImage::ImageLumaA16(_) => Err("already grayscale".to_string()),
                _ => Ok(img.grayscale()),
            },
            // Equalization works on 8-bit luma; alpha and 16-bit depth are
            // converted down, float images are left alone.
            PreprocessStep::NormalizeHistogram => match img {
                DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                    Err(format!("unsupported colorspace {:?}", img.color()))
                }
                DynamicImage::ImageLuma8(gray) => Ok(DynamicImage::ImageLuma8(
                    imageproc::contrast::equalize_histogram(gray),
                )),
                other => Ok(DynamicImage::ImageLuma8(
                    imageproc::contrast::equalize_histogram(&other.to_luma8()),
                )),
            },
            PreprocessStep::Sharpen => {
                if self.sharpen_sigma <= 0.0 {
                    return Err("sharpening disabled".to_string());
                }
                Ok(img.unsharpen(self.sharpen_sigma, self.sharpen_threshold))
            }
        }
    }
}

fn temp_image_file(extension: &str) -> Result<NamedTempFile, OcrError> {
    let suffix = format!(".{}", extension);
    Ok(tempfile::Builder::new()
        .prefix("docsift-ocr-")
        .suffix(&suffix)
        .tempfile()?)
}

fn write_passthrough(
    content: &[u8],
    extension: &str,
    skipped: Vec<(PreprocessStep, String)>,
) -> Result<PreparedImage, OcrError> {
    let mut file = temp_image_file(extension)?;
    file.write_all(content)?;
    file.flush()?;
    Ok(PreparedImage {
        file,
        applied: Vec::new(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn sample_rgb() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(32, 32, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, 128])
        }))
    }

    #[test]
    fn test_color_image_gets_all_steps() {
        let prepared = ImagePreprocessor::default()
            .prepare(&encode_png(sample_rgb()), "png")
            .unwrap();

        assert_eq!(
            prepared.applied,
            vec![
                PreprocessStep::Grayscale,
                PreprocessStep::NormalizeHistogram,
                PreprocessStep::Sharpen
            ]
        );
        assert!(prepared.path().exists());

        let reloaded = image::open(prepared.path()).unwrap();
        assert!(matches!(reloaded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let prepared = ImagePreprocessor::default()
            .prepare(&encode_png(sample_rgb()), "png")
            .unwrap();
        let path = prepared.path().to_path_buf();
        assert!(path.exists());
        drop(prepared);
        assert!(!path.exists());
    }

    #[test]
    fn test_rgba_image_is_equalized() {
        let rgba: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(32, 32, |x, y| Rgba([(x * 8) as u8, (y * 8) as u8, 64, 255]));
        let prepared = ImagePreprocessor::default()
            .prepare(&encode_png(DynamicImage::ImageRgba8(rgba)), "png")
            .unwrap();

        assert_eq!(
            prepared.applied,
            vec![
                PreprocessStep::Grayscale,
                PreprocessStep::NormalizeHistogram,
                PreprocessStep::Sharpen
            ]
        );
        assert!(prepared.skipped.is_empty());
        let reloaded = image::open(prepared.path()).unwrap();
        assert!(matches!(reloaded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_sixteen_bit_gray_is_equalized() {
        let gray16: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(16, 16, |x, _| Luma([(x * 4000) as u16]));
        let prepared = ImagePreprocessor::default()
            .prepare(&encode_png(DynamicImage::ImageLuma16(gray16)), "png")
            .unwrap();

        assert_eq!(
            prepared.applied,
            vec![PreprocessStep::NormalizeHistogram, PreprocessStep::Sharpen]
        );
        let skipped: Vec<_> = prepared.skipped.iter().map(|(s, _)| *s).collect();
        assert_eq!(skipped, vec![PreprocessStep::Grayscale]);
    }

    #[test]
    fn test_float_image_skips_equalization() {
        let float = DynamicImage::ImageRgb32F(ImageBuffer::from_fn(8, 8, |x, _| {
            image::Rgb([x as f32 / 8.0, 0.5, 0.25])
        }));
        let gray = ImagePreprocessor::default()
            .apply(PreprocessStep::Grayscale, &float)
            .unwrap();
        assert!(ImagePreprocessor::default()
            .apply(PreprocessStep::NormalizeHistogram, &gray)
            .is_err());
    }

    #[test]
    fn test_undecodable_bytes_pass_through() {
        let raw = b"not really an image".to_vec();
        let prepared = ImagePreprocessor::default().prepare(&raw, "tiff").unwrap();
        assert!(prepared.applied.is_empty());
        assert_eq!(std::fs::read(prepared.path()).unwrap(), raw);
        assert!(prepared.path().to_string_lossy().ends_with(".tiff"));
    }

    #[test]
    fn test_disabled_writes_original() {
        let png = encode_png(sample_rgb());
        let prepared = ImagePreprocessor::new(false).prepare(&png, "png").unwrap();
        assert!(prepared.applied.is_empty());
        assert_eq!(std::fs::read(prepared.path()).unwrap(), png);
    }
}
