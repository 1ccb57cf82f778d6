//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image` crate (pure Rust decoders) |
//! | Square thumbnail | `image::DynamicImage::resize_to_fill` (Lanczos3) |
//! | Proportional thumbnail | `image::DynamicImage::resize_exact` (Lanczos3) |
//! | Split halves | `image::DynamicImage::crop_imm` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode | `JpegEncoder` with quality, or PNG, then rename into place |

use super::backend::{BackendError, ImageBackend};
use super::calculations::{split_regions, thumbnail_dimensions};
use super::params::{SplitParams, ThumbnailFit, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Source extensions the scanner accepts, all decodable by the compiled-in
/// `image` features.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Whether a path has one of the [`SUPPORTED_EXTENSIONS`] (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Sibling of `path` that the encoder writes to before the rename.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Save a DynamicImage to the given path, inferring format from extension.
///
/// The file only appears at `path` once fully encoded, so an interrupted
/// write never leaves a truncated output that looks fresh.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let partial = partial_path(path);
    let written = match ext.as_str() {
        "jpg" | "jpeg" => save_jpeg(img, &partial, quality),
        "png" => img.save_with_format(&partial, ImageFormat::Png).map_err(|e| {
            BackendError::ProcessingFailed(format!("PNG encode failed: {}", e))
        }),
        other => {
            return Err(BackendError::ProcessingFailed(format!(
                "Unsupported output format: {}",
                other
            )));
        }
    };

    let result = written.and_then(|()| std::fs::rename(&partial, path).map_err(BackendError::Io));
    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

/// JPEG has no alpha channel, so the image is flattened to RGB first.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let (w, h) = thumbnail_dimensions(params.fit, (img.width(), img.height()));

        let resized = match params.fit {
            ThumbnailFit::Square(_) => img.resize_to_fill(w, h, FilterType::Lanczos3),
            ThumbnailFit::FixedWidth(_) | ThumbnailFit::FixedHeight(_) => {
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
        };

        let final_img = match params.sharpening {
            Some(s) => DynamicImage::from(image::imageops::unsharpen(
                &resized,
                s.sigma,
                s.threshold,
            )),
            None => resized,
        };

        save_image(&final_img, &params.output, params.quality.value())
    }

    fn split(&self, params: &SplitParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        if img.width() < 2 {
            return Err(BackendError::ProcessingFailed(format!(
                "{} is too narrow to split ({}px)",
                params.source.display(),
                img.width()
            )));
        }
        let height = img.height();
        let (left, right) = split_regions(img.width());

        let left_img = img.crop_imm(left.x, 0, left.width, height);
        save_image(&left_img, &params.left, params.quality.value())?;

        let right_img = img.crop_imm(right.x, 0, right.width, height);
        save_image(&right_img, &params.right, params.quality.value())
    }
}
