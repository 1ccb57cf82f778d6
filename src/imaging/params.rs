//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. The deriver plans
//! them; the [`backend`](super::backend) does the pixel work.
//!
//! - [`Quality`]: JPEG encoding quality (1-100). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters applied after downscaling.
//! - [`ThumbnailFit`]: How a thumbnail is sized for the gallery layout.
//! - [`ThumbnailParams`] / [`SplitParams`]: Full operation descriptions.

use crate::config::Layout;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur
/// - `threshold`: Minimum brightness difference to sharpen (0 = all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Thumbnail sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFit {
    /// `size`×`size`, resized to fill then centre-cropped.
    Square(u32),
    /// Fixed width, height follows the source aspect ratio.
    FixedWidth(u32),
    /// Fixed height, width follows the source aspect ratio.
    FixedHeight(u32),
}

impl ThumbnailFit {
    pub fn for_layout(layout: Layout, size: u32) -> Self {
        let size = size.max(1);
        match layout {
            Layout::Grid => ThumbnailFit::Square(size),
            Layout::Masonry => ThumbnailFit::FixedWidth(size),
            Layout::Justified => ThumbnailFit::FixedHeight(size),
        }
    }
}

/// Parameters for a thumbnail operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub fit: ThumbnailFit,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

/// Parameters for splitting an image into left and right halves.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitParams {
    pub source: PathBuf,
    pub left: PathBuf,
    pub right: PathBuf,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn fit_follows_layout() {
        assert_eq!(
            ThumbnailFit::for_layout(Layout::Grid, 300),
            ThumbnailFit::Square(300)
        );
        assert_eq!(
            ThumbnailFit::for_layout(Layout::Masonry, 300),
            ThumbnailFit::FixedWidth(300)
        );
        assert_eq!(
            ThumbnailFit::for_layout(Layout::Justified, 300),
            ThumbnailFit::FixedHeight(300)
        );
    }

    #[test]
    fn fit_never_zero() {
        assert_eq!(
            ThumbnailFit::for_layout(Layout::Grid, 0),
            ThumbnailFit::Square(1)
        );
    }
}
