//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::ThumbnailFit;

/// A horizontal slice of an image: `x` offset and width, full height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub width: u32,
}

/// Split an image of `width` pixels into left and right halves.
///
/// The left half is `floor(W/2)` wide and the right half takes the remainder,
/// so odd widths give the extra column to the right.
///
/// ```
/// # use diptych::imaging::split_regions;
/// let (left, right) = split_regions(101);
/// assert_eq!((left.x, left.width), (0, 50));
/// assert_eq!((right.x, right.width), (50, 51));
/// ```
pub fn split_regions(width: u32) -> (Region, Region) {
    let half = width / 2;
    (
        Region { x: 0, width: half },
        Region {
            x: half,
            width: width - half,
        },
    )
}

/// Output dimensions of a thumbnail for a given source size.
///
/// Proportional edges are rounded and never drop below one pixel.
pub fn thumbnail_dimensions(fit: ThumbnailFit, source: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    match fit {
        ThumbnailFit::Square(size) => (size, size),
        ThumbnailFit::FixedWidth(w) => {
            let h = (w as f64 * src_h as f64 / src_w as f64).round() as u32;
            (w, h.max(1))
        }
        ThumbnailFit::FixedHeight(h) => {
            let w = (h as f64 * src_w as f64 / src_h as f64).round() as u32;
            (w.max(1), h)
        }
    }
}
