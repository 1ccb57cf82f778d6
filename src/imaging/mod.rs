//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Thumbnail** | `resize_to_fill` / `resize_exact` + `unsharpen` |
//! | **Split** | `crop_imm` at `floor(W/2)` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{Region, split_regions, thumbnail_dimensions};
pub use params::{Quality, Sharpening, SplitParams, ThumbnailFit, ThumbnailParams};
pub use rust_backend::{RustBackend, is_supported_image};
