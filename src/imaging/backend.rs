//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the deriver needs:
//! thumbnail and split. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Backends are shared
//! across derivation workers, so they must be `Send + Sync`.

use super::params::{SplitParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
pub trait ImageBackend: Send + Sync {
    /// Write a thumbnail sized per `params.fit`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;

    /// Write the left and right halves of the full-resolution source.
    fn split(&self, params: &SplitParams) -> Result<(), BackendError>;
}
