//! Include resolution: pulling images into an album from elsewhere.
//!
//! An album config's `includes` entries are paths relative to the albums
//! root. A directory contributes every supported image directly inside it
//! (non-recursive, sorted by name); a file contributes itself. Resolved
//! images are attributed to the including album, so their derived assets
//! live under that album's id and never collide with the owner's copies.

use crate::imaging::is_supported_image;
use crate::scan::list_images;
use std::path::{Path, PathBuf};

/// What an include entry resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeTarget {
    /// A directory and the images found directly inside it.
    Directory {
        path: PathBuf,
        images: Vec<PathBuf>,
    },
    /// A single image file.
    File(PathBuf),
    /// Nothing exists at the path.
    Missing(PathBuf),
    /// A file exists but isn't a supported image (or the directory is unreadable).
    Unusable(PathBuf),
}

impl IncludeTarget {
    /// Images contributed by this include, in order.
    pub fn images(&self) -> Vec<PathBuf> {
        match self {
            IncludeTarget::Directory { images, .. } => images.clone(),
            IncludeTarget::File(path) => vec![path.clone()],
            IncludeTarget::Missing(_) | IncludeTarget::Unusable(_) => Vec::new(),
        }
    }
}

/// Resolve a single include entry against the albums root.
pub fn resolve_include(albums_root: &Path, entry: &str) -> IncludeTarget {
    let path = albums_root.join(entry.trim());
    if path.is_dir() {
        match list_images(&path) {
            Ok(images) => IncludeTarget::Directory { path, images },
            Err(_) => IncludeTarget::Unusable(path),
        }
    } else if path.is_file() {
        if is_supported_image(&path) {
            IncludeTarget::File(path)
        } else {
            IncludeTarget::Unusable(path)
        }
    } else {
        IncludeTarget::Missing(path)
    }
}
