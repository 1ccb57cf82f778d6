//! Shared test utilities for the diptych test suite.
//!
//! Fixture builders write source trees into a `TempDir`; lookup helpers find
//! albums and images by name and panic with the available candidates on a
//! miss, so a failing assertion says what *was* there.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let dir = tmp.path().join("albums/coast");
//! touch_images(&dir, &["sunset.jpg"]);
//! write_sidecar(&dir, "sunset", "---\ntags: [beach]\n---\n");
//!
//! let report = build(tmp.path(), &out, backend, None).unwrap();
//! let album = find_album(&report.manifest, "coast");
//! assert_eq!(find_image(album, "sunset.jpg").meta.tags, vec!["beach"]);
//! ```

use crate::manifest::{Manifest, ManifestAlbum, ManifestImage};
use crate::scan::{ScanResult, ScannedAlbum};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create `dir` and an empty file for each name. Enough for anything that
/// doesn't decode pixels (scanning, the mock backend).
pub fn touch_images(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
}

pub fn write_album_config(dir: &Path, json: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("config.json"), json).unwrap();
}

pub fn write_gallery_config(root: &Path, json: &str) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("gallery.config.json"), json).unwrap();
}

/// Write `<stem>.md` next to the images in `dir`.
pub fn write_sidecar(dir: &Path, stem: &str, text: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{stem}.md")), text).unwrap();
}

/// Gradient left to right, so the two halves of a split differ.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    })
}

/// Write a real JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

/// Write a real PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a scanned album by title. Panics if not found.
pub fn find_scanned<'a>(result: &'a ScanResult, title: &str) -> &'a ScannedAlbum {
    result
        .albums
        .iter()
        .find(|a| a.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = result.albums.iter().map(|a| a.title.as_str()).collect();
            panic!("album '{title}' not found. Available: {titles:?}")
        })
}

/// Find a manifest album by title. Panics if not found.
pub fn find_album<'a>(manifest: &'a Manifest, title: &str) -> &'a ManifestAlbum {
    manifest
        .albums
        .iter()
        .find(|a| a.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = manifest.albums.iter().map(|a| a.title.as_str()).collect();
            panic!("album '{title}' not found. Available: {titles:?}")
        })
}

/// Find an image by file name within an album. Panics if not found.
pub fn find_image<'a>(album: &'a ManifestAlbum, name: &str) -> &'a ManifestImage {
    album
        .images
        .iter()
        .find(|i| i.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = album.images.iter().map(|i| i.name.as_str()).collect();
            panic!(
                "image '{name}' not found in album '{}'. Available: {names:?}",
                album.title
            )
        })
}
