//! CLI output formatting.
//!
//! Output is **information-centric, not file-centric**: every album is shown by
//! its positional index and title, with source paths as indented context
//! lines underneath.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Albums
//! 001 Coast (3 photos)
//!     Folders: 2023-06-coast, 2023-07-coast
//!     Categories: Sea
//!     Locked
//!     001 a.jpg
//!         Source: 2023-06-coast/a.jpg
//!     002 x.jpg
//!         Include: Trips
//!
//! Warnings
//!     Duplicate image a.jpg in 2023-06-coast dropped: 2023-07-coast/a.jpg
//! ```
//!
//! ## Build
//!
//! ```text
//! sunset.jpg thumbnail: generated
//! sunset.jpg split: cached
//! Built 1 album, 3 images, 1 category, 2 tags
//! Cache: 3 cached, 3 generated (6 total)
//! Manifest: data.json
//! Pages: 2 written
//! Static: 4 files copied
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::derive::DeriveEvent;
use crate::pipeline::BuildReport;
use crate::scan::{ImageOrigin, ScanResult, ScanWarning};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Show `path` relative to `base` when possible.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Check (scan + merge)
// ============================================================================

pub fn format_warning(warning: &ScanWarning, albums_root: &Path) -> String {
    match warning {
        ScanWarning::InvalidConfig { path, reason } => {
            format!("Invalid config {}: {}", display_path(path, albums_root), reason)
        }
        ScanWarning::MissingInclude { album, target } => format!(
            "Missing include in {}: {}",
            album,
            display_path(target, albums_root)
        ),
        ScanWarning::UnusableInclude { album, target } => format!(
            "Unusable include in {}: {}",
            album,
            display_path(target, albums_root)
        ),
        ScanWarning::DuplicateImage {
            album,
            name,
            source,
        } => format!(
            "Duplicate image {} in {} dropped: {}",
            name,
            album,
            display_path(source, albums_root)
        ),
    }
}

pub fn format_scan_output(result: &ScanResult, albums_root: &Path) -> Vec<String> {
    let mut lines = vec!["Albums".to_string()];

    for (i, album) in result.albums.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            album.title,
            plural(album.images.len(), "photo", "photos")
        ));
        if album.folders.len() > 1 || album.folders.first() != Some(&album.title) {
            lines.push(format!("{}Folders: {}", indent(1), album.folders.join(", ")));
        }
        if !album.categories.is_empty() {
            lines.push(format!(
                "{}Categories: {}",
                indent(1),
                album.categories.join(", ")
            ));
        }
        if album.locked || album.unlock_code.is_some() {
            lines.push(format!("{}Locked", indent(1)));
        }
        for (j, image) in album.images.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), image.name));
            let context = match &image.origin {
                ImageOrigin::Folder(_) => {
                    format!("Source: {}", display_path(&image.path, albums_root))
                }
                ImageOrigin::Include(entry) => format!("Include: {entry}"),
            };
            lines.push(format!("{}{}", indent(2), context));
        }
    }

    if !result.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for warning in &result.warnings {
            lines.push(format!("{}{}", indent(1), format_warning(warning, albums_root)));
        }
    }
    lines
}

pub fn print_scan_output(result: &ScanResult, albums_root: &Path) {
    for line in format_scan_output(result, albums_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_derive_event(event: &DeriveEvent) -> String {
    match event {
        DeriveEvent::Cached { kind, source } => format!("{} {}: cached", file_name(source), kind),
        DeriveEvent::Generated { kind, source } => {
            format!("{} {}: generated", file_name(source), kind)
        }
        DeriveEvent::Failed {
            kind,
            source,
            error,
        } => format!("{} {}: failed ({})", file_name(source), kind, error),
    }
}

pub fn format_build_summary(report: &BuildReport, output: &Path) -> Vec<String> {
    let manifest = &report.manifest;
    let mut lines = vec![format!(
        "Built {}, {}, {}, {}",
        plural(manifest.albums.len(), "album", "albums"),
        plural(manifest.image_count(), "image", "images"),
        plural(manifest.categories.len(), "category", "categories"),
        plural(manifest.tags.len(), "tag", "tags"),
    )];

    lines.push(format!("Cache: {}", report.derive.stats));
    for failure in &report.derive.failures {
        lines.push(format!(
            "{}{} {}: {}",
            indent(1),
            file_name(&failure.source),
            failure.kind,
            failure.error
        ));
    }

    if let Some(reason) = &report.config_error {
        lines.push(format!("Config: invalid, defaults used ({reason})"));
    }
    if !report.invalid_sidecars.is_empty() {
        lines.push(format!(
            "Metadata: {} unreadable, defaults used",
            plural(report.invalid_sidecars.len(), "sidecar", "sidecars")
        ));
    }

    match (&report.manifest_path, &report.manifest_error) {
        (Some(path), _) => lines.push(format!("Manifest: {}", display_path(path, output))),
        (None, Some(e)) => lines.push(format!("Manifest: not written ({e})")),
        (None, None) => {}
    }

    let mut pages = format!("Pages: {} written", report.pages.written);
    if !report.pages.skipped.is_empty() {
        pages.push_str(&format!(", {} skipped", report.pages.skipped.len()));
    }
    if !report.pages.failed.is_empty() {
        pages.push_str(&format!(", {} failed", report.pages.failed.len()));
    }
    lines.push(pages);
    for (id, error) in &report.pages.failed {
        lines.push(format!("{}{}: {}", indent(1), id, error));
    }

    let mut published = format!("Static: {} copied", plural(report.published.copied, "file", "files"));
    if report.published.failed > 0 {
        published.push_str(&format!(", {} failed", report.published.failed));
    }
    lines.push(published);
    lines
}

pub fn print_build_summary(report: &BuildReport, output: &Path) {
    for line in format_build_summary(report, output) {
        println!("{}", line);
    }
}
