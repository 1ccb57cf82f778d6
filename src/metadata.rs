//! Per-image metadata from sidecar markdown files.
//!
//! Each image may have a sidecar with the same stem and an `.md` extension:
//!
//! ```text
//! albums/Coast/
//! ├── sunset.jpg
//! └── sunset.md
//! ```
//!
//! ```markdown
//! ---
//! title: Sunset at the pier
//! tags: [beach, evening]
//! description: Taken from the north end.
//! ---
//! Longer notes, rendered to **HTML** for the viewer's info panel.
//! ```
//!
//! The YAML front matter supplies `title`, `tags` and `description`; the body
//! is rendered with `pulldown-cmark` into `content`. Other front matter keys
//! are ignored.
//!
//! ## Fallbacks
//!
//! A missing sidecar, a sidecar path that is a directory, and a sidecar that
//! fails to parse all produce the same defaults: title = file stem, no tags,
//! empty description and content. Only the parse failure is logged. The
//! [`Loaded`] branch tells callers which case applied.

use crate::loaded::Loaded;
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML front matter error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter is not terminated by ---")]
    Unterminated,
    #[error("front matter must be a mapping")]
    NotAMapping,
}

/// Resolved metadata for one image, as serialized into the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageMeta {
    pub title: String,
    pub tags: Vec<String>,
    pub description: String,
    /// Sidecar body rendered to HTML.
    pub content: String,
}

impl ImageMeta {
    /// Defaults for an image without usable metadata.
    pub fn fallback(image_path: &Path) -> Self {
        Self {
            title: file_stem(image_path),
            ..Self::default()
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The sidecar path for an image: same stem, `.md` extension.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("md")
}

/// Load metadata for an image from its sidecar, if any.
pub fn load_meta(image_path: &Path) -> Loaded<ImageMeta> {
    let sidecar = sidecar_path(image_path);
    if !sidecar.is_file() {
        return Loaded::Default(ImageMeta::fallback(image_path));
    }
    let parsed = std::fs::read_to_string(&sidecar)
        .map_err(MetadataError::from)
        .and_then(|text| parse_sidecar(&text, &file_stem(image_path)));
    match parsed {
        Ok(meta) => Loaded::Found(meta),
        Err(e) => {
            warn!(sidecar = %sidecar.display(), error = %e, "invalid metadata sidecar, using defaults");
            Loaded::Invalid {
                value: ImageMeta::fallback(image_path),
                reason: e.to_string(),
            }
        }
    }
}

/// Parse sidecar text. `fallback_title` is used when front matter has none.
pub fn parse_sidecar(text: &str, fallback_title: &str) -> Result<ImageMeta, MetadataError> {
    let (front, body) = split_front_matter(text)?;

    let fields = match front {
        Some(yaml) => match serde_yaml::from_str::<Value>(yaml)? {
            Value::Null => serde_yaml::Mapping::new(),
            Value::Mapping(map) => map,
            _ => return Err(MetadataError::NotAMapping),
        },
        None => serde_yaml::Mapping::new(),
    };

    let title = fields
        .get("title")
        .and_then(scalar_to_string)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title.to_string());
    let description = fields
        .get("description")
        .and_then(scalar_to_string)
        .unwrap_or_default();
    let tags = fields.get("tags").map(collect_tags).unwrap_or_default();

    Ok(ImageMeta {
        title,
        tags,
        description,
        content: render_markdown(body),
    })
}

/// Split `---` delimited front matter from the body.
///
/// Text that doesn't open with a `---` line has no front matter. An opening
/// delimiter without a closing `---` (or `...`) line is an error.
fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), MetadataError> {
    let text = text.trim_start_matches('\u{feff}');
    let Some(first_end) = text.find('\n') else {
        return if text.trim_end() == "---" {
            Err(MetadataError::Unterminated)
        } else {
            Ok((None, text))
        };
    };
    if text[..first_end].trim_end() != "---" {
        return Ok((None, text));
    }

    let rest = &text[first_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(front), body));
        }
        offset += line.len();
    }
    Err(MetadataError::Unterminated)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tags may be a list or a single scalar. Blank and repeated tags are dropped.
fn collect_tags(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Render a markdown body to HTML. Blank bodies render to an empty string.
pub fn render_markdown(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    let mut html = String::new();
    md_html::push_html(&mut html, Parser::new(body));
    html
}
