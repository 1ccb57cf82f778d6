//! Gallery and album configuration.
//!
//! Two kinds of JSON config feed the build:
//!
//! ```text
//! root/
//! ├── gallery.config.json          # GalleryConfig (optional)
//! ├── dictionary.json              # Viewer UI strings (optional)
//! └── albums/
//!     ├── 2023-06-coast/
//!     │   └── config.json          # AlbumConfig (optional)
//!     └── 2023-07-coast/
//!         └── config.json          # name = "Coast" → merges with the folder above
//! ```
//!
//! ## Gallery options
//!
//! ```json
//! {
//!   "layout": "grid",                  // grid | masonry | justified
//!   "projectName": "My Gallery",
//!   "projectLogo": "assets/logo.png",
//!   "browserIcon": "assets/favicon.png",
//!   "description": "Photographs",
//!   "masterCode": "open-sesame",       // hashed into masterHash, never published
//!   "categoryCovers": { "Travel": "assets/travel.jpg" },
//!   "defaultCategoryCover": "assets/category.jpg",
//!   "defaultAlbumCover": "assets/album.jpg",
//!   "dictionary": "dictionary.json",
//!   "thumbnailSize": 400,
//!   "quality": 85,
//!   "maxProcesses": 4
//! }
//! ```
//!
//! ## Album options
//!
//! ```json
//! {
//!   "name": "Coast",
//!   "category": ["Travel", "Sea"],
//!   "coverImage": "sunset.jpg",
//!   "locked": false,
//!   "unlockCode": "secret",
//!   "includes": ["Favourites/", "Other/boat.jpg"]
//! }
//! ```
//!
//! Every field is optional and unknown keys are ignored. A file that fails to
//! parse is reported and treated as empty; it never stops the build.

use crate::loaded::Loaded;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

pub const GALLERY_CONFIG_FILE: &str = "gallery.config.json";
pub const ALBUM_CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Thumbnail layout policy, mirrored by the viewer's CSS classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Square centre crops.
    #[default]
    Grid,
    /// Fixed width, natural height.
    Masonry,
    /// Fixed height, natural width.
    Justified,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Grid => "grid",
            Layout::Masonry => "masonry",
            Layout::Justified => "justified",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grid" => Some(Layout::Grid),
            "masonry" => Some(Layout::Masonry),
            "justified" => Some(Layout::Justified),
            _ => None,
        }
    }
}

impl Serialize for Layout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// An unrecognised layout falls back to grid rather than invalidating the
// whole gallery config.
impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Layout::parse(&raw).unwrap_or_else(|| {
            warn!(layout = %raw, "unknown layout, using grid");
            Layout::Grid
        }))
    }
}

/// Gallery-wide configuration from `gallery.config.json`.
///
/// Serialized into the manifest's `config` block, minus the plaintext
/// master code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryConfig {
    pub layout: Layout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plaintext master code. Input only.
    #[serde(skip_serializing)]
    pub master_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_hash: Option<String>,
    pub category_covers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_category_cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_album_cover: Option<String>,
    /// Dictionary file, relative to the source root.
    pub dictionary: String,
    /// Thumbnail edge length in pixels (meaning depends on `layout`).
    pub thumbnail_size: u32,
    /// JPEG encoding quality for derived assets (1-100).
    pub quality: u32,
    /// Maximum number of parallel derivation workers.
    /// When absent, defaults to the number of CPU cores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Grid,
            project_name: None,
            project_logo: None,
            browser_icon: None,
            description: None,
            master_code: None,
            master_hash: None,
            category_covers: BTreeMap::new(),
            default_category_cover: None,
            default_album_cover: None,
            dictionary: "dictionary.json".to_string(),
            thumbnail_size: 400,
            quality: 85,
            max_processes: None,
        }
    }
}

/// Per-folder configuration from `albums/<folder>/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlbumConfig {
    #[serde(alias = "title")]
    pub name: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    pub cover_image: Option<String>,
    pub locked: bool,
    pub unlock_code: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub includes: Vec<String>,
}

impl AlbumConfig {
    /// The logical album this folder belongs to: the trimmed configured
    /// name, or the folder name when no usable name is set.
    pub fn merge_key(&self, folder_name: &str) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(folder_name)
            .to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept `"x"`, `["x", "y"]` or `null` for list-valued fields.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load an optional JSON file, falling back to `T::default()`.
///
/// Absent file → [`Loaded::Default`]; unreadable or malformed → warning and
/// [`Loaded::Invalid`].
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Loaded<T> {
    if !path.is_file() {
        return Loaded::Default(T::default());
    }
    match read_json(path) {
        Ok(value) => Loaded::Found(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Loaded::Invalid {
                value: T::default(),
                reason: e.to_string(),
            }
        }
    }
}

pub fn load_gallery_config(root: &Path) -> Loaded<GalleryConfig> {
    load_json(&root.join(GALLERY_CONFIG_FILE))
}

pub fn load_album_config(album_dir: &Path) -> Loaded<AlbumConfig> {
    load_json(&album_dir.join(ALBUM_CONFIG_FILE))
}

/// Load the viewer's UI dictionary. Anything but a JSON object is rejected.
pub fn load_dictionary(
    root: &Path,
    config: &GalleryConfig,
) -> Loaded<serde_json::Map<String, serde_json::Value>> {
    let path = root.join(&config.dictionary);
    match load_json::<serde_json::Value>(&path) {
        Loaded::Found(serde_json::Value::Object(map)) => Loaded::Found(map),
        Loaded::Found(_) => {
            warn!(path = %path.display(), "dictionary is not a JSON object, ignoring");
            Loaded::Invalid {
                value: serde_json::Map::new(),
                reason: "dictionary must be a JSON object".to_string(),
            }
        }
        Loaded::Default(_) => Loaded::Default(serde_json::Map::new()),
        Loaded::Invalid { reason, .. } => Loaded::Invalid {
            value: serde_json::Map::new(),
            reason,
        },
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least one
pub fn effective_threads(max_processes: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    max_processes.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}
