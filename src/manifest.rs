//! The manifest: everything the viewer needs, in one JSON file.
//!
//! ```json
//! {
//!   "config": { "layout": "grid", "masterHash": "…", … },
//!   "categories": { "Travel": "thumbnails/coast/a.jpg", "Empty": null },
//!   "tags": { "beach": { "count": 1, "cover": "thumbnails/coast/sunset.jpg" } },
//!   "albums": [
//!     {
//!       "id": "coast", "title": "Coast", "categories": ["Travel"],
//!       "cover": "coast/a.jpg", "locked": false, "unlockHash": null,
//!       "images": [
//!         { "name": "a.jpg", "srcA": "split/coast/a_a.jpg", "srcB": "split/coast/a_b.jpg",
//!           "thumb": "thumbnails/coast/a.jpg",
//!           "meta": { "title": "a", "tags": [], "description": "", "content": "" } }
//!       ]
//!     }
//!   ],
//!   "dictionary": { "lockedTitle": "…" }
//! }
//! ```
//!
//! The manifest is rebuilt from scratch on every run and replaces the previous
//! file atomically (temp file + rename), so the viewer never reads a partial
//! document.

use crate::config::GalleryConfig;
use crate::metadata::ImageMeta;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "data.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub config: GalleryConfig,
    pub categories: BTreeMap<String, Option<String>>,
    pub tags: BTreeMap<String, TagEntry>,
    pub albums: Vec<ManifestAlbum>,
    pub dictionary: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAlbum {
    pub id: String,
    pub title: String,
    pub categories: Vec<String>,
    /// `<albumId>/<image>`, relative to `thumbnails/`.
    pub cover: Option<String>,
    pub locked: bool,
    pub unlock_hash: Option<String>,
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestImage {
    pub name: String,
    pub src_a: String,
    pub src_b: String,
    pub thumb: String,
    pub meta: ImageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    pub count: u32,
    /// Thumbnail of the first image carrying the tag.
    pub cover: String,
}

impl Manifest {
    pub fn image_count(&self) -> usize {
        self.albums.iter().map(|a| a.images.len()).sum()
    }
}

/// Serialize `manifest` to `<output_dir>/data.json`, replacing any previous
/// version via a temp file and rename.
pub fn write_manifest(output_dir: &Path, manifest: &Manifest) -> Result<PathBuf, ManifestError> {
    let target = output_dir.join(MANIFEST_FILE);
    let tmp = output_dir.join(format!("{MANIFEST_FILE}.tmp"));
    let json = serde_json::to_string_pretty(manifest)?;

    fs::write(&tmp, json)?;
    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn sample() -> Manifest {
        Manifest {
            config: GalleryConfig {
                master_code: Some("secret".into()),
                master_hash: Some("hashed".into()),
                ..GalleryConfig::default()
            },
            categories: BTreeMap::from([("Empty".to_string(), None)]),
            tags: BTreeMap::from([(
                "beach".to_string(),
                TagEntry {
                    count: 1,
                    cover: "thumbnails/A/a.jpg".into(),
                },
            )]),
            albums: vec![ManifestAlbum {
                id: "A".into(),
                title: "Album".into(),
                categories: vec!["Empty".into()],
                cover: None,
                locked: false,
                unlock_hash: None,
                images: vec![ManifestImage {
                    name: "a.jpg".into(),
                    src_a: "split/A/a_a.jpg".into(),
                    src_b: "split/A/a_b.jpg".into(),
                    thumb: "thumbnails/A/a.jpg".into(),
                    meta: ImageMeta {
                        title: "a".into(),
                        tags: vec!["beach".into()],
                        ..ImageMeta::default()
                    },
                }],
            }],
            dictionary: serde_json::Map::new(),
        }
    }

    #[test]
    fn serializes_viewer_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        let album = &value["albums"][0];
        assert_eq!(album["unlockHash"], Value::Null);
        assert_eq!(album["cover"], Value::Null);
        assert_eq!(album["images"][0]["srcA"], "split/A/a_a.jpg");
        assert_eq!(album["images"][0]["srcB"], "split/A/a_b.jpg");
        assert_eq!(
            album["images"][0]["meta"],
            json!({"title": "a", "tags": ["beach"], "description": "", "content": ""})
        );
        assert_eq!(value["categories"]["Empty"], Value::Null);
        assert_eq!(value["tags"]["beach"]["count"], 1);
        assert_eq!(value["dictionary"], json!({}));
    }

    #[test]
    fn config_never_carries_master_code() {
        let text = serde_json::to_string(&sample()).unwrap();
        assert!(!text.contains("secret"));
        assert!(!text.contains("masterCode"));
        assert!(text.contains("\"masterHash\":\"hashed\""));
    }

    #[test]
    fn write_replaces_previous_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(MANIFEST_FILE), "stale").unwrap();

        let path = write_manifest(tmp.path(), &sample()).unwrap();
        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["albums"][0]["id"], "A");
        assert!(!tmp.path().join("data.json.tmp").exists());
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let result = write_manifest(&tmp.path().join("nope"), &sample());
        assert!(matches!(result, Err(ManifestError::Io(_))));
    }

    #[test]
    fn image_count_sums_albums() {
        assert_eq!(sample().image_count(), 1);
    }
}
