//! Content scanning and album merging.
//!
//! First stage of the build. Walks `root/albums/`, loads each folder's
//! optional `config.json`, and folds folders into logical albums.
//!
//! ## Directory Structure
//!
//! ```text
//! albums/
//! ├── 2023-06-coast/               # config.json: { "name": "Coast", "coverImage": "a.jpg" }
//! │   ├── a.jpg
//! │   └── a.md                     # Sidecar metadata (see metadata module)
//! ├── 2023-07-coast/               # config.json: { "name": "Coast", "locked": true }
//! │   ├── a.jpg                    # Dropped: "Coast" already has an a.jpg
//! │   └── b.jpg
//! └── Mountains/                   # No config: merge key is the folder name
//!     └── peak.png
//! ```
//!
//! ## Merge rules
//!
//! Folders are visited in lexicographic order of their names. The merge key
//! is the trimmed `name` from config, or the folder name. The first folder
//! for a key creates the album: its folder name becomes the album id, and its
//! config supplies categories, cover, lock state, unlock code and includes.
//! Later folders with the same key only contribute images; the rest of their
//! config is ignored. The example above yields one "Coast" album with id
//! `2023-06-coast`, unlocked, images `[a.jpg, b.jpg]`.
//!
//! Within an album, image names are unique: the first image with a given file
//! name wins (folder images before includes, earlier folders before later
//! ones). Each drop is recorded as a [`ScanWarning::DuplicateImage`].

use crate::config::{self, AlbumConfig};
use crate::imaging::is_supported_image;
use crate::include::{IncludeTarget, resolve_include};
use crate::loaded::Loaded;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read albums directory {0}: {1}")]
    AlbumsUnreadable(PathBuf, #[source] std::io::Error),
}

/// Where an image in an album came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    /// One of the album's own folders.
    Folder(String),
    /// An `includes` entry of the album's first folder.
    Include(String),
}

/// A source image assigned to an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// File name, unique within the album.
    pub name: String,
    pub path: PathBuf,
    pub origin: ImageOrigin,
}

/// A logical album after merging all folders that share its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedAlbum {
    /// Folder name of the first folder with this key.
    pub id: String,
    /// Merge key.
    pub title: String,
    pub categories: Vec<String>,
    pub cover_image: Option<String>,
    pub locked: bool,
    pub unlock_code: Option<String>,
    /// Every folder merged into this album, in scan order.
    pub folders: Vec<String>,
    pub images: Vec<SourceImage>,
}

impl ScannedAlbum {
    fn from_config(folder: &str, title: String, config: &AlbumConfig) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for cat in config.category.iter().map(|c| c.trim()) {
            if !cat.is_empty() && !categories.iter().any(|c| c == cat) {
                categories.push(cat.to_string());
            }
        }
        Self {
            id: folder.to_string(),
            title,
            categories,
            cover_image: config
                .cover_image
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
            locked: config.locked,
            unlock_code: config.unlock_code.clone().filter(|c| !c.is_empty()),
            folders: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn has_image(&self, name: &str) -> bool {
        self.images.iter().any(|i| i.name == name)
    }

    /// Append an image unless one with the same name is already present.
    /// Returns whether it was added.
    pub fn add_image(&mut self, image: SourceImage) -> bool {
        if self.has_image(&image.name) {
            return false;
        }
        self.images.push(image);
        true
    }
}

/// A recoverable problem found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    InvalidConfig { path: PathBuf, reason: String },
    MissingInclude { album: String, target: PathBuf },
    UnusableInclude { album: String, target: PathBuf },
    DuplicateImage { album: String, name: String, source: PathBuf },
}

/// Albums in first-seen order plus everything that went wrong on the way.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub albums: Vec<ScannedAlbum>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanResult {
    pub fn duplicates(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, ScanWarning::DuplicateImage { .. }))
            .count()
    }
}

/// Accumulates albums by merge key while folders are visited in order.
#[derive(Default)]
struct AlbumRegistry {
    albums: Vec<ScannedAlbum>,
    by_key: HashMap<String, usize>,
    warnings: Vec<ScanWarning>,
}

impl AlbumRegistry {
    fn add(&mut self, album_index: usize, path: PathBuf, origin: ImageOrigin) {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            return;
        };
        let album = &mut self.albums[album_index];
        let image = SourceImage {
            name: name.clone(),
            path: path.clone(),
            origin,
        };
        if !album.add_image(image) {
            debug!(album = %album.id, image = %name, source = %path.display(), "duplicate image name dropped");
            self.warnings.push(ScanWarning::DuplicateImage {
                album: album.id.clone(),
                name,
                source: path,
            });
        }
    }
}

/// Scan `albums_root` into merged albums.
///
/// A missing albums directory yields an empty result; an unreadable one is
/// an error.
pub fn scan(albums_root: &Path) -> Result<ScanResult, ScanError> {
    if !albums_root.exists() {
        warn!(path = %albums_root.display(), "albums directory not found, no albums to build");
        return Ok(ScanResult::default());
    }

    let folders = list_album_folders(albums_root)
        .map_err(|e| ScanError::AlbumsUnreadable(albums_root.to_path_buf(), e))?;

    let mut registry = AlbumRegistry::default();

    for folder_path in folders {
        let folder = folder_name(&folder_path);
        let config = match config::load_album_config(&folder_path) {
            Loaded::Invalid { value, reason } => {
                registry.warnings.push(ScanWarning::InvalidConfig {
                    path: folder_path.join(config::ALBUM_CONFIG_FILE),
                    reason,
                });
                value
            }
            loaded => loaded.into_value(),
        };
        let key = config.merge_key(&folder);

        let images = match list_images(&folder_path) {
            Ok(images) => images,
            Err(e) => {
                warn!(folder = %folder_path.display(), error = %e, "cannot list album folder, skipping");
                continue;
            }
        };

        let (index, is_new) = match registry.by_key.get(&key) {
            Some(&index) => (index, false),
            None => {
                registry
                    .albums
                    .push(ScannedAlbum::from_config(&folder, key.clone(), &config));
                let index = registry.albums.len() - 1;
                registry.by_key.insert(key, index);
                (index, true)
            }
        };

        registry.albums[index].folders.push(folder.clone());
        for image in images {
            registry.add(index, image, ImageOrigin::Folder(folder.clone()));
        }

        if is_new {
            resolve_includes(&mut registry, index, albums_root, &config.includes);
        }
    }

    Ok(ScanResult {
        albums: registry.albums,
        warnings: registry.warnings,
    })
}

fn resolve_includes(
    registry: &mut AlbumRegistry,
    index: usize,
    albums_root: &Path,
    includes: &[String],
) {
    for entry in includes {
        let album = registry.albums[index].id.clone();
        match resolve_include(albums_root, entry) {
            IncludeTarget::Missing(target) => {
                warn!(album = %album, target = %target.display(), "include target not found, skipping");
                registry
                    .warnings
                    .push(ScanWarning::MissingInclude { album, target });
            }
            IncludeTarget::Unusable(target) => {
                warn!(album = %album, target = %target.display(), "include target is not an image or readable directory, skipping");
                registry
                    .warnings
                    .push(ScanWarning::UnusableInclude { album, target });
            }
            resolved => {
                for image in resolved.images() {
                    registry.add(index, image, ImageOrigin::Include(entry.clone()));
                }
            }
        }
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

/// Album folders directly under the albums root, sorted by name.
fn list_album_folders(albums_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut folders: Vec<PathBuf> = fs::read_dir(albums_root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && !is_hidden(p))
        .collect();
    folders.sort_by_key(|p| folder_name(p));
    Ok(folders)
}

/// Supported images directly inside `dir`, sorted by file name.
pub(crate) fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && !is_hidden(p) && is_supported_image(p))
        .collect();
    images.sort_by_key(|p| folder_name(p));
    Ok(images)
}
