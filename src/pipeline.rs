//! Build orchestration.
//!
//! ```text
//! gallery.config.json ─┐
//! albums/ ── scan ─────┼─▶ per image: plan + submit derivation ──┐
//!                      │              load sidecar metadata      │ (overlapping)
//!                      │   aggregate tags                        │
//!                      │   ───────────── join barrier ◀──────────┘
//!                      │   album covers, category covers (check the finished tree)
//!                      └─▶ seal secrets → data.json → shells → static files
//! ```
//!
//! Only three things abort a build: a missing source root, an unreadable
//! albums directory, and an output tree (or worker pool) that can't be
//! created. Everything else is recorded in the [`BuildReport`] and logged.

use crate::aggregate::{aggregate_tags, album_cover, resolve_categories};
use crate::cache::CacheStats;
use crate::config::{self, GalleryConfig, effective_threads};
use crate::derive::{
    DerivationQueue, DeriveError, DeriveEvent, DeriveReport, DeriveSettings, output_path,
    plan_image,
};
use crate::imaging::ImageBackend;
use crate::loaded::Loaded;
use crate::manifest::{Manifest, ManifestAlbum, ManifestImage, write_manifest};
use crate::metadata::load_meta;
use crate::pages::{self, PagesReport, PublishReport};
use crate::scan::{self, ScanError, ScanResult, ScannedAlbum};
use crate::secrets::{seal_album, seal_config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ALBUMS_DIR: &str = "albums";
pub const DEFAULT_OUTPUT_DIR: &str = "public";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Source root {0} does not exist")]
    SourceRootMissing(PathBuf),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error("Cannot create output directory {0}: {1}")]
    Output(PathBuf, #[source] std::io::Error),
}

/// Default output directory for a source root.
pub fn default_output(root: &Path) -> PathBuf {
    root.join(DEFAULT_OUTPUT_DIR)
}

/// Everything a finished build did, including the non-fatal failures.
#[derive(Debug)]
pub struct BuildReport {
    pub manifest: Manifest,
    pub scan: ScanResult,
    pub config_error: Option<String>,
    pub derive: DeriveReport,
    /// Images whose sidecar existed but could not be parsed.
    pub invalid_sidecars: Vec<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub manifest_error: Option<String>,
    pub pages: PagesReport,
    pub published: PublishReport,
}

impl BuildReport {
    pub fn cache_stats(&self) -> &CacheStats {
        &self.derive.stats
    }
}

/// Result of `check`: what a build would see, without writing anything.
#[derive(Debug)]
pub struct CheckReport {
    pub config: Loaded<GalleryConfig>,
    pub scan: ScanResult,
}

fn require_root(root: &Path) -> Result<(), BuildError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(BuildError::SourceRootMissing(root.to_path_buf()))
    }
}

/// Scan and merge without deriving or writing.
pub fn check(root: &Path) -> Result<CheckReport, BuildError> {
    require_root(root)?;
    let config = config::load_gallery_config(root);
    let scan = scan::scan(&root.join(ALBUMS_DIR))?;
    Ok(CheckReport { config, scan })
}

/// Run the full build from `root` into `output`.
///
/// `events`, when given, receives a [`DeriveEvent`] per derivation job.
pub fn build(
    root: &Path,
    output: &Path,
    backend: Arc<dyn ImageBackend>,
    events: Option<Sender<DeriveEvent>>,
) -> Result<BuildReport, BuildError> {
    require_root(root)?;

    let loaded_config = config::load_gallery_config(root);
    let config_error = loaded_config.reason().map(String::from);
    let mut config = loaded_config.into_value();
    let dictionary = config::load_dictionary(root, &config).into_value();

    std::fs::create_dir_all(output).map_err(|e| BuildError::Output(output.to_path_buf(), e))?;

    let scan = scan::scan(&root.join(ALBUMS_DIR))?;
    info!(
        albums = scan.albums.len(),
        duplicates = scan.duplicates(),
        "scanned albums"
    );

    let settings = DeriveSettings::from_config(&config);
    let mut queue = DerivationQueue::new(backend, effective_threads(config.max_processes))?;
    if let Some(tx) = events {
        queue = queue.with_events(tx);
    }

    // Derivation runs on the pool while metadata and manifest entries are built here.
    let mut invalid_sidecars = Vec::new();
    let mut albums: Vec<ManifestAlbum> = scan
        .albums
        .iter()
        .map(|album| assemble_album(album, output, &settings, &queue, &mut invalid_sidecars))
        .collect();
    let tags = aggregate_tags(&albums);

    debug!(pending = queue.pending(), "waiting for derivations");
    let derive = queue.join();
    info!(cache = %derive.stats, "derivation finished");

    let exists = |relative: &str| output_path(output, relative).is_file();
    for (album, scanned) in albums.iter_mut().zip(&scan.albums) {
        album.cover = album_cover(&album.id, scanned.cover_image.as_deref(), exists);
    }
    let categories = resolve_categories(&albums, &config, exists);

    seal_config(&mut config);
    let manifest = Manifest {
        config,
        categories,
        tags,
        albums,
        dictionary,
    };

    let (manifest_path, manifest_error) = match write_manifest(output, &manifest) {
        Ok(path) => {
            info!(path = %path.display(), "wrote manifest");
            (Some(path), None)
        }
        Err(e) => {
            warn!(error = %e, "cannot write manifest");
            (None, Some(e.to_string()))
        }
    };

    let shell = pages::load_shell(root).into_value();
    let pages = pages::write_entity_pages(output, &shell, &manifest);

    let mut published = pages::publish_static(root, output);
    if let Err(e) = pages::write_serve_config(output) {
        warn!(error = %e, "cannot write serve config");
        published.failed += 1;
    }

    Ok(BuildReport {
        manifest,
        scan,
        config_error,
        derive,
        invalid_sidecars,
        manifest_path,
        manifest_error,
        pages,
        published,
    })
}

fn assemble_album(
    album: &ScannedAlbum,
    output: &Path,
    settings: &DeriveSettings,
    queue: &DerivationQueue,
    invalid_sidecars: &mut Vec<PathBuf>,
) -> ManifestAlbum {
    let images = album
        .images
        .iter()
        .map(|image| {
            let (paths, jobs) = plan_image(output, &album.id, &image.name, &image.path, settings);
            for job in jobs {
                queue.submit(job);
            }
            let meta = load_meta(&image.path);
            if meta.is_invalid() {
                invalid_sidecars.push(image.path.clone());
            }
            ManifestImage {
                name: image.name.clone(),
                src_a: paths.split_a,
                src_b: paths.split_b,
                thumb: paths.thumb,
                meta: meta.into_value(),
            }
        })
        .collect();

    let lock = seal_album(album.locked, album.unlock_code.as_deref());
    ManifestAlbum {
        id: album.id.clone(),
        title: album.title.clone(),
        categories: album.categories.clone(),
        cover: None,
        locked: lock.locked,
        unlock_hash: lock.unlock_hash,
        images,
    }
}
