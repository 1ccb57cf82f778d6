//! Asset derivation: thumbnails and split halves.
//!
//! Every image in an album gets three derived files, namespaced by the album
//! that lists it (an included image is derived again under the including
//! album's id):
//!
//! ```text
//! public/
//! ├── thumbnails/<albumId>/<name>        # layout-sized thumbnail, source format
//! └── split/<albumId>/<stem>_a.jpg       # left half,  width floor(W/2)
//!     split/<albumId>/<stem>_b.jpg       # right half, width W - floor(W/2)
//! ```
//!
//! ## Execution model
//!
//! [`DerivationQueue::submit`] checks freshness on the calling thread. A fresh
//! job is counted and skipped; anything else is spawned onto the queue's own
//! rayon pool right away and a [`TaskHandle`] is registered in the pending
//! set. The caller keeps going (loading metadata, building manifest entries)
//! while the pool works. [`DerivationQueue::join`] is the single barrier: it
//! waits on every handle and folds the outcomes into a [`DeriveReport`].
//!
//! Jobs never share an output path. A job whose outputs were already claimed
//! by an earlier job in the same run is refused, so no two tasks write the
//! same file.
//!
//! A failed job is logged and reported. The build continues; there are no
//! retries.

use crate::cache::{CacheStats, Freshness, freshness_all};
use crate::config::GalleryConfig;
use crate::imaging::{
    BackendError, ImageBackend, Quality, Sharpening, SplitParams, ThumbnailFit, ThumbnailParams,
};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const SPLIT_DIR: &str = "split";

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Cannot start derivation workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Output-relative paths of an image's derived assets, with `/` separators.
///
/// These strings go into the manifest verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPaths {
    pub thumb: String,
    pub split_a: String,
    pub split_b: String,
}

impl DerivedPaths {
    pub fn for_image(album_id: &str, image_name: &str) -> Self {
        let stem = Path::new(image_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| image_name.to_string());
        Self {
            thumb: format!("{THUMBNAILS_DIR}/{album_id}/{image_name}"),
            split_a: format!("{SPLIT_DIR}/{album_id}/{stem}_a.jpg"),
            split_b: format!("{SPLIT_DIR}/{album_id}/{stem}_b.jpg"),
        }
    }
}

/// Resolve a manifest-relative path against the output root.
pub fn output_path(output_root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(output_root.to_path_buf(), |acc, part| acc.join(part))
}

/// Settings shared by every job in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeriveSettings {
    pub fit: ThumbnailFit,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl DeriveSettings {
    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            fit: ThumbnailFit::for_layout(config.layout, config.thumbnail_size),
            quality: Quality::new(config.quality),
            sharpening: Some(Sharpening::light()),
        }
    }
}

/// One unit of derivation work.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivationJob {
    Thumbnail(ThumbnailParams),
    Split(SplitParams),
}

impl DerivationJob {
    pub fn source(&self) -> &Path {
        match self {
            DerivationJob::Thumbnail(p) => &p.source,
            DerivationJob::Split(p) => &p.source,
        }
    }

    pub fn outputs(&self) -> Vec<&Path> {
        match self {
            DerivationJob::Thumbnail(p) => vec![p.output.as_path()],
            DerivationJob::Split(p) => vec![p.left.as_path(), p.right.as_path()],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DerivationJob::Thumbnail(_) => "thumbnail",
            DerivationJob::Split(_) => "split",
        }
    }

    fn run(&self, backend: &dyn ImageBackend) -> Result<(), BackendError> {
        for output in self.outputs() {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        match self {
            DerivationJob::Thumbnail(p) => backend.thumbnail(p),
            DerivationJob::Split(p) => backend.split(p),
        }
    }
}

/// Plan the thumbnail and split jobs for one image of one album.
pub fn plan_image(
    output_root: &Path,
    album_id: &str,
    image_name: &str,
    source: &Path,
    settings: &DeriveSettings,
) -> (DerivedPaths, Vec<DerivationJob>) {
    let paths = DerivedPaths::for_image(album_id, image_name);
    let jobs = vec![
        DerivationJob::Thumbnail(ThumbnailParams {
            source: source.to_path_buf(),
            output: output_path(output_root, &paths.thumb),
            fit: settings.fit,
            quality: settings.quality,
            sharpening: settings.sharpening,
        }),
        DerivationJob::Split(SplitParams {
            source: source.to_path_buf(),
            left: output_path(output_root, &paths.split_a),
            right: output_path(output_root, &paths.split_b),
            quality: settings.quality,
        }),
    ];
    (paths, jobs)
}

/// Progress notifications, sent as jobs are skipped or finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeriveEvent {
    Cached { kind: &'static str, source: PathBuf },
    Generated { kind: &'static str, source: PathBuf },
    Failed { kind: &'static str, source: PathBuf, error: String },
}

/// A derivation that did not produce its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveFailure {
    pub kind: &'static str,
    pub source: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub error: String,
}

/// Outcome of a whole derivation stage.
#[derive(Debug, Default, Clone)]
pub struct DeriveReport {
    pub stats: CacheStats,
    pub failures: Vec<DeriveFailure>,
}

/// Handle to a spawned job. Resolves once the job's task has finished.
pub struct TaskHandle {
    kind: &'static str,
    source: PathBuf,
    outputs: Vec<PathBuf>,
    done: Receiver<Result<(), BackendError>>,
}

impl TaskHandle {
    /// Block until the task finishes. A task that ended without sending a
    /// result counts as failed.
    fn wait(self) -> Result<(), DeriveFailure> {
        let error = match self.done.recv() {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "derivation task ended without a result".to_string(),
        };
        Err(DeriveFailure {
            kind: self.kind,
            source: self.source,
            outputs: self.outputs,
            error,
        })
    }
}

/// Run `job`, turning a backend panic into an ordinary failure. A panic
/// escaping a pool task would abort the process.
fn run_caught(job: &DerivationJob, backend: &dyn ImageBackend) -> Result<(), BackendError> {
    panic::catch_unwind(AssertUnwindSafe(|| job.run(backend))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(BackendError::ProcessingFailed(format!(
            "panicked while processing {}: {message}",
            job.source().display()
        )))
    })
}

#[derive(Default)]
struct Pending {
    handles: Vec<TaskHandle>,
    claimed: HashSet<PathBuf>,
    fresh: u32,
    refused: Vec<DeriveFailure>,
}

/// Concurrent derivation with a pending set and a join barrier.
pub struct DerivationQueue {
    pool: rayon::ThreadPool,
    backend: Arc<dyn ImageBackend>,
    pending: Mutex<Pending>,
    events: Option<Sender<DeriveEvent>>,
}

impl DerivationQueue {
    pub fn new(backend: Arc<dyn ImageBackend>, threads: usize) -> Result<Self, DeriveError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("derive-{i}"))
            .build()?;
        Ok(Self {
            pool,
            backend,
            pending: Mutex::new(Pending::default()),
            events: None,
        })
    }

    /// Send a [`DeriveEvent`] for every job to `events`.
    pub fn with_events(mut self, events: Sender<DeriveEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: DeriveEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Skip `job` if its outputs are fresh, otherwise start it.
    pub fn submit(&self, job: DerivationJob) -> Freshness {
        let kind = job.label();
        let source = job.source().to_path_buf();
        let outputs: Vec<PathBuf> = job.outputs().into_iter().map(Path::to_path_buf).collect();

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(taken) = outputs.iter().find(|o| pending.claimed.contains(*o)) {
            warn!(source = %source.display(), output = %taken.display(), "output already claimed by another image, skipping");
            let error = format!("output {} already claimed", taken.display());
            self.emit(DeriveEvent::Failed {
                kind,
                source: source.clone(),
                error: error.clone(),
            });
            pending.refused.push(DeriveFailure {
                kind,
                source,
                outputs,
                error,
            });
            return Freshness::Stale;
        }
        pending.claimed.extend(outputs.iter().cloned());

        let output_refs: Vec<&Path> = outputs.iter().map(PathBuf::as_path).collect();
        let freshness = freshness_all(&source, &output_refs);
        if freshness.is_fresh() {
            debug!(kind, source = %source.display(), "derived asset is fresh");
            pending.fresh += 1;
            self.emit(DeriveEvent::Cached { kind, source });
            return freshness;
        }

        let (done_tx, done_rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let task_source = source.clone();
        self.pool.spawn(move || {
            let result = run_caught(&job, backend.as_ref());
            if let Some(tx) = events {
                let event = match &result {
                    Ok(()) => DeriveEvent::Generated {
                        kind,
                        source: task_source,
                    },
                    Err(e) => DeriveEvent::Failed {
                        kind,
                        source: task_source,
                        error: e.to_string(),
                    },
                };
                let _ = tx.send(event);
            }
            let _ = done_tx.send(result);
        });

        pending.handles.push(TaskHandle {
            kind,
            source,
            outputs,
            done: done_rx,
        });
        freshness
    }

    /// Number of spawned jobs not yet joined.
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.handles.len())
            .unwrap_or_default()
    }

    /// Wait for every spawned job and report the stage outcome.
    pub fn join(self) -> DeriveReport {
        let pending = self.pending.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut report = DeriveReport {
            stats: CacheStats {
                fresh: pending.fresh,
                ..CacheStats::default()
            },
            failures: pending.refused,
        };
        report.stats.failed = report.failures.len() as u32;

        for handle in pending.handles {
            match handle.wait() {
                Ok(()) => report.stats.generated += 1,
                Err(failure) => {
                    warn!(
                        kind = failure.kind,
                        source = %failure.source.display(),
                        error = %failure.error,
                        "derivation failed"
                    );
                    report.stats.failed += 1;
                    report.failures.push(failure);
                }
            }
        }
        report
    }
}
