//! Staleness checks for derived assets.
//!
//! Thumbnails and split halves are the only cached artifacts. The cache is
//! the output tree itself: a derived file is reused when it exists and its
//! modification time is not older than its source's. There is no content
//! hashing and no side manifest, so touching a source (or deleting a derived
//! file) is enough to force regeneration.
//!
//! A source whose metadata can't be read is reported as stale; the
//! derivation that follows will surface the real error.

use std::fmt;
use std::path::Path;

/// Outcome of comparing a derived file against its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Derived file exists and is at least as new as the source.
    Fresh,
    /// Derived file exists but is older than the source.
    Stale,
    /// Derived file does not exist.
    Missing,
}

impl Freshness {
    pub fn is_fresh(self) -> bool {
        self == Freshness::Fresh
    }
}

/// Compare `derived` against `source` by modification time.
pub fn freshness(source: &Path, derived: &Path) -> Freshness {
    let Ok(derived_meta) = std::fs::metadata(derived) else {
        return Freshness::Missing;
    };
    let source_mtime = std::fs::metadata(source).and_then(|m| m.modified());
    match (source_mtime, derived_meta.modified()) {
        (Ok(src), Ok(out)) if out >= src => Freshness::Fresh,
        _ => Freshness::Stale,
    }
}

/// Freshness of a job that writes several files: fresh only if all are.
pub fn freshness_all(source: &Path, derived: &[&Path]) -> Freshness {
    derived
        .iter()
        .map(|d| freshness(source, d))
        .find(|f| !f.is_fresh())
        .unwrap_or(Freshness::Fresh)
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub fresh: u32,
    pub generated: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.fresh + self.generated + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fresh == 0 && self.failed == 0 {
            return write!(f, "{} generated", self.generated);
        }
        write!(f, "{} cached, {} generated", self.fresh, self.generated)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " ({} total)", self.total())
    }
}
