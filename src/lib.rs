//! # Diptych
//!
//! A build pipeline for split-view photo galleries. Album folders go in; a
//! single `data.json` manifest, cached thumbnails and left/right split halves,
//! and pre-stamped HTML shells come out. A browser-side viewer reads the
//! manifest and does the rest.
//!
//! # Architecture: One Pass, One Barrier
//!
//! ```text
//! albums/ ──▶ scan + merge + includes ──▶ per image ─┬─▶ derive (thread pool) ─┐
//!                                                    └─▶ sidecar metadata      │
//!                                          tag index                           │
//!                                          ─────────── join ◀──────────────────┘
//!                                          covers + categories ─▶ secrets ─▶ data.json ─▶ pages
//! ```
//!
//! Everything except derivation is sequential, in a fixed order (folders by
//! name, images by name, own images before includes). That order decides
//! every "first wins" tie: which folder owns a merged album, which image
//! covers a tag, which album covers a category. The same tree always builds
//! the same manifest.
//!
//! Derivation runs on a rayon pool with one task per output. The manifest
//! refers to derived paths before they exist; the pipeline joins every task
//! before it resolves covers (which look at the disk) and before it returns.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks `albums/`, merges folders by name into albums |
//! | [`include`] | Resolves `includes` entries into extra images |
//! | [`derive`] | Plans and runs thumbnail/split jobs, join barrier |
//! | [`cache`] | mtime staleness checks and cache statistics |
//! | [`imaging`] | Pure-Rust image operations behind a backend trait |
//! | [`metadata`] | Sidecar `.md` files: YAML front matter + markdown body |
//! | [`aggregate`] | Tag index, album and category covers |
//! | [`secrets`] | SHA-256 hashing of unlock and master codes |
//! | [`manifest`] | Manifest types and atomic writer |
//! | [`pages`] | Per-album/per-category HTML shells, static files, `serve.json` |
//! | [`pipeline`] | Orchestration and the fatal/non-fatal error policy |
//! | [`config`] | `gallery.config.json`, album `config.json`, dictionary |
//! | [`loaded`] | Found / Default / Invalid outcome of optional inputs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Output Tree Is the Cache
//!
//! A derived file is reused when it exists and is at least as new as its
//! source. No hashes and no cache index to corrupt or drift out of sync.
//! Touching a source or deleting an output forces a rebuild of just that
//! asset. The manifest itself is always rebuilt.
//!
//! ## Nothing Optional Is Fatal
//!
//! Malformed config, missing includes, broken sidecars, failed derivations and
//! even a failed manifest write are logged and recorded in the
//! [`pipeline::BuildReport`]. Loaders return [`loaded::Loaded`] rather than
//! quietly substituting defaults, so tests can assert which branch fired.
//!
//! ## Secrets Stay Out of the Manifest
//!
//! Unlock codes are replaced by their lowercase-hex SHA-256 before
//! serialization, matching what the viewer computes with
//! `crypto.subtle.digest`. Album locking is a client-side convenience, not
//! access control: the images are still public files.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod derive;
pub mod imaging;
pub mod include;
pub mod loaded;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod scan;
pub mod secrets;

#[cfg(test)]
pub(crate) mod test_helpers;
