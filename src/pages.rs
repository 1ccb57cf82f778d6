//! Static HTML shells and published files.
//!
//! The viewer is a single script that renders everything from `data.json`.
//! Crawlers and link previews don't run it, so every album and category also
//! gets a pre-stamped page:
//!
//! ```text
//! public/
//! ├── albums/<albumId>.html
//! ├── category/<name>.html
//! ├── app.js, style.css, assets/…   # copied from the source root
//! ├── index.html, …                  # copied from root/pages/*.html
//! └── serve.json                     # {"cleanUrls": false}
//! ```
//!
//! Each page is the shell (`root/pages/shell.html`, or the built-in one) with
//! these placeholders replaced:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{{TITLE}}` | entity title, HTML-escaped |
//! | `{{DESCRIPTION}}` | short summary, HTML-escaped |
//! | `{{COVER}}` | cover image path relative to the page, HTML-escaped |
//! | `{{CONTEXT}}` | `{"type":"album"\|"category","id":…}` for `window.initialContext` |
//!
//! `serve.json` turns off clean-URL rewriting in static hosts, which would
//! otherwise redirect `photo.html?album=…` and drop the query string.

use crate::config::GalleryConfig;
use crate::loaded::Loaded;
use crate::manifest::Manifest;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const PAGES_DIR: &str = "pages";
pub const SHELL_FILE: &str = "shell.html";
pub const SERVE_CONFIG_FILE: &str = "serve.json";
const STATIC_FILES: &[&str] = &["app.js", "style.css"];
const ASSETS_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which kind of entity a page describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Album,
    Category,
}

impl PageKind {
    fn dir(self) -> &'static str {
        match self {
            PageKind::Album => "albums",
            PageKind::Category => "category",
        }
    }
}

/// Values substituted into the shell for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub kind: PageKind,
    pub id: String,
    pub title: String,
    pub description: String,
    /// Cover path relative to the page, or empty.
    pub cover: String,
}

#[derive(Serialize)]
struct InitialContext<'a> {
    #[serde(rename = "type")]
    kind: PageKind,
    id: &'a str,
}

/// The built-in shell used when `root/pages/shell.html` is absent.
pub fn default_shell() -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "{{TITLE}}" }
                meta name="description" content="{{DESCRIPTION}}";
                meta property="og:title" content="{{TITLE}}";
                meta property="og:description" content="{{DESCRIPTION}}";
                meta property="og:image" content="{{COVER}}";
                link rel="stylesheet" href="../style.css";
            }
            body {
                main id="main-content" {}
                script { (PreEscaped("window.initialContext = {{CONTEXT}};")) }
                script src="../app.js" {}
            }
        }
    }
}

/// Load the page shell for `root`.
pub fn load_shell(root: &Path) -> Loaded<String> {
    let path = root.join(PAGES_DIR).join(SHELL_FILE);
    let builtin = || default_shell().into_string();
    if !path.is_file() {
        return Loaded::Default(builtin());
    }
    match fs::read_to_string(&path) {
        Ok(shell) => Loaded::Found(shell),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read page shell, using built-in");
            Loaded::Invalid {
                value: builtin(),
                reason: e.to_string(),
            }
        }
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// JSON for `window.initialContext`, safe to embed in a `<script>` block.
fn context_json(page: &PageContext) -> Result<String, PageError> {
    let json = serde_json::to_string(&InitialContext {
        kind: page.kind,
        id: &page.id,
    })?;
    Ok(json.replace("</", "<\\/"))
}

/// Substitute every placeholder in `shell`.
///
/// The shell is scanned once, so placeholder text inside a substituted value
/// is left alone.
pub fn render_page(shell: &str, page: &PageContext) -> Result<String, PageError> {
    let values = [
        ("{{TITLE}}", escape(&page.title)),
        ("{{DESCRIPTION}}", escape(&page.description)),
        ("{{COVER}}", escape(&page.cover)),
        ("{{CONTEXT}}", context_json(page)?),
    ];
    let mut rendered = String::with_capacity(shell.len());
    let mut rest = shell;
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                rendered.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                rendered.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    rendered.push_str(rest);
    Ok(rendered)
}

/// Whether `name` can be used as a single file name under the output tree.
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

fn page_title(entity: &str, config: &GalleryConfig) -> String {
    match config.project_name.as_deref().filter(|p| !p.is_empty()) {
        Some(project) => format!("{entity} | {project}"),
        None => entity.to_string(),
    }
}

fn page_cover(path: Option<&str>) -> String {
    match path {
        None => String::new(),
        Some(p) if p.contains("://") || p.starts_with('/') => p.to_string(),
        Some(p) => format!("../{p}"),
    }
}

/// Page contexts for every album and category in the manifest.
pub fn page_contexts(manifest: &Manifest) -> Vec<PageContext> {
    let mut pages: Vec<PageContext> = manifest
        .albums
        .iter()
        .map(|album| PageContext {
            kind: PageKind::Album,
            id: album.id.clone(),
            title: page_title(&album.title, &manifest.config),
            description: format!("{} photos", album.images.len()),
            cover: page_cover(
                album
                    .cover
                    .as_ref()
                    .map(|c| format!("thumbnails/{c}"))
                    .as_deref(),
            ),
        })
        .collect();

    pages.extend(manifest.categories.iter().map(|(name, cover)| {
        let albums = manifest
            .albums
            .iter()
            .filter(|a| a.categories.contains(name))
            .count();
        PageContext {
            kind: PageKind::Category,
            id: name.clone(),
            title: page_title(name, &manifest.config),
            description: format!("{albums} albums"),
            cover: page_cover(cover.as_deref()),
        }
    }));
    pages
}

/// Counts for the page-writing step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PagesReport {
    pub written: usize,
    /// Ids whose name cannot be a file name.
    pub skipped: Vec<String>,
    /// Ids whose page could not be rendered or written, with the error.
    pub failed: Vec<(String, String)>,
}

fn write_page(output_dir: &Path, shell: &str, page: &PageContext) -> Result<(), PageError> {
    let dir = output_dir.join(page.kind.dir());
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join(format!("{}.html", page.id)),
        render_page(shell, page)?,
    )?;
    Ok(())
}

/// Write one shell per album and per category under `output_dir`.
///
/// Each page stands alone: a failure is logged and recorded, and the
/// remaining pages are still written.
pub fn write_entity_pages(output_dir: &Path, shell: &str, manifest: &Manifest) -> PagesReport {
    let mut report = PagesReport::default();
    for page in page_contexts(manifest) {
        if !is_safe_segment(&page.id) {
            warn!(kind = ?page.kind, id = %page.id, "name is not a safe file name, skipping page");
            report.skipped.push(page.id);
            continue;
        }
        match write_page(output_dir, shell, &page) {
            Ok(()) => report.written += 1,
            Err(e) => {
                warn!(kind = ?page.kind, id = %page.id, error = %e, "cannot write page");
                report.failed.push((page.id, e.to_string()));
            }
        }
    }
    report
}

/// Write `serve.json` disabling clean URLs.
pub fn write_serve_config(output_dir: &Path) -> Result<(), PageError> {
    let json = serde_json::to_string_pretty(&serde_json::json!({ "cleanUrls": false }))?;
    fs::write(output_dir.join(SERVE_CONFIG_FILE), json)?;
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub copied: usize,
    pub failed: usize,
}

impl PublishReport {
    fn record(&mut self, from: &Path, to: &Path) {
        let result = to
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::copy(from, to));
        match result {
            Ok(_) => {
                debug!(file = %from.display(), "published");
                self.copied += 1;
            }
            Err(e) => {
                warn!(file = %from.display(), error = %e, "cannot publish file");
                self.failed += 1;
            }
        }
    }
}

/// Copy the viewer's static files into the output root.
///
/// `app.js` and `style.css` when present, the whole `assets/` tree, and every
/// `pages/*.html` except the shell. Failures are logged per file.
pub fn publish_static(root: &Path, output_dir: &Path) -> PublishReport {
    let mut report = PublishReport::default();

    for name in STATIC_FILES {
        let from = root.join(name);
        if from.is_file() {
            report.record(&from, &output_dir.join(name));
        }
    }

    let assets = root.join(ASSETS_DIR);
    if assets.is_dir() {
        for entry in WalkDir::new(&assets).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&assets) else {
                continue;
            };
            report.record(entry.path(), &output_dir.join(ASSETS_DIR).join(relative));
        }
    }

    let pages = root.join(PAGES_DIR);
    if let Ok(entries) = fs::read_dir(&pages) {
        let mut files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension().is_some_and(|e| e == "html")
                    && p.file_name().is_some_and(|n| n != SHELL_FILE)
            })
            .collect();
        files.sort();
        for from in files {
            if let Some(name) = from.file_name() {
                report.record(&from, &output_dir.join(name));
            }
        }
    }

    report
}
