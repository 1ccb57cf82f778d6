//! End-to-end builds with the real image backend.
//!
//! Each test writes a small source tree of real JPEG/PNG files into a temp
//! directory, runs the full pipeline and inspects `data.json` and the
//! derived files on disk.

use diptych::imaging::RustBackend;
use diptych::pipeline::{self, BuildReport};
use diptych::secrets::hash_code;
use image::{Rgb, RgbImage};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_fn(width, height, |x, _| Rgb([(x * 7 % 256) as u8, 90, 160]))
        .save(path)
        .unwrap();
}

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn build(root: &Path) -> BuildReport {
    pipeline::build(
        root,
        &pipeline::default_output(root),
        Arc::new(RustBackend::new()),
        None,
    )
    .unwrap()
}

fn read_manifest(root: &Path) -> Value {
    let text = fs::read_to_string(pipeline::default_output(root).join("data.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn album<'a>(manifest: &'a Value, id: &str) -> &'a Value {
    manifest["albums"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == id)
        .unwrap_or_else(|| panic!("album '{id}' not in manifest"))
}

fn out(root: &Path, relative: &str) -> PathBuf {
    pipeline::default_output(root).join(relative)
}

/// A small gallery exercising merges, includes, tags, covers and locks.
fn gallery() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let albums = root.join("albums");

    write_image(&albums.join("A/one.jpg"), 33, 20);
    write_image(&albums.join("B/two.png"), 40, 30);
    write(&albums.join("B/config.json"), r#"{"name": "A"}"#);

    write_image(&albums.join("coast/sunset.jpg"), 24, 16);
    write_image(&albums.join("coast/dawn.jpg"), 24, 16);
    write(
        &albums.join("coast/sunset.md"),
        "---\ntitle: Sunset\ntags: [beach]\ndescription: Evening.\n---\nShot from the *pier*.\n",
    );
    write(
        &albums.join("coast/config.json"),
        r#"{"category": ["Sea"], "coverImage": "sunset.jpg", "includes": ["A/one.jpg"]}"#,
    );

    write_image(&albums.join("vault/secret.jpg"), 12, 12);
    write(
        &albums.join("vault/config.json"),
        r#"{"category": "Private", "unlockCode": "open sesame"}"#,
    );

    write(
        &root.join("gallery.config.json"),
        r#"{"layout": "grid", "thumbnailSize": 10, "masterCode": "master", "defaultCategoryCover": "assets/default.jpg"}"#,
    );
    write(&root.join("dictionary.json"), r#"{"lockedTitle": "Locked"}"#);
    write(&root.join("app.js"), "console.log('viewer');");
    tmp
}

#[test]
fn merged_folders_form_one_album() {
    let tmp = gallery();
    build(tmp.path());
    let manifest = read_manifest(tmp.path());

    let a = album(&manifest, "A");
    assert_eq!(a["title"], "A");
    let names: Vec<&str> = a["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["one.jpg", "two.png"]);
    assert!(
        !manifest["albums"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a["id"] == "B")
    );
}

#[test]
fn tags_and_metadata_reach_the_manifest() {
    let tmp = gallery();
    build(tmp.path());
    let manifest = read_manifest(tmp.path());

    assert_eq!(
        manifest["tags"]["beach"],
        serde_json::json!({"count": 1, "cover": "thumbnails/coast/sunset.jpg"})
    );
    let sunset = &album(&manifest, "coast")["images"][1];
    assert_eq!(sunset["name"], "sunset.jpg");
    assert_eq!(sunset["meta"]["title"], "Sunset");
    assert_eq!(sunset["meta"]["description"], "Evening.");
    assert_eq!(sunset["meta"]["content"], "<p>Shot from the <em>pier</em>.</p>\n");
    let dawn = &album(&manifest, "coast")["images"][0];
    assert_eq!(dawn["meta"]["title"], "dawn");
    assert_eq!(dawn["meta"]["tags"], serde_json::json!([]));
}

#[test]
fn included_images_are_derived_under_the_including_album() {
    let tmp = gallery();
    build(tmp.path());
    let manifest = read_manifest(tmp.path());

    let included = &album(&manifest, "coast")["images"][2];
    assert_eq!(included["name"], "one.jpg");
    assert_eq!(included["thumb"], "thumbnails/coast/one.jpg");
    assert!(out(tmp.path(), "thumbnails/coast/one.jpg").is_file());
    assert!(out(tmp.path(), "thumbnails/A/one.jpg").is_file());
}

#[test]
fn split_halves_have_floor_and_remainder_widths() {
    let tmp = gallery();
    build(tmp.path());

    let left = image::image_dimensions(out(tmp.path(), "split/A/one_a.jpg")).unwrap();
    let right = image::image_dimensions(out(tmp.path(), "split/A/one_b.jpg")).unwrap();
    assert_eq!(left, (16, 20));
    assert_eq!(right, (17, 20));

    // PNG sources keep their format for thumbnails, halves are always JPEG
    let thumb = image::image_dimensions(out(tmp.path(), "thumbnails/A/two.png")).unwrap();
    assert_eq!(thumb, (10, 10));
    assert!(out(tmp.path(), "split/A/two_a.jpg").is_file());
}

#[test]
fn covers_and_categories_resolve() {
    let tmp = gallery();
    build(tmp.path());
    let manifest = read_manifest(tmp.path());

    assert_eq!(album(&manifest, "coast")["cover"], "coast/sunset.jpg");
    assert_eq!(album(&manifest, "A")["cover"], Value::Null);
    assert_eq!(manifest["categories"]["Sea"], "thumbnails/coast/sunset.jpg");
    assert_eq!(manifest["categories"]["Private"], "assets/default.jpg");
}

#[test]
fn secrets_are_hashed_and_plaintext_is_absent() {
    let tmp = gallery();
    build(tmp.path());
    let manifest = read_manifest(tmp.path());

    let vault = album(&manifest, "vault");
    assert_eq!(vault["locked"], true);
    assert_eq!(vault["unlockHash"], hash_code("open sesame"));
    assert_eq!(album(&manifest, "A")["unlockHash"], Value::Null);
    assert_eq!(manifest["config"]["masterHash"], hash_code("master"));
    assert_eq!(manifest["dictionary"]["lockedTitle"], "Locked");

    let text = fs::read_to_string(out(tmp.path(), "data.json")).unwrap();
    assert!(!text.contains("open sesame"));
    assert!(!text.contains("\"master\""));
    assert!(!text.contains("masterCode"));
}

#[test]
fn second_build_regenerates_nothing() {
    let tmp = gallery();
    let first = build(tmp.path());
    assert_eq!(first.derive.stats.generated, 12);
    assert!(first.derive.failures.is_empty());
    let before = fs::read_to_string(out(tmp.path(), "data.json")).unwrap();

    let second = build(tmp.path());
    assert_eq!(second.derive.stats.generated, 0);
    assert_eq!(second.derive.stats.fresh, 12);
    let after = fs::read_to_string(out(tmp.path(), "data.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn pages_and_static_files_are_published() {
    let tmp = gallery();
    build(tmp.path());

    let page = fs::read_to_string(out(tmp.path(), "albums/coast.html")).unwrap();
    assert!(page.contains("<title>coast</title>"));
    assert!(page.contains(r#"window.initialContext = {"type":"album","id":"coast"};"#));
    assert!(out(tmp.path(), "category/Sea.html").is_file());
    assert!(out(tmp.path(), "category/Private.html").is_file());
    assert!(out(tmp.path(), "app.js").is_file());

    let serve: Value =
        serde_json::from_str(&fs::read_to_string(out(tmp.path(), "serve.json")).unwrap())
            .unwrap();
    assert_eq!(serve["cleanUrls"], false);
}

#[test]
fn corrupt_image_does_not_stop_the_build() {
    let tmp = gallery();
    write(&tmp.path().join("albums/broken/bad.jpg"), "not an image");

    let report = build(tmp.path());
    assert_eq!(report.derive.stats.failed, 2);
    let manifest = read_manifest(tmp.path());
    assert_eq!(album(&manifest, "broken")["images"][0]["name"], "bad.jpg");
    assert!(out(tmp.path(), "thumbnails/coast/sunset.jpg").is_file());
}

#[test]
fn missing_root_fails() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("absent");
    let result = pipeline::build(
        &root,
        &root.join("public"),
        Arc::new(RustBackend::new()),
        None,
    );
    assert!(result.is_err());
}
