//! Global indexes built after all albums are assembled.
//!
//! Both passes walk albums and images in manifest order, which is the scan
//! order (folders sorted by name, own images before includes). "First" below
//! always means first in that order, so the same source tree always yields
//! the same tag and category covers.
//!
//! Cover resolution looks at the output tree through an `exists` closure that
//! answers "does this output-relative file exist?". The pipeline only calls
//! these after the derivation barrier, so the answer reflects the finished
//! thumbnails.

use crate::config::GalleryConfig;
use crate::derive::THUMBNAILS_DIR;
use crate::manifest::{ManifestAlbum, TagEntry};
use std::collections::{BTreeMap, HashSet};

/// Count every tag across all images and pick each tag's cover.
pub fn aggregate_tags(albums: &[ManifestAlbum]) -> BTreeMap<String, TagEntry> {
    let mut tags: BTreeMap<String, TagEntry> = BTreeMap::new();
    for image in albums.iter().flat_map(|a| &a.images) {
        let mut seen = HashSet::new();
        for tag in image.meta.tags.iter().map(|t| t.trim()) {
            if tag.is_empty() || !seen.insert(tag) {
                continue;
            }
            tags.entry(tag.to_string())
                .or_insert_with(|| TagEntry {
                    count: 0,
                    cover: image.thumb.clone(),
                })
                .count += 1;
        }
    }
    tags
}

/// `<albumId>/<coverImage>` when that thumbnail exists, else `None`.
pub fn album_cover(
    album_id: &str,
    cover_image: Option<&str>,
    exists: impl Fn(&str) -> bool,
) -> Option<String> {
    let cover = format!("{}/{}", album_id, cover_image?);
    exists(&format!("{THUMBNAILS_DIR}/{cover}")).then_some(cover)
}

/// Map every category used by an album to its cover.
///
/// Precedence: `categoryCovers` from config, then the first album in the
/// category whose cover thumbnail exists, then `defaultCategoryCover`, then
/// `None`. Empty configured covers count as unset.
pub fn resolve_categories(
    albums: &[ManifestAlbum],
    config: &GalleryConfig,
    exists: impl Fn(&str) -> bool,
) -> BTreeMap<String, Option<String>> {
    let mut categories: BTreeMap<String, Option<String>> = BTreeMap::new();

    for album in albums {
        let derived = album
            .cover
            .as_ref()
            .map(|c| format!("{THUMBNAILS_DIR}/{c}"))
            .filter(|path| exists(path));
        for category in &album.categories {
            let slot = categories.entry(category.clone()).or_insert(None);
            if slot.is_none() {
                slot.clone_from(&derived);
            }
        }
    }

    for (category, cover) in categories.iter_mut() {
        if let Some(explicit) = config.category_covers.get(category).filter(|c| !c.is_empty()) {
            *cover = Some(explicit.clone());
        }
        if cover.is_none() {
            *cover = config
                .default_category_cover
                .clone()
                .filter(|c| !c.is_empty());
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestImage;
    use crate::metadata::ImageMeta;

    fn image(album: &str, name: &str, tags: &[&str]) -> ManifestImage {
        ManifestImage {
            name: name.into(),
            src_a: String::new(),
            src_b: String::new(),
            thumb: format!("thumbnails/{album}/{name}"),
            meta: ImageMeta {
                title: name.into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..ImageMeta::default()
            },
        }
    }

    fn album(id: &str, categories: &[&str], cover: Option<&str>) -> ManifestAlbum {
        ManifestAlbum {
            id: id.into(),
            title: id.into(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            cover: cover.map(|c| format!("{id}/{c}")),
            locked: false,
            unlock_hash: None,
            images: Vec::new(),
        }
    }

    #[test]
    fn sole_tagged_image_is_cover() {
        let mut a = album("coast", &[], None);
        a.images = vec![
            image("coast", "dawn.jpg", &[]),
            image("coast", "sunset.jpg", &["beach"]),
        ];
        let tags = aggregate_tags(&[a]);
        assert_eq!(
            tags["beach"],
            TagEntry {
                count: 1,
                cover: "thumbnails/coast/sunset.jpg".into()
            }
        );
    }

    #[test]
    fn counts_across_albums_first_cover_wins() {
        let mut a = album("a", &[], None);
        a.images = vec![image("a", "1.jpg", &["x", "y"])];
        let mut b = album("b", &[], None);
        b.images = vec![image("b", "1.jpg", &["x"]), image("b", "2.jpg", &["x"])];

        let tags = aggregate_tags(&[a, b]);
        assert_eq!(tags["x"].count, 3);
        assert_eq!(tags["x"].cover, "thumbnails/a/1.jpg");
        assert_eq!(tags["y"].count, 1);
    }

    #[test]
    fn blank_and_repeated_tags_are_ignored() {
        let mut a = album("a", &[], None);
        a.images = vec![image("a", "1.jpg", &["x", " x ", "", "  "])];
        let tags = aggregate_tags(&[a]);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["x"].count, 1);
    }

    #[test]
    fn album_cover_requires_thumbnail() {
        assert_eq!(
            album_cover("A", Some("a.jpg"), |p| p == "thumbnails/A/a.jpg"),
            Some("A/a.jpg".to_string())
        );
        assert_eq!(album_cover("A", Some("a.jpg"), |_| false), None);
        assert_eq!(album_cover("A", None, |_| true), None);
    }

    #[test]
    fn first_resolvable_album_sets_category_cover() {
        let albums = [
            album("a", &["Sea"], Some("gone.jpg")),
            album("b", &["Sea", "Land"], Some("b.jpg")),
            album("c", &["Sea"], Some("c.jpg")),
        ];
        let exists = |p: &str| p != "thumbnails/a/gone.jpg";
        let cats = resolve_categories(&albums, &GalleryConfig::default(), exists);
        assert_eq!(cats["Sea"].as_deref(), Some("thumbnails/b/b.jpg"));
        assert_eq!(cats["Land"].as_deref(), Some("thumbnails/b/b.jpg"));
    }

    #[test]
    fn precedence_explicit_then_derived_then_default() {
        let albums = [
            album("a", &["Explicit", "Derived"], Some("a.jpg")),
            album("b", &["Fallback"], None),
        ];
        let config = GalleryConfig {
            category_covers: BTreeMap::from([
                ("Explicit".to_string(), "custom.jpg".to_string()),
                ("Unused".to_string(), "never.jpg".to_string()),
            ]),
            default_category_cover: Some("default.jpg".into()),
            ..GalleryConfig::default()
        };
        let cats = resolve_categories(&albums, &config, |_| true);
        assert_eq!(cats["Explicit"].as_deref(), Some("custom.jpg"));
        assert_eq!(cats["Derived"].as_deref(), Some("thumbnails/a/a.jpg"));
        assert_eq!(cats["Fallback"].as_deref(), Some("default.jpg"));
        assert!(!cats.contains_key("Unused"));
    }

    #[test]
    fn empty_configured_covers_are_ignored() {
        let albums = [
            album("a", &["Derived"], Some("a.jpg")),
            album("b", &["Bare"], None),
        ];
        let config = GalleryConfig {
            category_covers: BTreeMap::from([
                ("Derived".to_string(), String::new()),
                ("Bare".to_string(), String::new()),
            ]),
            default_category_cover: Some(String::new()),
            ..GalleryConfig::default()
        };
        let cats = resolve_categories(&albums, &config, |_| true);
        assert_eq!(cats["Derived"].as_deref(), Some("thumbnails/a/a.jpg"));
        assert_eq!(cats["Bare"], None);
    }

    #[test]
    fn unresolved_category_without_default_is_none() {
        let albums = [album("a", &["Sea"], None)];
        let cats = resolve_categories(&albums, &GalleryConfig::default(), |_| true);
        assert_eq!(cats["Sea"], None);
    }
}
