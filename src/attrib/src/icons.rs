//! Icon identity resolution
//!
//! Items from different civilizations frequently share a display slug
//! (`scout.png`) while pointing at different source art. Before icons are
//! copied, every slug's sources are clustered by perceptual equality; a slug
//! whose sources fall into more than one cluster is a conflict and is left
//! for a human to triage.

use image::RgbaImage;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::item::Item;
use crate::Result;

/// Per-channel difference above which a pixel counts as changed
pub const CHANNEL_THRESHOLD: u8 = 25;

/// Changed pixels tolerated before two images are considered distinct
pub const PIXEL_TOLERANCE: usize = 5;

/// Slug whose sources are perceptually distinct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconConflict {
    pub slug: String,
    /// Source paths grouped by equivalence, in first-seen order
    pub clusters: Vec<Vec<PathBuf>>,
}

/// Outcome of one resolution pass
#[derive(Debug, Default)]
pub struct IconReport {
    /// Destinations written
    pub copied: Vec<PathBuf>,
    /// Destinations already present and equivalent
    pub unchanged: usize,
    pub conflicts: Vec<IconConflict>,
    /// Icon names with no readable source image
    pub missing: Vec<String>,
}

/// Group items by icon slug, detect conflicts and copy one source per slug
///
/// Sources are `<icons_src>/<icon>.png`. Conflicting slugs are not copied.
pub fn resolve_icons<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    icons_src: &Path,
    dest_dir: &Path,
) -> Result<IconReport> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut report = IconReport::default();

    for item in items {
        let Some(icon) = &item.icon else {
            continue;
        };
        let source = icons_src.join(format!("{}.png", icon));
        if !source.is_file() {
            if !report.missing.contains(icon) {
                warn!(icon = %icon, item = %item.id, "icon source not found");
                report.missing.push(icon.clone());
            }
            continue;
        }

        let sources = groups.entry(item.icon_slug()).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    fs::create_dir_all(dest_dir)?;

    for (slug, sources) in groups {
        let clusters = cluster(&sources);
        if clusters.len() > 1 {
            let clusters: Vec<Vec<PathBuf>> = clusters.into_iter().map(|c| c.paths).collect();
            error!(slug = %slug, clusters = ?clusters, "conflicting icon sources");
            report.conflicts.push(IconConflict { slug, clusters });
            continue;
        }

        let Some(representative) = clusters.into_iter().next() else {
            continue;
        };
        let dest = dest_dir.join(&slug);

        if dest.is_file() {
            if let Some(existing) = decode(&dest) {
                if equivalent(&existing, &representative.image) {
                    debug!(slug = %slug, "icon unchanged");
                    report.unchanged += 1;
                    continue;
                }
            }
        }

        fs::copy(&representative.paths[0], &dest)?;
        report.copied.push(dest);
    }

    info!(
        copied = report.copied.len(),
        unchanged = report.unchanged,
        conflicts = report.conflicts.len(),
        missing = report.missing.len(),
        "resolved icons"
    );
    Ok(report)
}

struct Cluster {
    image: RgbaImage,
    paths: Vec<PathBuf>,
}

/// Cluster sources by perceptual equality against each cluster's first image
fn cluster(sources: &[PathBuf]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for source in sources {
        let Some(image) = decode(source) else {
            continue;
        };
        match clusters.iter_mut().find(|c| equivalent(&c.image, &image)) {
            Some(cluster) => cluster.paths.push(source.clone()),
            None => clusters.push(Cluster {
                image,
                paths: vec![source.clone()],
            }),
        }
    }

    clusters
}

/// Decode an icon to RGBA
pub fn load_icon(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

fn decode(path: &Path) -> Option<RgbaImage> {
    match load_icon(path) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to decode icon");
            None
        }
    }
}

/// Whether two images differ in at most `PIXEL_TOLERANCE` pixels
pub fn equivalent(a: &RgbaImage, b: &RgbaImage) -> bool {
    if a.dimensions() != b.dimensions() {
        return false;
    }
    differing_pixels(a, b) <= PIXEL_TOLERANCE
}

/// Pixels where any channel differs by more than `CHANNEL_THRESHOLD`
pub fn differing_pixels(a: &RgbaImage, b: &RgbaImage) -> usize {
    a.pixels()
        .zip(b.pixels())
        .filter(|(p, q)| {
            p.0.iter()
                .zip(q.0.iter())
                .any(|(x, y)| x.abs_diff(*y) > CHANNEL_THRESHOLD)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use image::Rgba;

    fn canvas(marked: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        for i in 0..marked {
            img.put_pixel(i, 0, Rgba([0, 0, 0, 255]));
        }
        img
    }

    fn write_icon(root: &Path, name: &str, img: &RgbaImage) {
        let path = root.join(format!("{}.png", name));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        img.save(path).unwrap();
    }

    fn scout(civ: &str, icon: &str) -> Item {
        let mut item = Item::new("scout", ItemType::Unit, "Scout", 1);
        item.civs.insert(civ.to_string());
        item.icon = Some(icon.to_string());
        item
    }

    #[test]
    fn test_equivalent_within_tolerance() {
        assert!(equivalent(&canvas(0), &canvas(5)));
        assert!(!equivalent(&canvas(0), &canvas(6)));
        assert!(!equivalent(&canvas(0), &RgbaImage::new(8, 8)));
    }

    #[test]
    fn test_small_channel_noise_ignored() {
        let a = canvas(0);
        let mut b = canvas(0);
        for x in 0..16 {
            b.put_pixel(x, 3, Rgba([250, 250, 250, 255]));
        }
        assert_eq!(differing_pixels(&a, &b), 0);
    }

    #[test]
    fn test_conflicting_scout_icons() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        let dest = dir.path().join("out");
        write_icon(&icons, "races/english/scout", &canvas(0));
        write_icon(&icons, "races/french/scout", &canvas(0));
        write_icon(&icons, "races/mongol/scout", &canvas(12));

        let items = [
            scout("en", "races/english/scout"),
            scout("fr", "races/french/scout"),
            scout("mo", "races/mongol/scout"),
        ];
        let report = resolve_icons(&items, &icons, &dest).unwrap();

        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.slug, "scout.png");
        assert_eq!(conflict.clusters.len(), 2);
        assert_eq!(conflict.clusters[0].len(), 2);
        assert_eq!(conflict.clusters[1], vec![icons.join("races/mongol/scout.png")]);
        assert!(!dest.join("scout.png").exists());
    }

    #[test]
    fn test_equivalent_sources_copied_once() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        let dest = dir.path().join("out");
        write_icon(&icons, "races/english/scout", &canvas(0));
        write_icon(&icons, "races/french/scout", &canvas(3));

        let items = [
            scout("en", "races/english/scout"),
            scout("fr", "races/french/scout"),
        ];
        let report = resolve_icons(&items, &icons, &dest).unwrap();
        assert!(report.conflicts.is_empty());
        assert_eq!(report.copied, vec![dest.join("scout.png")]);

        let again = resolve_icons(&items, &icons, &dest).unwrap();
        assert!(again.copied.is_empty());
        assert_eq!(again.unchanged, 1);
    }

    #[test]
    fn test_stale_destination_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        let dest = dir.path().join("out");
        write_icon(&icons, "races/english/scout", &canvas(0));
        write_icon(&dest, "scout", &canvas(12));

        let items = [scout("en", "races/english/scout")];
        let report = resolve_icons(&items, &icons, &dest).unwrap();
        assert_eq!(report.copied, vec![dest.join("scout.png")]);
        assert_eq!(report.unchanged, 0);

        let written = load_icon(&dest.join("scout.png")).unwrap();
        assert!(equivalent(&written, &canvas(0)));
    }

    #[test]
    fn test_missing_source_reported() {
        let dir = tempfile::tempdir().unwrap();
        let items = [scout("en", "races/english/nowhere")];
        let report = resolve_icons(&items, dir.path(), &dir.path().join("out")).unwrap();
        assert_eq!(report.missing, vec!["races/english/nowhere".to_string()]);
        assert!(report.copied.is_empty());
    }
}
