//! COCO manifest building.
//!
//! Aggregates per-image annotation JSON files into one COCO manifest per
//! (category, split), optionally merging all categories into a combined
//! per-split manifest.
//!
//! # Identifier scheme
//!
//! Image ids are content-derived rather than random: the CRC32C of the
//! category name in the high 32 bits, the CRC32C of the image stem in the
//! low 32 bits. Rebuilding a manifest from the same tree yields the same
//! ids, and ids from different categories can never collide, so combined
//! manifests can merge per-category lists without renumbering images.
//! Annotation ids are a counter starting at 1, scoped per output file;
//! the combined merge renumbers them to keep each file's ids unique.

pub mod schema;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::RiceprepError;
use crate::labelmap::Labelmap;
use crate::layout::{self, DatasetLayout, MANIFEST_EXT_ORDER};
use crate::split::read_split_file;

use schema::{CocoAnnotation, CocoImage, CocoInfo, CocoManifest};

/// Fallback dimensions when an image file cannot be probed.
pub const DEFAULT_DIMENSIONS: (u32, u32) = (512, 512);

/// Options for a manifest build run.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub categories: Vec<String>,
    pub splits: Vec<String>,
    pub combined: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            categories: layout::DEFAULT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            splits: vec!["train".to_string(), "val".to_string(), "test".to_string()],
            combined: false,
        }
    }
}

/// Counts for one written manifest file.
#[derive(Clone, Debug)]
pub struct ManifestCounts {
    pub name: String,
    pub images: usize,
    pub annotations: usize,
}

/// Result of a manifest build run.
#[derive(Clone, Debug, Default)]
pub struct BuildSummary {
    /// One entry per manifest file written, in write order.
    pub written: Vec<ManifestCounts>,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<String>,
}

impl BuildSummary {
    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for counts in &self.written {
            writeln!(
                f,
                "wrote {}: {} image(s), {} annotation(s)",
                counts.name, counts.images, counts.annotations
            )?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Stable image id derived from category and stem.
pub fn stable_image_id(category: &str, stem: &str) -> u64 {
    let hi = u64::from(crc32c::crc32c(category.as_bytes()));
    let lo = u64::from(crc32c::crc32c(stem.as_bytes()));
    (hi << 32) | lo
}

/// Probes image dimensions from the file header, defaulting to 512x512.
pub fn read_image_dimensions(path: &Path) -> (u32, u32) {
    match imagesize::size(path) {
        Ok(size) => {
            let width = u32::try_from(size.width).unwrap_or(DEFAULT_DIMENSIONS.0);
            let height = u32::try_from(size.height).unwrap_or(DEFAULT_DIMENSIONS.1);
            (width, height)
        }
        Err(_) => DEFAULT_DIMENSIONS,
    }
}

/// Resolves a COCO category id for one annotation entry.
///
/// The annotation's own `category_id` wins if the labelmap knows it;
/// otherwise the labelmap id for the current category name; otherwise 1.
fn resolve_category_id(labelmap: &Labelmap, ann_category_id: u64, category: &str) -> u64 {
    if labelmap.contains_id(ann_category_id) {
        ann_category_id
    } else {
        labelmap.id_for_name(category).unwrap_or(1)
    }
}

fn manifest_info(description: String) -> CocoInfo {
    CocoInfo {
        year: Some(2025),
        version: Some("1.0".to_string()),
        description: Some(description),
        url: Some(String::new()),
    }
}

/// Builds one manifest per (category, split) and writes them to `out_dir`.
///
/// With `combined` set, a second file per split merges all categories'
/// images and annotations.
pub fn build_manifests(
    layout: &DatasetLayout,
    out_dir: &Path,
    labelmap: &Labelmap,
    opts: &BuildOptions,
) -> Result<BuildSummary, RiceprepError> {
    std::fs::create_dir_all(out_dir)?;

    let mut summary = BuildSummary::default();
    let coco_categories = labelmap.coco_categories();

    // Combined accumulators, one per split, in split order.
    let mut combined: Vec<CocoManifest> = opts
        .splits
        .iter()
        .map(|split| CocoManifest {
            info: Some(manifest_info(format!(
                "Rice Leaf Disease Classification combined {split} split"
            ))),
            categories: coco_categories.clone(),
            ..Default::default()
        })
        .collect();

    for category in &opts.categories {
        let images_dir = layout.images_dir(category);
        if !images_dir.is_dir() {
            summary.warn(format!(
                "{} does not exist, skipping {category}",
                images_dir.display()
            ));
            continue;
        }

        for (split_idx, split) in opts.splits.iter().enumerate() {
            let manifest =
                build_category_split(layout, labelmap, &coco_categories, category, split, &mut summary);

            let out_path = out_dir.join(format!("{category}_instances_{split}.json"));
            schema::write_manifest(&out_path, &manifest)?;
            summary.written.push(ManifestCounts {
                name: out_path.display().to_string(),
                images: manifest.images.len(),
                annotations: manifest.annotations.len(),
            });

            let acc = &mut combined[split_idx];
            acc.images.extend(manifest.images);
            acc.annotations.extend(manifest.annotations);
        }
    }

    if opts.combined {
        for (split, mut manifest) in opts.splits.iter().zip(combined) {
            // Per-category annotation counters restart at 1, so renumber
            // before merging lists into one file.
            for (idx, ann) in manifest.annotations.iter_mut().enumerate() {
                ann.id = idx as u64 + 1;
            }

            let out_path = out_dir.join(format!("combined_instances_{split}.json"));
            schema::write_manifest(&out_path, &manifest)?;
            summary.written.push(ManifestCounts {
                name: out_path.display().to_string(),
                images: manifest.images.len(),
                annotations: manifest.annotations.len(),
            });
        }
    }

    Ok(summary)
}

/// Assembles the manifest for one (category, split) pair.
fn build_category_split(
    layout: &DatasetLayout,
    labelmap: &Labelmap,
    coco_categories: &[schema::CocoCategory],
    category: &str,
    split: &str,
    summary: &mut BuildSummary,
) -> CocoManifest {
    let images_dir = layout.images_dir(category);
    let json_dir = layout.json_dir(category);
    let split_path = layout.sets_dir(category).join(format!("{split}.txt"));

    let mut manifest = CocoManifest {
        info: Some(manifest_info(format!(
            "Rice Leaf Disease Classification {category} {split} split"
        ))),
        categories: coco_categories.to_vec(),
        ..Default::default()
    };

    // Stems come from the split file when present; otherwise fall back to
    // everything on disk. The fallback is a degraded mode, not a partition.
    let stems: Vec<String> = match read_split_file(&split_path) {
        Ok(lines) => {
            let unique: BTreeSet<String> = lines.into_iter().collect();
            unique.into_iter().collect()
        }
        Err(_) => {
            summary.warn(format!(
                "split file {} does not exist, using all images for {category}/{split}",
                split_path.display()
            ));
            match layout::list_image_stems(&images_dir) {
                Ok(stems) => stems,
                Err(err) => {
                    summary.warn(format!(
                        "failed to list {}: {err}",
                        images_dir.display()
                    ));
                    Vec::new()
                }
            }
        }
    };

    let listed = stems.len();
    let mut annotation_id: u64 = 1;

    for stem in &stems {
        let Some(image_path) = layout::resolve_image(&images_dir, stem, &MANIFEST_EXT_ORDER)
        else {
            continue;
        };

        let (width, height) = read_image_dimensions(&image_path);
        let image_id = stable_image_id(category, stem);

        let file_name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(stem)
            .to_string();

        manifest.images.push(CocoImage {
            id: image_id,
            width,
            height,
            file_name: format!("rice_leaves/{category}/images/{file_name}"),
        });

        let json_path = json_dir.join(format!("{stem}.json"));
        if !json_path.is_file() {
            continue;
        }

        let per_image = match schema::read_manifest(&json_path) {
            Ok(doc) => doc,
            Err(err) => {
                summary.warn(format!("error parsing {}: {err}", json_path.display()));
                continue;
            }
        };

        for ann in &per_image.annotations {
            let category_id = resolve_category_id(labelmap, ann.category_id, category);
            let bbox = ann.bbox_or_full(width, height);
            let area = ann.area.unwrap_or(bbox[2] * bbox[3]);

            manifest.annotations.push(CocoAnnotation {
                id: annotation_id,
                image_id,
                category_id,
                bbox: Some(bbox),
                area: Some(area),
                iscrowd: Some(0),
                segmentation: serde_json::Value::Array(Vec::new()),
            });
            annotation_id += 1;
        }
    }

    if manifest.images.len() < listed {
        summary.warn(format!(
            "{category}/{split}: found {} of {} listed stem(s) on disk",
            manifest.images.len(),
            listed
        ));
    }

    manifest
}
