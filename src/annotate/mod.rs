//! Per-image annotation seeding.
//!
//! Search-engine-sourced images arrive with no annotations at all. This
//! pass gives every image that lacks a per-image JSON a starter document
//! with a single full-image bounding box, so the manifest builder and CSV
//! exporter have something to aggregate until a human refines the boxes.

use std::fmt;

use crate::error::RiceprepError;
use crate::labelmap::Labelmap;
use crate::layout::{self, DatasetLayout};
use crate::manifest::schema::{
    write_manifest, CocoAnnotation, CocoCategory, CocoImage, CocoInfo, CocoManifest,
};
use crate::manifest::{read_image_dimensions, stable_image_id};

/// Result of an annotation seeding run.
#[derive(Clone, Debug, Default)]
pub struct AnnotateSummary {
    pub created: usize,
    pub already_annotated: usize,
    pub warnings: Vec<String>,
}

impl fmt::Display for AnnotateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "created {} annotation file(s), {} already present",
            self.created, self.already_annotated
        )?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Creates a starter per-image JSON for every un-annotated image.
///
/// Existing annotation files are never touched. Categories without an
/// `images/` directory are skipped with a warning.
pub fn seed_annotations(
    layout: &DatasetLayout,
    labelmap: &Labelmap,
    categories: &[String],
) -> Result<AnnotateSummary, RiceprepError> {
    let mut summary = AnnotateSummary::default();

    for category in categories {
        let images_dir = layout.images_dir(category);
        if !images_dir.is_dir() {
            summary.warnings.push(format!(
                "{} does not exist, skipping {category}",
                images_dir.display()
            ));
            continue;
        }

        let json_dir = layout.json_dir(category);
        std::fs::create_dir_all(&json_dir)?;

        let category_id = labelmap.id_for_name(category).unwrap_or(1);

        for image_path in layout::list_image_files(&images_dir)? {
            let Some(stem) = image_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let json_path = json_dir.join(format!("{stem}.json"));
            if json_path.exists() {
                summary.already_annotated += 1;
                continue;
            }

            let (width, height) = read_image_dimensions(&image_path);
            let image_id = stable_image_id(category, stem);

            let file_name = image_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(stem)
                .to_string();

            let doc = CocoManifest {
                info: Some(CocoInfo {
                    year: Some(2025),
                    version: Some("1.0".to_string()),
                    description: Some("data".to_string()),
                    url: None,
                }),
                images: vec![CocoImage {
                    id: image_id,
                    width,
                    height,
                    file_name,
                }],
                annotations: vec![CocoAnnotation {
                    id: 1,
                    image_id,
                    category_id,
                    bbox: Some([0.0, 0.0, f64::from(width), f64::from(height)]),
                    area: Some(f64::from(width) * f64::from(height)),
                    iscrowd: Some(0),
                    segmentation: serde_json::Value::Array(Vec::new()),
                }],
                categories: vec![CocoCategory {
                    id: category_id,
                    name: category.clone(),
                    supercategory: Some("rice_leaf".to_string()),
                }],
                ..Default::default()
            };

            write_manifest(&json_path, &doc)?;
            summary.created += 1;
        }
    }

    Ok(summary)
}
