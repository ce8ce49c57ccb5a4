//! CSV export of per-image annotations.
//!
//! Each per-image JSON with at least one annotation becomes a CSV under the
//! category's `csv/` directory, one row per bounding box:
//!
//! ```text
//! #item,x,y,width,height,label
//! 0,10,10,50,40,1
//! ```
//!
//! The label column is the labelmap id for the document's category name
//! (lowercased, spaces to underscores), defaulting to 1.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::RiceprepError;
use crate::labelmap::Labelmap;
use crate::layout::DatasetLayout;
use crate::manifest::schema::{read_manifest, CocoManifest};
use crate::manifest::DEFAULT_DIMENSIONS;

/// Per-category counts after an export run.
#[derive(Clone, Debug)]
pub struct ExportedCounts {
    pub category: String,
    pub converted: usize,
    /// JSON files with zero annotations; skipped, not failed.
    pub skipped: usize,
}

/// Result of a CSV export run.
#[derive(Clone, Debug, Default)]
pub struct ExportSummary {
    pub per_category: Vec<ExportedCounts>,
    pub warnings: Vec<String>,
}

impl ExportSummary {
    pub fn total_converted(&self) -> usize {
        self.per_category.iter().map(|c| c.converted).sum()
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for counts in &self.per_category {
            writeln!(
                f,
                "{}: {} converted, {} skipped (no annotations)",
                counts.category, counts.converted, counts.skipped
            )?;
        }
        writeln!(f, "total: {} CSV file(s) created", self.total_converted())?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Converts every per-image JSON with annotations into a CSV file.
///
/// Categories without a `json/` directory are skipped with a warning;
/// corrupt JSON files are warned about and skipped.
pub fn export_csv(
    layout: &DatasetLayout,
    labelmap: &Labelmap,
    categories: &[String],
) -> Result<ExportSummary, RiceprepError> {
    let mut summary = ExportSummary::default();

    for category in categories {
        let json_dir = layout.json_dir(category);
        if !json_dir.is_dir() {
            summary.warnings.push(format!(
                "{} does not exist, skipping {category}",
                json_dir.display()
            ));
            continue;
        }

        let csv_dir = layout.csv_dir(category);
        std::fs::create_dir_all(&csv_dir)?;

        let mut json_paths: Vec<_> = std::fs::read_dir(&json_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        json_paths.sort();

        let mut converted = 0;
        let mut skipped = 0;

        for json_path in json_paths {
            let doc = match read_manifest(&json_path) {
                Ok(doc) => doc,
                Err(err) => {
                    summary
                        .warnings
                        .push(format!("error converting {}: {err}", json_path.display()));
                    continue;
                }
            };

            if doc.annotations.is_empty() {
                skipped += 1;
                continue;
            }

            let Some(stem) = json_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let csv_path = csv_dir.join(format!("{stem}.csv"));
            write_annotation_csv(&csv_path, &doc, labelmap)?;
            converted += 1;
        }

        summary.per_category.push(ExportedCounts {
            category: category.clone(),
            converted,
            skipped,
        });
    }

    Ok(summary)
}

/// Writes one per-image document as a row-per-bbox CSV.
pub fn write_annotation_csv(
    path: &Path,
    doc: &CocoManifest,
    labelmap: &Labelmap,
) -> Result<(), RiceprepError> {
    let (width, height) = doc
        .images
        .first()
        .map(|img| (img.width, img.height))
        .unwrap_or(DEFAULT_DIMENSIONS);

    let label = doc
        .categories
        .first()
        .map(|cat| labelmap.label_for_display_name(&cat.name))
        .unwrap_or(1);

    let file = File::create(path).map_err(RiceprepError::Io)?;
    let writer = BufWriter::new(file);
    let mut csv_writer = csv::Writer::from_writer(writer);

    let map_err = |source: csv::Error| RiceprepError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };

    csv_writer
        .write_record(["#item", "x", "y", "width", "height", "label"])
        .map_err(map_err)?;

    for (idx, ann) in doc.annotations.iter().enumerate() {
        let bbox = ann.bbox_or_full(width, height);
        csv_writer
            .write_record([
                idx.to_string(),
                bbox[0].to_string(),
                bbox[1].to_string(),
                bbox[2].to_string(),
                bbox[3].to_string(),
                label.to_string(),
            ])
            .map_err(map_err)?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| RiceprepError::Io(e.into_error()))?
        .flush()
        .map_err(RiceprepError::Io)?;

    Ok(())
}
