//! Split distribution to per-category `sets/` directories.
//!
//! Global split files carry `<category>/<stem>` entries. Each category gets
//! its own copy with the prefix stripped, so downstream consumers of one
//! category never need to know about the others. Re-running with unchanged
//! inputs reproduces identical files.

use std::fmt;

use crate::error::RiceprepError;
use crate::layout::{self, DatasetLayout, FALLBACK_EXT_ORDER};
use crate::split::{read_split_file, write_split_file, SPLIT_FILES};

/// Per-category file counts after a distribution run.
#[derive(Clone, Debug)]
pub struct DistributedCounts {
    pub category: String,
    pub file: &'static str,
    pub entries: usize,
}

/// Result of a split distribution run.
#[derive(Clone, Debug, Default)]
pub struct DistributeSummary {
    pub written: Vec<DistributedCounts>,
    pub warnings: Vec<String>,
}

impl fmt::Display for DistributeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for counts in &self.written {
            writeln!(
                f,
                "{}/sets/{}: {} entr(ies)",
                counts.category, counts.file, counts.entries
            )?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Rewrites the global split files into each category's `sets/` directory.
///
/// Entries matching `<category>/` have the prefix stripped. Legacy entries
/// with no prefix are claimed by the first category whose `images/`
/// directory contains a matching file (extensions probed in
/// `.jpg/.jpeg/.png/.bmp` order). Empty results are not written.
pub fn distribute_splits(
    layout: &DatasetLayout,
    categories: &[String],
) -> Result<DistributeSummary, RiceprepError> {
    let mut summary = DistributeSummary::default();
    let main_sets = layout.global_sets_dir();

    if !main_sets.is_dir() {
        summary.warnings.push(format!(
            "{} does not exist, nothing to distribute",
            main_sets.display()
        ));
        return Ok(summary);
    }

    // Read each global file once; missing ones are warned about once.
    let mut globals: Vec<(&'static str, Vec<String>)> = Vec::new();
    for file in SPLIT_FILES {
        let global_path = main_sets.join(file);
        match read_split_file(&global_path) {
            Ok(entries) => globals.push((file, entries)),
            Err(_) => summary
                .warnings
                .push(format!("{} does not exist", global_path.display())),
        }
    }

    for category in categories {
        let sets_dir = layout.sets_dir(category);
        std::fs::create_dir_all(&sets_dir)?;

        for (file, entries) in &globals {
            let file = *file;
            let mut matched = filter_for_category(layout, category, entries);
            if matched.is_empty() {
                summary.warnings.push(format!(
                    "no entries found for {category}/sets/{file}"
                ));
                continue;
            }

            write_split_file(&sets_dir.join(file), &mut matched)?;
            summary.written.push(DistributedCounts {
                category: category.clone(),
                file,
                entries: matched.len(),
            });
        }
    }

    Ok(summary)
}

/// Selects the bare stems belonging to one category.
fn filter_for_category(
    layout: &DatasetLayout,
    category: &str,
    entries: &[String],
) -> Vec<String> {
    let prefix = format!("{category}/");
    let images_dir = layout.images_dir(category);

    let mut matched = Vec::new();
    for entry in entries {
        if let Some(stem) = entry.strip_prefix(&prefix) {
            matched.push(stem.to_string());
        } else if !entry.contains('/') {
            // Legacy prefix-free entry: keep it if the image exists here.
            if layout::resolve_image(&images_dir, entry, &FALLBACK_EXT_ORDER).is_some() {
                matched.push(entry.clone());
            }
        }
    }
    matched
}
