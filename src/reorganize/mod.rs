//! One-time reorganization of legacy folders into the canonical layout.
//!
//! Legacy data lives in top-level folders with human-readable names
//! ("Brown Spot"). Reorganization copies images into
//! `<category>/images/` and per-image JSON into `<category>/json/`,
//! never overwriting an existing destination, so an interrupted run can
//! simply be repeated.
//!
//! After reorganization the legacy folders can be archived: generated JSON
//! is deleted from them and the folders move under `data/origin/`.

use std::fmt;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::RiceprepError;
use crate::layout::{has_image_extension, DatasetLayout, LEGACY_FOLDERS};

/// Per-category counts after a reorganization run.
#[derive(Clone, Debug)]
pub struct ReorganizedCounts {
    pub legacy_folder: String,
    pub category: String,
    pub images: usize,
    pub json_files: usize,
}

/// Result of a reorganization run.
#[derive(Clone, Debug, Default)]
pub struct ReorganizeSummary {
    pub per_category: Vec<ReorganizedCounts>,
    pub warnings: Vec<String>,
}

impl fmt::Display for ReorganizeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for counts in &self.per_category {
            writeln!(
                f,
                "{} -> {}: {} image(s), {} JSON file(s)",
                counts.legacy_folder, counts.category, counts.images, counts.json_files
            )?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Copies legacy folder contents into the canonical per-category layout.
///
/// Files whose destination already exists are counted but left untouched,
/// with the source kept in place. Missing legacy folders are skipped with a
/// warning.
pub fn reorganize(layout: &DatasetLayout) -> Result<ReorganizeSummary, RiceprepError> {
    let mut summary = ReorganizeSummary::default();

    for (legacy_name, category) in LEGACY_FOLDERS {
        let legacy_dir = layout.legacy_dir(legacy_name);
        if !legacy_dir.is_dir() {
            summary.warnings.push(format!(
                "{} does not exist, skipping",
                legacy_dir.display()
            ));
            continue;
        }

        let images_dir = layout.images_dir(category);
        let json_dir = layout.json_dir(category);
        std::fs::create_dir_all(&images_dir)?;
        std::fs::create_dir_all(&json_dir)?;

        let mut images = 0;
        let mut json_files = 0;

        // Legacy folders are flat in practice, but walk them anyway so
        // stray nested files are not silently dropped.
        for entry in WalkDir::new(&legacy_dir).follow_links(true) {
            let entry = entry.map_err(|source| {
                RiceprepError::Io(source.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("walkdir loop detected")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(file_name) = path.file_name() else {
                continue;
            };

            if has_image_extension(path) {
                copy_if_absent(path, &images_dir.join(file_name), &mut summary)?;
                images += 1;
            } else if is_json(path) {
                copy_if_absent(path, &json_dir.join(file_name), &mut summary)?;
                json_files += 1;
            }
        }

        summary.per_category.push(ReorganizedCounts {
            legacy_folder: legacy_name.to_string(),
            category: category.to_string(),
            images,
            json_files,
        });
    }

    Ok(summary)
}

/// Result of an archive run.
#[derive(Clone, Debug, Default)]
pub struct ArchiveSummary {
    pub json_deleted: usize,
    pub folders_moved: usize,
    pub warnings: Vec<String>,
}

impl fmt::Display for ArchiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "JSON files deleted: {}", self.json_deleted)?;
        writeln!(f, "folders moved: {}", self.folders_moved)?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Deletes generated JSON from legacy folders and moves them to
/// `data/origin/`.
///
/// Folders whose destination already exists are left in place with a
/// warning; there is no merging.
pub fn archive_legacy(layout: &DatasetLayout) -> Result<ArchiveSummary, RiceprepError> {
    let mut summary = ArchiveSummary::default();
    let origin_dir = layout.origin_dir();
    std::fs::create_dir_all(&origin_dir)?;

    for (legacy_name, _category) in LEGACY_FOLDERS {
        let legacy_dir = layout.legacy_dir(legacy_name);
        if !legacy_dir.is_dir() {
            summary.warnings.push(format!(
                "{} does not exist, skipping",
                legacy_dir.display()
            ));
            continue;
        }

        for entry in std::fs::read_dir(&legacy_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_json(&path) {
                std::fs::remove_file(&path)?;
                summary.json_deleted += 1;
            }
        }

        let dest = origin_dir.join(legacy_name);
        if dest.exists() {
            summary.warnings.push(format!(
                "{} already exists, skipping move",
                dest.display()
            ));
            continue;
        }

        std::fs::rename(&legacy_dir, &dest)?;
        summary.folders_moved += 1;
    }

    Ok(summary)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn copy_if_absent(
    src: &Path,
    dest: &Path,
    summary: &mut ReorganizeSummary,
) -> Result<(), RiceprepError> {
    if dest.exists() {
        summary.warnings.push(format!(
            "{} already exists, leaving {} in place",
            dest.display(),
            src.display()
        ));
        return Ok(());
    }
    std::fs::copy(src, dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn legacy_tree() -> (tempfile::TempDir, DatasetLayout) {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = DatasetLayout::new(dir.path());
        let legacy = layout.legacy_dir("Brown Spot");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("leaf_01.jpg"), b"img").unwrap();
        fs::write(legacy.join("leaf_01.json"), b"{}").unwrap();
        fs::write(legacy.join("notes.txt"), b"ignore me").unwrap();
        (dir, layout)
    }

    #[test]
    fn copies_images_and_json_into_canonical_layout() {
        let (_dir, layout) = legacy_tree();

        let summary = reorganize(&layout).expect("reorganize failed");
        let brown = summary
            .per_category
            .iter()
            .find(|c| c.category == "brown_spot")
            .expect("brown_spot processed");
        assert_eq!(brown.images, 1);
        assert_eq!(brown.json_files, 1);

        assert!(layout.images_dir("brown_spot").join("leaf_01.jpg").is_file());
        assert!(layout.json_dir("brown_spot").join("leaf_01.json").is_file());
        // Unrelated files are not copied.
        assert!(!layout.images_dir("brown_spot").join("notes.txt").exists());
        // Source stays in place (copy, not move).
        assert!(layout.legacy_dir("Brown Spot").join("leaf_01.jpg").is_file());
    }

    #[test]
    fn existing_destination_is_not_overwritten() {
        let (_dir, layout) = legacy_tree();
        let dest = layout.images_dir("brown_spot").join("leaf_01.jpg");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"original").unwrap();

        let summary = reorganize(&layout).expect("reorganize failed");
        assert!(summary
            .warnings
            .iter()
            .any(|w| w.contains("already exists")));
        assert_eq!(fs::read(&dest).unwrap(), b"original");
    }

    #[test]
    fn missing_legacy_folders_are_warnings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = DatasetLayout::new(dir.path());

        let summary = reorganize(&layout).expect("reorganize failed");
        assert!(summary.per_category.is_empty());
        assert_eq!(summary.warnings.len(), LEGACY_FOLDERS.len());
    }

    #[test]
    fn archive_deletes_json_and_moves_folder() {
        let (_dir, layout) = legacy_tree();

        let summary = archive_legacy(&layout).expect("archive failed");
        assert_eq!(summary.json_deleted, 1);
        assert_eq!(summary.folders_moved, 1);

        let archived = layout.origin_dir().join("Brown Spot");
        assert!(archived.join("leaf_01.jpg").is_file());
        assert!(!archived.join("leaf_01.json").exists());
        assert!(!layout.legacy_dir("Brown Spot").exists());
    }

    #[test]
    fn archive_skips_existing_destination() {
        let (_dir, layout) = legacy_tree();
        fs::create_dir_all(layout.origin_dir().join("Brown Spot")).unwrap();

        let summary = archive_legacy(&layout).expect("archive failed");
        assert_eq!(summary.folders_moved, 0);
        assert!(summary
            .warnings
            .iter()
            .any(|w| w.contains("skipping move")));
        // Source folder stays put.
        assert!(layout.legacy_dir("Brown Spot").is_dir());
    }
}
