//! Structural checks for built COCO manifests.
//!
//! Catches the ways a manifest can go quietly wrong: duplicate ids,
//! annotations pointing at images or categories that are not in the file,
//! zero-size images from failed dimension probes, and bounding boxes that
//! fall outside their image.

mod report;

pub use report::{CheckIssue, CheckReport, IssueCode, IssueContext, Severity};

use std::collections::{HashMap, HashSet};

use crate::manifest::schema::CocoManifest;

/// Checks a manifest and returns a report of all issues found.
pub fn check_manifest(manifest: &CocoManifest) -> CheckReport {
    let mut report = CheckReport::new();

    let image_ids: HashSet<u64> = manifest.images.iter().map(|i| i.id).collect();
    let category_ids: HashSet<u64> = manifest.categories.iter().map(|c| c.id).collect();

    check_images(manifest, &mut report);
    check_categories(manifest, &mut report);
    check_annotations(manifest, &image_ids, &category_ids, &mut report);

    report
}

fn check_images(manifest: &CocoManifest, report: &mut CheckReport) {
    let mut seen_ids: HashMap<u64, usize> = HashMap::new();

    for (idx, image) in manifest.images.iter().enumerate() {
        if let Some(first_idx) = seen_ids.get(&image.id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "duplicate image id {} (first seen at index {})",
                    image.id, first_idx
                ),
                IssueContext::Image { id: image.id },
            ));
        } else {
            seen_ids.insert(image.id, idx);
        }

        if image.width == 0 || image.height == 0 {
            report.add(CheckIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id: image.id },
            ));
        }

        if image.file_name.is_empty() {
            report.add(CheckIssue::warning(
                IssueCode::EmptyFileName,
                "empty file name",
                IssueContext::Image { id: image.id },
            ));
        }
    }
}

fn check_categories(manifest: &CocoManifest, report: &mut CheckReport) {
    let mut seen_ids: HashMap<u64, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, u64> = HashMap::new();

    for (idx, category) in manifest.categories.iter().enumerate() {
        if let Some(first_idx) = seen_ids.get(&category.id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateCategoryId,
                format!(
                    "duplicate category id {} (first seen at index {})",
                    category.id, first_idx
                ),
                IssueContext::Category { id: category.id },
            ));
        } else {
            seen_ids.insert(category.id, idx);
        }

        if category.name.is_empty() {
            report.add(CheckIssue::warning(
                IssueCode::EmptyCategoryName,
                "empty category name",
                IssueContext::Category { id: category.id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            report.add(CheckIssue::warning(
                IssueCode::DuplicateCategoryName,
                format!(
                    "duplicate category name '{}' (also used by category {})",
                    category.name, first_id
                ),
                IssueContext::Category { id: category.id },
            ));
        } else {
            seen_names.insert(&category.name, category.id);
        }
    }
}

fn check_annotations(
    manifest: &CocoManifest,
    image_ids: &HashSet<u64>,
    category_ids: &HashSet<u64>,
    report: &mut CheckReport,
) {
    let mut seen_ids: HashMap<u64, usize> = HashMap::new();

    let image_dims: HashMap<u64, (u32, u32)> = manifest
        .images
        .iter()
        .map(|i| (i.id, (i.width, i.height)))
        .collect();

    for (idx, annotation) in manifest.annotations.iter().enumerate() {
        let id = annotation.id;

        if let Some(first_idx) = seen_ids.get(&id) {
            report.add(CheckIssue::error(
                IssueCode::DuplicateAnnotationId,
                format!(
                    "duplicate annotation id {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Annotation { id },
            ));
        } else {
            seen_ids.insert(id, idx);
        }

        if !image_ids.contains(&annotation.image_id) {
            report.add(CheckIssue::error(
                IssueCode::MissingImageRef,
                format!("references non-existent image {}", annotation.image_id),
                IssueContext::Annotation { id },
            ));
        }

        if !category_ids.contains(&annotation.category_id) {
            report.add(CheckIssue::error(
                IssueCode::MissingCategoryRef,
                format!(
                    "references non-existent category {}",
                    annotation.category_id
                ),
                IssueContext::Annotation { id },
            ));
        }

        // Id 0 is the reserved background class; a box labeled background
        // is almost certainly a mapping bug upstream.
        if annotation.category_id == 0 {
            report.add(CheckIssue::warning(
                IssueCode::BackgroundAnnotation,
                "annotation labeled with reserved background category 0",
                IssueContext::Annotation { id },
            ));
        }

        let Some(bbox) = annotation.bbox else {
            report.add(CheckIssue::warning(
                IssueCode::MissingBBox,
                "annotation has no bbox",
                IssueContext::Annotation { id },
            ));
            continue;
        };
        let [x, y, w, h] = bbox;

        if !bbox.iter().all(|v| v.is_finite()) {
            report.add(CheckIssue::error(
                IssueCode::BBoxNotFinite,
                format!("non-finite bbox ({x}, {y}, {w}, {h})"),
                IssueContext::Annotation { id },
            ));
            continue;
        }

        if x < 0.0 || y < 0.0 || w < 0.0 || h < 0.0 {
            report.add(CheckIssue::error(
                IssueCode::NegativeBBox,
                format!("negative bbox component ({x}, {y}, {w}, {h})"),
                IssueContext::Annotation { id },
            ));
        }

        if w == 0.0 || h == 0.0 {
            report.add(CheckIssue::warning(
                IssueCode::ZeroAreaBBox,
                format!("degenerate bbox {w}x{h}"),
                IssueContext::Annotation { id },
            ));
        }

        if let Some(area) = annotation.area {
            let expected = w * h;
            // Area is redundant in COCO; tolerate rounding but flag real drift.
            if (area - expected).abs() > expected.max(1.0) * 1e-6 {
                report.add(CheckIssue::warning(
                    IssueCode::AreaMismatch,
                    format!("stored area {area} disagrees with w*h = {expected}"),
                    IssueContext::Annotation { id },
                ));
            }
        }

        if let Some((width, height)) = image_dims.get(&annotation.image_id) {
            let (img_w, img_h) = (f64::from(*width), f64::from(*height));
            let tolerance = 0.5;

            if x < -tolerance
                || y < -tolerance
                || x + w > img_w + tolerance
                || y + h > img_h + tolerance
            {
                report.add(CheckIssue::error(
                    IssueCode::BBoxOutOfBounds,
                    format!(
                        "bbox ({x:.1}, {y:.1}, {w:.1}, {h:.1}) extends outside image bounds (0, 0, {width}, {height})"
                    ),
                    IssueContext::Annotation { id },
                ));
            }
        }
    }
}
