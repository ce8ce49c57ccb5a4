//! Directory layout contract for the rice leaves dataset.
//!
//! The canonical tree is:
//!
//! ```text
//! <root>/rice_leaves/<category>/images/   image files
//! <root>/rice_leaves/<category>/json/     per-image COCO-style annotations
//! <root>/rice_leaves/<category>/csv/      per-image bounding-box CSVs
//! <root>/rice_leaves/<category>/sets/     per-category split lists
//! <root>/rice_leaves/sets/                global split lists
//! <root>/rice_leaves/labelmap.json        id <-> name mapping
//! ```
//!
//! Legacy top-level folders carry human-readable names ("Brown Spot") and
//! only exist until the one-time reorganization has run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The six disease categories shipped with the dataset, in canonical order.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "healthy_rice_leaf",
    "bacterial_leaf_blight",
    "brown_spot",
    "leaf_blast",
    "leaf_scald",
    "sheath_blight",
];

/// Mapping from legacy human-readable folder names to canonical categories.
///
/// "Leaf scald" really is lowercase-s in the source data.
pub const LEGACY_FOLDERS: [(&str, &str); 6] = [
    ("Healthy Rice Leaf", "healthy_rice_leaf"),
    ("Bacterial Leaf Blight", "bacterial_leaf_blight"),
    ("Brown Spot", "brown_spot"),
    ("Leaf Blast", "leaf_blast"),
    ("Leaf scald", "leaf_scald"),
    ("Sheath Blight", "sheath_blight"),
];

/// Recognized image extensions (matched case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Extension preference order when resolving a stem for manifest building.
pub const MANIFEST_EXT_ORDER: [&str; 4] = ["jpg", "png", "jpeg", "bmp"];

/// Extension preference order for the distributor's legacy fallback.
pub const FALLBACK_EXT_ORDER: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Resolved paths for one dataset root.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `rice_leaves` directory holding all canonical data.
    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join("rice_leaves")
    }

    pub fn labelmap_path(&self) -> PathBuf {
        self.dataset_dir().join("labelmap.json")
    }

    /// Global split lists shared by all categories.
    pub fn global_sets_dir(&self) -> PathBuf {
        self.dataset_dir().join("sets")
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.dataset_dir().join(category)
    }

    pub fn images_dir(&self, category: &str) -> PathBuf {
        self.category_dir(category).join("images")
    }

    pub fn json_dir(&self, category: &str) -> PathBuf {
        self.category_dir(category).join("json")
    }

    pub fn csv_dir(&self, category: &str) -> PathBuf {
        self.category_dir(category).join("csv")
    }

    pub fn sets_dir(&self, category: &str) -> PathBuf {
        self.category_dir(category).join("sets")
    }

    /// Legacy human-readable folder for a category, if the mapping knows it.
    pub fn legacy_dir(&self, legacy_name: &str) -> PathBuf {
        self.root.join(legacy_name)
    }

    /// Where archived legacy folders end up.
    pub fn origin_dir(&self) -> PathBuf {
        self.root.join("data").join("origin")
    }
}

/// Returns true if the path carries one of the recognized image extensions.
pub fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Finds the image file for a stem by trying extensions in the given order.
///
/// First existing file wins; if both `stem.jpg` and `stem.png` exist the
/// earlier extension in `order` is silently preferred.
pub fn resolve_image(images_dir: &Path, stem: &str, order: &[&str]) -> Option<PathBuf> {
    for ext in order {
        let candidate = images_dir.join(format!("{stem}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Lists the unique image stems in a directory, sorted lexicographically.
///
/// Stems are deduplicated across extensions, so `leaf_01.jpg` and
/// `leaf_01.png` contribute a single entry.
pub fn list_image_stems(images_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut stems = BTreeSet::new();

    for entry in std::fs::read_dir(images_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !has_image_extension(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_string());
        }
    }

    Ok(stems.into_iter().collect())
}

/// Lists all image files in a directory, sorted by filename.
pub fn list_image_files(images_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(images_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
