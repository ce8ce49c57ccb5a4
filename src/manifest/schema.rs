//! COCO-shaped JSON schema types.
//!
//! Both the per-image annotation files and the aggregated manifests use the
//! same top-level shape (`images`, `annotations`, `categories`), so one set
//! of serde types covers reading the per-image JSON and writing the
//! per-split manifests.
//!
//! # COCO Format Reference
//!
//! COCO bounding boxes use `[x, y, width, height]` where `(x, y)` is the
//! top-left corner in absolute pixel coordinates.
//!
//! # Deterministic Output
//!
//! The writer sorts `images[]` and `categories[]` by id and keeps
//! annotations in assignment order, so rebuilding a manifest from the same
//! inputs produces byte-identical output.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RiceprepError;

/// Top-level COCO document: a per-image annotation file or a full manifest.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CocoManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<CocoInfo>,

    #[serde(default)]
    pub images: Vec<CocoImage>,

    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    pub categories: Vec<CocoCategory>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<serde_json::Value>,
}

/// COCO info block.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CocoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// COCO image entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

/// COCO category entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

/// COCO annotation entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,

    /// Defaults to 1 when absent, matching the per-image annotation files.
    #[serde(default = "default_category_id")]
    pub category_id: u64,

    /// `[x, y, width, height]` with `(x, y)` as top-left corner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iscrowd: Option<u8>,

    /// Segmentation data; accepted but never produced.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub segmentation: serde_json::Value,
}

fn default_category_id() -> u64 {
    1
}

/// Reads a COCO document from a file.
pub fn read_manifest(path: &Path) -> Result<CocoManifest, RiceprepError> {
    let file = File::open(path).map_err(RiceprepError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| RiceprepError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a COCO document as pretty JSON.
///
/// `images[]` and `categories[]` are sorted by id before writing so the
/// output is reproducible.
pub fn write_manifest(path: &Path, manifest: &CocoManifest) -> Result<(), RiceprepError> {
    let file = File::create(path).map_err(RiceprepError::Io)?;
    let writer = BufWriter::new(file);

    let mut sorted = manifest.clone();
    sorted.images.sort_by_key(|img| img.id);
    sorted.categories.sort_by_key(|cat| cat.id);

    serde_json::to_writer_pretty(writer, &sorted).map_err(|source| {
        RiceprepError::ManifestWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Parses a COCO document from a string. Useful for testing without file I/O.
pub fn from_manifest_str(json: &str) -> Result<CocoManifest, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a COCO document from raw bytes.
///
/// Useful for fuzzing without UTF-8 validation overhead.
pub fn from_manifest_slice(bytes: &[u8]) -> Result<CocoManifest, serde_json::Error> {
    serde_json::from_slice(bytes)
}

impl CocoAnnotation {
    /// The bounding box, falling back to the full image extent.
    pub fn bbox_or_full(&self, width: u32, height: u32) -> [f64; 4] {
        self.bbox
            .unwrap_or([0.0, 0.0, f64::from(width), f64::from(height)])
    }
}
