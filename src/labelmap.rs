//! Labelmap loading and lookup.
//!
//! `labelmap.json` is an ordered list of `{object_id, object_name}` pairs.
//! Id 0 is reserved for `background` by convention. Both the COCO manifest
//! builder and the CSV exporter resolve ids through this mapping, so a
//! missing or malformed labelmap aborts the whole run rather than being
//! skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RiceprepError;
use crate::manifest::schema::CocoCategory;

/// One entry of `labelmap.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelmapEntry {
    pub object_id: u64,
    pub object_name: String,
}

/// The loaded labelmap with two-way lookup.
#[derive(Clone, Debug, Default)]
pub struct Labelmap {
    entries: Vec<LabelmapEntry>,
    by_id: BTreeMap<u64, String>,
    by_name: BTreeMap<String, u64>,
}

impl Labelmap {
    /// Builds a labelmap from entries, enforcing id and name uniqueness.
    pub fn from_entries(
        entries: Vec<LabelmapEntry>,
        path: &Path,
    ) -> Result<Self, RiceprepError> {
        let mut by_id = BTreeMap::new();
        let mut by_name = BTreeMap::new();

        for entry in &entries {
            if by_id
                .insert(entry.object_id, entry.object_name.clone())
                .is_some()
            {
                return Err(RiceprepError::LabelmapInvalid {
                    path: path.to_path_buf(),
                    message: format!("duplicate object_id {}", entry.object_id),
                });
            }
            if by_name
                .insert(entry.object_name.clone(), entry.object_id)
                .is_some()
            {
                return Err(RiceprepError::LabelmapInvalid {
                    path: path.to_path_buf(),
                    message: format!("duplicate object_name '{}'", entry.object_name),
                });
            }
        }

        Ok(Self {
            entries,
            by_id,
            by_name,
        })
    }

    /// Reads and validates `labelmap.json`.
    pub fn load(path: &Path) -> Result<Self, RiceprepError> {
        let file = File::open(path).map_err(RiceprepError::Io)?;
        let reader = BufReader::new(file);

        let entries: Vec<LabelmapEntry> =
            serde_json::from_reader(reader).map_err(|source| RiceprepError::LabelmapParse {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_entries(entries, path)
    }

    /// Parses and validates a labelmap from raw bytes.
    ///
    /// Useful for fuzzing without file I/O.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RiceprepError> {
        let path = Path::new("<bytes>");
        let entries: Vec<LabelmapEntry> =
            serde_json::from_slice(bytes).map_err(|source| RiceprepError::LabelmapParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_entries(entries, path)
    }

    pub fn entries(&self) -> &[LabelmapEntry] {
        &self.entries
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn name_for_id(&self, id: u64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn id_for_name(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    /// Label id for a manifest category name, lowercased with underscores.
    ///
    /// Defaults to 1 when the name is unknown, matching the exporter
    /// contract.
    pub fn label_for_display_name(&self, display_name: &str) -> u64 {
        let key = display_name.to_lowercase().replace(' ', "_");
        self.id_for_name(&key).unwrap_or(1)
    }

    /// Builds the COCO `categories[]` list, sorted by id.
    ///
    /// Id 0 keeps the `background` supercategory; everything else is a
    /// `rice_leaf`.
    pub fn coco_categories(&self) -> Vec<CocoCategory> {
        self.by_id
            .iter()
            .map(|(&id, name)| CocoCategory {
                id,
                name: name.clone(),
                supercategory: Some(if id == 0 {
                    "background".to_string()
                } else {
                    "rice_leaf".to_string()
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, name: &str) -> LabelmapEntry {
        LabelmapEntry {
            object_id: id,
            object_name: name.to_string(),
        }
    }

    #[test]
    fn lookup_works_both_ways() {
        let labelmap = Labelmap::from_entries(
            vec![entry(0, "background"), entry(1, "brown_spot")],
            Path::new("labelmap.json"),
        )
        .expect("valid labelmap");

        assert_eq!(labelmap.name_for_id(1), Some("brown_spot"));
        assert_eq!(labelmap.id_for_name("background"), Some(0));
        assert!(labelmap.contains_id(0));
        assert!(!labelmap.contains_id(7));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let result = Labelmap::from_entries(
            vec![entry(1, "brown_spot"), entry(1, "leaf_blast")],
            Path::new("labelmap.json"),
        );
        assert!(matches!(
            result,
            Err(RiceprepError::LabelmapInvalid { .. })
        ));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let result = Labelmap::from_entries(
            vec![entry(1, "brown_spot"), entry(2, "brown_spot")],
            Path::new("labelmap.json"),
        );
        assert!(matches!(
            result,
            Err(RiceprepError::LabelmapInvalid { .. })
        ));
    }

    #[test]
    fn display_name_lookup_normalizes_and_defaults() {
        let labelmap = Labelmap::from_entries(
            vec![entry(0, "background"), entry(3, "leaf_scald")],
            Path::new("labelmap.json"),
        )
        .expect("valid labelmap");

        assert_eq!(labelmap.label_for_display_name("Leaf scald"), 3);
        assert_eq!(labelmap.label_for_display_name("unknown thing"), 1);
    }

    #[test]
    fn coco_categories_sorted_with_background_supercategory() {
        let labelmap = Labelmap::from_entries(
            vec![entry(2, "leaf_blast"), entry(0, "background")],
            Path::new("labelmap.json"),
        )
        .expect("valid labelmap");

        let cats = labelmap.coco_categories();
        assert_eq!(cats[0].id, 0);
        assert_eq!(cats[0].supercategory.as_deref(), Some("background"));
        assert_eq!(cats[1].id, 2);
        assert_eq!(cats[1].supercategory.as_deref(), Some("rice_leaf"));
    }
}
