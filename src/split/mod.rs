//! Train/val/test split generation.
//!
//! For each category the generator collects the unique image stems, sorts
//! them for determinism, shuffles with a seeded RNG, and slices the result
//! into three contiguous blocks. `floor` arithmetic on the train and val
//! ratios leaves the remainder to test, so the three blocks always sum
//! exactly to the input set.
//!
//! Output files are sorted before writing: the shuffle decides *which* stems
//! land in which split, never the file order, so reruns with the same seed
//! diff clean.

pub mod distribute;

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::RiceprepError;
use crate::layout::{self, DatasetLayout};

/// The five split list filenames, global and per-category alike.
pub const SPLIT_FILES: [&str; 5] = [
    "train.txt",
    "val.txt",
    "test.txt",
    "all.txt",
    "train_val.txt",
];

/// Train/val/test ratio triple.
#[derive(Clone, Copy, Debug)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    /// Scales the triple so it sums to 1.
    ///
    /// Negative, non-finite, or all-zero ratios are rejected.
    pub fn normalized(self) -> Result<Self, RiceprepError> {
        let parts = [self.train, self.val, self.test];
        if parts.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(RiceprepError::InvalidSplitRatios {
                message: "ratios must be finite and non-negative".to_string(),
            });
        }

        let total: f64 = parts.iter().sum();
        if total <= 0.0 {
            return Err(RiceprepError::InvalidSplitRatios {
                message: "at least one ratio must be positive".to_string(),
            });
        }

        Ok(Self {
            train: self.train / total,
            val: self.val / total,
            test: self.test / total,
        })
    }
}

/// Options for a split generation run.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub ratios: SplitRatios,
    pub seed: u64,
    pub categories: Vec<String>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: 42,
            categories: layout::DEFAULT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Per-category counts after a split run.
#[derive(Clone, Debug)]
pub struct CategorySplitCounts {
    pub category: String,
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

/// Result of a split generation run.
#[derive(Clone, Debug, Default)]
pub struct SplitSummary {
    pub per_category: Vec<CategorySplitCounts>,
    pub warnings: Vec<String>,
}

impl SplitSummary {
    pub fn total(&self) -> usize {
        self.per_category
            .iter()
            .map(|c| c.train + c.val + c.test)
            .sum()
    }
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for counts in &self.per_category {
            writeln!(
                f,
                "{}: {} train, {} val, {} test",
                counts.category, counts.train, counts.val, counts.test
            )?;
        }
        writeln!(f, "total: {} image(s)", self.total())?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Slices a shuffled stem list into (train, val, test) block sizes.
pub fn split_sizes(n_total: usize, ratios: &SplitRatios) -> (usize, usize, usize) {
    let n_train = (n_total as f64 * ratios.train).floor() as usize;
    let n_val = (n_total as f64 * ratios.val).floor() as usize;
    // Remainder goes to test so the partition sums exactly to n_total.
    let n_test = n_total - n_train - n_val;
    (n_train, n_val, n_test)
}

/// Generates the five global split files under `<root>/rice_leaves/sets/`.
///
/// For a fixed seed and a fixed set of input files the output is
/// byte-identical across runs. Categories whose `images/` directory is
/// missing are skipped with a warning.
pub fn generate_splits(
    layout: &DatasetLayout,
    opts: &SplitOptions,
) -> Result<SplitSummary, RiceprepError> {
    let ratios = opts.ratios.normalized()?;
    let mut rng = StdRng::seed_from_u64(opts.seed);

    let mut summary = SplitSummary::default();
    let mut train_entries = Vec::new();
    let mut val_entries = Vec::new();
    let mut test_entries = Vec::new();

    for category in &opts.categories {
        let images_dir = layout.images_dir(category);
        if !images_dir.is_dir() {
            summary.warnings.push(format!(
                "{} does not exist, skipping {category}",
                images_dir.display()
            ));
            continue;
        }

        // Sorted before shuffling so the seed fully determines the outcome.
        let mut stems = layout::list_image_stems(&images_dir)?;
        stems.shuffle(&mut rng);

        let (n_train, n_val, n_test) = split_sizes(stems.len(), &ratios);

        for (idx, stem) in stems.iter().enumerate() {
            let entry = format!("{category}/{stem}");
            if idx < n_train {
                train_entries.push(entry);
            } else if idx < n_train + n_val {
                val_entries.push(entry);
            } else {
                test_entries.push(entry);
            }
        }

        summary.per_category.push(CategorySplitCounts {
            category: category.clone(),
            train: n_train,
            val: n_val,
            test: n_test,
        });
    }

    let sets_dir = layout.global_sets_dir();
    std::fs::create_dir_all(&sets_dir)?;

    let mut all_entries: Vec<String> = Vec::new();
    all_entries.extend(train_entries.iter().cloned());
    all_entries.extend(val_entries.iter().cloned());
    all_entries.extend(test_entries.iter().cloned());

    let mut train_val_entries: Vec<String> = Vec::new();
    train_val_entries.extend(train_entries.iter().cloned());
    train_val_entries.extend(val_entries.iter().cloned());

    write_split_file(&sets_dir.join("train.txt"), &mut train_entries)?;
    write_split_file(&sets_dir.join("val.txt"), &mut val_entries)?;
    write_split_file(&sets_dir.join("test.txt"), &mut test_entries)?;
    write_split_file(&sets_dir.join("all.txt"), &mut all_entries)?;
    write_split_file(&sets_dir.join("train_val.txt"), &mut train_val_entries)?;

    Ok(summary)
}

/// Reads a split file into trimmed, non-empty lines.
pub fn read_split_file(path: &Path) -> std::io::Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

/// Writes entries one per line, UTF-8, newline-terminated, sorted.
pub fn write_split_file(path: &Path, entries: &mut [String]) -> std::io::Result<()> {
    entries.sort_unstable();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for entry in entries.iter() {
        writeln!(writer, "{entry}")?;
    }
    writer.flush()
}
