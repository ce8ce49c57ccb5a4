//! Riceprep: dataset preparation tools for rice leaf disease imagery.
//!
//! Riceprep turns a pile of legacy per-disease photo folders into a
//! standard dataset layout and keeps the derived artifacts in sync:
//! per-image COCO-style annotation files, deterministic train/val/test
//! split lists, per-(category, split) COCO manifests, and row-per-bbox
//! CSV exports.
//!
//! # Modules
//!
//! - [`layout`]: the on-disk directory contract
//! - [`labelmap`]: category id <-> name mapping
//! - [`split`]: seeded split generation and per-category distribution
//! - [`manifest`]: COCO manifest aggregation
//! - [`export`]: CSV export
//! - [`check`]: structural checks for built manifests
//! - [`error`]: error types for riceprep operations

pub mod annotate;
pub mod check;
pub mod error;
pub mod export;
pub mod labelmap;
pub mod layout;
pub mod manifest;
pub mod reorganize;
pub mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::RiceprepError;

use labelmap::Labelmap;
use layout::DatasetLayout;

/// The riceprep CLI application.
#[derive(Parser)]
#[command(name = "riceprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands, one per pipeline stage.
#[derive(Subcommand)]
enum Commands {
    /// Copy legacy per-disease folders into the canonical layout.
    Reorganize(RootArgs),

    /// Delete generated JSON from legacy folders and move them to data/origin.
    Archive(RootArgs),

    /// Seed a full-image annotation file for every un-annotated image.
    Annotate(CategoryArgs),

    /// Generate the global train/val/test split lists.
    Split(SplitArgs),

    /// Rewrite the global split lists into each category's sets directory.
    Distribute(CategoryArgs),

    /// Aggregate per-image annotations into COCO manifests.
    Coco(CocoArgs),

    /// Export per-image annotations as row-per-bbox CSV files.
    Csv(CategoryArgs),

    /// Check a built COCO manifest for structural problems.
    Check(CheckArgs),
}

/// Arguments shared by subcommands that only need the dataset root.
#[derive(clap::Args)]
struct RootArgs {
    /// Dataset root directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

/// Arguments for subcommands operating on a category subset.
#[derive(clap::Args)]
struct CategoryArgs {
    /// Dataset root directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Categories to process (defaults to all six).
    #[arg(long, num_args = 1..)]
    categories: Vec<String>,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Dataset root directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Training set ratio.
    #[arg(long, default_value_t = 0.7)]
    train: f64,

    /// Validation set ratio.
    #[arg(long, default_value_t = 0.15)]
    val: f64,

    /// Test set ratio.
    #[arg(long, default_value_t = 0.15)]
    test: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Categories to process (defaults to all six).
    #[arg(long, num_args = 1..)]
    categories: Vec<String>,
}

/// Arguments for the coco subcommand.
#[derive(clap::Args)]
struct CocoArgs {
    /// Dataset root directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Output directory for manifest files.
    #[arg(long, default_value = "annotations")]
    out: PathBuf,

    /// Categories to process (defaults to all six).
    #[arg(long, num_args = 1..)]
    categories: Vec<String>,

    /// Splits to process.
    #[arg(long, num_args = 1.., default_values_t = ["train".to_string(), "val".to_string(), "test".to_string()])]
    splits: Vec<String>,

    /// Also write combined per-split manifests merging all categories.
    #[arg(long)]
    combined: bool,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// Manifest file to check.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,
}

/// Run the riceprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), RiceprepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Reorganize(args)) => run_reorganize(args),
        Some(Commands::Archive(args)) => run_archive(args),
        Some(Commands::Annotate(args)) => run_annotate(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Distribute(args)) => run_distribute(args),
        Some(Commands::Coco(args)) => run_coco(args),
        Some(Commands::Csv(args)) => run_csv(args),
        Some(Commands::Check(args)) => run_check(args),
        None => {
            println!("riceprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset preparation tools for rice leaf disease imagery.");
            println!();
            println!("Run 'riceprep --help' for usage information.");
            Ok(())
        }
    }
}

fn categories_or_default(categories: Vec<String>) -> Vec<String> {
    if categories.is_empty() {
        layout::DEFAULT_CATEGORIES
            .iter()
            .map(|c| c.to_string())
            .collect()
    } else {
        categories
    }
}

fn run_reorganize(args: RootArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let summary = reorganize::reorganize(&layout)?;
    print!("{summary}");
    Ok(())
}

fn run_archive(args: RootArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let summary = reorganize::archive_legacy(&layout)?;
    print!("{summary}");
    Ok(())
}

fn run_annotate(args: CategoryArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let labelmap = Labelmap::load(&layout.labelmap_path())?;
    let categories = categories_or_default(args.categories);
    let summary = annotate::seed_annotations(&layout, &labelmap, &categories)?;
    print!("{summary}");
    Ok(())
}

fn run_split(args: SplitArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let opts = split::SplitOptions {
        ratios: split::SplitRatios {
            train: args.train,
            val: args.val,
            test: args.test,
        },
        seed: args.seed,
        categories: categories_or_default(args.categories),
    };
    let summary = split::generate_splits(&layout, &opts)?;
    print!("{summary}");
    Ok(())
}

fn run_distribute(args: CategoryArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let categories = categories_or_default(args.categories);
    let summary = split::distribute::distribute_splits(&layout, &categories)?;
    print!("{summary}");
    Ok(())
}

fn run_coco(args: CocoArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let labelmap = Labelmap::load(&layout.labelmap_path())?;
    let opts = manifest::BuildOptions {
        categories: categories_or_default(args.categories),
        splits: args.splits,
        combined: args.combined,
    };
    let summary = manifest::build_manifests(&layout, &args.out, &labelmap, &opts)?;
    print!("{summary}");
    Ok(())
}

fn run_csv(args: CategoryArgs) -> Result<(), RiceprepError> {
    let layout = DatasetLayout::new(args.root);
    let labelmap = Labelmap::load(&layout.labelmap_path())?;
    let categories = categories_or_default(args.categories);
    let summary = export::export_csv(&layout, &labelmap, &categories)?;
    print!("{summary}");
    Ok(())
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), RiceprepError> {
    let manifest = manifest::schema::read_manifest(&args.input)?;

    let report = check::check_manifest(&manifest);

    print!("{report}");

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(RiceprepError::CheckFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
