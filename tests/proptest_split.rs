use std::collections::BTreeSet;
use std::fs;

use proptest::prelude::*;

use riceprep::layout::DatasetLayout;
use riceprep::split::{
    generate_splits, read_split_file, split_sizes, SplitOptions, SplitRatios,
};

/// Unique lowercase stems, small enough to keep filesystem churn cheap.
fn arb_stems() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z][a-z0-9]{2,8}", 1..40)
        .prop_map(|set| set.into_iter().collect())
}

fn tree_with_stems(stems: &[String]) -> (tempfile::TempDir, DatasetLayout) {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = DatasetLayout::new(dir.path());
    let images = layout.images_dir("brown_spot");
    fs::create_dir_all(&images).expect("create images dir");
    for stem in stems {
        fs::write(images.join(format!("{stem}.jpg")), b"x").expect("write image");
    }
    (dir, layout)
}

fn options(seed: u64) -> SplitOptions {
    SplitOptions {
        ratios: SplitRatios::default(),
        seed,
        categories: vec!["brown_spot".to_string()],
    }
}

proptest! {
    #[test]
    fn sizes_always_sum_to_total(
        n in 0usize..10_000,
        train in 0.0f64..1.0,
        val in 0.0f64..1.0,
    ) {
        prop_assume!(train + val <= 1.0);
        let ratios = SplitRatios { train, val, test: 1.0 - train - val };
        let (n_train, n_val, n_test) = split_sizes(n, &ratios);
        prop_assert_eq!(n_train + n_val + n_test, n);
    }

    #[test]
    fn splits_partition_the_stem_set(stems in arb_stems(), seed in any::<u64>()) {
        let (_dir, layout) = tree_with_stems(&stems);

        generate_splits(&layout, &options(seed)).expect("split failed");

        let sets = layout.global_sets_dir();
        let train: BTreeSet<String> =
            read_split_file(&sets.join("train.txt")).unwrap().into_iter().collect();
        let val: BTreeSet<String> =
            read_split_file(&sets.join("val.txt")).unwrap().into_iter().collect();
        let test: BTreeSet<String> =
            read_split_file(&sets.join("test.txt")).unwrap().into_iter().collect();

        prop_assert!(train.is_disjoint(&val));
        prop_assert!(train.is_disjoint(&test));
        prop_assert!(val.is_disjoint(&test));

        let union: BTreeSet<String> = train.union(&val).chain(&test).cloned().collect();
        let expected: BTreeSet<String> =
            stems.iter().map(|s| format!("brown_spot/{s}")).collect();
        prop_assert_eq!(union, expected);
    }

    #[test]
    fn same_seed_is_deterministic(stems in arb_stems(), seed in any::<u64>()) {
        let (_dir, layout) = tree_with_stems(&stems);

        generate_splits(&layout, &options(seed)).expect("first run");
        let first = fs::read(layout.global_sets_dir().join("train.txt")).unwrap();

        generate_splits(&layout, &options(seed)).expect("second run");
        let second = fs::read(layout.global_sets_dir().join("train.txt")).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn output_files_are_sorted(stems in arb_stems(), seed in any::<u64>()) {
        let (_dir, layout) = tree_with_stems(&stems);

        generate_splits(&layout, &options(seed)).expect("split failed");

        for name in ["train.txt", "val.txt", "test.txt", "all.txt", "train_val.txt"] {
            let lines = read_split_file(&layout.global_sets_dir().join(name)).unwrap();
            let mut sorted = lines.clone();
            sorted.sort_unstable();
            prop_assert_eq!(lines, sorted, "{} is not sorted", name);
        }
    }
}
