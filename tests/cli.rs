use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

fn riceprep() -> Command {
    Command::cargo_bin("riceprep").unwrap()
}

/// Writes a minimal PNG header so dimension probing sees real values.
fn write_png(path: &Path, width: u32, height: u32) {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    fs::write(path, bytes).unwrap();
}

/// Builds a dataset root with a labelmap and three brown_spot images.
fn fixture_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("rice_leaves");
    let images = dataset.join("brown_spot").join("images");
    fs::create_dir_all(&images).unwrap();

    fs::write(
        dataset.join("labelmap.json"),
        r#"[
            {"object_id": 0, "object_name": "background"},
            {"object_id": 1, "object_name": "brown_spot"}
        ]"#,
    )
    .unwrap();

    write_png(&images.join("bs_001.png"), 100, 80);
    write_png(&images.join("bs_002.png"), 64, 64);
    write_png(&images.join("bs_003.png"), 32, 48);

    dir
}

#[test]
fn runs() {
    let mut cmd = riceprep();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = riceprep();
    cmd.arg("-V");
    cmd.assert().success().stdout("riceprep 0.3.0\n");
}

// Pipeline tests

#[test]
fn annotate_seeds_per_image_json() {
    let root = fixture_root();

    let mut cmd = riceprep();
    cmd.args(["annotate", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("created 3 annotation file(s)"));

    let json_dir = root.path().join("rice_leaves/brown_spot/json");
    assert!(json_dir.join("bs_001.json").is_file());
    assert!(json_dir.join("bs_002.json").is_file());
    assert!(json_dir.join("bs_003.json").is_file());
}

#[test]
fn annotate_is_idempotent() {
    let root = fixture_root();

    for _ in 0..2 {
        let mut cmd = riceprep();
        cmd.args(["annotate", "--categories", "brown_spot"]);
        cmd.args(["--root"]).arg(root.path());
        cmd.assert().success();
    }

    let mut cmd = riceprep();
    cmd.args(["annotate", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("3 already present"));
}

#[test]
fn split_writes_global_set_files() {
    let root = fixture_root();

    let mut cmd = riceprep();
    cmd.args(["split", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("total: 3 image(s)"));

    let sets = root.path().join("rice_leaves/sets");
    for file in ["train.txt", "val.txt", "test.txt", "all.txt", "train_val.txt"] {
        assert!(sets.join(file).is_file(), "missing {file}");
    }

    let all = fs::read_to_string(sets.join("all.txt")).unwrap();
    assert_eq!(
        all,
        "brown_spot/bs_001\nbrown_spot/bs_002\nbrown_spot/bs_003\n"
    );
}

#[test]
fn split_rejects_bad_ratios() {
    let root = fixture_root();

    let mut cmd = riceprep();
    cmd.args(["split", "--train", "0.0", "--val", "0.0", "--test", "0.0"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert().failure();
}

#[test]
fn distribute_writes_per_category_set_files() {
    let root = fixture_root();

    let mut cmd = riceprep();
    cmd.args(["split", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert().success();

    let mut cmd = riceprep();
    cmd.args(["distribute", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert().success();

    let all = root.path().join("rice_leaves/brown_spot/sets/all.txt");
    let body = fs::read_to_string(all).unwrap();
    assert_eq!(body, "bs_001\nbs_002\nbs_003\n");
}

#[test]
fn coco_builds_manifest_from_seeded_annotations() {
    let root = fixture_root();
    let out = root.path().join("annotations");

    for args in [
        vec!["annotate", "--categories", "brown_spot"],
        vec!["split", "--categories", "brown_spot"],
        vec!["distribute", "--categories", "brown_spot"],
    ] {
        let mut cmd = riceprep();
        cmd.args(&args);
        cmd.args(["--root"]).arg(root.path());
        cmd.assert().success();
    }

    let mut cmd = riceprep();
    cmd.args(["coco", "--categories", "brown_spot", "--splits", "train", "--combined"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.args(["--out"]).arg(&out);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("brown_spot_instances_train.json"));

    assert!(out.join("brown_spot_instances_train.json").is_file());
    assert!(out.join("combined_instances_train.json").is_file());
}

#[test]
fn csv_exports_row_per_bbox() {
    let root = fixture_root();

    let mut cmd = riceprep();
    cmd.args(["annotate", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert().success();

    let mut cmd = riceprep();
    cmd.args(["csv", "--categories", "brown_spot"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("3 CSV file(s) created"));

    let csv = root.path().join("rice_leaves/brown_spot/csv/bs_001.csv");
    let body = fs::read_to_string(csv).unwrap();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("#item,x,y,width,height,label"));
    assert_eq!(lines.next(), Some("0,0,0,100,80,1"));
}

#[test]
fn built_manifest_passes_check() {
    let root = fixture_root();
    let out = root.path().join("annotations");

    for args in [
        vec!["annotate", "--categories", "brown_spot"],
        vec!["split", "--categories", "brown_spot"],
        vec!["distribute", "--categories", "brown_spot"],
    ] {
        let mut cmd = riceprep();
        cmd.args(&args);
        cmd.args(["--root"]).arg(root.path());
        cmd.assert().success();
    }

    let mut cmd = riceprep();
    cmd.args(["coco", "--categories", "brown_spot", "--splits", "all"]);
    cmd.args(["--root"]).arg(root.path());
    cmd.args(["--out"]).arg(&out);
    cmd.assert().success();

    let mut cmd = riceprep();
    cmd.arg("check").arg(out.join("brown_spot_instances_all.json"));
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Check passed"));
}

// Reorganize tests

#[test]
fn reorganize_copies_legacy_folders() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("Brown Spot");
    fs::create_dir_all(&legacy).unwrap();
    write_png(&legacy.join("bs_001.png"), 10, 10);
    fs::write(legacy.join("bs_001.json"), "{}").unwrap();

    let mut cmd = riceprep();
    cmd.arg("reorganize");
    cmd.args(["--root"]).arg(dir.path());
    cmd.assert().success();

    let category = dir.path().join("rice_leaves/brown_spot");
    assert!(category.join("images/bs_001.png").is_file());
    assert!(category.join("json/bs_001.json").is_file());
}

// Check subcommand tests

#[test]
fn check_invalid_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("bad.json");
    fs::write(
        &manifest,
        r#"{
            "images": [
                {"id": 1, "width": 10, "height": 10, "file_name": "a.jpg"},
                {"id": 1, "width": 10, "height": 10, "file_name": "b.jpg"}
            ],
            "annotations": [],
            "categories": [{"id": 1, "name": "brown_spot"}]
        }"#,
    )
    .unwrap();

    let mut cmd = riceprep();
    cmd.arg("check").arg(&manifest);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("DuplicateImageId"));
}

#[test]
fn check_strict_promotes_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("warn.json");
    fs::write(
        &manifest,
        r#"{
            "images": [{"id": 1, "width": 10, "height": 10, "file_name": "a.jpg"}],
            "annotations": [{"id": 1, "image_id": 1, "category_id": 1}],
            "categories": [{"id": 1, "name": "brown_spot"}]
        }"#,
    )
    .unwrap();

    let mut cmd = riceprep();
    cmd.arg("check").arg(&manifest);
    cmd.assert().success();

    let mut cmd = riceprep();
    cmd.args(["check", "--strict"]).arg(&manifest);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("MissingBBox"));
}

#[test]
fn check_nonexistent_file_fails() {
    let mut cmd = riceprep();
    cmd.args(["check", "nonexistent_manifest.json"]);
    cmd.assert().failure();
}
