use image::{Rgb, RgbImage};
use matchgrid::{compose, ComparisonGrid, ComparisonRow, GridStyle, MatchGridError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .unwrap();
}

/// Corpus with a target and candidates at deliberately different native
/// resolutions; canonicalization must even them out.
fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target.png");
    write_image(&target, 320, 240, [200, 40, 40]);
    write_image(&dir.path().join("a1.png"), 64, 64, [40, 200, 40]);
    write_image(&dir.path().join("a2.png"), 640, 480, [40, 40, 200]);
    write_image(&dir.path().join("a3.png"), 100, 300, [200, 200, 40]);
    write_image(&dir.path().join("b1.png"), 150, 150, [40, 200, 200]);
    (dir, target)
}

#[test]
fn raster_is_max_row_width_by_summed_heights() {
    let (dir, target) = fixture();
    let mut grid = ComparisonGrid::new(&target).with_title("Comparison");
    grid.push_row(ComparisonRow::new(
        "Baseline",
        vec![
            dir.path().join("a1.png"),
            dir.path().join("a2.png"),
            dir.path().join("a3.png"),
        ],
    ));
    grid.push_row(ComparisonRow::new(
        "DNN",
        vec![dir.path().join("b1.png")],
    ));

    let style = GridStyle::default();
    let out = dir.path().join("grid.png");
    compose(&grid, &style, &out).unwrap();

    let raster = image::open(&out).unwrap().to_rgb8();
    // Widest row: label panel + three tiles. Narrower rows (the bare target,
    // the one-tile DNN row) are white-padded up to it.
    assert_eq!(raster.width(), 150 + 3 * 200);
    // Title bar + target row + two method rows.
    assert_eq!(raster.height(), 50 + 3 * 200);
}

#[test]
fn composing_twice_is_byte_identical() {
    let (dir, target) = fixture();
    let mut grid = ComparisonGrid::new(&target).with_title("Comparison");
    grid.push_row(ComparisonRow::new(
        "Baseline",
        vec![dir.path().join("a1.png"), dir.path().join("a2.png")],
    ));

    let style = GridStyle::default();
    let first = dir.path().join("first.png");
    let second = dir.path().join("second.png");
    compose(&grid, &style, &first).unwrap();
    compose(&grid, &style, &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn unreadable_match_tile_is_omitted_not_fatal() {
    let (dir, target) = fixture();
    let mut grid = ComparisonGrid::new(&target);
    grid.push_row(ComparisonRow::new(
        "Histogram",
        vec![
            dir.path().join("a1.png"),
            dir.path().join("missing.png"),
            dir.path().join("a2.png"),
        ],
    ));

    let style = GridStyle::default();
    let out = dir.path().join("grid.png");
    compose(&grid, &style, &out).unwrap();

    let raster = image::open(&out).unwrap().to_rgb8();
    // Two surviving tiles instead of three.
    assert_eq!(raster.width(), 150 + 2 * 200);
    assert_eq!(raster.height(), 2 * 200);
}

#[test]
fn row_losing_every_tile_is_omitted() {
    let (dir, target) = fixture();
    let mut grid = ComparisonGrid::new(&target);
    grid.push_row(ComparisonRow::new(
        "Saliency",
        vec![dir.path().join("gone.png")],
    ));

    let style = GridStyle::default();
    let out = dir.path().join("grid.png");
    compose(&grid, &style, &out).unwrap();

    let raster = image::open(&out).unwrap().to_rgb8();
    // Just the target row, no title bar.
    assert_eq!(raster.width(), 200);
    assert_eq!(raster.height(), 200);
}

#[test]
fn only_row_prefix_tiles_are_rendered() {
    let (dir, target) = fixture();
    let mut grid = ComparisonGrid::new(&target);
    grid.push_row(ComparisonRow::new(
        "Baseline",
        vec![
            dir.path().join("a1.png"),
            dir.path().join("a2.png"),
            dir.path().join("a3.png"),
            dir.path().join("b1.png"),
        ],
    ));

    let style = GridStyle {
        row_prefix: 2,
        ..GridStyle::default()
    };
    let out = dir.path().join("grid.png");
    compose(&grid, &style, &out).unwrap();

    let raster = image::open(&out).unwrap().to_rgb8();
    assert_eq!(raster.width(), 150 + 2 * 200);
}

#[test]
fn unreadable_target_aborts_without_writing() {
    let dir = TempDir::new().unwrap();
    let grid = ComparisonGrid::new(dir.path().join("no-target.png"));
    let out = dir.path().join("grid.png");

    let err = compose(&grid, &GridStyle::default(), &out).unwrap_err();
    match err {
        MatchGridError::TargetImageUnreadable { path, .. } => {
            assert!(path.ends_with("no-target.png"));
        }
        other => panic!("expected TargetImageUnreadable, got {other:?}"),
    }
    assert!(!out.exists());
}
