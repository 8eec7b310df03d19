//! Tile canonicalization and raster stacking helpers.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageError, Rgb, RgbImage};

pub(crate) const FILL_WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Decodes an image and resizes it to a square tile.
///
/// The Triangle filter produces identical pixels for identical input, so
/// composition stays reproducible.
pub(crate) fn load_canonical(path: &Path, tile_size: u32) -> Result<RgbImage, ImageError> {
    let decoded = image::open(path)?;
    Ok(imageops::resize(
        &decoded.to_rgb8(),
        tile_size,
        tile_size,
        FilterType::Triangle,
    ))
}

/// Solid white block used for label panels, padding, and title bars.
pub(crate) fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, FILL_WHITE)
}

/// Stacks tiles left to right. Height is the tallest tile; shorter tiles
/// leave white below them.
pub(crate) fn hstack(tiles: &[RgbImage]) -> RgbImage {
    let width = tiles.iter().map(RgbImage::width).sum();
    let height = tiles.iter().map(RgbImage::height).max().unwrap_or(0);
    let mut canvas = blank(width, height);
    let mut offset = 0i64;
    for tile in tiles {
        imageops::replace(&mut canvas, tile, offset, 0);
        offset += i64::from(tile.width());
    }
    canvas
}

/// Stacks rows top to bottom. Rows must already share one width.
pub(crate) fn vstack(rows: &[RgbImage]) -> RgbImage {
    let width = rows.iter().map(RgbImage::width).max().unwrap_or(0);
    let height = rows.iter().map(RgbImage::height).sum();
    let mut canvas = blank(width, height);
    let mut offset = 0i64;
    for row in rows {
        imageops::replace(&mut canvas, row, 0, offset);
        offset += i64::from(row.height());
    }
    canvas
}
