//! Comparison grid compositing.
//!
//! Takes a target image plus one or more named rows of ranked candidate
//! paths and produces a single aligned raster: the target on top, one row
//! per method below it, every image canonicalized to the same square tile.
//! Rows may end up with different pixel widths (label widths differ, tiles
//! get dropped); each row is right-padded with white to the widest row
//! before vertical stacking so the output is always one rectangle.
//!
//! The compositor is stateless across calls and owns all decoded buffers for
//! the duration of one call. The raster is fully assembled in memory before
//! anything is written, so a failed composition never leaves a partial file.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tracing::warn;

use crate::util::{MatchGridError, MatchGridResult};

mod font;
mod tile;

use font::draw_text;
use tile::{blank, hstack, load_canonical, vstack};

/// Overlay color for target and rank labels.
const OVERLAY_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
/// Text color on white panels (row labels, title bar).
const PANEL_BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Fixed overlay anchors and scales; placement never depends on content.
const TARGET_ANCHOR: (u32, u32) = (10, 10);
const TARGET_SCALE: u32 = 3;
const RANK_ANCHOR: (u32, u32) = (5, 5);
const RANK_SCALE: u32 = 2;
const PANEL_ANCHOR_X: u32 = 10;
const PANEL_SCALE: u32 = 2;
const TITLE_ANCHOR: (u32, u32) = (10, 14);
const TITLE_SCALE: u32 = 3;

/// One labeled row of ranked candidate images.
#[derive(Clone, Debug)]
pub struct ComparisonRow {
    pub label: String,
    /// Ranked best-first; only a bounded prefix is rendered.
    pub images: Vec<PathBuf>,
}

impl ComparisonRow {
    pub fn new(label: impl Into<String>, images: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            images,
        }
    }
}

/// Input to one composition call; consumed once, not retained.
#[derive(Clone, Debug)]
pub struct ComparisonGrid {
    pub target: PathBuf,
    pub rows: Vec<ComparisonRow>,
    /// Optional title bar rendered above everything.
    pub title: Option<String>,
}

impl ComparisonGrid {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            rows: Vec::new(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push_row(&mut self, row: ComparisonRow) {
        self.rows.push(row);
    }
}

/// Layout constants for one composition.
#[derive(Clone, Copy, Debug)]
pub struct GridStyle {
    /// Side of the square every image is canonicalized to.
    pub tile_size: u32,
    /// How many tiles of each row are rendered.
    pub row_prefix: usize,
    /// Width of the white label panel on the left of each row.
    pub label_panel_width: u32,
    /// Height of the optional title bar.
    pub title_bar_height: u32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            tile_size: 200,
            row_prefix: 3,
            label_panel_width: 150,
            title_bar_height: 50,
        }
    }
}

/// Composes the grid into a single raster at `output_path`.
///
/// An unreadable *target* aborts the whole composition; an unreadable match
/// image only loses its tile, and a row that loses every tile is omitted.
/// The output format follows the path's extension.
pub fn compose(grid: &ComparisonGrid, style: &GridStyle, output_path: &Path) -> MatchGridResult<()> {
    let mut rows: Vec<RgbImage> = Vec::with_capacity(grid.rows.len() + 1);

    let mut target_tile = load_canonical(&grid.target, style.tile_size).map_err(|err| {
        MatchGridError::TargetImageUnreadable {
            path: grid.target.clone(),
            reason: err.to_string(),
        }
    })?;
    draw_text(
        &mut target_tile,
        "Target",
        TARGET_ANCHOR.0,
        TARGET_ANCHOR.1,
        TARGET_SCALE,
        OVERLAY_GREEN,
    );
    rows.push(target_tile);

    for row in &grid.rows {
        if let Some(rendered) = render_row(row, style) {
            rows.push(rendered);
        }
    }

    // Alignment invariant: pad every row to the widest one, then stack.
    let max_width = rows.iter().map(RgbImage::width).max().unwrap_or(0);
    let padded: Vec<RgbImage> = rows
        .into_iter()
        .map(|row| {
            if row.width() < max_width {
                let pad = blank(max_width - row.width(), row.height());
                hstack(&[row, pad])
            } else {
                row
            }
        })
        .collect();
    let mut raster = vstack(&padded);

    if let Some(title) = &grid.title {
        let mut bar = blank(max_width, style.title_bar_height);
        draw_text(
            &mut bar,
            title,
            TITLE_ANCHOR.0,
            TITLE_ANCHOR.1,
            TITLE_SCALE,
            PANEL_BLACK,
        );
        raster = vstack(&[bar, raster]);
    }

    raster
        .save(output_path)
        .map_err(|err| MatchGridError::ImageEncode {
            path: output_path.to_path_buf(),
            reason: err.to_string(),
        })
}

/// Renders one row: label panel plus up to `row_prefix` surviving tiles.
/// Returns `None` when every tile was unreadable.
fn render_row(row: &ComparisonRow, style: &GridStyle) -> Option<RgbImage> {
    let mut tiles: Vec<RgbImage> = Vec::with_capacity(style.row_prefix + 1);

    let mut panel = blank(style.label_panel_width, style.tile_size);
    draw_text(
        &mut panel,
        &row.label,
        PANEL_ANCHOR_X,
        style.tile_size / 2,
        PANEL_SCALE,
        PANEL_BLACK,
    );
    tiles.push(panel);

    let mut survivors = 0usize;
    for (rank, path) in row.images.iter().take(style.row_prefix).enumerate() {
        match load_canonical(path, style.tile_size) {
            Ok(mut tile) => {
                let label = format!("{} #{}", row.label, rank + 1);
                draw_text(
                    &mut tile,
                    &label,
                    RANK_ANCHOR.0,
                    RANK_ANCHOR.1,
                    RANK_SCALE,
                    OVERLAY_GREEN,
                );
                tiles.push(tile);
                survivors += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "omitting unreadable match tile");
            }
        }
    }

    if survivors == 0 {
        warn!(label = row.label.as_str(), "row lost every tile; omitting");
        return None;
    }
    Some(hstack(&tiles))
}
