//! Panel layout presets.
//!
//! Each preset splits the canvas, inset by a margin, into equal panels
//! separated by a gutter.

use crate::geometry::Bounds;
use crate::model::MIN_EXTENT;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// The canvas (page) dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
        }
    }
}

/// A preset arrangement of panels on a page.
///
/// Names follow `grid-{columns}x{rows}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelLayout {
    #[serde(rename = "single")]
    Single,
    /// Two equal columns.
    #[serde(rename = "grid-2x1")]
    Columns2,
    /// Two equal rows.
    #[serde(rename = "grid-1x2")]
    Rows2,
    #[serde(rename = "grid-2x2")]
    Grid2x2,
    /// Three equal columns.
    #[serde(rename = "grid-3x1")]
    Columns3,
}

impl PanelLayout {
    pub const ALL: [PanelLayout; 5] = [
        PanelLayout::Single,
        PanelLayout::Columns2,
        PanelLayout::Rows2,
        PanelLayout::Grid2x2,
        PanelLayout::Columns3,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PanelLayout::Single => "single",
            PanelLayout::Columns2 => "grid-2x1",
            PanelLayout::Rows2 => "grid-1x2",
            PanelLayout::Grid2x2 => "grid-2x2",
            PanelLayout::Columns3 => "grid-3x1",
        }
    }

    /// `(columns, rows)`.
    fn grid(self) -> (u8, u8) {
        match self {
            PanelLayout::Single => (1, 1),
            PanelLayout::Columns2 => (2, 1),
            PanelLayout::Rows2 => (1, 2),
            PanelLayout::Grid2x2 => (2, 2),
            PanelLayout::Columns3 => (3, 1),
        }
    }
}

impl fmt::Display for PanelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PanelLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PanelLayout::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| format!("unknown panel layout `{s}`"))
    }
}

/// Unfloored extent of one cell; may be below `MIN_EXTENT` on a cramped canvas.
pub(crate) fn cell_size(
    layout: PanelLayout,
    canvas: Viewport,
    margin: f32,
    gutter: f32,
) -> (f32, f32) {
    let (cols, rows) = layout.grid();
    let (fc, fr) = (f32::from(cols), f32::from(rows));
    (
        (canvas.width - 2.0 * margin - (fc - 1.0) * gutter) / fc,
        (canvas.height - 2.0 * margin - (fr - 1.0) * gutter) / fr,
    )
}

/// Panel rectangles for `layout`, row by row, left to right.
///
/// Cells never shrink below `MIN_EXTENT`, even if that overruns the canvas.
pub fn panel_geometry(
    layout: PanelLayout,
    canvas: Viewport,
    margin: f32,
    gutter: f32,
) -> SmallVec<[Bounds; 4]> {
    let (cols, rows) = layout.grid();
    let (cell_w, cell_h) = cell_size(layout, canvas, margin, gutter);

    (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (f32::from(c), f32::from(r))))
        .map(|(c, r)| {
            Bounds::new(
                margin + c * (cell_w + gutter),
                margin + r * (cell_h + gutter),
                cell_w.max(MIN_EXTENT),
                cell_h.max(MIN_EXTENT),
            )
        })
        .collect()
}
