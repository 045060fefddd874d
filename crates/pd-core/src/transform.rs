//! Transform-end folding.
//!
//! While a resize/rotate gesture runs, the rendering surface scales the node
//! visually. When it ends, the surface reports the final geometry and the
//! scale is folded into the variant's own size attributes, so persisted
//! scale is always 1 and never accumulates across gestures.

use crate::geometry::Bounds;
use crate::model::{MIN_EXTENT, MIN_FONT_SIZE, Node, NodeKind, Panel};
use crate::patch::NodePatch;
use serde::{Deserialize, Serialize};

/// Final geometry reported by the rendering surface at the end of a
/// resize/rotate gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformEnd {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl TransformEnd {
    /// Absolute scale factors. Panics on non-finite input: the surface must
    /// never report one, and carrying NaN into the document is unrecoverable.
    fn factors(&self) -> (f32, f32) {
        assert!(
            self.scale_x.is_finite() && self.scale_y.is_finite(),
            "transform end reported non-finite scale ({}, {})",
            self.scale_x,
            self.scale_y
        );
        (self.scale_x.abs(), self.scale_y.abs())
    }

    fn base_patch(&self) -> NodePatch {
        NodePatch {
            x: Some(self.x),
            y: Some(self.y),
            rotation: Some(self.rotation),
            scale_x: Some(1.0),
            scale_y: Some(1.0),
            ..NodePatch::default()
        }
    }
}

fn scaled(extent: f32, factor: f32) -> f32 {
    (extent * factor).max(MIN_EXTENT)
}

/// Patch that bakes a finished transform into a node.
pub fn fold_node(node: &Node, t: &TransformEnd) -> NodePatch {
    let (sx, sy) = t.factors();
    let mut patch = t.base_patch();
    match &node.kind {
        NodeKind::Text { font_size, .. } | NodeKind::Sfx { font_size, .. } => {
            patch.font_size = Some((font_size * sx).max(MIN_FONT_SIZE));
        }
        NodeKind::Ellipse {
            radius_x, radius_y, ..
        } => {
            patch.radius_x = Some((radius_x * sx).max(MIN_EXTENT / 2.0));
            patch.radius_y = Some((radius_y * sy).max(MIN_EXTENT / 2.0));
        }
        NodeKind::Rect { width, height, .. } | NodeKind::Bubble { width, height, .. } => {
            patch.width = Some(scaled(*width, sx));
            patch.height = Some(scaled(*height, sy));
        }
        NodeKind::Image {
            width,
            height,
            crop,
            ..
        } => {
            patch.width = Some(scaled(*width, sx));
            patch.height = Some(scaled(*height, sy));
            // Crop lives in node space and follows the resize.
            patch.crop = crop.map(|c| {
                Some(Bounds::new(c.x * sx, c.y * sy, c.width * sx, c.height * sy))
            });
        }
        NodeKind::Line { points, .. } => {
            // Mirrored scale flips the stroke, so keep the sign here.
            patch.points = Some(
                points
                    .iter()
                    .map(|(px, py)| (px * t.scale_x, py * t.scale_y))
                    .collect(),
            );
        }
    }
    patch
}

/// Patch that bakes a finished transform into a panel.
pub fn fold_panel(panel: &Panel, t: &TransformEnd) -> NodePatch {
    let (sx, sy) = t.factors();
    NodePatch {
        width: Some(scaled(panel.width, sx)),
        height: Some(scaled(panel.height, sy)),
        ..t.base_patch()
    }
}
