//! Hit testing: point → node lookup.
//!
//! Walks a page front-to-back (last painted = topmost) to find what sits at a
//! page position. Hidden items are skipped. Panels are hit by their frame;
//! their children are tested first since they paint above the frame.

use crate::geometry::{Bounds, to_local};
use crate::id::NodeId;
use crate::model::{Node, NodeAttrs, NodeKind, Page};

/// Average glyph advance as a fraction of the font size. Text extents are
/// only estimated here; exact metrics belong to the rendering surface.
const GLYPH_ADVANCE: f32 = 0.6;
const DEFAULT_LINE_HEIGHT: f32 = 1.2;
/// Minimum grab distance around thin lines.
const LINE_SLOP: f32 = 4.0;

/// What was hit: the item id plus the panel that owns it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub id: NodeId,
    pub owner: Option<NodeId>,
}

impl NodeRef {
    pub fn loose(id: NodeId) -> Self {
        Self { id, owner: None }
    }

    pub fn in_panel(id: NodeId, panel: NodeId) -> Self {
        Self {
            id,
            owner: Some(panel),
        }
    }
}

/// Find the topmost visible item at page position `(px, py)`.
/// Returns `None` for the page background.
pub fn hit_test(page: &Page, px: f32, py: f32) -> Option<NodeRef> {
    if let Some(id) = page
        .loose_elements
        .iter()
        .rev()
        .find(|n| node_contains(n, px, py))
        .map(Node::id)
    {
        return Some(NodeRef::loose(id));
    }

    for panel in page.panels.iter().rev().filter(|p| p.attrs.visible) {
        let local = to_local((px, py), (panel.attrs.x, panel.attrs.y), panel.attrs.rotation);
        if let Some(child) = panel
            .children
            .iter()
            .rev()
            .find(|n| node_contains(n, local.0, local.1))
        {
            return Some(NodeRef::in_panel(child.id(), panel.id()));
        }
        if scaled_contains(&panel.attrs, Bounds::new(0.0, 0.0, panel.width, panel.height), local) {
            return Some(NodeRef::in_panel(panel.id(), panel.id()));
        }
    }
    None
}

/// Whether `(px, py)`, in the node's parent space, falls on the node.
pub fn node_contains(node: &Node, px: f32, py: f32) -> bool {
    if !node.attrs.visible {
        return false;
    }
    let local = to_local((px, py), (node.attrs.x, node.attrs.y), node.attrs.rotation);
    scaled_contains(&node.attrs, local_extent(&node.kind), local)
}

fn scaled_contains(attrs: &NodeAttrs, extent: Bounds, local: (f32, f32)) -> bool {
    if attrs.scale_x == 0.0 || attrs.scale_y == 0.0 {
        return false;
    }
    extent.contains(local.0 / attrs.scale_x, local.1 / attrs.scale_y)
}

/// Unrotated extent of a variant relative to its node origin.
pub fn local_extent(kind: &NodeKind) -> Bounds {
    match kind {
        NodeKind::Rect { width, height, .. }
        | NodeKind::Image { width, height, .. }
        | NodeKind::Bubble { width, height, .. } => Bounds::new(0.0, 0.0, *width, *height),
        NodeKind::Ellipse {
            radius_x, radius_y, ..
        } => Bounds::new(-radius_x, -radius_y, radius_x * 2.0, radius_y * 2.0),
        NodeKind::Line {
            points,
            stroke_width,
            ..
        } => {
            let pad = (stroke_width / 2.0).max(LINE_SLOP);
            let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
            for (x, y) in points {
                x0 = x0.min(*x);
                y0 = y0.min(*y);
                x1 = x1.max(*x);
                y1 = y1.max(*y);
            }
            if points.is_empty() {
                return Bounds::default();
            }
            Bounds::new(x0 - pad, y0 - pad, x1 - x0 + 2.0 * pad, y1 - y0 + 2.0 * pad)
        }
        NodeKind::Text {
            text,
            font_size,
            line_height,
            ..
        } => text_extent(text, *font_size, line_height.unwrap_or(DEFAULT_LINE_HEIGHT)),
        NodeKind::Sfx {
            text, font_size, ..
        } => text_extent(text, *font_size, DEFAULT_LINE_HEIGHT),
    }
}

fn text_extent(text: &str, font_size: f32, line_height: f32) -> Bounds {
    let lines = text.lines().count().max(1);
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    Bounds::new(
        0.0,
        0.0,
        widest as f32 * font_size * GLYPH_ADVANCE,
        lines as f32 * font_size * line_height,
    )
}
