//! Lint diagnostics for page documents.
//!
//! Reports structural issues without modifying the document. Error-severity
//! findings are invariant violations: the codec refuses documents that carry
//! any of them.

use crate::id::NodeId;
use crate::model::{Document, MIN_EXTENT, MIN_FONT_SIZE, Node, NodeAttrs, NodeKind, Page, Panel};
use smallvec::SmallVec;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LintSeverity {
    /// Informational only.
    Info,
    /// Probably a mistake, but the document is usable.
    Warning,
    /// Breaks a document invariant.
    Error,
}

/// A single lint diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct LintDiagnostic {
    /// Index of the page the finding is on.
    pub page: usize,
    /// The node, panel, or page this diagnostic refers to.
    pub node_id: NodeId,
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "duplicate-id", "empty-text").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over every page and return diagnostics.
#[must_use]
pub fn lint_document(doc: &Document) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    for (index, page) in doc.pages.iter().enumerate() {
        let mut ctx = PageLint {
            page: index,
            diags: &mut diags,
        };
        ctx.ids(page);
        for panel in &page.panels {
            ctx.panel(panel);
        }
        for (node, _) in page.nodes() {
            ctx.node(node);
        }
    }
    diags
}

/// True when no diagnostic is an error.
pub fn is_valid(diags: &[LintDiagnostic]) -> bool {
    diags.iter().all(|d| d.severity < LintSeverity::Error)
}

// ─── Rules ────────────────────────────────────────────────────────────────

struct PageLint<'a> {
    page: usize,
    diags: &'a mut Vec<LintDiagnostic>,
}

impl PageLint<'_> {
    fn push(&mut self, node_id: NodeId, severity: LintSeverity, rule: &'static str, message: String) {
        self.diags.push(LintDiagnostic {
            page: self.page,
            node_id,
            message,
            severity,
            rule,
        });
    }

    /// Ids are non-empty and unique across loose nodes, panels, and children.
    fn ids(&mut self, page: &Page) {
        if page.id.is_empty() {
            self.push(page.id, LintSeverity::Error, "empty-id", "Page has an empty id.".into());
        }
        let mut seen = HashSet::new();
        for id in page.ids() {
            if id.is_empty() {
                self.push(id, LintSeverity::Error, "empty-id", "Node has an empty id.".into());
            } else if !seen.insert(id) {
                self.push(
                    id,
                    LintSeverity::Error,
                    "duplicate-id",
                    format!("Id `{id}` is used more than once on page {}.", self.page),
                );
            }
        }
    }

    fn attrs(&mut self, attrs: &NodeAttrs, extra: &[f32]) {
        let shared = [
            attrs.x,
            attrs.y,
            attrs.rotation,
            attrs.scale_x,
            attrs.scale_y,
            attrs.opacity,
        ];
        if shared.iter().chain(extra).any(|v| !v.is_finite()) {
            self.push(
                attrs.id,
                LintSeverity::Error,
                "non-finite",
                format!("`{}` has a non-finite coordinate or size.", attrs.id),
            );
        }
        if !(0.0..=1.0).contains(&attrs.opacity) {
            self.push(
                attrs.id,
                LintSeverity::Warning,
                "opacity-range",
                format!("Opacity {} on `{}` is outside 0..=1.", attrs.opacity, attrs.id),
            );
        }
    }

    fn degenerate(&mut self, id: NodeId, what: &str) {
        self.push(
            id,
            LintSeverity::Warning,
            "degenerate-size",
            format!("`{id}` has a degenerate {what}."),
        );
    }

    fn panel(&mut self, panel: &Panel) {
        self.attrs(&panel.attrs, &[panel.width, panel.height, panel.border_width]);
        if panel.width < MIN_EXTENT || panel.height < MIN_EXTENT {
            self.degenerate(panel.id(), "size");
        }
    }

    fn node(&mut self, node: &Node) {
        let numbers = kind_numbers(&node.kind);
        self.attrs(&node.attrs, &numbers);

        let id = node.id();
        match &node.kind {
            NodeKind::Rect { width, height, .. }
            | NodeKind::Image { width, height, .. }
            | NodeKind::Bubble { width, height, .. } => {
                if *width < MIN_EXTENT || *height < MIN_EXTENT {
                    self.degenerate(id, "size");
                }
            }
            NodeKind::Ellipse {
                radius_x, radius_y, ..
            } => {
                if *radius_x < MIN_EXTENT / 2.0 || *radius_y < MIN_EXTENT / 2.0 {
                    self.degenerate(id, "radius");
                }
            }
            NodeKind::Line { points, .. } => {
                if points.len() < 2 {
                    self.degenerate(id, "point list");
                }
            }
            NodeKind::Text { font_size, .. } | NodeKind::Sfx { font_size, .. } => {
                if *font_size < MIN_FONT_SIZE {
                    self.degenerate(id, "font size");
                }
            }
        }

        if node.kind.text().is_some_and(|t| t.trim().is_empty()) {
            self.push(id, LintSeverity::Info, "empty-text", format!("`{id}` has no visible text."));
        }
    }
}

/// Every numeric payload field of a variant.
fn kind_numbers(kind: &NodeKind) -> SmallVec<[f32; 8]> {
    match kind {
        NodeKind::Rect {
            width,
            height,
            stroke_width,
            corner_radius,
            ..
        } => [Some(*width), Some(*height), *stroke_width, *corner_radius]
            .into_iter()
            .flatten()
            .collect(),
        NodeKind::Ellipse {
            radius_x,
            radius_y,
            stroke_width,
            ..
        } => [Some(*radius_x), Some(*radius_y), *stroke_width]
            .into_iter()
            .flatten()
            .collect(),
        NodeKind::Line {
            points,
            stroke_width,
            ..
        } => points
            .iter()
            .flat_map(|(x, y)| [*x, *y])
            .chain([*stroke_width])
            .collect(),
        NodeKind::Text {
            font_size,
            letter_spacing,
            line_height,
            ..
        } => [Some(*font_size), *letter_spacing, *line_height]
            .into_iter()
            .flatten()
            .collect(),
        NodeKind::Image {
            width,
            height,
            brightness,
            contrast,
            crop,
            ..
        } => {
            let mut numbers = SmallVec::from_slice(&[*width, *height, *brightness, *contrast]);
            if let Some(c) = crop {
                numbers.extend_from_slice(&[c.x, c.y, c.width, c.height]);
            }
            numbers
        }
        NodeKind::Bubble {
            width,
            height,
            font_size,
            stroke_width,
            corner_radius,
            tail_size,
            ..
        } => SmallVec::from_slice(&[
            *width,
            *height,
            *font_size,
            *stroke_width,
            *corner_radius,
            *tail_size,
        ]),
        NodeKind::Sfx {
            font_size,
            stroke_width,
            ..
        } => SmallVec::from_slice(&[*font_size, *stroke_width]),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
