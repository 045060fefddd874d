//! Tool system for canvas interactions.
//!
//! Each tool translates input events into `ToolAction`s that the controller
//! applies to the store. In-progress creation gestures are held by the tool
//! as a `Preview` and never touch the document until they commit.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Rect / Panel Tool |
//! |----------|-------------|-------------------|
//! | **Shift** | Axis-constrain drag | Square constraint |

use crate::input::InputEvent;
use pd_core::defaults::{self, BubbleVariant, SHAPE_FILL};
use pd_core::geometry::{Bounds, drag_radius, normalize_rect};
use pd_core::hit::NodeRef;
use pd_core::{Color, MIN_EXTENT, NodeDraft, NodeKind};
use serde::{Deserialize, Serialize};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    /// Viewport panning; handled entirely by the rendering surface.
    Pan,
    Rect,
    Ellipse,
    Panel,
    Pen,
    Text,
    Bubble,
    Sfx,
    Eraser,
}

/// What a tool asks the controller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Select(NodeRef),
    ClearSelection,
    /// Start moving an item; followed by `DragBy` and `EndDrag`.
    BeginDrag(NodeRef),
    /// Total pointer offset since `BeginDrag`.
    DragBy { dx: f32, dy: f32 },
    EndDrag,
    /// Create a node; the draft is in page coordinates.
    CreateNode(NodeDraft),
    CreatePanel(Bounds),
    Delete(NodeRef),
}

/// Transient shape drawn while a creation gesture is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Rect(Bounds),
    Panel(Bounds),
    Circle { cx: f32, cy: f32, radius: f32 },
    Stroke(Vec<(f32, f32)>),
}

/// Trait for tools that handle input and produce actions.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more actions.
    fn handle(&mut self, event: &InputEvent, hit: Option<NodeRef>) -> Vec<ToolAction>;

    /// The uncommitted shape, if a gesture is in progress.
    fn preview(&self) -> Option<Preview> {
        None
    }

    /// Drop any in-progress gesture without producing actions.
    fn cancel(&mut self) {}
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SelectTool {
    /// Press position while dragging an item.
    drag_origin: Option<(f32, f32)>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<NodeRef>) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown { x, y, .. } => match hit {
                Some(target) => {
                    self.drag_origin = Some((*x, *y));
                    vec![ToolAction::Select(target), ToolAction::BeginDrag(target)]
                }
                None => {
                    self.drag_origin = None;
                    vec![ToolAction::ClearSelection]
                }
            },
            InputEvent::PointerMove {
                x, y, modifiers, ..
            } => {
                let Some((ox, oy)) = self.drag_origin else {
                    return vec![];
                };
                let (mut dx, mut dy) = (x - ox, y - oy);
                // Shift: constrain to dominant axis
                if modifiers.shift {
                    if dx.abs() > dy.abs() {
                        dy = 0.0;
                    } else {
                        dx = 0.0;
                    }
                }
                vec![ToolAction::DragBy { dx, dy }]
            }
            InputEvent::PointerUp { .. } => match self.drag_origin.take() {
                Some(_) => vec![ToolAction::EndDrag],
                None => vec![],
            },
        }
    }

    fn cancel(&mut self) {
        self.drag_origin = None;
    }
}

// ─── Rect / Panel Tool ───────────────────────────────────────────────────

/// What a rectangle drag creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectTarget {
    Shape,
    Panel,
}

pub struct RectTool {
    target: RectTarget,
    min_size: f32,
    anchor: Option<(f32, f32)>,
    current: (f32, f32),
    square: bool,
}

impl RectTool {
    pub fn new(target: RectTarget) -> Self {
        Self {
            target,
            min_size: MIN_EXTENT,
            anchor: None,
            current: (0.0, 0.0),
            square: false,
        }
    }

    /// Drags no larger than `min_size` in either dimension are discarded.
    pub fn with_min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    fn bounds(&self) -> Option<Bounds> {
        let anchor = self.anchor?;
        let mut b = normalize_rect(anchor, self.current);
        // Shift: constrain to square, growing away from the anchor
        if self.square {
            let side = b.width.max(b.height);
            b.x = if self.current.0 < anchor.0 { anchor.0 - side } else { anchor.0 };
            b.y = if self.current.1 < anchor.1 { anchor.1 - side } else { anchor.1 };
            b.width = side;
            b.height = side;
        }
        Some(b)
    }
}

impl Tool for RectTool {
    fn kind(&self) -> ToolKind {
        match self.target {
            RectTarget::Shape => ToolKind::Rect,
            RectTarget::Panel => ToolKind::Panel,
        }
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<NodeRef>) -> Vec<ToolAction> {
        let (x, y) = event.position();
        match event {
            InputEvent::PointerDown { .. } => {
                self.anchor = Some((x, y));
                self.current = (x, y);
                self.square = false;
                vec![]
            }
            InputEvent::PointerMove { modifiers, .. } => {
                self.current = (x, y);
                self.square = modifiers.shift;
                vec![]
            }
            InputEvent::PointerUp { modifiers, .. } => {
                self.current = (x, y);
                self.square = modifiers.shift;
                let bounds = self.bounds();
                self.anchor = None;
                let Some(b) = bounds.filter(|b| b.width > self.min_size && b.height > self.min_size)
                else {
                    log::trace!("rect drag below threshold, discarded");
                    return vec![];
                };
                match self.target {
                    RectTarget::Panel => vec![ToolAction::CreatePanel(b)],
                    RectTarget::Shape => vec![ToolAction::CreateNode(
                        NodeDraft::new(NodeKind::Rect {
                            width: b.width,
                            height: b.height,
                            fill: SHAPE_FILL,
                            stroke: None,
                            stroke_width: None,
                            corner_radius: None,
                        })
                        .at(b.x, b.y),
                    )],
                }
            }
        }
    }

    fn preview(&self) -> Option<Preview> {
        let b = self.bounds()?;
        Some(match self.target {
            RectTarget::Shape => Preview::Rect(b),
            RectTarget::Panel => Preview::Panel(b),
        })
    }

    fn cancel(&mut self) {
        self.anchor = None;
    }
}

// ─── Ellipse Tool ────────────────────────────────────────────────────────

/// Drags out a circle centred on the press point.
pub struct EllipseTool {
    min_size: f32,
    center: Option<(f32, f32)>,
    radius: f32,
}

impl Default for EllipseTool {
    fn default() -> Self {
        Self::new()
    }
}

impl EllipseTool {
    pub fn new() -> Self {
        Self {
            min_size: MIN_EXTENT,
            center: None,
            radius: 0.0,
        }
    }

    /// Radii no larger than `min_size` are discarded.
    pub fn with_min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }
}

impl Tool for EllipseTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Ellipse
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<NodeRef>) -> Vec<ToolAction> {
        let pos = event.position();
        match event {
            InputEvent::PointerDown { .. } => {
                self.center = Some(pos);
                self.radius = 0.0;
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                if let Some(center) = self.center {
                    self.radius = drag_radius(center, pos);
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                let Some(center) = self.center.take() else {
                    return vec![];
                };
                let radius = drag_radius(center, pos);
                if radius <= self.min_size {
                    return vec![];
                }
                vec![ToolAction::CreateNode(
                    NodeDraft::new(NodeKind::Ellipse {
                        radius_x: radius,
                        radius_y: radius,
                        fill: SHAPE_FILL,
                        stroke: None,
                        stroke_width: None,
                    })
                    .at(center.0, center.1),
                )]
            }
        }
    }

    fn preview(&self) -> Option<Preview> {
        let (cx, cy) = self.center?;
        Some(Preview::Circle {
            cx,
            cy,
            radius: self.radius,
        })
    }

    fn cancel(&mut self) {
        self.center = None;
    }
}

// ─── Pen Tool (freehand) ─────────────────────────────────────────────────

pub struct PenTool {
    drawing: bool,
    points: Vec<(f32, f32)>,
    stroke: Color,
    stroke_width: f32,
}

impl Default for PenTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PenTool {
    pub fn new() -> Self {
        Self {
            drawing: false,
            points: Vec::new(),
            stroke: Color::BLACK,
            stroke_width: 2.0,
        }
    }

    pub fn set_stroke(&mut self, color: Color, width: f32) {
        self.stroke = color;
        self.stroke_width = width.max(0.0);
    }

    fn push(&mut self, p: (f32, f32)) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }
}

impl Tool for PenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pen
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<NodeRef>) -> Vec<ToolAction> {
        let pos = event.position();
        match event {
            InputEvent::PointerDown { .. } => {
                self.drawing = true;
                self.points.clear();
                self.points.push(pos);
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                if self.drawing {
                    self.push(pos);
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                if !self.drawing {
                    return vec![];
                }
                self.drawing = false;
                self.push(pos);
                let points = std::mem::take(&mut self.points);
                if points.len() < 2 {
                    return vec![];
                }
                // The line's origin is its first point; the rest are relative.
                let (ox, oy) = points[0];
                let relative = points.iter().map(|(x, y)| (x - ox, y - oy)).collect();
                vec![ToolAction::CreateNode(
                    NodeDraft::new(NodeKind::Line {
                        points: relative,
                        stroke: self.stroke,
                        stroke_width: self.stroke_width,
                    })
                    .at(ox, oy),
                )]
            }
        }
    }

    fn preview(&self) -> Option<Preview> {
        self.drawing.then(|| Preview::Stroke(self.points.clone()))
    }

    fn cancel(&mut self) {
        self.drawing = false;
        self.points.clear();
    }
}

// ─── Place Tool (text, bubble, sfx) ──────────────────────────────────────

/// Click-to-place: drops the default node of its kind at the pointer.
pub struct PlaceTool {
    kind: ToolKind,
    placed: bool,
}

impl PlaceTool {
    /// `kind` must be `Text`, `Bubble`, or `Sfx`; anything else places text.
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            placed: false,
        }
    }

    fn draft(&self) -> NodeDraft {
        match self.kind {
            ToolKind::Bubble => defaults::bubble(BubbleVariant::Speech),
            ToolKind::Sfx => defaults::sfx(),
            _ => defaults::text(),
        }
    }
}

impl Tool for PlaceTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<NodeRef>) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                if self.placed {
                    return vec![];
                }
                self.placed = true;
                vec![ToolAction::CreateNode(self.draft().at(*x, *y))]
            }
            InputEvent::PointerUp { .. } => {
                self.placed = false;
                vec![]
            }
            InputEvent::PointerMove { .. } => vec![],
        }
    }

    fn cancel(&mut self) {
        self.placed = false;
    }
}

// ─── Eraser Tool ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct EraserTool;

impl EraserTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for EraserTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Eraser
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<NodeRef>) -> Vec<ToolAction> {
        match (event, hit) {
            // Panel frames are not erasable.
            (InputEvent::PointerDown { .. }, Some(target)) if target.owner != Some(target.id) => {
                vec![ToolAction::Delete(target)]
            }
            _ => vec![],
        }
    }
}
