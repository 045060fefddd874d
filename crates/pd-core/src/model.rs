//! Page document model.
//!
//! A `Document` is an ordered list of pages. Each page owns two top-level
//! collections: loose elements drawn directly on the page, and panels that
//! each own an ordered list of child nodes in panel-local coordinates.
//! List position is z-order: a later index is drawn on top.

use crate::geometry::Bounds;
use crate::id::NodeId;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Smallest width/height a sized node may have after any mutation.
pub const MIN_EXTENT: f32 = 5.0;

/// Smallest font size a text-bearing node may have after any mutation.
pub const MIN_FONT_SIZE: f32 = 1.0;

// ─── Colors ──────────────────────────────────────────────────────────────

/// An 8-bit RGBA color, serialized as a hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Parse a single ASCII hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| v * 17);
        let long = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        match bytes.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Parse a hex string or one of the keywords `transparent`, `white`, `black`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transparent" => Some(Self::TRANSPARENT),
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            other => Self::from_hex(other),
        }
    }

    /// Emit as the shortest lossless hex string (`#RRGGBB` or `#RRGGBBAA`).
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).ok_or_else(|| de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Enumerated attributes ───────────────────────────────────────────────

/// Which side of a speech bubble its tail points from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailDirection {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
    /// No tail is drawn.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    #[serde(rename = "bold italic")]
    BoldItalic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    #[serde(rename = "line-through")]
    LineThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Z-order move within the owning collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// One step towards the top (swap with the next item).
    Up,
    /// One step towards the bottom (swap with the previous item).
    Down,
    /// To the top of the collection.
    Top,
    /// To the bottom of the collection.
    Bottom,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// Attributes every node and every panel carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttrs {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    /// Degrees, clockwise, about `(x, y)`.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "yes")]
    pub visible: bool,
    /// Blocks drag and transform, never selection.
    #[serde(default)]
    pub locked: bool,
}

impl NodeAttrs {
    pub fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
            locked: false,
        }
    }
}

/// The drawable variants. The set is closed: every consumer matches
/// exhaustively, so a new variant is a compile error at each fold site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NodeKind {
    Rect {
        width: f32,
        height: f32,
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Color>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_width: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        corner_radius: Option<f32>,
    },
    Ellipse {
        radius_x: f32,
        radius_y: f32,
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Color>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_width: Option<f32>,
    },
    /// Open polyline; points are relative to the node's `(x, y)`.
    Line {
        #[serde(with = "crate::codec::flat_points")]
        points: Vec<(f32, f32)>,
        stroke: Color,
        stroke_width: f32,
    },
    Text {
        text: String,
        font_size: f32,
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_family: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_style: Option<FontStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_decoration: Option<TextDecoration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<TextAlign>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        letter_spacing: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line_height: Option<f32>,
    },
    /// Raster image. Only the source reference is persisted; decoded pixels
    /// belong to the rendering surface.
    Image {
        src: String,
        width: f32,
        height: f32,
        #[serde(default)]
        brightness: f32,
        #[serde(default)]
        contrast: f32,
        /// Visible region in node space; `None` shows the whole image.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crop: Option<Bounds>,
    },
    /// Speech or thought bubble: a rounded body with an optional tail.
    Bubble {
        width: f32,
        height: f32,
        text: String,
        #[serde(default = "bubble_font_size")]
        font_size: f32,
        #[serde(default = "bubble_text_color")]
        text_color: Color,
        fill: Color,
        stroke: Color,
        stroke_width: f32,
        corner_radius: f32,
        #[serde(default)]
        tail_direction: TailDirection,
        tail_size: f32,
    },
    /// Sound-effect lettering.
    Sfx {
        text: String,
        font_size: f32,
        fill: Color,
        stroke: Color,
        stroke_width: f32,
        font_family: String,
    },
}

fn bubble_font_size() -> f32 {
    18.0
}

fn bubble_text_color() -> Color {
    Color::BLACK
}

impl NodeKind {
    /// The serialized `type` tag, also used as the id prefix.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Rect { .. } => "rect",
            NodeKind::Ellipse { .. } => "ellipse",
            NodeKind::Line { .. } => "line",
            NodeKind::Text { .. } => "text",
            NodeKind::Image { .. } => "image",
            NodeKind::Bubble { .. } => "bubble",
            NodeKind::Sfx { .. } => "sfx",
        }
    }

    /// Persisted `(width, height)` for variants that carry them.
    pub fn size(&self) -> Option<(f32, f32)> {
        match self {
            NodeKind::Rect { width, height, .. }
            | NodeKind::Image { width, height, .. }
            | NodeKind::Bubble { width, height, .. } => Some((*width, *height)),
            _ => None,
        }
    }

    /// Displayed text for text-bearing variants.
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeKind::Text { text, .. }
            | NodeKind::Bubble { text, .. }
            | NodeKind::Sfx { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn image_src(&self) -> Option<&str> {
        match self {
            NodeKind::Image { src, .. } => Some(src),
            _ => None,
        }
    }
}

/// A drawable node: shared attributes plus its variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub attrs: NodeAttrs,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            attrs: NodeAttrs::new(id, 0.0, 0.0),
            kind,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.attrs.x = x;
        self.attrs.y = y;
        self
    }

    pub fn id(&self) -> NodeId {
        self.attrs.id
    }
}

/// A node that has not been assigned an id or an owner yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub x: f32,
    pub y: f32,
    pub kind: NodeKind,
}

impl NodeDraft {
    pub fn new(kind: NodeKind) -> Self {
        Self { x: 0.0, y: 0.0, kind }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn into_node(self, id: NodeId) -> Node {
        Node::new(id, self.kind).at(self.x, self.y)
    }
}

// ─── Panels ──────────────────────────────────────────────────────────────

fn panel_border_width() -> f32 {
    3.0
}

fn panel_border_color() -> Color {
    Color::BLACK
}

fn panel_background() -> Color {
    Color::WHITE
}

/// A bordered frame that owns child nodes positioned in its local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    #[serde(flatten)]
    pub attrs: NodeAttrs,
    pub width: f32,
    pub height: f32,
    #[serde(default = "panel_border_width")]
    pub border_width: f32,
    #[serde(default = "panel_border_color")]
    pub border_color: Color,
    #[serde(default = "panel_background")]
    pub background_color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Children in z-order, panel-local coordinates.
    #[serde(rename = "elements", default)]
    pub children: Vec<Node>,
}

impl Panel {
    pub fn new(id: NodeId, bounds: Bounds) -> Self {
        Self {
            attrs: NodeAttrs::new(id, bounds.x, bounds.y),
            width: bounds.width,
            height: bounds.height,
            border_width: panel_border_width(),
            border_color: panel_border_color(),
            background_color: panel_background(),
            background_image: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.attrs.id
    }

    /// Unrotated bounds in page coordinates.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.attrs.x, self.attrs.y, self.width, self.height)
    }
}

// ─── Pages & documents ───────────────────────────────────────────────────

fn fresh_page_id() -> NodeId {
    NodeId::with_prefix("page")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default = "fresh_page_id")]
    pub id: NodeId,
    pub loose_elements: Vec<Node>,
    pub panels: Vec<Panel>,
}

/// Where a node or panel lives inside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Loose(usize),
    Panel(usize),
    Child { panel: usize, index: usize },
}

/// Borrowed view of whatever a `Slot` points at.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    Node(&'a Node),
    Panel(&'a Panel),
}

impl<'a> ItemRef<'a> {
    pub fn attrs(&self) -> &'a NodeAttrs {
        match self {
            ItemRef::Node(n) => &n.attrs,
            ItemRef::Panel(p) => &p.attrs,
        }
    }

    pub fn id(&self) -> NodeId {
        self.attrs().id
    }
}

/// Mutable view of whatever a `Slot` points at.
#[derive(Debug)]
pub enum ItemMut<'a> {
    Node(&'a mut Node),
    Panel(&'a mut Panel),
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        Self {
            id: fresh_page_id(),
            loose_elements: Vec::new(),
            panels: Vec::new(),
        }
    }

    /// Find an item by id.
    ///
    /// With an owner hint the hinted panel is searched first (the panel
    /// itself, then its children). Without one, or when the hint misses,
    /// the search order is loose elements, panels, then panel children.
    pub fn locate(&self, id: NodeId, owner: Option<NodeId>) -> Option<Slot> {
        if let Some(owner) = owner
            && let Some(pi) = self.panels.iter().position(|p| p.id() == owner)
        {
            if owner == id {
                return Some(Slot::Panel(pi));
            }
            if let Some(index) = self.panels[pi].children.iter().position(|n| n.id() == id) {
                return Some(Slot::Child { panel: pi, index });
            }
        }

        if let Some(i) = self.loose_elements.iter().position(|n| n.id() == id) {
            return Some(Slot::Loose(i));
        }
        if let Some(i) = self.panels.iter().position(|p| p.id() == id) {
            return Some(Slot::Panel(i));
        }
        self.panels.iter().enumerate().find_map(|(pi, p)| {
            p.children
                .iter()
                .position(|n| n.id() == id)
                .map(|index| Slot::Child { panel: pi, index })
        })
    }

    pub fn get(&self, slot: Slot) -> Option<ItemRef<'_>> {
        match slot {
            Slot::Loose(i) => self.loose_elements.get(i).map(ItemRef::Node),
            Slot::Panel(i) => self.panels.get(i).map(ItemRef::Panel),
            Slot::Child { panel, index } => self
                .panels
                .get(panel)
                .and_then(|p| p.children.get(index))
                .map(ItemRef::Node),
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<ItemMut<'_>> {
        match slot {
            Slot::Loose(i) => self.loose_elements.get_mut(i).map(ItemMut::Node),
            Slot::Panel(i) => self.panels.get_mut(i).map(ItemMut::Panel),
            Slot::Child { panel, index } => self
                .panels
                .get_mut(panel)
                .and_then(|p| p.children.get_mut(index))
                .map(ItemMut::Node),
        }
    }

    /// Look up by id with no owner hint.
    pub fn find(&self, id: NodeId) -> Option<ItemRef<'_>> {
        self.locate(id, None).and_then(|slot| self.get(slot))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.locate(id, None).is_some()
    }

    pub fn panel(&self, id: NodeId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id() == id)
    }

    /// The panel that owns the item at `slot`, if any.
    pub fn owner_of(&self, slot: Slot) -> Option<NodeId> {
        match slot {
            Slot::Child { panel, .. } => self.panels.get(panel).map(Panel::id),
            _ => None,
        }
    }

    /// Remove the item at `slot`. A panel takes its children with it.
    pub fn remove(&mut self, slot: Slot) -> bool {
        match slot {
            Slot::Loose(i) if i < self.loose_elements.len() => {
                self.loose_elements.remove(i);
                true
            }
            Slot::Panel(i) if i < self.panels.len() => {
                self.panels.remove(i);
                true
            }
            Slot::Child { panel, index } => match self.panels.get_mut(panel) {
                Some(p) if index < p.children.len() => {
                    p.children.remove(index);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Move the item at `slot` within its owning collection.
    /// Returns `false` at the boundary or for a stale slot.
    pub fn restack(&mut self, slot: Slot, direction: Direction) -> bool {
        match slot {
            Slot::Loose(i) => restack(&mut self.loose_elements, i, direction),
            Slot::Panel(i) => restack(&mut self.panels, i, direction),
            Slot::Child { panel, index } => match self.panels.get_mut(panel) {
                Some(p) => restack(&mut p.children, index, direction),
                None => false,
            },
        }
    }

    /// Every id on the page: loose nodes, panels, then panel children.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.loose_elements
            .iter()
            .map(Node::id)
            .chain(self.panels.iter().map(Panel::id))
            .chain(
                self.panels
                    .iter()
                    .flat_map(|p| p.children.iter().map(Node::id)),
            )
    }

    /// Every node on the page with its owning panel: loose nodes first, then
    /// each panel's children in z-order.
    pub fn nodes(&self) -> impl Iterator<Item = (&Node, Option<&Panel>)> + '_ {
        self.loose_elements
            .iter()
            .map(|n| (n, None))
            .chain(
                self.panels
                    .iter()
                    .flat_map(|p| p.children.iter().map(move |n| (n, Some(p)))),
            )
    }
}

fn restack<T>(items: &mut Vec<T>, index: usize, direction: Direction) -> bool {
    if index >= items.len() {
        return false;
    }
    let last = items.len() - 1;
    match direction {
        Direction::Up if index < last => items.swap(index, index + 1),
        Direction::Down if index > 0 => items.swap(index, index - 1),
        Direction::Top if index < last => {
            let item = items.remove(index);
            items.push(item);
        }
        Direction::Bottom if index > 0 => {
            let item = items.remove(index);
            items.insert(0, item);
        }
        _ => return false,
    }
    true
}

/// A multi-page illustrated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with a single empty page.
    pub fn new() -> Self {
        Self {
            pages: vec![Page::new()],
        }
    }
}
