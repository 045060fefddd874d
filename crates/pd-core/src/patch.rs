//! Partial attribute updates.
//!
//! A `NodePatch` names the attributes to overwrite; `None` fields are left
//! alone and fields that don't apply to the target variant are ignored.
//! Applying a patch is the mutation boundary, so the size floors live here.

use crate::geometry::Bounds;
use crate::model::{
    Color, FontStyle, MIN_EXTENT, MIN_FONT_SIZE, Node, NodeAttrs, NodeKind, Panel, TailDirection,
    TextAlign, TextDecoration,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    // ── Shared ──
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub rotation: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
    pub opacity: Option<f32>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,

    // ── Geometry ──
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub radius_x: Option<f32>,
    pub radius_y: Option<f32>,
    #[serde(skip)]
    pub points: Option<Vec<(f32, f32)>>,

    // ── Paint ──
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f32>,
    pub corner_radius: Option<f32>,

    // ── Text ──
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub font_style: Option<FontStyle>,
    pub text_decoration: Option<TextDecoration>,
    pub align: Option<TextAlign>,
    pub letter_spacing: Option<f32>,
    pub line_height: Option<f32>,
    pub text_color: Option<Color>,

    // ── Image ──
    pub src: Option<String>,
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    /// `Some(None)` resets the crop.
    pub crop: Option<Option<Bounds>>,

    // ── Bubble ──
    pub tail_direction: Option<TailDirection>,
    pub tail_size: Option<f32>,

    // ── Panel ──
    pub border_width: Option<f32>,
    pub border_color: Option<Color>,
    pub background_color: Option<Color>,
    /// `Some(None)` clears the background image.
    pub background_image: Option<Option<String>>,
}

impl NodePatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

fn set_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

fn floor(value: Option<f32>, min: f32) -> Option<f32> {
    value.map(|v| v.max(min))
}

fn clamp(value: Option<f32>, lo: f32, hi: f32) -> Option<f32> {
    value.map(|v| v.clamp(lo, hi))
}

impl NodeAttrs {
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        set(&mut self.x, &patch.x);
        set(&mut self.y, &patch.y);
        set(&mut self.rotation, &patch.rotation);
        set(&mut self.scale_x, &patch.scale_x);
        set(&mut self.scale_y, &patch.scale_y);
        set(&mut self.opacity, &clamp(patch.opacity, 0.0, 1.0));
        set(&mut self.visible, &patch.visible);
        set(&mut self.locked, &patch.locked);
    }
}

impl Node {
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        self.attrs.apply_patch(patch);
        self.kind.apply_patch(patch);
    }
}

impl NodeKind {
    pub fn apply_patch(&mut self, p: &NodePatch) {
        let width = floor(p.width, MIN_EXTENT);
        let height = floor(p.height, MIN_EXTENT);
        let font_size = floor(p.font_size, MIN_FONT_SIZE);
        let stroke_width = floor(p.stroke_width, 0.0);

        match self {
            NodeKind::Rect {
                width: w,
                height: h,
                fill,
                stroke,
                stroke_width: sw,
                corner_radius,
            } => {
                set(w, &width);
                set(h, &height);
                set(fill, &p.fill);
                set_opt(stroke, &p.stroke);
                set_opt(sw, &stroke_width);
                set_opt(corner_radius, &floor(p.corner_radius, 0.0));
            }
            NodeKind::Ellipse {
                radius_x,
                radius_y,
                fill,
                stroke,
                stroke_width: sw,
            } => {
                set(radius_x, &floor(p.radius_x, MIN_EXTENT / 2.0));
                set(radius_y, &floor(p.radius_y, MIN_EXTENT / 2.0));
                set(fill, &p.fill);
                set_opt(stroke, &p.stroke);
                set_opt(sw, &stroke_width);
            }
            NodeKind::Line {
                points,
                stroke,
                stroke_width: sw,
            } => {
                set(points, &p.points);
                set(stroke, &p.stroke);
                set(sw, &stroke_width);
            }
            NodeKind::Text {
                text,
                font_size: fs,
                fill,
                font_family,
                font_style,
                text_decoration,
                align,
                letter_spacing,
                line_height,
            } => {
                set(text, &p.text);
                set(fs, &font_size);
                set(fill, &p.fill);
                set_opt(font_family, &p.font_family);
                set_opt(font_style, &p.font_style);
                set_opt(text_decoration, &p.text_decoration);
                set_opt(align, &p.align);
                set_opt(letter_spacing, &p.letter_spacing);
                set_opt(line_height, &floor(p.line_height, 0.0));
            }
            NodeKind::Image {
                src,
                width: w,
                height: h,
                brightness,
                contrast,
                crop,
            } => {
                set(src, &p.src);
                set(w, &width);
                set(h, &height);
                set(brightness, &clamp(p.brightness, -1.0, 1.0));
                set(contrast, &clamp(p.contrast, -1.0, 1.0));
                set(crop, &p.crop);
            }
            NodeKind::Bubble {
                width: w,
                height: h,
                text,
                font_size: fs,
                text_color,
                fill,
                stroke,
                stroke_width: sw,
                corner_radius,
                tail_direction,
                tail_size,
            } => {
                set(w, &width);
                set(h, &height);
                set(text, &p.text);
                set(fs, &font_size);
                set(text_color, &p.text_color);
                set(fill, &p.fill);
                set(stroke, &p.stroke);
                set(sw, &stroke_width);
                set(corner_radius, &floor(p.corner_radius, 0.0));
                set(tail_direction, &p.tail_direction);
                set(tail_size, &floor(p.tail_size, 0.0));
            }
            NodeKind::Sfx {
                text,
                font_size: fs,
                fill,
                stroke,
                stroke_width: sw,
                font_family,
            } => {
                set(text, &p.text);
                set(fs, &font_size);
                set(fill, &p.fill);
                set(stroke, &p.stroke);
                set(sw, &stroke_width);
                set(font_family, &p.font_family);
            }
        }
    }
}

impl Panel {
    pub fn apply_patch(&mut self, p: &NodePatch) {
        self.attrs.apply_patch(p);
        set(&mut self.width, &floor(p.width, MIN_EXTENT));
        set(&mut self.height, &floor(p.height, MIN_EXTENT));
        set(&mut self.border_width, &floor(p.border_width, 0.0));
        set(&mut self.border_color, &p.border_color);
        set(&mut self.background_color, &p.background_color);
        set(&mut self.background_image, &p.background_image);
    }
}
