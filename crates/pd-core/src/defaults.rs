//! Toolbar defaults: the node each "add" button creates.

use crate::geometry::Bounds;
use crate::model::{Color, NodeDraft, NodeKind, TailDirection};

/// Default fill for toolbar shapes.
pub const SHAPE_FILL: Color = Color::rgb(0x4f, 0x46, 0xe5);

/// Which flavour of bubble to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BubbleVariant {
    #[default]
    Speech,
    Thought,
}

pub fn rect() -> NodeDraft {
    NodeDraft::new(NodeKind::Rect {
        width: 160.0,
        height: 110.0,
        fill: SHAPE_FILL,
        stroke: None,
        stroke_width: None,
        corner_radius: None,
    })
    .at(100.0, 100.0)
}

pub fn ellipse() -> NodeDraft {
    NodeDraft::new(NodeKind::Ellipse {
        radius_x: 80.0,
        radius_y: 55.0,
        fill: SHAPE_FILL,
        stroke: None,
        stroke_width: None,
    })
    .at(100.0, 100.0)
}

pub fn line() -> NodeDraft {
    NodeDraft::new(NodeKind::Line {
        points: vec![(0.0, 0.0), (200.0, 0.0)],
        stroke: Color::BLACK,
        stroke_width: 2.0,
    })
    .at(100.0, 100.0)
}

pub fn text() -> NodeDraft {
    NodeDraft::new(NodeKind::Text {
        text: "Edit text".into(),
        font_size: 26.0,
        fill: Color::rgb(0x11, 0x11, 0x11),
        font_family: None,
        font_style: None,
        text_decoration: None,
        align: None,
        letter_spacing: None,
        line_height: None,
    })
    .at(120.0, 120.0)
}

/// An image sized to a third of its natural dimensions.
pub fn image(src: impl Into<String>, natural_width: f32, natural_height: f32) -> NodeDraft {
    NodeDraft::new(NodeKind::Image {
        src: src.into(),
        width: natural_width / 3.0,
        height: natural_height / 3.0,
        brightness: 0.0,
        contrast: 0.0,
        crop: None,
    })
    .at(150.0, 150.0)
}

pub fn bubble(variant: BubbleVariant) -> NodeDraft {
    let text = match variant {
        BubbleVariant::Speech => "...",
        BubbleVariant::Thought => "•••",
    };
    NodeDraft::new(NodeKind::Bubble {
        width: 220.0,
        height: 120.0,
        text: text.into(),
        font_size: 18.0,
        text_color: Color::BLACK,
        fill: Color::WHITE,
        stroke: Color::BLACK,
        stroke_width: 2.0,
        corner_radius: 12.0,
        tail_direction: TailDirection::Left,
        tail_size: 20.0,
    })
    .at(200.0, 200.0)
}

pub fn sfx() -> NodeDraft {
    NodeDraft::new(NodeKind::Sfx {
        text: "BOOM!".into(),
        font_size: 48.0,
        fill: Color::rgb(0xff, 0, 0),
        stroke: Color::BLACK,
        stroke_width: 2.0,
        font_family: "Impact".into(),
    })
    .at(150.0, 150.0)
}

/// Side cap of the centred crop preset.
const CENTER_CROP_MAX: f32 = 200.0;

/// Centred crop of at most 200×200 inside a `width`×`height` image node.
pub fn center_crop(width: f32, height: f32) -> Bounds {
    let cw = width.min(CENTER_CROP_MAX);
    let ch = height.min(CENTER_CROP_MAX);
    Bounds::new((width - cw) / 2.0, (height - ch) / 2.0, cw, ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_a_third_of_natural_size() {
        let draft = image("data:image/png;base64,AAAA", 600.0, 300.0);
        assert!(matches!(
            draft.kind,
            NodeKind::Image { width, height, .. } if width == 200.0 && height == 100.0
        ));
        assert_eq!((draft.x, draft.y), (150.0, 150.0));
    }

    #[test]
    fn center_crop_is_capped_and_centred() {
        assert_eq!(center_crop(600.0, 120.0), Bounds::new(200.0, 0.0, 200.0, 120.0));
        assert_eq!(center_crop(50.0, 50.0), Bounds::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn thought_bubble_uses_dots() {
        assert_eq!(bubble(BubbleVariant::Thought).kind.text(), Some("•••"));
        assert_eq!(bubble(BubbleVariant::Speech).kind.text(), Some("..."));
    }
}
