//! Geometry helpers shared by the model, hit testing, and the tools.
//!
//! The document stores plain `f32`s; `kurbo` does the affine math.

use crate::model::TailDirection;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle: top-left corner plus non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this rectangle overlaps another.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    fn to_kurbo(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x + self.width),
            f64::from(self.y + self.height),
        )
    }

    fn from_kurbo(r: Rect) -> Self {
        Self::new(r.x0 as f32, r.y0 as f32, r.width() as f32, r.height() as f32)
    }
}

/// Rectangle spanned by a drag from `p0` to `p1`, in any direction.
pub fn normalize_rect(p0: (f32, f32), p1: (f32, f32)) -> Bounds {
    Bounds::new(
        p0.0.min(p1.0),
        p0.1.min(p1.1),
        (p1.0 - p0.0).abs(),
        (p1.1 - p0.1).abs(),
    )
}

/// Containment test for an unrotated rectangle.
pub fn point_in_rect(px: f32, py: f32, rect: &Bounds) -> bool {
    rect.contains(px, py)
}

/// Euclidean distance from the drag anchor, used as a circle radius.
pub fn drag_radius(anchor: (f32, f32), current: (f32, f32)) -> f32 {
    Point::new(f64::from(anchor.0), f64::from(anchor.1))
        .distance(Point::new(f64::from(current.0), f64::from(current.1))) as f32
}

/// Node-local transform: translate to `(x, y)`, rotate by `rotation` degrees.
fn placement(x: f32, y: f32, rotation: f32) -> Affine {
    Affine::translate((f64::from(x), f64::from(y))) * Affine::rotate(f64::from(rotation).to_radians())
}

/// Map a point from the parent's space into the local space of a child placed
/// at `origin` with `rotation` degrees.
pub fn to_local(point: (f32, f32), origin: (f32, f32), rotation: f32) -> (f32, f32) {
    let inv = placement(origin.0, origin.1, rotation).inverse();
    let p = inv * Point::new(f64::from(point.0), f64::from(point.1));
    (p.x as f32, p.y as f32)
}

/// Map a point from a child's local space back into its parent's space.
pub fn to_parent(point: (f32, f32), origin: (f32, f32), rotation: f32) -> (f32, f32) {
    let p = placement(origin.0, origin.1, rotation) * Point::new(f64::from(point.0), f64::from(point.1));
    (p.x as f32, p.y as f32)
}

/// Axis-aligned box of `local` after rotating it by `rotation` degrees about
/// `pivot` (the node origin) and translating to the pivot.
pub fn rotated_bounds(local: Bounds, rotation: f32, pivot: (f32, f32)) -> Bounds {
    Bounds::from_kurbo(placement(pivot.0, pivot.1, rotation).transform_rect_bbox(local.to_kurbo()))
}

// ─── Speech-bubble tail ──────────────────────────────────────────────────

/// Gap between the bubble body and the tail marker's center.
const TAIL_OFFSET: f32 = 10.0;

/// Where a bubble's tail marker sits in the bubble's local space, and which
/// way it points (degrees, 0 = apex up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TailAnchor {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// Tail anchor for a `width × height` bubble body. `None` means no tail.
pub fn tail_anchor(width: f32, height: f32, direction: TailDirection) -> Option<TailAnchor> {
    let (x, y, rotation) = match direction {
        TailDirection::Left => (-TAIL_OFFSET, height / 2.0, 90.0),
        TailDirection::Right => (width + TAIL_OFFSET, height / 2.0, -90.0),
        TailDirection::Top => (width / 2.0, -TAIL_OFFSET, 0.0),
        TailDirection::Bottom => (width / 2.0, height + TAIL_OFFSET, 180.0),
        TailDirection::None => return None,
    };
    Some(TailAnchor { x, y, rotation })
}

/// Vertices of the equilateral tail marker centered on `anchor`.
///
/// The marker's circumradius is three quarters of the bubble's tail size,
/// and its apex points along the anchor rotation.
pub fn tail_triangle(anchor: &TailAnchor, tail_size: f32) -> [(f32, f32); 3] {
    let radius = f64::from(tail_size * 0.75);
    let xf = placement(anchor.x, anchor.y, anchor.rotation);
    let corner = |deg: f64| {
        let rad = deg.to_radians();
        let p = xf * Point::new(radius * rad.sin(), -radius * rad.cos());
        (p.x as f32, p.y as f32)
    };
    [corner(0.0), corner(120.0), corner(240.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3
    }

    #[test]
    fn normalize_negative_drag() {
        let r = normalize_rect((100.0, 80.0), (40.0, 20.0));
        assert_eq!(r, Bounds::new(40.0, 20.0, 60.0, 60.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let r = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_rect(10.0, 10.0, &r));
        assert!(!point_in_rect(10.1, 5.0, &r));
        assert_eq!(r.center(), (5.0, 5.0));
    }

    #[test]
    fn intersects_excludes_touching_edges() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Bounds::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Bounds::new(10.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn radius_is_euclidean() {
        assert_eq!(drag_radius((0.0, 0.0), (3.0, 4.0)), 5.0);
    }

    #[test]
    fn tail_anchor_per_direction() {
        let left = tail_anchor(220.0, 120.0, TailDirection::Left).unwrap();
        assert_eq!((left.x, left.y, left.rotation), (-10.0, 60.0, 90.0));
        let right = tail_anchor(220.0, 120.0, TailDirection::Right).unwrap();
        assert_eq!((right.x, right.y, right.rotation), (230.0, 60.0, -90.0));
        let top = tail_anchor(220.0, 120.0, TailDirection::Top).unwrap();
        assert_eq!((top.x, top.y, top.rotation), (110.0, -10.0, 0.0));
        let bottom = tail_anchor(220.0, 120.0, TailDirection::Bottom).unwrap();
        assert_eq!((bottom.x, bottom.y, bottom.rotation), (110.0, 130.0, 180.0));
        assert_eq!(tail_anchor(220.0, 120.0, TailDirection::None), None);
    }

    #[test]
    fn tail_apex_points_up_when_unrotated() {
        let anchor = TailAnchor {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
        };
        let [apex, _, _] = tail_triangle(&anchor, 20.0);
        assert!(close(apex, (0.0, -15.0)));
    }

    #[test]
    fn local_parent_roundtrip() {
        let p = (37.0, -12.0);
        let local = to_local(p, (100.0, 50.0), 30.0);
        assert!(close(to_parent(local, (100.0, 50.0), 30.0), p));
        assert!(close(to_local((120.0, 70.0), (100.0, 50.0), 0.0), (20.0, 20.0)));
    }

    #[test]
    fn rotated_square_grows() {
        let b = rotated_bounds(Bounds::new(0.0, 0.0, 10.0, 10.0), 90.0, (0.0, 0.0));
        assert!((b.width - 10.0).abs() < 1e-3);
        assert!((b.x + 10.0).abs() < 1e-3);
    }
}
