//! Plain geometric value types and the rectangle math used by the force model.

mod transform;

pub use transform::Transform;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its left-top corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered at `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    pub fn set_center(&mut self, cx: f64, cy: f64) {
        self.x = cx - self.width / 2.0;
        self.y = cy - self.height / 2.0;
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Touching edges count as an intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

/// `-1`, `0` or `1`; unlike `f64::signum`, zero maps to zero.
pub fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Points where the center-to-center segment leaves `a` and enters `b`.
///
/// Returns `None` when the rectangles intersect.
pub fn clip_points(a: &Rect, b: &Rect) -> Option<(Point, Point)> {
    if a.intersects(b) {
        return None;
    }
    Some((clip_towards(a, b.center()), clip_towards(b, a.center())))
}

fn clip_towards(r: &Rect, target: Point) -> Point {
    let cx = r.center_x();
    let cy = r.center_y();
    let dx = target.x - cx;
    let dy = target.y - cy;

    if dx == 0.0 && dy == 0.0 {
        return Point::new(cx, cy);
    }

    let t_x = if dx != 0.0 {
        r.half_width() / dx.abs()
    } else {
        f64::INFINITY
    };
    let t_y = if dy != 0.0 {
        r.half_height() / dy.abs()
    } else {
        f64::INFINITY
    };
    let t = t_x.min(t_y).max(0.0);
    Point::new(cx + t * dx, cy + t * dy)
}

/// Signed amount to push `a` away from an overlapping `b`, along the axis of least overlap.
///
/// The returned pair is what `a` must move by the negation of; `b` moves by the pair itself.
/// Containment adds the smaller gap on the contained axis so nested rectangles still separate,
/// and coincident centers fall back to a 45° slope.
pub fn separation_amount(a: &Rect, b: &Rect, buffer: f64) -> (f64, f64) {
    debug_assert!(a.intersects(b));

    let dir_x = if a.center_x() < b.center_x() { -1.0 } else { 1.0 };
    let dir_y = if a.center_y() < b.center_y() { -1.0 } else { 1.0 };

    let mut overlap_x = a.right().min(b.right()) - a.left().max(b.left());
    let mut overlap_y = a.bottom().min(b.bottom()) - a.top().max(b.top());

    if a.left() <= b.left() && a.right() >= b.right() {
        overlap_x += (b.left() - a.left()).min(a.right() - b.right());
    } else if b.left() <= a.left() && b.right() >= a.right() {
        overlap_x += (a.left() - b.left()).min(b.right() - a.right());
    }
    if a.top() <= b.top() && a.bottom() >= b.bottom() {
        overlap_y += (b.top() - a.top()).min(a.bottom() - b.bottom());
    } else if b.top() <= a.top() && b.bottom() >= a.bottom() {
        overlap_y += (a.top() - b.top()).min(b.bottom() - a.bottom());
    }

    let ddx = b.center_x() - a.center_x();
    let ddy = b.center_y() - a.center_y();
    let slope = if ddx == 0.0 && ddy == 0.0 {
        1.0
    } else {
        (ddy / ddx).abs()
    };

    let (move_x, move_y) = if slope.is_infinite() {
        (0.0, overlap_y)
    } else if slope == 0.0 {
        (overlap_x, 0.0)
    } else {
        let move_x = overlap_y / slope;
        if overlap_x < move_x {
            (overlap_x, slope * overlap_x)
        } else {
            (move_x, overlap_y)
        }
    };

    (
        -dir_x * (move_x / 2.0 + buffer),
        -dir_y * (move_y / 2.0 + buffer),
    )
}
