use crate::graphics::point::Point;

/// Axis-aligned rectangle; `(x, y)` is the top-left corner for normalized rects.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Smallest rect containing all `points`; `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in it {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Flip negative extents so that width and height are non-negative.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    pub fn is_empty(self) -> bool {
        let n = self.normalized();
        n.width <= 0.0 || n.height <= 0.0
    }

    pub fn centroid(self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn max_x(self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(self) -> f64 {
        self.y + self.height
    }

    /// Union of both rects; an empty side contributes nothing.
    pub fn union(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other.normalized();
        }
        if other.is_empty() {
            return self.normalized();
        }
        self.union_strict(other)
    }

    /// Union that also takes degenerate (zero-width or zero-height) rects into account.
    pub fn union_strict(self, other: Rect) -> Rect {
        let a = self.normalized();
        let b = other.normalized();
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        let x1 = a.max_x().max(b.max_x());
        let y1 = a.max_y().max(b.max_y());
        Rect::new(x, y, x1 - x, y1 - y)
    }

    pub fn intersects(self, other: Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.x.max(b.x) < a.max_x().min(b.max_x()) && a.y.max(b.y) < a.max_y().min(b.max_y())
    }

    pub fn contains_point(self, p: Point) -> bool {
        let r = self.normalized();
        p.x >= r.x && p.x <= r.max_x() && p.y >= r.y && p.y <= r.max_y()
    }

    pub fn contains_rect(self, other: Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        b.x >= a.x && b.max_x() <= a.max_x() && b.y >= a.y && b.max_y() <= a.max_y()
    }

    pub fn corners(self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.max_x(), self.y),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.x, self.max_y()),
        ]
    }

    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.max_x(), self.max_y())
    }

    pub fn from_kurbo(r: kurbo::Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0, r.y0, r.width(), r.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_skips_empty_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(Rect::ZERO.union(a), a);
        assert_eq!(a.union(Rect::ZERO), a);
        let b = Rect::new(20.0, -5.0, 5.0, 5.0);
        assert_eq!(a.union(b), Rect::new(0.0, -5.0, 25.0, 15.0));
    }

    #[test]
    fn normalize_flips_negative_extents() {
        let r = Rect::new(10.0, 10.0, -10.0, -5.0).normalized();
        assert_eq!(r, Rect::new(0.0, 5.0, 10.0, 5.0));
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_empty());
    }

    #[test]
    fn containment_and_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains_point(Point::new(10.0, 10.0)));
        assert!(a.contains_rect(Rect::new(2.0, 2.0, 3.0, 3.0)));
        assert!(a.intersects(Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(Rect::new(10.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn kurbo_round_trip_keeps_extent() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Rect::from_kurbo(r.to_kurbo()), r);
    }
}
