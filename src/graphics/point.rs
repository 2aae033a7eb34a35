/// Role of a point inside a contour.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    /// On-curve point reached by a straight segment (or the contour start).
    #[default]
    LineTo,
    /// Off-curve control point.
    CurveData,
    /// On-curve point ending a cubic segment; preceded by two `CurveData` points.
    CurveTo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub kind: PointKind,
}

impl Point {
    pub const ZERO: Point = Point::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            kind: PointKind::LineTo,
        }
    }

    pub const fn with_kind(x: f64, y: f64, kind: PointKind) -> Self {
        Self { x, y, kind }
    }

    pub fn is_on_curve(self) -> bool {
        self.kind != PointKind::CurveData
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation toward `other`; `t` is not clamped.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::with_kind(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.kind,
        )
    }

    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub fn from_kurbo(p: kurbo::Point, kind: PointKind) -> Self {
        Self::with_kind(p.x, p.y, kind)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_and_lerp() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        let m = a.lerp(b, 0.5);
        assert_eq!((m.x, m.y), (1.5, 2.0));
        assert!(Point::with_kind(0.0, 0.0, PointKind::CurveTo).is_on_curve());
        assert!(!Point::with_kind(0.0, 0.0, PointKind::CurveData).is_on_curve());
    }
}
