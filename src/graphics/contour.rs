use std::cell::OnceCell;

use kurbo::{CubicBez, ParamCurve, ParamCurveArclen, Shape};

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::point::{Point, PointKind};
use crate::graphics::rect::Rect;
use crate::graphics::transform::Transform;

const ARCLEN_ACCURACY: f64 = 1e-6;
const MIN_SEGMENT_LENGTH: f64 = 1e-7;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    Line(Point, Point),
    Cubic(CubicBez),
}

impl Segment {
    fn length(&self) -> f64 {
        match self {
            Segment::Line(a, b) => a.distance(*b),
            Segment::Cubic(c) => c.arclen(ARCLEN_ACCURACY),
        }
    }

    /// Position at parameter `t`; values outside `[0, 1]` extrapolate.
    fn eval(&self, t: f64) -> Point {
        match self {
            Segment::Line(a, b) => Point::new(a.x, a.y).lerp(*b, t),
            Segment::Cubic(c) => Point::from_kurbo(c.eval(t), PointKind::LineTo),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct SegmentCache {
    segments: Vec<Segment>,
    lengths: Vec<f64>,
    total: f64,
}

/// Ordered sequence of points, optionally closed.
///
/// Segments and their lengths are computed lazily and cached; every mutating method drops the
/// cache, so cached geometry is never stale.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Contour {
    points: Vec<Point>,
    #[serde(default)]
    closed: bool,
    #[serde(skip)]
    cache: OnceCell<SegmentCache>,
}

impl PartialEq for Contour {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.points == other.points
    }
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>, closed: bool) -> Self {
        Self {
            points: points.into_iter().collect(),
            closed,
            cache: OnceCell::new(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn invalidate(&mut self) {
        self.cache.take();
    }

    pub fn add_point(&mut self, p: Point) {
        self.points.push(p);
        self.invalidate();
    }

    pub fn extend(&mut self, points: impl IntoIterator<Item = Point>) {
        self.points.extend(points);
        self.invalidate();
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
        self.invalidate();
    }

    pub fn close(&mut self) {
        self.set_closed(true);
    }

    /// Replace every point with `f(point)`.
    pub fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        for p in &mut self.points {
            *p = f(*p);
        }
        self.invalidate();
    }

    pub fn transform(&mut self, t: &Transform) {
        self.map_points(|p| t.map_point(p));
    }

    fn segments(&self) -> Vec<Segment> {
        let pts = &self.points;
        let mut out = Vec::with_capacity(pts.len());
        for i in 1..pts.len() {
            let pt = pts[i];
            match pt.kind {
                PointKind::LineTo => out.push(Segment::Line(pts[i - 1], pt)),
                PointKind::CurveTo if i >= 3 => out.push(Segment::Cubic(CubicBez::new(
                    pts[i - 3].to_kurbo(),
                    pts[i - 2].to_kurbo(),
                    pts[i - 1].to_kurbo(),
                    pt.to_kurbo(),
                ))),
                // A curve without enough control data degrades to a straight segment.
                PointKind::CurveTo => out.push(Segment::Line(pts[i - 1], pt)),
                PointKind::CurveData => {}
            }
        }
        if self.closed
            && let (Some(&first), Some(&last)) = (pts.first(), pts.last())
        {
            out.push(Segment::Line(last, first));
        }
        out
    }

    fn segment_cache(&self) -> &SegmentCache {
        self.cache.get_or_init(|| {
            let segments = self.segments();
            let lengths: Vec<f64> = segments.iter().map(Segment::length).collect();
            let total = lengths.iter().sum();
            SegmentCache {
                segments,
                lengths,
                total,
            }
        })
    }

    /// Total length, including the closing segment for closed contours.
    pub fn length(&self) -> f64 {
        self.segment_cache().total
    }

    /// Position at fraction `t` of the total length.
    ///
    /// Values outside `[0, 1]` extrapolate along the first or last segment. A contour without
    /// length yields its first point.
    pub fn point_at(&self, t: f64) -> NodeBoxResult<Point> {
        let Some(&first) = self.points.first() else {
            return Err(NodeBoxError::geometry("the contour is empty"));
        };
        let cache = self.segment_cache();
        if cache.total == 0.0 || cache.lengths.is_empty() {
            return Ok(Point::new(first.x, first.y));
        }
        let mut abs_t = t * cache.total;
        let mut idx = 0;
        let last = cache.lengths.len() - 1;
        for (i, &len) in cache.lengths.iter().enumerate() {
            idx = i;
            if abs_t <= len || i == last {
                break;
            }
            abs_t -= len;
        }
        let seg_len = cache.lengths[idx];
        let local_t = if seg_len > 0.0 { abs_t / seg_len } else { 0.0 };
        Ok(cache.segments[idx].eval(local_t))
    }

    /// `amount` points evenly spaced along the contour. Open contours include both ends.
    pub fn make_points(&self, amount: usize) -> NodeBoxResult<Vec<Point>> {
        if self.points.is_empty() {
            return Ok(Vec::new());
        }
        let delta = if self.closed {
            if amount > 0 { 1.0 / amount as f64 } else { 1.0 }
        } else if amount > 2 {
            1.0 / (amount as f64 - 1.0)
        } else {
            1.0
        };
        (0..amount).map(|i| self.point_at(delta * i as f64)).collect()
    }

    pub fn resample_by_amount(&self, amount: usize) -> NodeBoxResult<Contour> {
        Ok(Contour::from_points(self.make_points(amount)?, self.closed))
    }

    /// Points spaced `segment_length` apart; the last segment of an open contour may be shorter.
    pub fn resample_by_length(&self, segment_length: f64) -> NodeBoxResult<Contour> {
        if segment_length.is_nan() || segment_length <= MIN_SEGMENT_LENGTH {
            return Err(NodeBoxError::geometry(
                "segment length must be greater than zero",
            ));
        }
        let amount = (self.length() / segment_length).ceil() as usize;
        if self.closed {
            self.resample_by_amount(amount)
        } else {
            self.resample_by_amount(amount + 1)
        }
    }

    pub fn to_bez_path(&self) -> kurbo::BezPath {
        let mut bp = kurbo::BezPath::new();
        let Some(first) = self.points.first() else {
            return bp;
        };
        bp.move_to(first.to_kurbo());
        for i in 1..self.points.len() {
            let pt = self.points[i];
            match pt.kind {
                PointKind::CurveTo if i >= 3 => bp.curve_to(
                    self.points[i - 2].to_kurbo(),
                    self.points[i - 1].to_kurbo(),
                    pt.to_kurbo(),
                ),
                PointKind::LineTo | PointKind::CurveTo => bp.line_to(pt.to_kurbo()),
                PointKind::CurveData => {}
            }
        }
        if self.closed {
            bp.close_path();
        }
        bp
    }

    /// Tight bounds of the geometry after mapping it through `t`.
    pub fn bounds_with(&self, t: &Transform) -> Option<Rect> {
        if self.points.is_empty() {
            return None;
        }
        let bp = t.affine() * self.to_bez_path();
        Some(Rect::from_kurbo(bp.bounding_box()))
    }

    pub fn bounds(&self) -> Rect {
        self.bounds_with(&Transform::IDENTITY).unwrap_or(Rect::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64, closed: bool) -> Contour {
        Contour::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(size, 0.0),
                Point::new(size, size),
                Point::new(0.0, size),
            ],
            closed,
        )
    }

    fn approx(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn open_and_closed_square_lengths() {
        assert_eq!(square(10.0, false).length(), 30.0);
        assert_eq!(square(10.0, true).length(), 40.0);
    }

    #[test]
    fn point_at_walks_segments() {
        let c = square(10.0, false);
        approx(c.point_at(0.5).unwrap(), 10.0, 5.0);
        approx(c.point_at(0.0).unwrap(), 0.0, 0.0);
        approx(c.point_at(1.0).unwrap(), 0.0, 10.0);
    }

    #[test]
    fn closed_contour_wraps_to_start() {
        let c = square(10.0, true);
        let start = c.point_at(0.0).unwrap();
        let end = c.point_at(1.0).unwrap();
        approx(end, start.x, start.y);
        approx(c.point_at(0.875).unwrap(), 0.0, 5.0);
    }

    #[test]
    fn out_of_range_t_extrapolates() {
        let c = Contour::from_points([Point::new(0.0, 0.0), Point::new(10.0, 0.0)], false);
        approx(c.point_at(-0.5).unwrap(), -5.0, 0.0);
        approx(c.point_at(1.5).unwrap(), 15.0, 0.0);
    }

    #[test]
    fn empty_and_degenerate_contours() {
        let empty = Contour::new();
        assert!(matches!(empty.point_at(0.5), Err(NodeBoxError::Geometry(_))));
        assert!(empty.make_points(4).unwrap().is_empty());
        assert!(empty.resample_by_amount(3).unwrap().is_empty());

        let dot = Contour::from_points([Point::new(3.0, 4.0)], false);
        assert_eq!(dot.length(), 0.0);
        approx(dot.point_at(0.7).unwrap(), 3.0, 4.0);
    }

    #[test]
    fn cache_is_invalidated_on_mutation() {
        let mut c = Contour::from_points([Point::new(0.0, 0.0), Point::new(10.0, 0.0)], false);
        assert_eq!(c.length(), 10.0);
        let end = c.point_at(1.0).unwrap();
        assert_eq!((end.x, end.y), (10.0, 0.0));
        c.add_point(Point::new(10.0, 10.0));
        assert_eq!(c.length(), 20.0);
        let end = c.point_at(1.0).unwrap();
        assert_eq!((end.x, end.y), (10.0, 10.0));
        c.close();
        assert!((c.length() - (20.0 + 200f64.sqrt())).abs() < 1e-9);
        let mut t = Transform::identity();
        t.scale(2.0);
        c.transform(&t);
        assert!((c.length() - 2.0 * (20.0 + 200f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn make_points_spacing() {
        let open = square(10.0, false);
        let pts = open.make_points(4).unwrap();
        assert_eq!(pts.len(), 4);
        approx(pts[0], 0.0, 0.0);
        approx(pts[3], 0.0, 10.0);

        let closed = square(10.0, true);
        let pts = closed.make_points(4).unwrap();
        approx(pts[1], 10.0, 0.0);
        approx(pts[2], 10.0, 10.0);
    }

    #[test]
    fn resample_by_length_counts() {
        let open = Contour::from_points([Point::new(0.0, 0.0), Point::new(10.0, 0.0)], false);
        let r = open.resample_by_length(2.5).unwrap();
        assert_eq!(r.point_count(), 5);
        assert!(!r.is_closed());

        let closed = square(10.0, true);
        let r = closed.resample_by_length(10.0).unwrap();
        assert_eq!(r.point_count(), 4);
        assert!(r.is_closed());

        assert!(open.resample_by_length(0.0).is_err());
    }

    #[test]
    fn curve_length_and_bounds() {
        let c = Contour::from_points(
            [
                Point::new(0.0, 0.0),
                Point::with_kind(0.0, 0.0, PointKind::CurveData),
                Point::with_kind(10.0, 0.0, PointKind::CurveData),
                Point::with_kind(10.0, 0.0, PointKind::CurveTo),
            ],
            false,
        );
        assert!((c.length() - 10.0).abs() < 1e-4);
        approx(c.point_at(0.5).unwrap(), 5.0, 0.0);

        let arc = Contour::from_points(
            [
                Point::new(0.0, 0.0),
                Point::with_kind(0.0, 10.0, PointKind::CurveData),
                Point::with_kind(10.0, 10.0, PointKind::CurveData),
                Point::with_kind(10.0, 0.0, PointKind::CurveTo),
            ],
            false,
        );
        let b = arc.bounds();
        assert!((b.height - 7.5).abs() < 1e-9);
        assert_eq!(b.width, 10.0);
    }
}
