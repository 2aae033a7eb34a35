use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::color::Color;
use crate::graphics::contour::Contour;
use crate::graphics::point::{Point, PointKind};
use crate::graphics::rect::Rect;
use crate::graphics::transform::Transform;

/// Bezier magic number for approximating a quarter circle with one cubic.
const KAPPA: f64 = 0.552_284_749_831;

fn default_stroke_width() -> f64 {
    1.0
}

/// Styled geometry: contours plus fill, stroke and an own transform.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Path {
    #[serde(default)]
    pub contours: Vec<Contour>,
    #[serde(default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub stroke: Option<Color>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub transform: Transform,
    /// Whether the last contour still accepts points.
    #[serde(skip)]
    open_contour: bool,
}

impl Default for Path {
    fn default() -> Self {
        Self {
            contours: Vec::new(),
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: default_stroke_width(),
            transform: Transform::IDENTITY,
            open_contour: false,
        }
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_contours(contours: impl IntoIterator<Item = Contour>) -> Self {
        Self {
            contours: contours.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_stroke(mut self, stroke: Option<Color>, width: f64) -> Self {
        self.stroke = stroke;
        self.stroke_width = width;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(Contour::is_empty)
    }

    pub fn add_contour(&mut self, contour: Contour) {
        self.contours.push(contour);
        self.open_contour = false;
    }

    fn current_contour(&mut self) -> &mut Contour {
        if !self.open_contour || self.contours.is_empty() {
            self.contours.push(Contour::new());
            self.open_contour = true;
        }
        let last = self.contours.len() - 1;
        &mut self.contours[last]
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.contours.push(Contour::from_points([Point::new(x, y)], false));
        self.open_contour = true;
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.current_contour().add_point(Point::new(x, y));
        self
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> &mut Self {
        self.current_contour().extend([
            Point::with_kind(x1, y1, PointKind::CurveData),
            Point::with_kind(x2, y2, PointKind::CurveData),
            Point::with_kind(x, y, PointKind::CurveTo),
        ]);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if self.open_contour
            && let Some(c) = self.contours.last_mut()
        {
            c.close();
        }
        self.open_contour = false;
        self
    }

    /// Axis-aligned rectangle with `(x, y)` as its top-left corner.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + width, y)
            .line_to(x + width, y + height)
            .line_to(x, y + height)
            .close()
    }

    /// Ellipse inscribed in the rect `(x, y, width, height)`.
    pub fn ellipse(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let (cx, cy) = (x + hw, y + hh);
        let (ox, oy) = (hw * KAPPA, hh * KAPPA);
        self.move_to(cx, y)
            .curve_to(cx + ox, y, x + width, cy - oy, x + width, cy)
            .curve_to(x + width, cy + oy, cx + ox, y + height, cx, y + height)
            .curve_to(cx - ox, y + height, x, cy + oy, x, cy)
            .curve_to(x, cy - oy, cx - ox, y, cx, y)
            .close()
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> &mut Self {
        self.move_to(x1, y1).line_to(x2, y2);
        self.open_contour = false;
        self
    }

    pub fn prepend_transform(&mut self, t: &Transform) {
        self.transform.prepend(t);
    }

    pub fn append_transform(&mut self, t: &Transform) {
        self.transform.append(t);
    }

    /// Contours with the path transform baked in.
    pub fn world_contours(&self) -> Vec<Contour> {
        self.contours
            .iter()
            .map(|c| {
                let mut c = c.clone();
                if !self.transform.is_identity() {
                    c.transform(&self.transform);
                }
                c
            })
            .collect()
    }

    /// Bounds of the transformed geometry; zero rect for an empty path.
    pub fn bounds(&self) -> Rect {
        self.contours
            .iter()
            .filter_map(|c| c.bounds_with(&self.transform))
            .reduce(Rect::union_strict)
            .unwrap_or(Rect::ZERO)
    }

    /// On-curve points in world space.
    pub fn points(&self) -> Vec<Point> {
        self.contours
            .iter()
            .flat_map(|c| c.points().iter().copied())
            .filter(|p| p.is_on_curve())
            .map(|p| self.transform.map_point(p))
            .collect()
    }

    pub fn length(&self) -> f64 {
        self.world_contours().iter().map(Contour::length).sum()
    }

    /// Position at fraction `t` of the total length over all contours.
    pub fn point_at(&self, t: f64) -> NodeBoxResult<Point> {
        let contours: Vec<Contour> = self
            .world_contours()
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect();
        let Some(first) = contours.first() else {
            return Err(NodeBoxError::geometry("the path is empty"));
        };
        let total: f64 = contours.iter().map(Contour::length).sum();
        if total == 0.0 {
            return first.point_at(0.0);
        }
        let mut abs_t = t * total;
        let last = contours.len() - 1;
        for (i, c) in contours.iter().enumerate() {
            let len = c.length();
            if abs_t <= len || i == last {
                let local = if len > 0.0 { abs_t / len } else { 0.0 };
                return c.point_at(local);
            }
            abs_t -= len;
        }
        first.point_at(0.0)
    }

    fn with_world_contours(&self, contours: Vec<Contour>) -> Path {
        Path {
            contours,
            fill: self.fill,
            stroke: self.stroke,
            stroke_width: self.stroke_width,
            transform: Transform::IDENTITY,
            open_contour: false,
        }
    }

    /// Resample every contour to `amount` points, baking in the transform.
    pub fn resample_by_amount(&self, amount: usize) -> NodeBoxResult<Path> {
        let contours = self
            .world_contours()
            .iter()
            .map(|c| c.resample_by_amount(amount))
            .collect::<NodeBoxResult<Vec<_>>>()?;
        Ok(self.with_world_contours(contours))
    }

    /// Resample every contour with points `segment_length` apart, baking in the transform.
    pub fn resample_by_length(&self, segment_length: f64) -> NodeBoxResult<Path> {
        let contours = self
            .world_contours()
            .iter()
            .map(|c| c.resample_by_length(segment_length))
            .collect::<NodeBoxResult<Vec<_>>>()?;
        Ok(self.with_world_contours(contours))
    }

    pub fn to_bez_path(&self) -> kurbo::BezPath {
        let mut bp = kurbo::BezPath::new();
        for c in &self.contours {
            bp.extend(c.to_bez_path().elements().iter().copied());
        }
        self.transform.affine() * bp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_builder_makes_one_closed_contour() {
        let mut p = Path::new();
        p.rect(0.0, 0.0, 100.0, 50.0);
        assert_eq!(p.contours.len(), 1);
        assert!(p.contours[0].is_closed());
        assert_eq!(p.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(p.length(), 300.0);
    }

    #[test]
    fn drawing_after_close_starts_a_new_contour() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(10.0, 0.0).close();
        p.line_to(20.0, 20.0);
        assert_eq!(p.contours.len(), 2);
        assert_eq!(p.contours[1].point_count(), 1);
    }

    #[test]
    fn ellipse_bounds_match_its_rect() {
        let mut p = Path::new();
        p.ellipse(10.0, 20.0, 40.0, 20.0);
        let b = p.bounds();
        assert!((b.x - 10.0).abs() < 1e-9);
        assert!((b.y - 20.0).abs() < 1e-9);
        assert!((b.width - 40.0).abs() < 1e-9);
        assert!((b.height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_follow_the_transform() {
        let mut p = Path::new();
        p.rect(0.0, 0.0, 10.0, 10.0);
        p.append_transform(&Transform::translated(5.0, 5.0));
        assert_eq!(p.bounds(), Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(p.points()[0], Point::new(5.0, 5.0));
    }

    #[test]
    fn point_at_spans_contours() {
        let mut p = Path::new();
        p.line(0.0, 0.0, 10.0, 0.0);
        p.line(0.0, 10.0, 10.0, 10.0);
        let mid = p.point_at(0.75).unwrap();
        assert_eq!((mid.x, mid.y), (5.0, 10.0));
        assert!(Path::new().point_at(0.5).is_err());
    }

    #[test]
    fn resample_bakes_transform_and_keeps_style() {
        let mut p = Path::new().with_fill(None);
        p.line(0.0, 0.0, 10.0, 0.0);
        p.append_transform(&Transform::scaled(2.0, 1.0));
        let r = p.resample_by_length(5.0).unwrap();
        assert!(r.transform.is_identity());
        assert_eq!(r.fill, None);
        assert_eq!(r.contours[0].point_count(), 5);
        assert_eq!(r.contours[0].points()[4].x, 20.0);
    }
}
