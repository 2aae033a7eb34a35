use kurbo::Affine;

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::point::Point;
use crate::graphics::rect::Rect;

/// 2D affine transform.
///
/// `translate`, `rotate`, `scale` and `skew` compose like a graphics state: the new operation
/// is applied to points *before* the existing matrix, so a sequence of calls reads in the
/// order the operations are nested. [`Transform::prepend`] and [`Transform::append`] place an
/// arbitrary transform before or after the existing one.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Transform(Affine);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform(Affine::IDENTITY);

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_affine(a: Affine) -> Self {
        Self(a)
    }

    pub fn affine(self) -> Affine {
        self.0
    }

    /// Coefficients `[a, b, c, d, e, f]` mapping `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
    pub fn coefficients(self) -> [f64; 6] {
        self.0.as_coeffs()
    }

    pub fn is_identity(self) -> bool {
        self.0 == Affine::IDENTITY
    }

    pub fn translated(tx: f64, ty: f64) -> Self {
        Self(Affine::translate((tx, ty)))
    }

    pub fn rotated(degrees: f64) -> Self {
        Self(Affine::rotate(degrees.to_radians()))
    }

    pub fn scaled(sx: f64, sy: f64) -> Self {
        Self(Affine::scale_non_uniform(sx, sy))
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.0 *= Affine::translate((tx, ty));
        self
    }

    pub fn rotate(&mut self, degrees: f64) -> &mut Self {
        self.rotate_radians(degrees.to_radians())
    }

    pub fn rotate_radians(&mut self, radians: f64) -> &mut Self {
        self.0 *= Affine::rotate(radians);
        self
    }

    pub fn scale(&mut self, s: f64) -> &mut Self {
        self.scale_xy(s, s)
    }

    pub fn scale_xy(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.0 *= Affine::scale_non_uniform(sx, sy);
        self
    }

    /// Skew by angles given in degrees.
    pub fn skew(&mut self, kx_degrees: f64, ky_degrees: f64) -> &mut Self {
        self.0 *= Affine::skew(kx_degrees.to_radians().tan(), ky_degrees.to_radians().tan());
        self
    }

    /// Apply `t` to points before this transform.
    pub fn prepend(&mut self, t: &Transform) -> &mut Self {
        self.0 *= t.0;
        self
    }

    /// Apply `t` to points after this transform.
    pub fn append(&mut self, t: &Transform) -> &mut Self {
        self.0 = t.0 * self.0;
        self
    }

    pub fn invert(self) -> NodeBoxResult<Transform> {
        let det = self.0.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(NodeBoxError::geometry("transform is not invertible"));
        }
        Ok(Self(self.0.inverse()))
    }

    pub fn map_point(&self, p: Point) -> Point {
        Point::from_kurbo(self.0 * p.to_kurbo(), p.kind)
    }

    pub fn map_points(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.map_point(p)).collect()
    }

    /// Bounding box of the four mapped corners.
    pub fn map_rect(&self, r: Rect) -> Rect {
        let corners = r.corners().map(|p| self.map_point(p));
        Rect::from_points(corners).unwrap_or(Rect::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, x: f64, y: f64) -> bool {
        (a.x - x).abs() < 1e-9 && (a.y - y).abs() < 1e-9
    }

    #[test]
    fn identity_is_neutral() {
        let p = Point::new(3.0, -4.0);
        assert_eq!(Transform::identity().map_point(p), p);
        assert!(Transform::default().is_identity());
    }

    #[test]
    fn chained_ops_apply_innermost_first() {
        let mut t = Transform::identity();
        t.translate(10.0, 0.0).scale(2.0);
        // scale first, then translate
        assert!(close(t.map_point(Point::new(1.0, 1.0)), 12.0, 2.0));
    }

    #[test]
    fn rotate_uses_degrees() {
        let mut t = Transform::identity();
        t.rotate(90.0);
        assert!(close(t.map_point(Point::new(1.0, 0.0)), 0.0, 1.0));
    }

    #[test]
    fn prepend_and_append_order() {
        let s = Transform::scaled(2.0, 2.0);
        let tr = Transform::translated(5.0, 0.0);

        let mut a = s;
        a.append(&tr);
        assert!(close(a.map_point(Point::new(1.0, 0.0)), 7.0, 0.0));

        let mut b = s;
        b.prepend(&tr);
        assert!(close(b.map_point(Point::new(1.0, 0.0)), 12.0, 0.0));
    }

    #[test]
    fn map_rect_returns_bounding_box_of_corners() {
        let r = Transform::rotated(45.0).map_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let half_diag = 10.0 / 2f64.sqrt();
        assert!((r.x + half_diag).abs() < 1e-9);
        assert!((r.width - 2.0 * half_diag).abs() < 1e-9);
    }

    #[test]
    fn singular_transform_does_not_invert() {
        assert!(Transform::scaled(0.0, 1.0).invert().is_err());
        let inv = Transform::translated(3.0, 4.0).invert().unwrap();
        assert!(close(inv.map_point(Point::new(3.0, 4.0)), 0.0, 0.0));
    }
}
