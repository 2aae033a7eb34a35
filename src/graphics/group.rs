use crate::graphics::grob::Grob;
use crate::graphics::point::Point;
use crate::graphics::rect::Rect;
use crate::graphics::transform::Transform;

/// Ordered collection of child grobs sharing one transform.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Group {
    #[serde(default)]
    pub grobs: Vec<Grob>,
    #[serde(default)]
    pub transform: Transform,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_grobs(grobs: impl IntoIterator<Item = Grob>) -> Self {
        Self {
            grobs: grobs.into_iter().collect(),
            transform: Transform::IDENTITY,
        }
    }

    pub fn add(&mut self, grob: impl Into<Grob>) {
        self.grobs.push(grob.into());
    }

    pub fn len(&self) -> usize {
        self.grobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grobs.is_empty()
    }

    pub fn prepend_transform(&mut self, t: &Transform) {
        self.transform.prepend(t);
    }

    pub fn append_transform(&mut self, t: &Transform) {
        self.transform.append(t);
    }

    /// Union of the children bounds mapped by the group transform; zero rect when empty.
    pub fn bounds(&self) -> Rect {
        let Some(inner) = self
            .grobs
            .iter()
            .map(Grob::bounds)
            .reduce(Rect::union_strict)
        else {
            return Rect::ZERO;
        };
        self.transform.map_rect(inner)
    }

    /// On-curve points of all children in world space.
    pub fn points(&self) -> Vec<Point> {
        self.grobs
            .iter()
            .flat_map(Grob::points)
            .map(|p| self.transform.map_point(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::path::Path;

    fn square(x: f64, y: f64, size: f64) -> Path {
        let mut p = Path::new();
        p.rect(x, y, size, size);
        p
    }

    #[test]
    fn empty_group_has_zero_bounds() {
        assert_eq!(Group::new().bounds(), Rect::ZERO);
    }

    #[test]
    fn bounds_are_union_of_children() {
        let mut g = Group::new();
        g.add(square(0.0, 0.0, 10.0));
        g.add(square(20.0, 30.0, 10.0));
        assert_eq!(g.bounds(), Rect::new(0.0, 0.0, 30.0, 40.0));

        g.append_transform(&Transform::translated(-5.0, 0.0));
        assert_eq!(g.bounds(), Rect::new(-5.0, 0.0, 30.0, 40.0));
        assert_eq!(g.points()[0], Point::new(-5.0, 0.0));
    }
}
