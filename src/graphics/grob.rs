use crate::graphics::group::Group;
use crate::graphics::path::Path;
use crate::graphics::point::Point;
use crate::graphics::rect::Rect;
use crate::graphics::transform::Transform;

/// Graphic object: the closed set of drawable values.
///
/// Grobs are plain values. `clone()` produces a deep copy that shares nothing mutable with the
/// original.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grob {
    Path(Path),
    Group(Group),
}

impl From<Path> for Grob {
    fn from(p: Path) -> Self {
        Grob::Path(p)
    }
}

impl From<Group> for Grob {
    fn from(g: Group) -> Self {
        Grob::Group(g)
    }
}

impl Grob {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Grob::Path(_) => "path",
            Grob::Group(_) => "group",
        }
    }

    pub fn transform(&self) -> Transform {
        match self {
            Grob::Path(p) => p.transform,
            Grob::Group(g) => g.transform,
        }
    }

    pub fn set_transform(&mut self, t: Transform) {
        match self {
            Grob::Path(p) => p.transform = t,
            Grob::Group(g) => g.transform = t,
        }
    }

    /// Apply `t` before the grob's own transform.
    pub fn prepend_transform(&mut self, t: &Transform) {
        match self {
            Grob::Path(p) => p.prepend_transform(t),
            Grob::Group(g) => g.prepend_transform(t),
        }
    }

    /// Apply `t` after the grob's own transform.
    pub fn append_transform(&mut self, t: &Transform) {
        match self {
            Grob::Path(p) => p.append_transform(t),
            Grob::Group(g) => g.append_transform(t),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Grob::Path(p) => p.bounds(),
            Grob::Group(g) => g.bounds(),
        }
    }

    /// Bounds as seen through an inherited parent transform.
    pub fn frame(&self, parent: &Transform) -> Rect {
        parent.map_rect(self.bounds())
    }

    pub fn points(&self) -> Vec<Point> {
        match self {
            Grob::Path(p) => p.points(),
            Grob::Group(g) => g.points(),
        }
    }

    /// Wrap a path into a one-element group; groups pass through.
    pub fn into_group(self) -> Group {
        match self {
            Grob::Group(g) => g,
            Grob::Path(p) => Group::from_grobs([Grob::Path(p)]),
        }
    }
}
