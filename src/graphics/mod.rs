//! Vector geometry: points, transforms, contours, paths and groups.

pub mod color;
pub mod contour;
pub mod grob;
pub mod group;
pub mod path;
pub mod point;
pub mod rect;
pub mod transform;

pub use color::Color;
pub use contour::Contour;
pub use grob::Grob;
pub use group::Group;
pub use path::Path;
pub use point::{Point, PointKind};
pub use rect::Rect;
pub use transform::Transform;
