pub mod primitives;
pub mod shape;
pub mod transform;
pub mod wkb;

pub use primitives::{BoundingBox, Vertex};
pub use shape::{Polygon, Shape, ShapeFamily, WellKnownType};
pub use transform::ScreenTransform;
pub use wkb::ByteOrder;
