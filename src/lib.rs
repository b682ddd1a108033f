pub mod canvas;
pub mod config;
pub mod error;
pub mod geometry;
pub mod label_dump;
pub mod labeling;
pub mod render;
pub mod style;
pub mod text_metrics;

pub use canvas::{AreaDrawing, DrawingOrder, LabelCanvas, TextDrawing};
pub use config::{LabelStyleConfig, LabelingConfig, load_config};
pub use error::{LabelError, Result};
pub use geometry::wkb;
pub use geometry::{BoundingBox, Polygon, ScreenTransform, Shape, ShapeFamily, Vertex};
pub use labeling::grid;
pub use labeling::resolver;
pub use labeling::{
    Feature, LabelEngine, LabelInformation, LabelPositions, LabelingCandidate, SimpleCandidate,
    WorldLabelingCandidate,
};
pub use render::{DrawOperation, SvgCanvas};
pub use style::{DrawingLevel, Halo, LabelFont, Mask, TextStyle};
pub use text_metrics::{MonospaceMeasurer, TextMeasurer, TextSize};
