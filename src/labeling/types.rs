use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Vertex};

/// One positioned text run of a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelInformation {
    /// Centre of the run in screen pixels.
    pub position: Vertex,
    pub text: String,
    /// Degrees, clockwise on screen.
    pub rotation: f64,
}

/// A tentative label placement before it is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelingCandidate {
    pub original_text: String,
    /// Closed ring in screen pixels.
    pub collision_polygon: Vec<Vertex>,
    pub center: Vertex,
    pub label_informations: Vec<LabelInformation>,
}

impl LabelingCandidate {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(&self.collision_polygon)
    }

    pub fn to_simple(&self) -> SimpleCandidate {
        SimpleCandidate {
            text: self.original_text.clone(),
            collision_polygon: self.collision_polygon.clone(),
            center: self.center,
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for v in &mut self.collision_polygon {
            *v = v.translated(dx, dy);
        }
        self.center = self.center.translated(dx, dy);
        for info in &mut self.label_informations {
            info.position = info.position.translated(dx, dy);
        }
    }
}

/// Accepted label as remembered for duplicate and overlap checks, shared
/// across styles and layers during one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleCandidate {
    pub text: String,
    pub collision_polygon: Vec<Vertex>,
    pub center: Vertex,
}

impl SimpleCandidate {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(&self.collision_polygon)
    }
}

/// World-space anchor remembered for a feature so its label does not jump
/// when the view moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldLabelingCandidate {
    pub center: Vertex,
    pub original_text: String,
}

/// The segment chosen to host a straight line label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLabelAdjuster {
    pub midpoint: Vertex,
    pub segment_length: f64,
    /// Degrees, direction of the segment as drawn.
    pub angle: f64,
}
