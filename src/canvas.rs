//! Contract between the label engine and a rendering backend.
//!
//! The engine only measures text, draws text runs and mask areas, and reads
//! the view state. Everything is queried fresh on every draw pass.

use crate::geometry::{BoundingBox, Vertex};
use crate::style::{DrawingLevel, Halo, LabelFont};
use crate::text_metrics::TextSize;

/// One text run to draw. Positions are text centres in screen pixels.
#[derive(Debug, Clone, Copy)]
pub struct TextDrawing<'a> {
    pub text: &'a str,
    pub font: &'a LabelFont,
    pub fill: &'a str,
    pub halo: Option<&'a Halo>,
    pub positions: &'a [Vertex],
    pub level: DrawingLevel,
    pub x_offset: f64,
    pub y_offset: f64,
    /// Degrees, clockwise on screen.
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingOrder {
    #[default]
    BrushFirst,
    PenFirst,
}

/// A filled area in screen pixels; the first ring is the outer boundary.
#[derive(Debug, Clone, Copy)]
pub struct AreaDrawing<'a> {
    pub rings: &'a [Vec<Vertex>],
    pub fill: &'a str,
    pub stroke: &'a str,
    pub stroke_width: f32,
    pub level: DrawingLevel,
    pub x_offset: f64,
    pub y_offset: f64,
    pub order: DrawingOrder,
}

pub trait LabelCanvas {
    /// Must be deterministic for identical text and font within a pass.
    fn measure_text(&mut self, text: &str, font: &LabelFont) -> TextSize;

    fn draw_text(&mut self, drawing: TextDrawing<'_>);

    fn draw_area(&mut self, drawing: AreaDrawing<'_>);

    fn current_world_extent(&self) -> BoundingBox;

    fn width(&self) -> f64;

    fn height(&self) -> f64;

    fn dpi(&self) -> f64 {
        96.0
    }

    /// True between begin-drawing and end-drawing.
    fn is_drawing(&self) -> bool;

    /// Checked between features; a long pass stops early once this is set.
    fn is_cancelled(&self) -> bool {
        false
    }
}
