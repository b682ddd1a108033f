use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::canvas::{AreaDrawing, DrawingOrder, LabelCanvas, TextDrawing};
use crate::error::{LabelError, Result};
use crate::geometry::{BoundingBox, ScreenTransform, Shape, ShapeFamily, Vertex, wkb};
use crate::labeling::Feature;
use crate::style::{DrawingLevel, Halo, LabelFont};
use crate::text_metrics::{MonospaceMeasurer, TextMeasurer, TextSize};

/// A draw call recorded between begin and end of drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOperation {
    Text {
        text: String,
        font: LabelFont,
        fill: String,
        halo: Option<Halo>,
        /// Text centre in screen pixels, offsets applied.
        position: Vertex,
        rotation: f64,
        level: DrawingLevel,
    },
    Area {
        rings: Vec<Vec<Vertex>>,
        fill: String,
        stroke: String,
        stroke_width: f32,
        level: DrawingLevel,
        order: DrawingOrder,
    },
}

impl DrawOperation {
    pub fn level(&self) -> DrawingLevel {
        match self {
            DrawOperation::Text { level, .. } | DrawOperation::Area { level, .. } => *level,
        }
    }
}

const LEVELS: [DrawingLevel; 5] = [
    DrawingLevel::LevelOne,
    DrawingLevel::LevelTwo,
    DrawingLevel::LevelThree,
    DrawingLevel::LevelFour,
    DrawingLevel::LabelLevel,
];

/// Reference canvas that records draw calls and writes them out as SVG.
///
/// Operations are kept in call order and serialised level by level on
/// [`SvgCanvas::end_drawing`].
pub struct SvgCanvas<M = MonospaceMeasurer> {
    measurer: M,
    width: f64,
    height: f64,
    dpi: f64,
    extent: BoundingBox,
    background: String,
    drawing: bool,
    cancelled: Arc<AtomicBool>,
    operations: Vec<DrawOperation>,
}

impl<M: TextMeasurer> SvgCanvas<M> {
    pub fn new(measurer: M, width: f64, height: f64) -> Self {
        Self {
            measurer,
            width,
            height,
            dpi: 96.0,
            extent: BoundingBox::new(0.0, 0.0, width, height),
            background: "#FFFFFF".to_string(),
            drawing: false,
            cancelled: Arc::new(AtomicBool::new(false)),
            operations: Vec::new(),
        }
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = color.into();
        self
    }

    /// Starts a drawing scope over `extent`, dropping operations from any
    /// earlier scope and resetting cancellation.
    pub fn begin_drawing(&mut self, extent: BoundingBox) {
        self.extent = extent;
        self.operations.clear();
        self.cancelled.store(false, Ordering::Relaxed);
        self.drawing = true;
    }

    /// Ends the drawing scope and returns the SVG document.
    pub fn end_drawing(&mut self) -> String {
        self.drawing = false;
        self.to_svg()
    }

    /// Flag another thread can set to stop a long pass between features.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn operations(&self) -> &[DrawOperation] {
        &self.operations
    }

    pub fn text_operations(&self) -> impl Iterator<Item = &DrawOperation> {
        self.operations
            .iter()
            .filter(|op| matches!(op, DrawOperation::Text { .. }))
    }

    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }

    /// Draws an area feature. Anything but a polygon or multipolygon is
    /// refused before its coordinates are read.
    pub fn draw_area_feature(
        &mut self,
        feature: &Feature,
        fill: &str,
        stroke: &str,
        stroke_width: f32,
        level: DrawingLevel,
    ) -> Result<()> {
        if !self.drawing {
            return Err(LabelError::NotDrawing);
        }
        let shape = wkb::decode_as(&feature.geometry, ShapeFamily::Area)?;
        let transform = ScreenTransform::from_canvas(&*self);
        let polygons = match transform.shape_to_screen(&shape) {
            Shape::Polygon(polygon) => vec![polygon],
            Shape::MultiPolygon(polygons) => polygons,
            _ => Vec::new(),
        };
        for polygon in polygons {
            let mut rings = Vec::with_capacity(polygon.holes.len() + 1);
            rings.push(polygon.outer);
            rings.extend(polygon.holes);
            self.draw_area(AreaDrawing {
                rings: &rings,
                fill,
                stroke,
                stroke_width,
                level,
                x_offset: 0.0,
                y_offset: 0.0,
                order: DrawingOrder::BrushFirst,
            });
        }
        Ok(())
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let (width, height) = (self.width, self.height);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&self.background)
        ));
        for level in LEVELS {
            for op in self.operations.iter().filter(|op| op.level() == level) {
                match op {
                    DrawOperation::Area {
                        rings,
                        fill,
                        stroke,
                        stroke_width,
                        order,
                        ..
                    } => svg.push_str(&area_svg(rings, fill, stroke, *stroke_width, *order)),
                    DrawOperation::Text {
                        text,
                        font,
                        fill,
                        halo,
                        position,
                        rotation,
                        ..
                    } => svg.push_str(&text_svg(text, font, fill, halo.as_ref(), *position, *rotation)),
                }
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

impl<M: TextMeasurer> LabelCanvas for SvgCanvas<M> {
    fn measure_text(&mut self, text: &str, font: &LabelFont) -> TextSize {
        self.measurer.measure(text, font)
    }

    fn draw_text(&mut self, drawing: TextDrawing<'_>) {
        for position in drawing.positions {
            self.operations.push(DrawOperation::Text {
                text: drawing.text.to_string(),
                font: drawing.font.clone(),
                fill: drawing.fill.to_string(),
                halo: drawing.halo.cloned(),
                position: position.translated(drawing.x_offset, -drawing.y_offset),
                rotation: drawing.rotation,
                level: drawing.level,
            });
        }
    }

    fn draw_area(&mut self, drawing: AreaDrawing<'_>) {
        let rings = drawing
            .rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|v| v.translated(drawing.x_offset, -drawing.y_offset))
                    .collect()
            })
            .collect();
        self.operations.push(DrawOperation::Area {
            rings,
            fill: drawing.fill.to_string(),
            stroke: drawing.stroke.to_string(),
            stroke_width: drawing.stroke_width,
            level: drawing.level,
            order: drawing.order,
        });
    }

    fn current_world_extent(&self) -> BoundingBox {
        self.extent
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn dpi(&self) -> f64 {
        self.dpi
    }

    fn is_drawing(&self) -> bool {
        self.drawing
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

fn area_svg(
    rings: &[Vec<Vertex>],
    fill: &str,
    stroke: &str,
    stroke_width: f32,
    order: DrawingOrder,
) -> String {
    let mut d = String::new();
    for ring in rings {
        for (idx, v) in ring.iter().enumerate() {
            let cmd = if idx == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{cmd}{:.2},{:.2} ", v.x, v.y));
        }
        d.push('Z');
    }
    let paint_order = match order {
        DrawingOrder::BrushFirst => "fill",
        DrawingOrder::PenFirst => "stroke",
    };
    format!(
        "<path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"{}\" stroke-width=\"{}\" paint-order=\"{paint_order}\"/>",
        d.trim_end(),
        escape_xml(fill),
        escape_xml(stroke),
        stroke_width
    )
}

fn text_svg(
    text: &str,
    font: &LabelFont,
    fill: &str,
    halo: Option<&Halo>,
    position: Vertex,
    rotation: f64,
) -> String {
    let (x, y) = (position.x, position.y);
    let mut attrs = format!(
        "x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"",
        escape_xml(&font.family),
        font.size,
        escape_xml(fill)
    );
    if font.bold {
        attrs.push_str(" font-weight=\"bold\"");
    }
    if font.italic {
        attrs.push_str(" font-style=\"italic\"");
    }
    if let Some(halo) = halo {
        attrs.push_str(&format!(
            " stroke=\"{}\" stroke-width=\"{}\" paint-order=\"stroke\"",
            escape_xml(&halo.color),
            halo.width
        ));
    }
    if rotation != 0.0 {
        attrs.push_str(&format!(" transform=\"rotate({rotation:.2} {x:.2} {y:.2})\""));
    }
    format!("<text {attrs}>{}</text>", escape_xml(text))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
