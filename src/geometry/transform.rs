use super::primitives::{BoundingBox, Vertex};
use super::shape::Shape;
use crate::canvas::LabelCanvas;

/// World-to-screen mapping for one draw pass.
///
/// Built from the canvas at the start of every pass and dropped at its end;
/// the engine never keeps one across passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    extent: BoundingBox,
    width: f64,
    height: f64,
    dpi: f64,
}

impl ScreenTransform {
    pub fn new(extent: BoundingBox, width: f64, height: f64, dpi: f64) -> Self {
        Self {
            extent,
            width,
            height,
            dpi,
        }
    }

    pub fn from_canvas(canvas: &dyn LabelCanvas) -> Self {
        Self::new(
            canvas.current_world_extent(),
            canvas.width(),
            canvas.height(),
            canvas.dpi(),
        )
    }

    pub fn extent(&self) -> BoundingBox {
        self.extent
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// The canvas rectangle in screen pixels.
    pub fn screen_bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }

    pub fn screen_center(&self) -> Vertex {
        Vertex::new(self.width * 0.5, self.height * 0.5)
    }

    /// World units covered by one screen pixel along x.
    pub fn world_per_pixel(&self) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        self.extent.width() / self.width
    }

    pub fn world_to_screen(&self, world: Vertex) -> Vertex {
        let ext_w = self.extent.width();
        let ext_h = self.extent.height();
        let x = if ext_w == 0.0 {
            0.0
        } else {
            (world.x - self.extent.min_x) * self.width / ext_w
        };
        let y = if ext_h == 0.0 {
            0.0
        } else {
            (self.extent.max_y - world.y) * self.height / ext_h
        };
        Vertex::new(x, y)
    }

    pub fn screen_to_world(&self, screen: Vertex) -> Vertex {
        let x = if self.width == 0.0 {
            self.extent.min_x
        } else {
            self.extent.min_x + screen.x * self.extent.width() / self.width
        };
        let y = if self.height == 0.0 {
            self.extent.max_y
        } else {
            self.extent.max_y - screen.y * self.extent.height() / self.height
        };
        Vertex::new(x, y)
    }

    pub fn shape_to_screen(&self, shape: &Shape) -> Shape {
        shape.map_vertices(&|v| self.world_to_screen(v))
    }
}
