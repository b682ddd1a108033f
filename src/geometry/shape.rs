use serde::{Deserialize, Serialize};

use super::primitives::{
    BoundingBox, Vertex, point_in_polygon, polyline_length, ring_centroid, ring_signed_area,
};

/// Shape type tag as it appears in the binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellKnownType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl WellKnownType {
    pub fn from_tag(tag: u32) -> Option<Self> {
        // ISO Z/M variants carry the base type in the lowest three digits.
        match tag % 1000 {
            1 => Some(Self::Point),
            2 => Some(Self::LineString),
            3 => Some(Self::Polygon),
            4 => Some(Self::MultiPoint),
            5 => Some(Self::MultiLineString),
            6 => Some(Self::MultiPolygon),
            7 => Some(Self::GeometryCollection),
            _ => None,
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            Self::Point => 1,
            Self::LineString => 2,
            Self::Polygon => 3,
            Self::MultiPoint => 4,
            Self::MultiLineString => 5,
            Self::MultiPolygon => 6,
            Self::GeometryCollection => 7,
        }
    }

    pub fn family(self) -> ShapeFamily {
        match self {
            Self::Point | Self::MultiPoint => ShapeFamily::Point,
            Self::LineString | Self::MultiLineString => ShapeFamily::Line,
            Self::Polygon | Self::MultiPolygon => ShapeFamily::Area,
            Self::GeometryCollection => ShapeFamily::Collection,
        }
    }
}

/// Shape family a drawing call site accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeFamily {
    Point,
    Line,
    Area,
    Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub outer: Vec<Vertex>,
    pub holes: Vec<Vec<Vertex>>,
}

impl Polygon {
    pub fn new(outer: Vec<Vertex>, holes: Vec<Vec<Vertex>>) -> Self {
        Self { outer, holes }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(&self.outer)
    }

    pub fn contains(&self, point: Vertex) -> bool {
        point_in_polygon(point, &self.outer, &self.holes)
    }

    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_signed_area(h).abs()).sum();
        (ring_signed_area(&self.outer).abs() - holes).max(0.0)
    }

    /// Area-weighted centroid of the outer ring; NaN for degenerate rings.
    pub fn centroid(&self) -> Vertex {
        ring_centroid(&self.outer)
    }

    fn map(&self, f: &impl Fn(Vertex) -> Vertex) -> Polygon {
        Polygon {
            outer: self.outer.iter().map(|v| f(*v)).collect(),
            holes: self
                .holes
                .iter()
                .map(|ring| ring.iter().map(|v| f(*v)).collect())
                .collect(),
        }
    }
}

/// A decoded geometry. Coordinates are in whatever space the producer used;
/// the decoder yields world coordinates and [`Shape::map_vertices`] moves a
/// shape to screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Point(Vertex),
    MultiPoint(Vec<Vertex>),
    Line(Vec<Vertex>),
    MultiLine(Vec<Vec<Vertex>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
    Collection(Vec<Shape>),
}

impl Shape {
    pub fn well_known_type(&self) -> WellKnownType {
        match self {
            Shape::Point(_) => WellKnownType::Point,
            Shape::MultiPoint(_) => WellKnownType::MultiPoint,
            Shape::Line(_) => WellKnownType::LineString,
            Shape::MultiLine(_) => WellKnownType::MultiLineString,
            Shape::Polygon(_) => WellKnownType::Polygon,
            Shape::MultiPolygon(_) => WellKnownType::MultiPolygon,
            Shape::Collection(_) => WellKnownType::GeometryCollection,
        }
    }

    pub fn is_linear(&self) -> bool {
        self.well_known_type().family() == ShapeFamily::Line
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Shape::Point(p) => BoundingBox::of(std::slice::from_ref(p)),
            Shape::MultiPoint(points) | Shape::Line(points) => BoundingBox::of(points),
            Shape::MultiLine(lines) => merge_boxes(lines.iter().map(|l| BoundingBox::of(l))),
            Shape::Polygon(polygon) => polygon.bounding_box(),
            Shape::MultiPolygon(polygons) => {
                merge_boxes(polygons.iter().map(Polygon::bounding_box))
            }
            Shape::Collection(shapes) => merge_boxes(shapes.iter().map(Shape::bounding_box)),
        }
    }

    /// Representative point: the point itself, the middle of a line by
    /// length, the centroid of an area (falling back to the first vertex when
    /// the centroid is not finite), or the bounding box centre otherwise.
    pub fn center_point(&self) -> Option<Vertex> {
        match self {
            Shape::Point(p) => Some(*p),
            Shape::Line(points) => {
                super::primitives::point_on_line(points, polyline_length(points) * 0.5)
                    .map(|(p, _)| p)
            }
            Shape::Polygon(polygon) => {
                let c = polygon.centroid();
                if c.is_finite() {
                    Some(c)
                } else {
                    polygon.outer.first().copied()
                }
            }
            _ => self.bounding_box().map(|b| b.center()),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Shape::Line(points) => polyline_length(points),
            Shape::MultiLine(lines) => lines.iter().map(|l| polyline_length(l)).sum(),
            Shape::Collection(shapes) => shapes.iter().map(Shape::length).sum(),
            _ => 0.0,
        }
    }

    pub fn map_vertices(&self, f: &impl Fn(Vertex) -> Vertex) -> Shape {
        match self {
            Shape::Point(p) => Shape::Point(f(*p)),
            Shape::MultiPoint(points) => Shape::MultiPoint(points.iter().map(|v| f(*v)).collect()),
            Shape::Line(points) => Shape::Line(points.iter().map(|v| f(*v)).collect()),
            Shape::MultiLine(lines) => Shape::MultiLine(
                lines
                    .iter()
                    .map(|line| line.iter().map(|v| f(*v)).collect())
                    .collect(),
            ),
            Shape::Polygon(polygon) => Shape::Polygon(polygon.map(f)),
            Shape::MultiPolygon(polygons) => {
                Shape::MultiPolygon(polygons.iter().map(|p| p.map(f)).collect())
            }
            Shape::Collection(shapes) => {
                Shape::Collection(shapes.iter().map(|s| s.map_vertices(f)).collect())
            }
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Shape {
        self.map_vertices(&|v| v.translated(dx, dy))
    }
}

fn merge_boxes(boxes: impl Iterator<Item = Option<BoundingBox>>) -> Option<BoundingBox> {
    boxes
        .flatten()
        .reduce(|acc, bbox| acc.union(&bbox))
}
