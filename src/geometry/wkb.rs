//! Minimal well-known-binary codec.
//!
//! Every geometry starts with a byte-order marker (`0` big endian, `1` little
//! endian) and a `u32` type tag, followed by the coordinate stream. Members of
//! multi-geometries and collections carry their own header. ISO Z/M tags
//! (`1001`, `2002`, ...) are accepted; the extra ordinates are skipped.

use serde::{Deserialize, Serialize};

use super::primitives::Vertex;
use super::shape::{Polygon, Shape, ShapeFamily, WellKnownType};
use super::transform::ScreenTransform;
use crate::error::{LabelError, Result};

/// Deepest member nesting the decoder follows before giving up.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            0 => Ok(ByteOrder::BigEndian),
            1 => Ok(ByteOrder::LittleEndian),
            other => Err(LabelError::InvalidByteOrder(other)),
        }
    }

    fn marker(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }
}

/// Decodes exactly one geometry in world coordinates.
pub fn decode(bytes: &[u8]) -> Result<Shape> {
    let mut reader = Reader::new(bytes);
    let shape = reader.read_geometry()?;
    reader.finish()?;
    Ok(shape)
}

/// Reads only the header of the outermost geometry.
pub fn peek_type(bytes: &[u8]) -> Result<WellKnownType> {
    let mut reader = Reader::new(bytes);
    let (_, wkt, _) = reader.read_header()?;
    Ok(wkt)
}

/// Decodes a geometry for a call site that only draws one shape family.
/// A mismatching tag fails before any coordinates are read.
pub fn decode_as(bytes: &[u8], expected: ShapeFamily) -> Result<Shape> {
    let found = peek_type(bytes)?;
    if found.family() != expected {
        return Err(LabelError::UnexpectedShapeType { expected, found });
    }
    decode(bytes)
}

/// Decodes a geometry straight into screen coordinates.
pub fn decode_to_screen(bytes: &[u8], transform: &ScreenTransform) -> Result<Shape> {
    decode(bytes).map(|shape| transform.shape_to_screen(&shape))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let Some(slice) = self.bytes.get(self.pos..end) else {
            return Err(LabelError::UnexpectedEndOfBuffer {
                offset: self.pos,
                needed: end - self.bytes.len(),
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn read_u32(&mut self, order: ByteOrder) -> Result<u32> {
        let raw = self.take::<4>()?;
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
        })
    }

    fn read_f64(&mut self, order: ByteOrder) -> Result<f64> {
        let raw = self.take::<8>()?;
        Ok(match order {
            ByteOrder::BigEndian => f64::from_be_bytes(raw),
            ByteOrder::LittleEndian => f64::from_le_bytes(raw),
        })
    }

    /// Byte order, shape type and number of ordinates per vertex.
    fn read_header(&mut self) -> Result<(ByteOrder, WellKnownType, usize)> {
        let order = ByteOrder::from_marker(self.read_u8()?)?;
        let tag = self.read_u32(order)?;
        let wkt = WellKnownType::from_tag(tag).ok_or(LabelError::UnknownShapeType(tag))?;
        let dims = match tag / 1000 {
            0 => 2,
            1 | 2 => 3,
            3 => 4,
            _ => return Err(LabelError::UnknownShapeType(tag)),
        };
        Ok((order, wkt, dims))
    }

    fn read_vertex(&mut self, order: ByteOrder, dims: usize) -> Result<Vertex> {
        let x = self.read_f64(order)?;
        let y = self.read_f64(order)?;
        for _ in 2..dims {
            self.read_f64(order)?;
        }
        Ok(Vertex::new(x, y))
    }

    fn read_count(&mut self, order: ByteOrder, min_item_size: usize) -> Result<usize> {
        let count = self.read_u32(order)? as usize;
        // Refuse counts that cannot possibly fit before allocating for them.
        let remaining = self.bytes.len().saturating_sub(self.pos);
        if count.saturating_mul(min_item_size) > remaining {
            return Err(LabelError::UnexpectedEndOfBuffer {
                offset: self.pos,
                needed: count.saturating_mul(min_item_size) - remaining,
            });
        }
        Ok(count)
    }

    fn read_points(&mut self, order: ByteOrder, dims: usize) -> Result<Vec<Vertex>> {
        let count = self.read_count(order, dims * 8)?;
        (0..count).map(|_| self.read_vertex(order, dims)).collect()
    }

    fn read_polygon_body(&mut self, order: ByteOrder, dims: usize) -> Result<Polygon> {
        let ring_count = self.read_count(order, 4)?;
        let mut rings = Vec::with_capacity(ring_count);
        for _ in 0..ring_count {
            rings.push(self.read_points(order, dims)?);
        }
        let mut rings = rings.into_iter();
        let outer = rings.next().unwrap_or_default();
        Ok(Polygon::new(outer, rings.collect()))
    }

    fn read_geometry(&mut self) -> Result<Shape> {
        if self.depth > MAX_NESTING_DEPTH {
            return Err(LabelError::NestingTooDeep {
                offset: self.pos,
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let shape = self.read_geometry_body();
        self.depth -= 1;
        shape
    }

    fn read_geometry_body(&mut self) -> Result<Shape> {
        let (order, wkt, dims) = self.read_header()?;
        match wkt {
            WellKnownType::Point => Ok(Shape::Point(self.read_vertex(order, dims)?)),
            WellKnownType::LineString => Ok(Shape::Line(self.read_points(order, dims)?)),
            WellKnownType::Polygon => Ok(Shape::Polygon(self.read_polygon_body(order, dims)?)),
            WellKnownType::MultiPoint => {
                let count = self.read_count(order, 5)?;
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    points.push(self.read_member(WellKnownType::Point, |s| match s {
                        Shape::Point(p) => Some(p),
                        _ => None,
                    })?);
                }
                Ok(Shape::MultiPoint(points))
            }
            WellKnownType::MultiLineString => {
                let count = self.read_count(order, 9)?;
                let mut lines = Vec::with_capacity(count);
                for _ in 0..count {
                    lines.push(self.read_member(WellKnownType::LineString, |s| match s {
                        Shape::Line(l) => Some(l),
                        _ => None,
                    })?);
                }
                Ok(Shape::MultiLine(lines))
            }
            WellKnownType::MultiPolygon => {
                let count = self.read_count(order, 9)?;
                let mut polygons = Vec::with_capacity(count);
                for _ in 0..count {
                    polygons.push(self.read_member(WellKnownType::Polygon, |s| match s {
                        Shape::Polygon(p) => Some(p),
                        _ => None,
                    })?);
                }
                Ok(Shape::MultiPolygon(polygons))
            }
            WellKnownType::GeometryCollection => {
                let count = self.read_count(order, 5)?;
                let mut shapes = Vec::with_capacity(count);
                for _ in 0..count {
                    shapes.push(self.read_geometry()?);
                }
                Ok(Shape::Collection(shapes))
            }
        }
    }

    /// Reads a multi-geometry member and insists on its declared type.
    fn read_member<T>(
        &mut self,
        expected: WellKnownType,
        extract: impl FnOnce(Shape) -> Option<T>,
    ) -> Result<T> {
        let shape = self.read_geometry()?;
        let found = shape.well_known_type();
        extract(shape).ok_or(LabelError::UnexpectedShapeType {
            expected: expected.family(),
            found,
        })
    }

    fn finish(&self) -> Result<()> {
        let trailing = self.bytes.len() - self.pos;
        if trailing > 0 {
            return Err(LabelError::TrailingBytes(trailing));
        }
        Ok(())
    }
}

/// Encodes a shape as 2D well-known binary.
pub fn encode(shape: &Shape, order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::new();
    Writer { out: &mut out, order }.write_geometry(shape);
    out
}

struct Writer<'a> {
    out: &'a mut Vec<u8>,
    order: ByteOrder,
}

impl Writer<'_> {
    fn write_u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::BigEndian => self.out.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn write_f64(&mut self, value: f64) {
        match self.order {
            ByteOrder::BigEndian => self.out.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn write_header(&mut self, wkt: WellKnownType) {
        self.out.push(self.order.marker());
        self.write_u32(wkt.tag());
    }

    fn write_points(&mut self, points: &[Vertex]) {
        self.write_u32(points.len() as u32);
        for p in points {
            self.write_f64(p.x);
            self.write_f64(p.y);
        }
    }

    fn write_polygon(&mut self, polygon: &Polygon) {
        self.write_header(WellKnownType::Polygon);
        self.write_u32(1 + polygon.holes.len() as u32);
        self.write_points(&polygon.outer);
        for hole in &polygon.holes {
            self.write_points(hole);
        }
    }

    fn write_geometry(&mut self, shape: &Shape) {
        match shape {
            Shape::Point(p) => {
                self.write_header(WellKnownType::Point);
                self.write_f64(p.x);
                self.write_f64(p.y);
            }
            Shape::Line(points) => {
                self.write_header(WellKnownType::LineString);
                self.write_points(points);
            }
            Shape::Polygon(polygon) => self.write_polygon(polygon),
            Shape::MultiPoint(points) => {
                self.write_header(WellKnownType::MultiPoint);
                self.write_u32(points.len() as u32);
                for p in points {
                    self.write_geometry(&Shape::Point(*p));
                }
            }
            Shape::MultiLine(lines) => {
                self.write_header(WellKnownType::MultiLineString);
                self.write_u32(lines.len() as u32);
                for line in lines {
                    self.write_header(WellKnownType::LineString);
                    self.write_points(line);
                }
            }
            Shape::MultiPolygon(polygons) => {
                self.write_header(WellKnownType::MultiPolygon);
                self.write_u32(polygons.len() as u32);
                for polygon in polygons {
                    self.write_polygon(polygon);
                }
            }
            Shape::Collection(shapes) => {
                self.write_header(WellKnownType::GeometryCollection);
                self.write_u32(shapes.len() as u32);
                for member in shapes {
                    self.write_geometry(member);
                }
            }
        }
    }
}
