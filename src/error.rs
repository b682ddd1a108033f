use thiserror::Error;

use crate::geometry::{ShapeFamily, WellKnownType};

pub type Result<T> = std::result::Result<T, LabelError>;

/// Failures surfaced to the caller of the label engine.
///
/// Geometry that merely fails to produce a good label (zero-length lines,
/// degenerate centroids) is recovered locally and never shows up here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LabelError {
    #[error("unknown shape type tag {0}")]
    UnknownShapeType(u32),

    #[error("expected {expected:?} geometry, found {found:?}")]
    UnexpectedShapeType {
        expected: ShapeFamily,
        found: WellKnownType,
    },

    #[error("invalid byte order marker {0}")]
    InvalidByteOrder(u8),

    #[error("unexpected end of buffer at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEndOfBuffer { offset: usize, needed: usize },

    #[error("geometry nested deeper than {limit} levels at offset {offset}")]
    NestingTooDeep { offset: usize, limit: usize },

    #[error("{0} trailing bytes after geometry")]
    TrailingBytes(usize),

    #[error("label placement requested outside of a drawing scope")]
    NotDrawing,

    #[error("cannot format {value:?} with numeric pattern {pattern:?}")]
    NumericFormat { value: String, pattern: String },

    #[error("cannot format {value:?} with date pattern {pattern:?}")]
    DateFormat { value: String, pattern: String },
}
