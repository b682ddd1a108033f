use std::collections::BTreeMap;

use crate::error::Result;
use crate::geometry::{ByteOrder, Shape, wkb};

/// Identity, encoded geometry and attribute columns of a map feature.
///
/// The geometry stays encoded until a draw pass decodes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub geometry: Vec<u8>,
    pub columns: BTreeMap<String, String>,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            geometry,
            columns: BTreeMap::new(),
        }
    }

    pub fn from_shape(id: impl Into<String>, shape: &Shape) -> Self {
        Self::new(id, wkb::encode(shape, ByteOrder::LittleEndian))
    }

    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }

    /// Decodes the geometry in world coordinates.
    pub fn shape(&self) -> Result<Shape> {
        wkb::decode(&self.geometry)
    }
}
