use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFont {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl LabelFont {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }

    /// Stable key used by measurement caches.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.family.trim(),
            self.size,
            self.bold,
            self.italic
        )
    }
}

impl Default for LabelFont {
    fn default() -> Self {
        Self::new("Arial, Helvetica, sans-serif", 10.0)
    }
}

/// Outline drawn around glyphs to keep labels legible on busy maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Halo {
    pub color: String,
    pub width: f32,
}

/// Filled shape drawn behind a label using its collision polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f32,
    /// Pixels the collision polygon is grown by on every side.
    pub margin: f64,
}

impl Default for Mask {
    fn default() -> Self {
        Self {
            fill: "#FFFFFF".to_string(),
            stroke: "#333333".to_string(),
            stroke_width: 1.0,
            margin: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrawingLevel {
    LevelOne,
    LevelTwo,
    LevelThree,
    LevelFour,
    #[default]
    LabelLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: LabelFont,
    pub fill: String,
    pub halo: Option<Halo>,
    pub mask: Option<Mask>,
    pub level: DrawingLevel,
    /// Horizontal pixel offset; positive moves right.
    pub x_offset: f64,
    /// Vertical pixel offset; positive moves up.
    pub y_offset: f64,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self {
            font: LabelFont::default(),
            fill: "#000000".to_string(),
            halo: None,
            mask: None,
            level: DrawingLevel::LabelLevel,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    pub fn haloed() -> Self {
        Self {
            halo: Some(Halo {
                color: "#FFFFFF".to_string(),
                width: 2.0,
            }),
            ..Self::plain()
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::plain()
    }
}
