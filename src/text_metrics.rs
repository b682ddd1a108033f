// Text measurement used by canvases to size label boxes. Every measurer must
// return identical sizes for identical (text, font) pairs within a pass.

use serde::{Deserialize, Serialize};

use crate::style::LabelFont;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSize {
    pub width: f64,
    pub height: f64,
}

impl TextSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub trait TextMeasurer {
    fn measure(&mut self, text: &str, font: &LabelFont) -> TextSize;
}

/// Fixed advance per character and fixed line height, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub char_width: f64,
    pub line_height: f64,
}

impl MonospaceMeasurer {
    pub fn new(char_width: f64, line_height: f64) -> Self {
        Self {
            char_width,
            line_height,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&mut self, text: &str, _font: &LabelFont) -> TextSize {
        if text.is_empty() {
            return TextSize::default();
        }
        let widest = text
            .split('\n')
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let lines = text.split('\n').count().max(1);
        TextSize::new(
            widest as f64 * self.char_width,
            lines as f64 * self.line_height,
        )
    }
}

/// Proportional approximation from calibrated per-character widths. Used on
/// its own when no font files are available and as the fallback for glyphs a
/// loaded face does not cover.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ApproximateMeasurer;

impl TextMeasurer for ApproximateMeasurer {
    fn measure(&mut self, text: &str, font: &LabelFont) -> TextSize {
        let size = font.size.max(0.0) as f64;
        if text.is_empty() {
            return TextSize::default();
        }
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| approximate_width(line, size))
            .fold(0.0, f64::max);
        TextSize::new(width, lines.len() as f64 * line_height(size))
    }
}

fn line_height(font_size: f64) -> f64 {
    font_size * 1.2
}

pub fn approximate_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(char_width_factor).sum::<f64>() * font_size
}

fn char_width_factor(ch: char) -> f64 {
    // Widths relative to the font size for a typical sans-serif face.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'I' | 'i' | 'j' | 'l' => 0.24,
        'f' | 't' | 'r' => 0.34,
        'M' | 'W' | 'm' | 'w' => 0.88,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        '0'..='9' => 0.6,
        '@' | '#' | '%' | '&' => 0.946,
        _ => 0.568,
    }
}

#[cfg(feature = "system-fonts")]
pub use system::FontMeasurer;

#[cfg(feature = "system-fonts")]
mod system {
    use std::collections::HashMap;

    use fontdb::{Database, Family, Query, Stretch, Style, Weight};
    use ttf_parser::Face;

    use super::{TextMeasurer, TextSize, approximate_width, char_width_factor, line_height};
    use crate::style::LabelFont;

    /// Measures with the advances of installed system fonts.
    ///
    /// Loaded faces are cached per family/weight/style. The cache belongs to
    /// the caller; call [`FontMeasurer::clear`] when fonts change.
    pub struct FontMeasurer {
        db: Database,
        loaded_system_fonts: bool,
        faces: HashMap<String, Option<FontFace>>,
    }

    impl Default for FontMeasurer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FontMeasurer {
        pub fn new() -> Self {
            Self {
                db: Database::new(),
                loaded_system_fonts: false,
                faces: HashMap::new(),
            }
        }

        /// Uses only the given font data instead of scanning the system.
        pub fn with_font_data(data: Vec<u8>) -> Self {
            let mut db = Database::new();
            db.load_font_data(data);
            Self {
                db,
                loaded_system_fonts: true,
                faces: HashMap::new(),
            }
        }

        pub fn clear(&mut self) {
            self.faces.clear();
        }

        fn face_for(&mut self, font: &LabelFont) -> Option<&mut FontFace> {
            let key = font.cache_key();
            if !self.faces.contains_key(&key) {
                let face = self.load_face(font);
                self.faces.insert(key.clone(), face);
            }
            self.faces.get_mut(&key).and_then(|face| face.as_mut())
        }

        fn load_face(&mut self, font: &LabelFont) -> Option<FontFace> {
            let mut names: Vec<String> = Vec::new();
            let mut generics: Vec<Option<Family<'static>>> = Vec::new();
            for part in font.family.split(',') {
                let raw = part.trim().trim_matches('"').trim_matches('\'');
                if raw.is_empty() {
                    continue;
                }
                match raw.to_ascii_lowercase().as_str() {
                    "serif" => generics.push(Some(Family::Serif)),
                    "sans-serif" | "system-ui" => generics.push(Some(Family::SansSerif)),
                    "monospace" => generics.push(Some(Family::Monospace)),
                    _ => {
                        names.push(raw.to_string());
                        generics.push(None);
                    }
                }
            }
            let mut families: Vec<Family<'_>> = Vec::with_capacity(generics.len() + 1);
            let mut named = names.iter();
            for generic in generics {
                match generic {
                    Some(family) => families.push(family),
                    None => {
                        if let Some(name) = named.next() {
                            families.push(Family::Name(name.as_str()));
                        }
                    }
                }
            }
            if families.is_empty() {
                families.push(Family::SansSerif);
            }

            if !self.loaded_system_fonts {
                self.db.load_system_fonts();
                self.loaded_system_fonts = true;
            }

            let query = Query {
                families: &families,
                weight: if font.bold {
                    Weight::BOLD
                } else {
                    Weight::NORMAL
                },
                stretch: Stretch::Normal,
                style: if font.italic {
                    Style::Italic
                } else {
                    Style::Normal
                },
            };
            let id = self.db.query(&query)?;
            self.db
                .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
                .flatten()
        }
    }

    impl TextMeasurer for FontMeasurer {
        fn measure(&mut self, text: &str, font: &LabelFont) -> TextSize {
            let size = font.size.max(0.0) as f64;
            if text.is_empty() || size <= 0.0 {
                return TextSize::default();
            }
            let lines: Vec<&str> = text.split('\n').collect();
            let Some(face) = self.face_for(font) else {
                let width = lines
                    .iter()
                    .map(|line| approximate_width(line, size))
                    .fold(0.0, f64::max);
                return TextSize::new(width, lines.len() as f64 * line_height(size));
            };
            let width = lines
                .iter()
                .map(|line| face.measure_width(line, size))
                .fold(0.0, f64::max);
            TextSize::new(width, lines.len() as f64 * face.line_height(size))
        }
    }

    struct FontFace {
        data: Vec<u8>,
        index: u32,
        units_per_em: u16,
        ascender: i16,
        descender: i16,
        ascii_advances: [u16; 128],
        advance_cache: HashMap<char, Option<u16>>,
    }

    impl FontFace {
        fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
            let face = Face::parse(&data, index).ok()?;
            let mut ascii_advances = [0u16; 128];
            for byte in 0u8..=127 {
                if let Some(glyph_id) = face.glyph_index(byte as char) {
                    ascii_advances[byte as usize] = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                }
            }
            let units_per_em = face.units_per_em().max(1);
            let ascender = face.ascender();
            let descender = face.descender();
            Some(Self {
                data,
                index,
                units_per_em,
                ascender,
                descender,
                ascii_advances,
                advance_cache: HashMap::new(),
            })
        }

        fn line_height(&self, font_size: f64) -> f64 {
            let span = (self.ascender as f64 - self.descender as f64).max(0.0);
            if span <= 0.0 {
                return line_height(font_size);
            }
            span * font_size / self.units_per_em as f64
        }

        fn advance(&mut self, ch: char) -> Option<u16> {
            if ch.is_ascii() {
                let advance = self.ascii_advances[ch as usize];
                return (advance > 0).then_some(advance);
            }
            if let Some(cached) = self.advance_cache.get(&ch) {
                return *cached;
            }
            let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            self.advance_cache.insert(ch, advance);
            advance
        }

        fn measure_width(&mut self, text: &str, font_size: f64) -> f64 {
            let scale = font_size / self.units_per_em as f64;
            let mut width = 0.0f64;
            for ch in text.chars() {
                match self.advance(ch) {
                    Some(advance) => width += advance as f64 * scale,
                    None => width += char_width_factor(ch) * font_size,
                }
            }
            width.max(0.0)
        }
    }
}
