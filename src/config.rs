use crate::style::{DrawingLevel, Halo, LabelFont, Mask, TextStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PointPlacement {
    UpperLeft,
    #[default]
    UpperCenter,
    UpperRight,
    CenterLeft,
    Center,
    CenterRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

impl PointPlacement {
    /// Placements tried, in order, when this one collides. Corners flip
    /// horizontally, then vertically, then both; axis placements flip to the
    /// opposite side and then try the perpendicular axis.
    pub fn alternates(self) -> [PointPlacement; 3] {
        use PointPlacement::*;
        match self {
            UpperRight => [UpperLeft, LowerRight, LowerLeft],
            UpperLeft => [UpperRight, LowerLeft, LowerRight],
            LowerRight => [LowerLeft, UpperRight, UpperLeft],
            LowerLeft => [LowerRight, UpperLeft, UpperRight],
            CenterRight => [CenterLeft, UpperCenter, LowerCenter],
            CenterLeft => [CenterRight, UpperCenter, LowerCenter],
            UpperCenter => [LowerCenter, CenterRight, CenterLeft],
            LowerCenter => [UpperCenter, CenterRight, CenterLeft],
            Center => [Center, Center, Center],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DuplicateRule {
    #[serde(alias = "None")]
    UnlimitedDuplicates,
    #[default]
    NoDuplicates,
    OneDuplicatePerQuadrant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OverlappingRule {
    #[default]
    NoOverlapping,
    Unlimited,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SplineType {
    #[default]
    #[serde(alias = "None")]
    Off,
    /// Spline only labels longer than the longest segment.
    Standard,
    /// Spline every label that fits along its line.
    Force,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PolygonLabelingLocation {
    #[default]
    Centroid,
    BoundingBoxCenter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PolygonParts {
    #[default]
    LargestOnly,
    AllParts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelingConfig {
    /// Column name, or a template such as `"[name] ([ref])"`.
    pub text_column: String,
    pub numeric_format: Option<String>,
    pub date_format: Option<String>,
    pub point_placement: PointPlacement,
    /// Degrees, clockwise on screen.
    pub rotation_angle: f64,
    pub best_placement: bool,
    pub duplicate_rule: DuplicateRule,
    pub overlapping_rule: OverlappingRule,
    /// Grid cell size in pixels for thinning line labels; 0 disables it.
    pub grid_size: f64,
    pub force_horizontal_for_line: bool,
    pub spline_type: SplineType,
    pub text_line_segment_ratio: f64,
    pub clip_lines_to_extent: bool,
    pub label_all_line_parts: bool,
    pub polygon_labeling_location: PolygonLabelingLocation,
    pub polygon_parts: PolygonParts,
    pub allow_line_carriage: bool,
    pub fitting_polygon: bool,
    pub suppress_outside_canvas: bool,
    pub line_spacing: f64,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            text_column: String::new(),
            numeric_format: None,
            date_format: None,
            point_placement: PointPlacement::UpperCenter,
            rotation_angle: 0.0,
            best_placement: false,
            duplicate_rule: DuplicateRule::NoDuplicates,
            overlapping_rule: OverlappingRule::NoOverlapping,
            grid_size: 100.0,
            force_horizontal_for_line: false,
            spline_type: SplineType::Off,
            text_line_segment_ratio: 1.5,
            clip_lines_to_extent: true,
            label_all_line_parts: false,
            polygon_labeling_location: PolygonLabelingLocation::Centroid,
            polygon_parts: PolygonParts::LargestOnly,
            allow_line_carriage: false,
            fitting_polygon: false,
            suppress_outside_canvas: true,
            line_spacing: 1.0,
        }
    }
}

/// A label style and the styles stacked on top of it. Stacked styles are
/// drawn after their parent, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LabelStyleConfig {
    pub text: TextStyle,
    pub labeling: LabelingConfig,
    pub stacked: Vec<LabelStyleConfig>,
}

impl LabelStyleConfig {
    pub fn new(text_column: impl Into<String>) -> Self {
        Self {
            labeling: LabelingConfig {
                text_column: text_column.into(),
                ..LabelingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Parses a JSON style document; keys override the defaults they name.
    pub fn from_json_str(contents: &str) -> anyhow::Result<Self> {
        let parsed: LabelStyleFile = serde_json::from_str(contents)?;
        Ok(parsed.into_config(&LabelStyleConfig::default()))
    }

    pub fn from_json5_str(contents: &str) -> anyhow::Result<Self> {
        let parsed: LabelStyleFile = json5::from_str(contents)?;
        Ok(parsed.into_config(&LabelStyleConfig::default()))
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LabelStyleConfig> {
    let Some(path) = path else {
        return Ok(LabelStyleConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let is_json5 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json5"));
    if is_json5 {
        LabelStyleConfig::from_json5_str(&contents)
    } else {
        LabelStyleConfig::from_json_str(&contents)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FontFile {
    family: Option<String>,
    size: Option<f32>,
    bold: Option<bool>,
    italic: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HaloFile {
    color: Option<String>,
    width: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MaskFile {
    fill: Option<String>,
    stroke: Option<String>,
    stroke_width: Option<f32>,
    margin: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LabelStyleFile {
    text_column: Option<String>,
    numeric_format: Option<String>,
    date_format: Option<String>,
    point_placement: Option<PointPlacement>,
    rotation_angle: Option<f64>,
    best_placement: Option<bool>,
    duplicate_rule: Option<DuplicateRule>,
    overlapping_rule: Option<OverlappingRule>,
    grid_size: Option<f64>,
    force_horizontal_for_line: Option<bool>,
    spline_type: Option<SplineType>,
    text_line_segment_ratio: Option<f64>,
    clip_lines_to_extent: Option<bool>,
    label_all_line_parts: Option<bool>,
    polygon_labeling_location: Option<PolygonLabelingLocation>,
    polygon_parts: Option<PolygonParts>,
    allow_line_carriage: Option<bool>,
    fitting_polygon: Option<bool>,
    suppress_outside_canvas: Option<bool>,
    line_spacing: Option<f64>,
    font: Option<FontFile>,
    fill: Option<String>,
    halo: Option<HaloFile>,
    mask: Option<MaskFile>,
    level: Option<DrawingLevel>,
    x_offset: Option<f64>,
    y_offset: Option<f64>,
    stacked: Option<Vec<LabelStyleFile>>,
}

impl LabelStyleFile {
    /// Applies the keys present in the file on top of `base`. Stacked styles
    /// start from the merged parent, minus its own stacked list.
    fn into_config(self, base: &LabelStyleConfig) -> LabelStyleConfig {
        let mut config = LabelStyleConfig {
            stacked: Vec::new(),
            ..base.clone()
        };
        let labeling = &mut config.labeling;
        if let Some(v) = self.text_column {
            labeling.text_column = v;
        }
        if let Some(v) = self.numeric_format {
            labeling.numeric_format = Some(v);
        }
        if let Some(v) = self.date_format {
            labeling.date_format = Some(v);
        }
        if let Some(v) = self.point_placement {
            labeling.point_placement = v;
        }
        if let Some(v) = self.rotation_angle {
            labeling.rotation_angle = v;
        }
        if let Some(v) = self.best_placement {
            labeling.best_placement = v;
        }
        if let Some(v) = self.duplicate_rule {
            labeling.duplicate_rule = v;
        }
        if let Some(v) = self.overlapping_rule {
            labeling.overlapping_rule = v;
        }
        if let Some(v) = self.grid_size {
            labeling.grid_size = v.max(0.0);
        }
        if let Some(v) = self.force_horizontal_for_line {
            labeling.force_horizontal_for_line = v;
        }
        if let Some(v) = self.spline_type {
            labeling.spline_type = v;
        }
        if let Some(v) = self.text_line_segment_ratio {
            labeling.text_line_segment_ratio = v;
        }
        if let Some(v) = self.clip_lines_to_extent {
            labeling.clip_lines_to_extent = v;
        }
        if let Some(v) = self.label_all_line_parts {
            labeling.label_all_line_parts = v;
        }
        if let Some(v) = self.polygon_labeling_location {
            labeling.polygon_labeling_location = v;
        }
        if let Some(v) = self.polygon_parts {
            labeling.polygon_parts = v;
        }
        if let Some(v) = self.allow_line_carriage {
            labeling.allow_line_carriage = v;
        }
        if let Some(v) = self.fitting_polygon {
            labeling.fitting_polygon = v;
        }
        if let Some(v) = self.suppress_outside_canvas {
            labeling.suppress_outside_canvas = v;
        }
        if let Some(v) = self.line_spacing {
            labeling.line_spacing = v;
        }

        let text = &mut config.text;
        if let Some(font) = self.font {
            let defaults = LabelFont::default();
            let current = std::mem::replace(&mut text.font, defaults);
            text.font = LabelFont {
                family: font.family.unwrap_or(current.family),
                size: font.size.unwrap_or(current.size),
                bold: font.bold.unwrap_or(current.bold),
                italic: font.italic.unwrap_or(current.italic),
            };
        }
        if let Some(v) = self.fill {
            text.fill = v;
        }
        if let Some(halo) = self.halo {
            let current = text.halo.clone().unwrap_or(Halo {
                color: "#FFFFFF".to_string(),
                width: 2.0,
            });
            text.halo = Some(Halo {
                color: halo.color.unwrap_or(current.color),
                width: halo.width.unwrap_or(current.width),
            });
        }
        if let Some(mask) = self.mask {
            let current = text.mask.clone().unwrap_or_default();
            text.mask = Some(Mask {
                fill: mask.fill.unwrap_or(current.fill),
                stroke: mask.stroke.unwrap_or(current.stroke),
                stroke_width: mask.stroke_width.unwrap_or(current.stroke_width),
                margin: mask.margin.unwrap_or(current.margin),
            });
        }
        if let Some(v) = self.level {
            text.level = v;
        }
        if let Some(v) = self.x_offset {
            text.x_offset = v;
        }
        if let Some(v) = self.y_offset {
            text.y_offset = v;
        }

        if let Some(stacked) = self.stacked {
            let parent = config.clone();
            config.stacked = stacked
                .into_iter()
                .map(|child| child.into_config(&parent))
                .collect();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = LabelStyleConfig::from_json_str("{}").expect("parse");
        assert_eq!(config, LabelStyleConfig::default());
    }

    #[test]
    fn camel_case_keys_override_defaults() {
        let config = LabelStyleConfig::from_json_str(
            r##"{
                "textColumn": "NAME",
                "pointPlacement": "CenterRight",
                "duplicateRule": "OneDuplicatePerQuadrant",
                "gridSize": 50,
                "font": { "size": 14, "bold": true },
                "halo": { "width": 3 }
            }"##,
        )
        .expect("parse");
        assert_eq!(config.labeling.text_column, "NAME");
        assert_eq!(config.labeling.point_placement, PointPlacement::CenterRight);
        assert_eq!(
            config.labeling.duplicate_rule,
            DuplicateRule::OneDuplicatePerQuadrant
        );
        assert_eq!(config.labeling.grid_size, 50.0);
        assert_eq!(config.text.font.size, 14.0);
        assert!(config.text.font.bold);
        assert_eq!(config.text.font.family, LabelFont::default().family);
        assert_eq!(config.text.halo.map(|h| h.width), Some(3.0));
    }

    #[test]
    fn duplicate_rule_accepts_none_alias() {
        let config =
            LabelStyleConfig::from_json_str(r#"{ "duplicateRule": "None" }"#).expect("parse");
        assert_eq!(
            config.labeling.duplicate_rule,
            DuplicateRule::UnlimitedDuplicates
        );
    }

    #[test]
    fn stacked_styles_inherit_from_parent() {
        let config = LabelStyleConfig::from_json5_str(
            r##"{
                // parent labels names, the stacked style labels refs below
                textColumn: "name",
                fill: "#112233",
                stacked: [{ textColumn: "ref", yOffset: -12 }],
            }"##,
        )
        .expect("parse");
        assert_eq!(config.stacked.len(), 1);
        let child = &config.stacked[0];
        assert_eq!(child.labeling.text_column, "ref");
        assert_eq!(child.text.fill, "#112233");
        assert_eq!(child.text.y_offset, -12.0);
        assert!(child.stacked.is_empty());
    }

    #[test]
    fn alternates_never_repeat_the_base_placement() {
        use PointPlacement::*;
        for p in [
            UpperLeft,
            UpperCenter,
            UpperRight,
            CenterLeft,
            CenterRight,
            LowerLeft,
            LowerCenter,
            LowerRight,
        ] {
            assert!(!p.alternates().contains(&p), "{p:?} retries itself");
        }
    }
}
