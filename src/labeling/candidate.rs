// Candidate generation per shape type. Everything here works in screen
// pixels: shapes arrive already transformed and candidates leave with their
// pixel offsets baked in.

use tracing::trace;

use super::text::wrap_text;
use super::types::{LabelInformation, LabelingCandidate, LineLabelAdjuster};
use crate::config::{
    LabelingConfig, PointPlacement, PolygonLabelingLocation, PolygonParts, SplineType,
};
use crate::geometry::primitives::{
    angle_between, clip_polyline, convex_hull, distance, midpoint, normalize_text_angle,
    point_on_line, point_segment_distance, polyline_length, rotate_about, rotated_box,
};
use crate::geometry::{BoundingBox, Polygon, Shape, Vertex};
use crate::style::TextStyle;
use crate::text_metrics::TextSize;

const ANGLE_EPSILON: f64 = 1e-6;
const SEGMENT_EPSILON: f64 = 1e-9;
/// How far a recorded anchor may sit from a line and still be reused.
const LINE_ANCHOR_TOLERANCE: f64 = 1.0;
/// Step used to push a spline character past its predecessor.
const NUDGE_STEP: f64 = 0.5;

pub(crate) type Measure<'m> = dyn FnMut(&str) -> TextSize + 'm;

/// A candidate plus what the engine needs to record or re-place it.
#[derive(Debug, Clone)]
pub(crate) struct GeneratedCandidate {
    pub candidate: LabelingCandidate,
    /// Screen point the label was built around, before pixel offsets.
    pub anchor: Vertex,
    /// Box size of an unrotated point label, which makes it eligible for the
    /// alternate-placement search.
    pub point_box: Option<TextSize>,
}

pub(crate) struct CandidateGenerator<'a> {
    config: &'a LabelingConfig,
    style: &'a TextStyle,
    screen: BoundingBox,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(config: &'a LabelingConfig, style: &'a TextStyle, screen: BoundingBox) -> Self {
        Self {
            config,
            style,
            screen,
        }
    }

    /// Candidates for a screen-space shape. `recorded` is a previously used
    /// anchor (screen pixels) that is reused when it still fits the shape.
    pub fn generate(
        &self,
        shape: &Shape,
        text: &str,
        recorded: Option<Vertex>,
        measure: &mut Measure<'_>,
    ) -> Vec<GeneratedCandidate> {
        match shape {
            Shape::Point(p) => vec![self.point(*p, text, measure)],
            Shape::MultiPoint(points) => points
                .iter()
                .map(|p| self.point(*p, text, measure))
                .collect(),
            Shape::Line(points) => {
                self.lines(std::slice::from_ref(points), text, recorded, measure)
            }
            Shape::MultiLine(parts) => self.lines(parts, text, recorded, measure),
            Shape::Polygon(polygon) => {
                self.polygons(std::slice::from_ref(polygon), text, recorded, measure)
            }
            Shape::MultiPolygon(polygons) => self.polygons(polygons, text, recorded, measure),
            Shape::Collection(shapes) => shapes
                .iter()
                .flat_map(|s| self.generate(s, text, None, measure))
                .collect(),
        }
    }

    fn offset(&self, p: Vertex) -> Vertex {
        p.translated(self.style.x_offset, -self.style.y_offset)
    }

    fn point(&self, p: Vertex, text: &str, measure: &mut Measure<'_>) -> GeneratedCandidate {
        let size = measure(text);
        let rotation = self.config.rotation_angle % 360.0;
        if rotation.abs() < ANGLE_EPSILON {
            return GeneratedCandidate {
                candidate: self.placed_point(p, text, size, self.config.point_placement),
                anchor: p,
                point_box: Some(size),
            };
        }
        // The point sits on the lower-left corner of the box, which then
        // turns around it.
        let origin = self.offset(p);
        let unrotated = Vertex::new(origin.x + size.width * 0.5, origin.y - size.height * 0.5);
        let center = rotate_about(origin, unrotated, rotation);
        GeneratedCandidate {
            candidate: LabelingCandidate {
                original_text: text.to_string(),
                collision_polygon: rotated_box(center, size.width, size.height, rotation),
                center,
                label_informations: stack_lines(text, center, size.height, 1.0, rotation),
            },
            anchor: p,
            point_box: None,
        }
    }

    /// Unrotated point label at one of the nine placements around `p`.
    pub fn placed_point(
        &self,
        p: Vertex,
        text: &str,
        size: TextSize,
        placement: PointPlacement,
    ) -> LabelingCandidate {
        let origin = self.offset(p);
        let (fx, fy) = placement_factors(placement);
        let bbox = BoundingBox::from_xywh(
            origin.x - size.width * fx,
            origin.y - size.height * fy,
            size.width,
            size.height,
        );
        let center = bbox.center();
        LabelingCandidate {
            original_text: text.to_string(),
            collision_polygon: bbox.to_ring(),
            center,
            label_informations: stack_lines(text, center, size.height, 1.0, 0.0),
        }
    }

    fn lines(
        &self,
        parts: &[Vec<Vertex>],
        text: &str,
        recorded: Option<Vertex>,
        measure: &mut Measure<'_>,
    ) -> Vec<GeneratedCandidate> {
        let pieces: Vec<Vec<Vertex>> = if self.config.clip_lines_to_extent {
            parts
                .iter()
                .flat_map(|part| clip_polyline(part, &self.screen))
                .collect()
        } else {
            parts.iter().filter(|p| p.len() >= 2).cloned().collect()
        };
        if pieces.is_empty() {
            trace!(text, "line has no visible part");
            return Vec::new();
        }
        let size = measure(text);
        if self.config.label_all_line_parts {
            return pieces
                .iter()
                .filter_map(|piece| self.line(piece, text, size, None, measure))
                .collect();
        }
        let host = pieces
            .iter()
            .filter_map(|piece| longest_segment(piece).map(|adj| (piece, adj.segment_length)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(piece, _)| piece);
        match host {
            Some(piece) => self
                .line(piece, text, size, recorded, measure)
                .into_iter()
                .collect(),
            None => {
                trace!(text, "line has zero length");
                Vec::new()
            }
        }
    }

    fn line(
        &self,
        part: &[Vertex],
        text: &str,
        size: TextSize,
        recorded: Option<Vertex>,
        measure: &mut Measure<'_>,
    ) -> Option<GeneratedCandidate> {
        let adjuster = longest_segment(part)?;
        let total = polyline_length(part);
        let wants_spline = match self.config.spline_type {
            SplineType::Off => false,
            SplineType::Standard => size.width > adjuster.segment_length && size.width < total,
            SplineType::Force => size.width < total,
        };
        if wants_spline {
            return self.spline(part, text, measure);
        }
        let limit = adjuster.segment_length * self.config.text_line_segment_ratio;
        if size.width > limit {
            trace!(
                text,
                width = size.width,
                segment = adjuster.segment_length,
                "label too long for its segment"
            );
            return None;
        }

        let (anchor, angle) = recorded
            .filter(|r| self.screen.contains(*r))
            .and_then(|r| anchor_on_line(part, r))
            .unwrap_or((adjuster.midpoint, adjuster.angle));
        let angle = normalize_text_angle(angle);
        let rotation = if self.config.force_horizontal_for_line || angle.abs() < ANGLE_EPSILON {
            0.0
        } else {
            angle
        };
        let center = self.offset(anchor);
        Some(GeneratedCandidate {
            candidate: LabelingCandidate {
                original_text: text.to_string(),
                collision_polygon: rotated_box(center, size.width, size.height, rotation),
                center,
                label_informations: stack_lines(text, center, size.height, 1.0, rotation),
            },
            anchor,
            point_box: None,
        })
    }

    /// Lays characters one by one along the line, centred on its length.
    fn spline(
        &self,
        part: &[Vertex],
        text: &str,
        measure: &mut Measure<'_>,
    ) -> Option<GeneratedCandidate> {
        let mut line = part.to_vec();
        if let (Some(first), Some(last)) = (line.first(), line.last()) {
            if last.x < first.x {
                line.reverse();
            }
        }
        let total = polyline_length(&line);
        let glyphs: Vec<(char, TextSize)> = text
            .chars()
            .map(|ch| (ch, measure(ch.encode_utf8(&mut [0u8; 4]))))
            .collect();
        let text_width: f64 = glyphs.iter().map(|(_, size)| size.width).sum();
        let height = glyphs.iter().map(|(_, size)| size.height).fold(0.0, f64::max);
        let start = ((total - text_width) * 0.5).max(0.0);

        let mut cursor = start;
        let mut corners: Vec<Vertex> = Vec::with_capacity(glyphs.len() * 5);
        let mut informations = Vec::new();
        let mut previous: Option<(Vertex, f64)> = None;
        for (ch, size) in &glyphs {
            let half = size.width * 0.5;
            let mut at = cursor + half;
            let (position, angle) = loop {
                if at > total {
                    trace!(text, "spline label runs past the end of its line");
                    return None;
                }
                let (position, angle) = point_on_line(&line, at)?;
                match previous {
                    Some((prev, prev_half)) if distance(prev, position) + 1e-6 < prev_half + half => {
                        at += NUDGE_STEP;
                    }
                    _ => break (position, angle),
                }
            };
            let rotation = normalize_text_angle(angle);
            corners.extend(rotated_box(position, size.width, height, rotation));
            if !ch.is_whitespace() {
                informations.push(LabelInformation {
                    position,
                    text: ch.to_string(),
                    rotation,
                });
            }
            previous = Some((position, half));
            cursor = at + half;
        }
        if cursor > total + 1e-6 || informations.is_empty() {
            return None;
        }
        let hull = convex_hull(&corners);
        if hull.len() < 4 {
            trace!(text, "spline label has no area");
            return None;
        }
        let (anchor, _) = point_on_line(&line, (start + cursor) * 0.5)?;
        let mut candidate = LabelingCandidate {
            original_text: text.to_string(),
            collision_polygon: hull,
            center: anchor,
            label_informations: informations,
        };
        candidate.translate(self.style.x_offset, -self.style.y_offset);
        Some(GeneratedCandidate {
            candidate,
            anchor,
            point_box: None,
        })
    }

    fn polygons(
        &self,
        polygons: &[Polygon],
        text: &str,
        recorded: Option<Vertex>,
        measure: &mut Measure<'_>,
    ) -> Vec<GeneratedCandidate> {
        match self.config.polygon_parts {
            PolygonParts::AllParts => {
                let recorded = if polygons.len() == 1 { recorded } else { None };
                polygons
                    .iter()
                    .filter_map(|polygon| self.polygon(polygon, text, recorded, measure))
                    .collect()
            }
            PolygonParts::LargestOnly => polygons
                .iter()
                .filter_map(|polygon| polygon.bounding_box().map(|b| (polygon, b.area())))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .and_then(|(polygon, _)| self.polygon(polygon, text, recorded, measure))
                .into_iter()
                .collect(),
        }
    }

    fn polygon(
        &self,
        polygon: &Polygon,
        text: &str,
        recorded: Option<Vertex>,
        measure: &mut Measure<'_>,
    ) -> Option<GeneratedCandidate> {
        let bbox = polygon.bounding_box()?;
        let anchor = match recorded.filter(|r| polygon.contains(*r)) {
            Some(r) => r,
            None => interior_point(polygon, &bbox, self.config.polygon_labeling_location)?,
        };

        let size = measure(text);
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let line_height = size.height / lines.len() as f64;
        let mut width = size.width;
        if width > bbox.width() {
            if self.config.allow_line_carriage && lines.len() == 1 {
                lines = wrap_text(text, bbox.width(), |t| measure(t));
                width = lines
                    .iter()
                    .map(|line| measure(line).width)
                    .fold(0.0, f64::max);
            }
            if self.config.fitting_polygon && width > bbox.width() {
                trace!(text, width, polygon_width = bbox.width(), "label wider than polygon");
                return None;
            }
        }
        let spacing = self.config.line_spacing.max(0.0);
        let height = line_height * (1.0 + (lines.len() as f64 - 1.0) * spacing);
        let center = self.offset(anchor);
        let label_box =
            BoundingBox::from_xywh(center.x - width * 0.5, center.y - height * 0.5, width, height);
        let label_informations = stack_line_list(&lines, center, line_height, spacing, 0.0);
        Some(GeneratedCandidate {
            candidate: LabelingCandidate {
                original_text: text.to_string(),
                collision_polygon: label_box.to_ring(),
                center,
                label_informations,
            },
            anchor,
            point_box: None,
        })
    }
}

/// Fractions of the box width and height that sit left of and above the
/// anchor for each placement.
fn placement_factors(placement: PointPlacement) -> (f64, f64) {
    use PointPlacement::*;
    let fx = match placement {
        UpperLeft | CenterLeft | LowerLeft => 1.0,
        UpperCenter | Center | LowerCenter => 0.5,
        UpperRight | CenterRight | LowerRight => 0.0,
    };
    let fy = match placement {
        UpperLeft | UpperCenter | UpperRight => 1.0,
        CenterLeft | Center | CenterRight => 0.5,
        LowerLeft | LowerCenter | LowerRight => 0.0,
    };
    (fx, fy)
}

pub(crate) fn longest_segment(points: &[Vertex]) -> Option<LineLabelAdjuster> {
    points
        .windows(2)
        .map(|pair| (pair[0], pair[1], distance(pair[0], pair[1])))
        .filter(|(_, _, len)| *len > SEGMENT_EPSILON)
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(a, b, len)| LineLabelAdjuster {
            midpoint: midpoint(a, b),
            segment_length: len,
            angle: angle_between(a, b),
        })
}

/// `point` with the direction of the nearest segment, when it lies on the
/// line.
fn anchor_on_line(points: &[Vertex], point: Vertex) -> Option<(Vertex, f64)> {
    points
        .windows(2)
        .filter(|pair| distance(pair[0], pair[1]) > SEGMENT_EPSILON)
        .map(|pair| (point_segment_distance(point, pair[0], pair[1]), pair))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .filter(|(d, _)| *d <= LINE_ANCHOR_TOLERANCE)
        .map(|(_, pair)| (point, angle_between(pair[0], pair[1])))
}

/// Centroid or box centre, moved inside the polygon when it falls outside.
fn interior_point(
    polygon: &Polygon,
    bbox: &BoundingBox,
    location: PolygonLabelingLocation,
) -> Option<Vertex> {
    let center = match location {
        PolygonLabelingLocation::Centroid => polygon.centroid(),
        PolygonLabelingLocation::BoundingBoxCenter => bbox.center(),
    };
    let center = if center.is_finite() {
        center
    } else {
        *polygon.outer.first()?
    };
    if polygon.contains(center) {
        return Some(center);
    }
    let probes = [
        Vertex::new(center.x, (center.y + bbox.min_y) * 0.5),
        Vertex::new(center.x, (center.y + bbox.max_y) * 0.5),
        Vertex::new((center.x + bbox.min_x) * 0.5, center.y),
        Vertex::new((center.x + bbox.max_x) * 0.5, center.y),
    ];
    Some(
        probes
            .into_iter()
            .find(|probe| polygon.contains(*probe))
            .unwrap_or(center),
    )
}

fn stack_lines(
    text: &str,
    center: Vertex,
    total_height: f64,
    spacing: f64,
    rotation: f64,
) -> Vec<LabelInformation> {
    let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let line_height = total_height / lines.len() as f64;
    stack_line_list(&lines, center, line_height, spacing, rotation)
}

/// One run per line, stacked around `center` and turned with the label.
fn stack_line_list(
    lines: &[String],
    center: Vertex,
    line_height: f64,
    spacing: f64,
    rotation: f64,
) -> Vec<LabelInformation> {
    let step = line_height * spacing;
    let mid = (lines.len() as f64 - 1.0) * 0.5;
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let unrotated = Vertex::new(center.x, center.y + (i as f64 - mid) * step);
            LabelInformation {
                position: rotate_about(center, unrotated, rotation),
                text: line.clone(),
                rotation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::point_in_ring;

    fn mono(text: &str) -> TextSize {
        let lines = text.split('\n').count() as f64;
        let widest = text.split('\n').map(|l| l.chars().count()).max().unwrap_or(0);
        TextSize::new(widest as f64 * 10.0, lines * 4.0)
    }

    fn screen() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 100.0, 100.0)
    }

    fn run(config: &LabelingConfig, shape: &Shape, text: &str) -> Vec<GeneratedCandidate> {
        run_styled(config, &TextStyle::plain(), shape, text, None)
    }

    fn run_styled(
        config: &LabelingConfig,
        style: &TextStyle,
        shape: &Shape,
        text: &str,
        recorded: Option<Vertex>,
    ) -> Vec<GeneratedCandidate> {
        let generator = CandidateGenerator::new(config, style, screen());
        let mut measure = mono;
        generator.generate(shape, text, recorded, &mut measure)
    }

    fn top_left(candidate: &LabelingCandidate) -> Vertex {
        let bbox = candidate.bounding_box().expect("non-empty polygon");
        Vertex::new(bbox.min_x, bbox.min_y)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn center_right_places_box_right_of_point() {
        let config = LabelingConfig {
            point_placement: PointPlacement::CenterRight,
            ..LabelingConfig::default()
        };
        let out = run(&config, &Shape::Point(Vertex::new(50.0, 50.0)), "A");
        assert_eq!(out.len(), 1);
        let candidate = &out[0].candidate;
        assert_eq!(top_left(candidate), Vertex::new(50.0, 48.0));
        assert_eq!(candidate.collision_polygon.len(), 5);
        assert_eq!(candidate.collision_polygon.first(), candidate.collision_polygon.last());
        assert_eq!(candidate.center, Vertex::new(55.0, 50.0));
        assert_eq!(out[0].point_box, Some(TextSize::new(10.0, 4.0)));
    }

    #[test]
    fn every_placement_touches_the_point() {
        use PointPlacement::*;
        let cases = [
            (UpperLeft, (40.0, 46.0)),
            (UpperCenter, (45.0, 46.0)),
            (UpperRight, (50.0, 46.0)),
            (CenterLeft, (40.0, 48.0)),
            (Center, (45.0, 48.0)),
            (CenterRight, (50.0, 48.0)),
            (LowerLeft, (40.0, 50.0)),
            (LowerCenter, (45.0, 50.0)),
            (LowerRight, (50.0, 50.0)),
        ];
        for (placement, (x, y)) in cases {
            let config = LabelingConfig {
                point_placement: placement,
                ..LabelingConfig::default()
            };
            let out = run(&config, &Shape::Point(Vertex::new(50.0, 50.0)), "A");
            assert_eq!(top_left(&out[0].candidate), Vertex::new(x, y), "{placement:?}");
        }
    }

    #[test]
    fn offsets_move_right_and_up() {
        let config = LabelingConfig {
            point_placement: PointPlacement::CenterRight,
            ..LabelingConfig::default()
        };
        let style = TextStyle {
            x_offset: 3.0,
            y_offset: 5.0,
            ..TextStyle::plain()
        };
        let out = run_styled(&config, &style, &Shape::Point(Vertex::new(50.0, 50.0)), "A", None);
        assert_eq!(top_left(&out[0].candidate), Vertex::new(53.0, 43.0));
        assert_eq!(out[0].anchor, Vertex::new(50.0, 50.0));
    }

    #[test]
    fn rotated_point_turns_box_around_point() {
        let config = LabelingConfig {
            rotation_angle: 90.0,
            ..LabelingConfig::default()
        };
        let out = run(&config, &Shape::Point(Vertex::new(50.0, 50.0)), "AB");
        let candidate = &out[0].candidate;
        assert!(out[0].point_box.is_none());
        // Unrotated centre (60, 48) turned 90 degrees clockwise about (50, 50).
        assert_close(candidate.center.x, 52.0);
        assert_close(candidate.center.y, 60.0);
        assert_eq!(candidate.label_informations[0].rotation, 90.0);
        let bbox = candidate.bounding_box().unwrap();
        assert_close(bbox.width(), 4.0);
        assert_close(bbox.height(), 20.0);
    }

    #[test]
    fn multipoint_yields_one_candidate_per_point() {
        let shape = Shape::MultiPoint(vec![Vertex::new(10.0, 10.0), Vertex::new(80.0, 80.0)]);
        assert_eq!(run(&LabelingConfig::default(), &shape, "A").len(), 2);
    }

    #[test]
    fn horizontal_line_labels_at_longest_segment_midpoint() {
        let shape = Shape::Line(vec![
            Vertex::new(10.0, 50.0),
            Vertex::new(20.0, 50.0),
            Vertex::new(80.0, 50.0),
        ]);
        let out = run(&LabelingConfig::default(), &shape, "Road");
        assert_eq!(out.len(), 1);
        let candidate = &out[0].candidate;
        assert_eq!(candidate.center, Vertex::new(50.0, 50.0));
        assert_eq!(candidate.label_informations[0].rotation, 0.0);
        assert_eq!(top_left(candidate), Vertex::new(30.0, 48.0));
    }

    #[test]
    fn inclined_line_label_never_reads_upside_down() {
        // Drawn right to left and downwards on screen.
        let shape = Shape::Line(vec![Vertex::new(90.0, 10.0), Vertex::new(10.0, 90.0)]);
        let out = run(&LabelingConfig::default(), &shape, "Road");
        let rotation = out[0].candidate.label_informations[0].rotation;
        assert_close(rotation, -45.0);
        assert_eq!(out[0].candidate.center, Vertex::new(50.0, 50.0));
    }

    #[test]
    fn forced_horizontal_line_label_has_no_rotation() {
        let config = LabelingConfig {
            force_horizontal_for_line: true,
            ..LabelingConfig::default()
        };
        let shape = Shape::Line(vec![Vertex::new(10.0, 10.0), Vertex::new(90.0, 90.0)]);
        let out = run(&config, &shape, "Road");
        assert_eq!(out[0].candidate.label_informations[0].rotation, 0.0);
    }

    #[test]
    fn label_longer_than_segment_ratio_is_rejected() {
        let config = LabelingConfig {
            text_line_segment_ratio: 0.5,
            ..LabelingConfig::default()
        };
        let shape = Shape::Line(vec![Vertex::new(30.0, 50.0), Vertex::new(70.0, 50.0)]);
        assert!(run(&config, &shape, "ABC").is_empty());
        let relaxed = LabelingConfig::default();
        assert_eq!(run(&relaxed, &shape, "ABC").len(), 1);
    }

    #[test]
    fn zero_length_line_yields_nothing() {
        let shape = Shape::Line(vec![Vertex::new(30.0, 50.0), Vertex::new(30.0, 50.0)]);
        assert!(run(&LabelingConfig::default(), &shape, "A").is_empty());
    }

    #[test]
    fn clipping_keeps_only_the_visible_piece() {
        let shape = Shape::Line(vec![Vertex::new(-500.0, 50.0), Vertex::new(60.0, 50.0)]);
        let out = run(&LabelingConfig::default(), &shape, "A");
        assert_eq!(out[0].candidate.center, Vertex::new(30.0, 50.0));
        let unclipped = LabelingConfig {
            clip_lines_to_extent: false,
            ..LabelingConfig::default()
        };
        let out = run(&unclipped, &shape, "A");
        assert_eq!(out[0].candidate.center, Vertex::new(-220.0, 50.0));
    }

    #[test]
    fn all_line_parts_label_each_part() {
        let shape = Shape::MultiLine(vec![
            vec![Vertex::new(10.0, 10.0), Vertex::new(40.0, 10.0)],
            vec![Vertex::new(10.0, 60.0), Vertex::new(90.0, 60.0)],
        ]);
        let single = run(&LabelingConfig::default(), &shape, "A");
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].candidate.center, Vertex::new(50.0, 60.0));
        let all = LabelingConfig {
            label_all_line_parts: true,
            ..LabelingConfig::default()
        };
        assert_eq!(run(&all, &shape, "A").len(), 2);
    }

    #[test]
    fn recorded_anchor_on_line_is_reused() {
        let shape = Shape::Line(vec![Vertex::new(10.0, 50.0), Vertex::new(90.0, 50.0)]);
        let config = LabelingConfig::default();
        let out = run_styled(
            &config,
            &TextStyle::plain(),
            &shape,
            "A",
            Some(Vertex::new(30.0, 50.5)),
        );
        assert_eq!(out[0].anchor, Vertex::new(30.0, 50.5));
        let off_line = run_styled(
            &config,
            &TextStyle::plain(),
            &shape,
            "A",
            Some(Vertex::new(30.0, 70.0)),
        );
        assert_eq!(off_line[0].anchor, Vertex::new(50.0, 50.0));
    }

    #[test]
    fn spline_places_one_run_per_character() {
        let config = LabelingConfig {
            spline_type: SplineType::Standard,
            ..LabelingConfig::default()
        };
        let shape = Shape::Line(vec![
            Vertex::new(10.0, 50.0),
            Vertex::new(30.0, 40.0),
            Vertex::new(50.0, 50.0),
            Vertex::new(70.0, 40.0),
            Vertex::new(90.0, 50.0),
        ]);
        let out = run(&config, &shape, "AB C");
        assert_eq!(out.len(), 1);
        let candidate = &out[0].candidate;
        let texts: Vec<&str> = candidate
            .label_informations
            .iter()
            .map(|info| info.text.as_str())
            .collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
        assert!(candidate.collision_polygon.len() >= 4);
        assert_eq!(candidate.collision_polygon.first(), candidate.collision_polygon.last());
        for info in &candidate.label_informations {
            assert!(
                point_in_ring(info.position, &candidate.collision_polygon),
                "character {} outside hull",
                info.text
            );
        }
    }

    #[test]
    fn spline_runs_left_to_right_on_reversed_lines() {
        let config = LabelingConfig {
            spline_type: SplineType::Force,
            ..LabelingConfig::default()
        };
        let shape = Shape::Line(vec![
            Vertex::new(90.0, 50.0),
            Vertex::new(50.0, 40.0),
            Vertex::new(10.0, 50.0),
        ]);
        let out = run(&config, &shape, "AB");
        let infos = &out[0].candidate.label_informations;
        assert!(infos[0].position.x < infos[1].position.x);
    }

    #[test]
    fn spline_is_skipped_when_text_exceeds_line() {
        let config = LabelingConfig {
            spline_type: SplineType::Force,
            text_line_segment_ratio: 0.5,
            ..LabelingConfig::default()
        };
        let shape = Shape::Line(vec![Vertex::new(10.0, 50.0), Vertex::new(30.0, 50.0)]);
        assert!(run(&config, &shape, "ABCDEF").is_empty());
    }

    #[test]
    fn spline_without_area_is_rejected() {
        let config = LabelingConfig {
            spline_type: SplineType::Force,
            ..LabelingConfig::default()
        };
        let style = TextStyle::plain();
        let generator = CandidateGenerator::new(&config, &style, screen());
        let shape = Shape::Line(vec![Vertex::new(10.0, 50.0), Vertex::new(90.0, 50.0)]);
        for glyph in [TextSize::new(0.0, 0.0), TextSize::new(10.0, 0.0)] {
            let mut measure = |_: &str| glyph;
            assert!(
                generator.generate(&shape, "AB", None, &mut measure).is_empty(),
                "glyph {glyph:?} produced a candidate"
            );
        }
    }

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::new(
            vec![
                Vertex::new(x, y),
                Vertex::new(x + size, y),
                Vertex::new(x + size, y + size),
                Vertex::new(x, y + size),
                Vertex::new(x, y),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn polygon_label_sits_on_centroid() {
        let out = run(
            &LabelingConfig::default(),
            &Shape::Polygon(square(20.0, 20.0, 40.0)),
            "Park",
        );
        assert_eq!(out[0].candidate.center, Vertex::new(40.0, 40.0));
        assert_eq!(out[0].anchor, Vertex::new(40.0, 40.0));
    }

    #[test]
    fn concave_polygon_probes_for_interior_point() {
        // U shape open at the top: the box centre (50, 50) is in the notch.
        let u = Polygon::new(
            vec![
                Vertex::new(10.0, 10.0),
                Vertex::new(30.0, 10.0),
                Vertex::new(30.0, 70.0),
                Vertex::new(70.0, 70.0),
                Vertex::new(70.0, 10.0),
                Vertex::new(90.0, 10.0),
                Vertex::new(90.0, 90.0),
                Vertex::new(10.0, 90.0),
                Vertex::new(10.0, 10.0),
            ],
            Vec::new(),
        );
        let config = LabelingConfig {
            polygon_labeling_location: PolygonLabelingLocation::BoundingBoxCenter,
            ..LabelingConfig::default()
        };
        let out = run(&config, &Shape::Polygon(u.clone()), "A");
        let anchor = out[0].anchor;
        assert!(u.contains(anchor), "anchor {anchor:?} outside polygon");
        assert_eq!(anchor, Vertex::new(50.0, 70.0));
    }

    #[test]
    fn degenerate_polygon_falls_back_to_first_vertex() {
        let flat = Polygon::new(
            vec![
                Vertex::new(10.0, 10.0),
                Vertex::new(50.0, 10.0),
                Vertex::new(90.0, 10.0),
                Vertex::new(10.0, 10.0),
            ],
            Vec::new(),
        );
        let out = run(&LabelingConfig::default(), &Shape::Polygon(flat), "A");
        assert_eq!(out[0].anchor, Vertex::new(10.0, 10.0));
    }

    #[test]
    fn polygon_parts_select_largest_or_all() {
        let shape = Shape::MultiPolygon(vec![square(0.0, 0.0, 10.0), square(40.0, 40.0, 50.0)]);
        let largest = run(&LabelingConfig::default(), &shape, "A");
        assert_eq!(largest.len(), 1);
        assert_eq!(largest[0].anchor, Vertex::new(65.0, 65.0));
        let all = LabelingConfig {
            polygon_parts: PolygonParts::AllParts,
            ..LabelingConfig::default()
        };
        assert_eq!(run(&all, &shape, "A").len(), 2);
    }

    #[test]
    fn wide_polygon_label_wraps_into_lines() {
        let config = LabelingConfig {
            allow_line_carriage: true,
            ..LabelingConfig::default()
        };
        let out = run(&config, &Shape::Polygon(square(20.0, 20.0, 60.0)), "Green Lake Park");
        let infos = &out[0].candidate.label_informations;
        let lines: Vec<&str> = infos.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(lines, vec!["Green", "Lake", "Park"]);
        assert_eq!(infos[0].position, Vertex::new(50.0, 46.0));
        assert_eq!(infos[2].position, Vertex::new(50.0, 54.0));
        let bbox = out[0].candidate.bounding_box().unwrap();
        assert_close(bbox.width(), 50.0);
        assert_close(bbox.height(), 12.0);
    }

    #[test]
    fn fitting_polygon_suppresses_too_wide_labels() {
        let config = LabelingConfig {
            fitting_polygon: true,
            ..LabelingConfig::default()
        };
        let shape = Shape::Polygon(square(20.0, 20.0, 30.0));
        assert!(run(&config, &shape, "Green Lake").is_empty());
        assert_eq!(run(&config, &shape, "Bay").len(), 1);
    }

    #[test]
    fn collections_recurse_into_members() {
        let shape = Shape::Collection(vec![
            Shape::Point(Vertex::new(10.0, 10.0)),
            Shape::Polygon(square(40.0, 40.0, 20.0)),
        ]);
        assert_eq!(run(&LabelingConfig::default(), &shape, "A").len(), 2);
    }
}
