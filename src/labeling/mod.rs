//! Label placement: candidate generation, conflict resolution and the draw
//! pass that ties them to a canvas.

mod candidate;
pub mod feature;
pub mod grid;
pub mod positions;
pub mod resolver;
pub mod text;
pub mod types;

use std::time::Instant;

use tracing::{debug, trace};

use crate::canvas::{AreaDrawing, DrawingOrder, LabelCanvas, TextDrawing};
use crate::config::{LabelStyleConfig, PolygonParts};
use crate::error::{LabelError, Result};
use crate::geometry::primitives::grow_convex_ring;
use crate::geometry::{ScreenTransform, Shape};

use candidate::{CandidateGenerator, GeneratedCandidate};
pub use feature::Feature;
pub use positions::LabelPositions;
pub use resolver::{check_duplicate, check_overlapping, quadrant_of};
use text::{MeasureCache, resolve_label_text};
pub use types::{
    LabelInformation, LabelingCandidate, LineLabelAdjuster, SimpleCandidate,
    WorldLabelingCandidate,
};

/// Places labels for one style and the styles stacked on it.
///
/// The engine owns only its configuration and the label position store.
/// The accepted-label sets belong to the caller, who clears them between
/// passes.
#[derive(Debug, Clone)]
pub struct LabelEngine {
    config: LabelStyleConfig,
    positions: LabelPositions,
    stacked: Vec<LabelEngine>,
}

impl LabelEngine {
    pub fn new(config: LabelStyleConfig) -> Self {
        let stacked = config.stacked.iter().cloned().map(LabelEngine::new).collect();
        Self {
            config,
            positions: LabelPositions::new(),
            stacked,
        }
    }

    pub fn config(&self) -> &LabelStyleConfig {
        &self.config
    }

    pub fn stacked(&self) -> &[LabelEngine] {
        &self.stacked
    }

    pub fn positions(&self) -> &LabelPositions {
        &self.positions
    }

    /// Drops every recorded position, here and in stacked styles.
    pub fn clear_positions(&mut self) {
        self.positions.clear();
        for child in &mut self.stacked {
            child.clear_positions();
        }
    }

    /// Drops the recorded position of a feature that left the data source.
    pub fn forget(&mut self, id: &str) {
        self.positions.remove(id);
        for child in &mut self.stacked {
            child.forget(id);
        }
    }

    /// Features that survive the grid filter for the canvas's current view,
    /// in input order.
    pub fn filter_features<'f>(
        &self,
        features: &'f [Feature],
        canvas: &dyn LabelCanvas,
    ) -> Result<Vec<&'f Feature>> {
        let transform = ScreenTransform::from_canvas(canvas);
        let shapes = decode_all(features)?;
        let kept = grid::filter_by_grid(
            features,
            &shapes,
            &transform,
            self.config.labeling.grid_size,
        );
        Ok(kept.into_iter().map(|idx| &features[idx]).collect())
    }

    /// Candidates for a single feature without resolving or drawing them.
    /// Records the feature's anchor like a draw pass does, so it needs an
    /// open drawing scope too.
    pub fn labeling_candidates(
        &mut self,
        feature: &Feature,
        canvas: &mut dyn LabelCanvas,
    ) -> Result<Vec<LabelingCandidate>> {
        if !canvas.is_drawing() {
            return Err(LabelError::NotDrawing);
        }
        let transform = ScreenTransform::from_canvas(canvas);
        let shape = feature.shape()?;
        let Some(text) = resolve_label_text(feature, &self.config.labeling)? else {
            return Ok(Vec::new());
        };
        let mut cache = MeasureCache::new();
        Ok(self
            .generate(&feature.id, &shape, &text, &transform, canvas, &mut cache)
            .into_iter()
            .map(|generated| generated.candidate)
            .collect())
    }

    /// Runs one draw pass: filter, generate, resolve, draw. Accepted labels
    /// are appended to both caller-owned sets and returned. Stacked styles
    /// run after this one against the same sets.
    pub fn draw_features(
        &mut self,
        features: &[Feature],
        canvas: &mut dyn LabelCanvas,
        labels_in_this_layer: &mut Vec<SimpleCandidate>,
        labels_in_all_layers: &mut Vec<SimpleCandidate>,
    ) -> Result<Vec<LabelingCandidate>> {
        if !canvas.is_drawing() {
            return Err(LabelError::NotDrawing);
        }
        let started = Instant::now();
        let transform = ScreenTransform::from_canvas(canvas);
        let shapes = decode_all(features)?;
        let kept = grid::filter_by_grid(
            features,
            &shapes,
            &transform,
            self.config.labeling.grid_size,
        );
        debug!(
            features = features.len(),
            candidates = kept.len(),
            width = transform.width(),
            height = transform.height(),
            "label pass started"
        );

        let mut cache = MeasureCache::new();
        let mut accepted = Vec::new();
        let mut cancelled = false;
        for idx in kept {
            if canvas.is_cancelled() {
                debug!(placed = accepted.len(), "label pass cancelled");
                cancelled = true;
                break;
            }
            let feature = &features[idx];
            let Some(text) = resolve_label_text(feature, &self.config.labeling)? else {
                trace!(id = %feature.id, "no label text");
                continue;
            };
            let generated =
                self.generate(&feature.id, &shapes[idx], &text, &transform, canvas, &mut cache);
            for candidate in generated {
                let Some(placed) = self.resolve(
                    candidate,
                    &transform,
                    labels_in_this_layer,
                    labels_in_all_layers,
                ) else {
                    continue;
                };
                self.emit(&placed, canvas);
                labels_in_this_layer.push(placed.to_simple());
                labels_in_all_layers.push(placed.to_simple());
                accepted.push(placed);
            }
        }
        debug!(
            placed = accepted.len(),
            measured = cache.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "label pass finished"
        );
        drop(cache);

        if !cancelled {
            for child in &mut self.stacked {
                let placed = child.draw_features(
                    features,
                    canvas,
                    labels_in_this_layer,
                    labels_in_all_layers,
                )?;
                accepted.extend(placed);
            }
        }
        Ok(accepted)
    }

    fn generate(
        &mut self,
        id: &str,
        shape: &Shape,
        text: &str,
        transform: &ScreenTransform,
        canvas: &mut dyn LabelCanvas,
        cache: &mut MeasureCache,
    ) -> Vec<GeneratedCandidate> {
        // Only shapes with a single well-defined centre are stabilised.
        let stabilised = match shape {
            Shape::Point(_) | Shape::Line(_) | Shape::Polygon(_) => true,
            Shape::MultiPolygon(_) => {
                self.config.labeling.polygon_parts == PolygonParts::LargestOnly
            }
            _ => false,
        };
        let recorded = if stabilised {
            self.positions
                .anchor_for(id, text)
                .map(|world| transform.world_to_screen(world))
        } else {
            None
        };
        let screen_shape = transform.shape_to_screen(shape);
        let generator = CandidateGenerator::new(
            &self.config.labeling,
            &self.config.text,
            transform.screen_bounds(),
        );
        let font = &self.config.text.font;
        let mut measure = |t: &str| cache.measure(&mut *canvas, t, font);
        let generated = generator.generate(&screen_shape, text, recorded, &mut measure);
        if stabilised {
            if let [only] = generated.as_slice() {
                self.positions
                    .record(id, transform.screen_to_world(only.anchor), text);
            }
        }
        generated
    }

    fn resolve(
        &self,
        generated: GeneratedCandidate,
        transform: &ScreenTransform,
        labels_in_this_layer: &[SimpleCandidate],
        labels_in_all_layers: &[SimpleCandidate],
    ) -> Option<LabelingCandidate> {
        let labeling = &self.config.labeling;
        let screen = transform.screen_bounds();
        let visible = |candidate: &LabelingCandidate| {
            !labeling.suppress_outside_canvas
                || candidate
                    .bounding_box()
                    .is_some_and(|bbox| bbox.intersects(&screen))
        };
        let text = generated.candidate.original_text.as_str();
        if !visible(&generated.candidate) {
            trace!(text, "label outside canvas");
            return None;
        }
        if check_duplicate(
            &generated.candidate,
            labeling.duplicate_rule,
            labels_in_this_layer,
            transform.screen_center(),
        ) {
            trace!(text, rule = ?labeling.duplicate_rule, "duplicate label suppressed");
            return None;
        }
        if !check_overlapping(
            &generated.candidate,
            labeling.overlapping_rule,
            labels_in_all_layers,
        ) {
            return Some(generated.candidate);
        }
        if labeling.best_placement && generated.point_box.is_some() {
            let generator = CandidateGenerator::new(labeling, &self.config.text, screen);
            let alternate = resolver::best_placement(
                &generator,
                &generated,
                labeling.point_placement,
                |candidate| {
                    visible(candidate)
                        && !check_overlapping(
                            candidate,
                            labeling.overlapping_rule,
                            labels_in_all_layers,
                        )
                },
            );
            if let Some(candidate) = alternate {
                trace!(text, "label moved to an alternate placement");
                return Some(candidate);
            }
        }
        trace!(text, "overlapping label suppressed");
        None
    }

    fn emit(&self, candidate: &LabelingCandidate, canvas: &mut dyn LabelCanvas) {
        let style = &self.config.text;
        if let Some(mask) = &style.mask {
            let ring = grow_convex_ring(&candidate.collision_polygon, mask.margin);
            if ring.len() >= 4 {
                let rings = [ring];
                canvas.draw_area(AreaDrawing {
                    rings: &rings,
                    fill: &mask.fill,
                    stroke: &mask.stroke,
                    stroke_width: mask.stroke_width,
                    level: style.level,
                    x_offset: 0.0,
                    y_offset: 0.0,
                    order: DrawingOrder::BrushFirst,
                });
            }
        }
        // Offsets are already part of the candidate's positions.
        for info in &candidate.label_informations {
            canvas.draw_text(TextDrawing {
                text: &info.text,
                font: &style.font,
                fill: &style.fill,
                halo: style.halo.as_ref(),
                positions: std::slice::from_ref(&info.position),
                level: style.level,
                x_offset: 0.0,
                y_offset: 0.0,
                rotation: info.rotation,
            });
        }
    }
}

fn decode_all(features: &[Feature]) -> Result<Vec<Shape>> {
    features.iter().map(Feature::shape).collect()
}
