use std::collections::HashMap;

use tracing::debug;

use super::feature::Feature;
use crate::geometry::{BoundingBox, ScreenTransform, Shape};

/// World-aligned grid of cells, each claimed by at most one feature.
struct LabelGrid {
    cell: f64,
    /// Maps cell (ix, iy) to the index of the feature that claimed it.
    claimed: HashMap<(i64, i64), usize>,
}

impl LabelGrid {
    fn new(cell: f64) -> Self {
        Self {
            cell,
            claimed: HashMap::new(),
        }
    }

    fn cell_range(&self, bbox: &BoundingBox) -> (i64, i64, i64, i64) {
        let x0 = (bbox.min_x / self.cell).floor() as i64;
        let y0 = (bbox.min_y / self.cell).floor() as i64;
        let x1 = (bbox.max_x / self.cell).floor() as i64;
        let y1 = (bbox.max_y / self.cell).floor() as i64;
        (x0, y0, x1, y1)
    }

    /// Claims the first free cell under `bbox`, scanning rows from the top of
    /// the map down and cells left to right.
    fn claim(&mut self, idx: usize, bbox: &BoundingBox) -> Option<(i64, i64)> {
        let (x0, y0, x1, y1) = self.cell_range(bbox);
        for iy in (y0..=y1).rev() {
            for ix in x0..=x1 {
                if let std::collections::hash_map::Entry::Vacant(slot) =
                    self.claimed.entry((ix, iy))
                {
                    slot.insert(idx);
                    return Some((ix, iy));
                }
            }
        }
        None
    }
}

/// Thins line features so at most one claims each grid cell.
///
/// `grid_size` is in pixels and converted to world units at the current
/// scale. Returns the indices of the features that stay, in input order.
/// Non-line features always stay; line features whose extent misses the
/// view are dropped. A `grid_size` of zero keeps everything.
pub fn filter_by_grid(
    features: &[Feature],
    shapes: &[Shape],
    transform: &ScreenTransform,
    grid_size: f64,
) -> Vec<usize> {
    let count = features.len().min(shapes.len());
    let cell = grid_size * transform.world_per_pixel();
    if grid_size <= 0.0 || !cell.is_finite() || cell <= 0.0 {
        return (0..count).collect();
    }
    let view = transform.extent();
    let mut grid = LabelGrid::new(cell);
    let mut kept = Vec::with_capacity(count);
    let mut dropped = 0usize;
    for (idx, shape) in shapes.iter().take(count).enumerate() {
        if !shape.is_linear() {
            kept.push(idx);
            continue;
        }
        let visible = shape
            .bounding_box()
            .and_then(|bbox| clamp_to(&bbox, &view));
        match visible.and_then(|bbox| grid.claim(idx, &bbox)) {
            Some(_) => kept.push(idx),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(
            kept = kept.len(),
            dropped,
            cell_world = cell,
            "grid filter thinned line features"
        );
    }
    kept
}

fn clamp_to(bbox: &BoundingBox, view: &BoundingBox) -> Option<BoundingBox> {
    let clamped = BoundingBox::new(
        bbox.min_x.max(view.min_x),
        bbox.min_y.max(view.min_y),
        bbox.max_x.min(view.max_x),
        bbox.max_y.min(view.max_y),
    );
    (clamped.min_x <= clamped.max_x && clamped.min_y <= clamped.max_y).then_some(clamped)
}
