use super::candidate::{CandidateGenerator, GeneratedCandidate};
use super::types::{LabelingCandidate, SimpleCandidate};
use crate::config::{DuplicateRule, OverlappingRule, PointPlacement};
use crate::geometry::Vertex;

/// Quadrant of `point` relative to the canvas centre: bit 0 is set on the
/// right half, bit 1 on the lower half.
pub fn quadrant_of(point: Vertex, canvas_center: Vertex) -> u8 {
    let right = point.x >= canvas_center.x;
    let below = point.y >= canvas_center.y;
    u8::from(right) | (u8::from(below) << 1)
}

/// Whether `candidate` repeats the text of an accepted label under `rule`.
/// Text compares exactly.
pub fn check_duplicate(
    candidate: &LabelingCandidate,
    rule: DuplicateRule,
    accepted: &[SimpleCandidate],
    canvas_center: Vertex,
) -> bool {
    let text = candidate.original_text.as_str();
    match rule {
        DuplicateRule::UnlimitedDuplicates => false,
        DuplicateRule::NoDuplicates => accepted.iter().any(|label| label.text == text),
        DuplicateRule::OneDuplicatePerQuadrant => {
            let quadrant = quadrant_of(candidate.center, canvas_center);
            accepted.iter().any(|label| {
                label.text == text && quadrant_of(label.center, canvas_center) == quadrant
            })
        }
    }
}

/// Whether the bounding box of `candidate` intersects the bounding box of
/// any accepted label. Boxes that only share an edge do not intersect.
pub fn check_overlapping(
    candidate: &LabelingCandidate,
    rule: OverlappingRule,
    accepted: &[SimpleCandidate],
) -> bool {
    if rule == OverlappingRule::Unlimited {
        return false;
    }
    let Some(bbox) = candidate.bounding_box() else {
        return false;
    };
    accepted
        .iter()
        .filter_map(SimpleCandidate::bounding_box)
        .any(|other| bbox.intersects(&other))
}

/// Re-places an unrotated point label at the alternates of `base`, in
/// order, and returns the first one `accept` takes.
pub(crate) fn best_placement(
    generator: &CandidateGenerator<'_>,
    generated: &GeneratedCandidate,
    base: PointPlacement,
    accept: impl Fn(&LabelingCandidate) -> bool,
) -> Option<LabelingCandidate> {
    let size = generated.point_box?;
    base.alternates()
        .into_iter()
        .filter(|placement| *placement != base)
        .map(|placement| {
            generator.placed_point(
                generated.anchor,
                &generated.candidate.original_text,
                size,
                placement,
            )
        })
        .find(|candidate| accept(candidate))
}
