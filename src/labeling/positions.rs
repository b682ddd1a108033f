use std::collections::HashMap;

use super::types::WorldLabelingCandidate;
use crate::geometry::Vertex;

/// Feature id to the world anchor its label was last generated at.
///
/// Entries live as long as the owning engine; nothing is evicted unless the
/// owner calls [`LabelPositions::remove`] or [`LabelPositions::clear`].
#[derive(Debug, Clone, Default)]
pub struct LabelPositions {
    entries: HashMap<String, WorldLabelingCandidate>,
}

impl LabelPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&WorldLabelingCandidate> {
        self.entries.get(id)
    }

    /// The recorded anchor for `id`, only when it was recorded for `text`.
    pub fn anchor_for(&self, id: &str, text: &str) -> Option<Vertex> {
        self.entries
            .get(id)
            .filter(|entry| entry.original_text == text)
            .map(|entry| entry.center)
    }

    pub fn record(&mut self, id: &str, center: Vertex, text: &str) {
        if !center.is_finite() {
            return;
        }
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.center = center;
                if entry.original_text != text {
                    entry.original_text = text.to_string();
                }
            }
            None => {
                self.entries.insert(
                    id.to_string(),
                    WorldLabelingCandidate {
                        center,
                        original_text: text.to_string(),
                    },
                );
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<WorldLabelingCandidate> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorldLabelingCandidate)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}
