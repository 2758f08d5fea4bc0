//! Segment storage with visibility tracking

use std::collections::{HashMap, HashSet};

use super::state::Segment;
use super::tile::SegmentId;

/// Stored segments, plus the ones the caller no longer needs on screen
#[derive(Default)]
pub struct SegmentStore {
    segments: HashMap<SegmentId, Segment>,
    not_visible: HashSet<SegmentId>,
}

impl SegmentStore {
    pub fn contains(&self, id: &SegmentId) -> bool {
        self.segments.contains_key(id)
    }

    pub fn get(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn get_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id)
    }

    /// Existing segment, or a new one built by `create`
    pub fn get_or_insert_with(
        &mut self,
        id: SegmentId,
        create: impl FnOnce() -> Segment,
    ) -> &mut Segment {
        self.segments.entry(id).or_insert_with(create)
    }

    pub fn remove(&mut self, id: &SegmentId) -> Option<Segment> {
        self.not_visible.remove(id);
        self.segments.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Hint that the segment may be dropped from memory
    pub fn mark_not_visible(&mut self, id: SegmentId) -> bool {
        self.segments.contains_key(&id) && self.not_visible.insert(id)
    }

    pub fn mark_visible(&mut self, id: &SegmentId) {
        self.not_visible.remove(id);
    }

    pub fn is_marked_not_visible(&self, id: &SegmentId) -> bool {
        self.not_visible.contains(id)
    }

    /// Segments currently marked not visible, in id order
    pub fn not_visible(&self) -> Vec<SegmentId> {
        let mut ids: Vec<SegmentId> = self.not_visible.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            segment_count: self.segments.len(),
            tile_count: self.segments.values().map(|s| s.tiles.len()).sum(),
            not_visible_count: self.not_visible.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Store statistics for debugging/UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub segment_count: usize,
    pub tile_count: usize,
    pub not_visible_count: usize,
}
