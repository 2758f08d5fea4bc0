//! Segment request / poll state machine

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use log::debug;
use web_time::Instant;

use super::propagate::{ChangedTiles, propagate_segment};
use super::state::{Board, TileCategory};
use super::tile::SegmentId;
use crate::error::{BoardError, Result};
use crate::server::{SegmentFetcher, SegmentLoadResult, SegmentRequest, SegmentTileCollection};

/// A completed segment fetch, after merging into the board
#[derive(Debug)]
pub enum SegmentLoadOutcome {
    /// Merged and propagated. `neighbors` lists tiles of other segments that changed.
    Loaded {
        segment: SegmentId,
        neighbors: ChangedTiles,
    },
    /// The segment stays in `Loading` until explicitly reloaded.
    Failed { segment: SegmentId, error: BoardError },
}

/// Segment loader with de-duplication of in-flight requests
pub struct SegmentLoader {
    game_id: String,
    fetcher: Box<dyn SegmentFetcher>,
    /// In-flight or stuck segments, with the time loading started
    pending: HashMap<SegmentId, Instant>,
    failed: HashSet<SegmentId>,

    // Per-merge scratch space
    previous_heights: Vec<Option<f64>>,
    covered: Vec<bool>,
}

impl SegmentLoader {
    pub fn new(game_id: &str, fetcher: Box<dyn SegmentFetcher>) -> Self {
        Self {
            game_id: game_id.to_string(),
            fetcher,
            pending: HashMap::new(),
            failed: HashSet::new(),
            previous_heights: Vec::new(),
            covered: Vec::new(),
        }
    }

    /// Request a segment. Returns false if it is already present or loading.
    /// Placeholders are in the board when this returns.
    pub fn request_segment(&mut self, board: &mut Board, id: SegmentId) -> bool {
        board.segments.mark_visible(&id);
        if self.pending.contains_key(&id) || board.contains_segment(&id) {
            return false;
        }

        board.get_or_create_segment(id);
        board.bump_load_id();
        self.start_fetch(board, id);
        true
    }

    /// Fetch a stored segment again, keeping its current tiles until the
    /// response lands. Failed segments can always be reloaded.
    pub fn reload_segment(&mut self, board: &mut Board, id: SegmentId) -> bool {
        if !board.contains_segment(&id) {
            return false;
        }
        if self.pending.contains_key(&id) && !self.failed.contains(&id) {
            return false;
        }

        self.failed.remove(&id);
        board.segments.mark_visible(&id);
        self.start_fetch(board, id);
        true
    }

    fn start_fetch(&mut self, board: &Board, id: SegmentId) {
        let size = board.segment_size();
        self.pending.insert(id, Instant::now());
        self.fetcher.fetch(SegmentRequest {
            game_id: self.game_id.clone(),
            segment_id: id,
            x: id.x,
            y: id.y,
            width: size.width,
            height: size.height,
        });
    }

    /// Apply the next completed fetch, if any
    pub fn poll(&mut self, board: &mut Board) -> Option<SegmentLoadOutcome> {
        while let Some(result) = self.fetcher.poll() {
            let (segment, outcome) = match result {
                SegmentLoadResult::Success(segment, collection) => {
                    if !self.is_awaiting(board, &segment) {
                        debug!("Dropping stale result for segment {}", segment);
                        continue;
                    }
                    match self.merge(board, segment, &collection) {
                        Ok(neighbors) => {
                            return Some(SegmentLoadOutcome::Loaded { segment, neighbors });
                        }
                        Err(error) => (segment, SegmentLoadOutcome::Failed { segment, error }),
                    }
                }
                SegmentLoadResult::Failed(segment, error) => {
                    if !self.is_awaiting(board, &segment) {
                        debug!("Dropping stale failure for segment {}", segment);
                        continue;
                    }
                    (segment, SegmentLoadOutcome::Failed { segment, error })
                }
            };
            self.failed.insert(segment);
            return Some(outcome);
        }
        None
    }

    fn is_awaiting(&self, board: &Board, id: &SegmentId) -> bool {
        self.pending.contains_key(id) && !self.failed.contains(id) && board.contains_segment(id)
    }

    /// Overwrite the segment's tiles with server data, then propagate.
    fn merge(
        &mut self,
        board: &mut Board,
        id: SegmentId,
        collection: &SegmentTileCollection,
    ) -> Result<ChangedTiles> {
        let size = board.segment_size();
        let indices = collection
            .segments
            .iter()
            .map(|t| {
                id.tile_index(t.x, t.y, size)
                    .ok_or_else(|| BoardError::MalformedPayload {
                        segment: id,
                        reason: format!("tile ({}, {}) outside the requested segment", t.x, t.y),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let segment = board
            .segment_mut(&id)
            .ok_or_else(|| BoardError::MalformedPayload {
                segment: id,
                reason: "segment left the store".to_string(),
            })?;

        self.previous_heights.clear();
        self.previous_heights.extend(
            segment
                .tiles
                .iter()
                .map(|t| t.is_loaded().then_some(t.height)),
        );
        self.covered.clear();
        self.covered.resize(segment.tiles.len(), false);

        for (server_tile, &index) in collection.segments.iter().zip(&indices) {
            let tile = &mut segment.tiles[index];
            tile.clear_to(TileCategory::from_server(&server_tile.category));
            tile.height = server_tile.height;
            tile.token_id = Some(server_tile.token_id);
            tile.parameters
                .extend(server_tile.parameters.iter().map(|p| (p.index, p.quantity)));
            self.covered[index] = true;
        }
        for (tile, _) in segment
            .tiles
            .iter_mut()
            .zip(&self.covered)
            .filter(|(_, covered)| !**covered)
        {
            tile.clear_to(TileCategory::Empty);
        }
        debug!(
            "Merged {} server tiles into segment {}",
            collection.segments.len(),
            id
        );

        let mut changed = ChangedTiles::new();
        propagate_segment(board, id, &self.previous_heights, &mut changed);
        changed.remove(&id);

        self.pending.remove(&id);
        self.failed.remove(&id);
        board.segments.mark_visible(&id);
        board.bump_load_id();
        Ok(changed)
    }

    /// Drop all loading state for a segment leaving the board
    pub fn forget(&mut self, id: &SegmentId) {
        self.pending.remove(id);
        self.failed.remove(id);
    }

    /// Segment has an outstanding or stuck fetch
    pub fn is_loading(&self, id: &SegmentId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// How long the segment has been waiting on the server
    pub fn loading_elapsed(&self, id: &SegmentId) -> Option<Duration> {
        self.pending.get(id).map(Instant::elapsed)
    }

    /// Last fetch of the segment failed; it stays in `Loading` until reloaded.
    pub fn has_failed(&self, id: &SegmentId) -> bool {
        self.failed.contains(id)
    }
}
