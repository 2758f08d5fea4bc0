//! Derived tile data: placeable marking and smoothed vertex heights.
//!
//! Vertex heights use running accumulators. A tile pulls the heights of its
//! loaded source tiles when its own data lands, and pushes its height into
//! tiles of other segments that were loaded earlier. Tiles of the segment
//! being propagated pull each other, so pushes never target them; this keeps
//! every contribution counted exactly once whatever the arrival order.

use std::collections::{BTreeMap, BTreeSet};

use super::state::{Board, TileCategory};
use super::tables::{NEIGHBOR_HEX, VERTEX_HEIGHT_SOURCES, VERTEX_PROPAGATION};
use super::tile::{SegmentId, hex_anchor};
use crate::server::structs::ChangedTile;

/// Tile indices touched per segment
pub type ChangedTiles = BTreeMap<SegmentId, BTreeSet<usize>>;

/// Run every derived-data step over a freshly merged segment, in row-major order.
/// `previous_heights[i]` holds the height tile `i` had if it was already loaded.
pub fn propagate_segment(
    board: &mut Board,
    segment: SegmentId,
    previous_heights: &[Option<f64>],
    changed: &mut ChangedTiles,
) {
    let size = board.segment_size();
    for index in 0..size.tile_count() {
        let (x, y) = segment.tile_position(index, size);
        mark_adjacency(board, x, y, changed);
        pull_vertex_heights(board, x, y);
        let previous = previous_heights.get(index).copied().flatten();
        push_height(board, x, y, previous, Some(segment), changed);
    }
}

/// Undo the pushes of every loaded tile in a segment about to leave the store.
pub fn retract_segment(board: &mut Board, segment: SegmentId, changed: &mut ChangedTiles) {
    let size = board.segment_size();
    for index in 0..size.tile_count() {
        let (x, y) = segment.tile_position(index, size);
        let Some(tile) = board.tile(x, y).filter(|t| t.is_loaded()) else {
            continue;
        };
        let k = tile.hex_tile_index() as usize;
        let height = tile.height;
        for target in VERTEX_PROPAGATION[k] {
            let (nx, ny) = (x + target.dx, y + target.dy);
            if board.segment_id_at(nx, ny) == segment {
                continue;
            }
            let Some(n) = board.tile_mut(nx, ny).filter(|n| n.is_loaded()) else {
                continue;
            };
            let v = target.vertex;
            n.vertex_height_sum[v] -= height;
            n.vertex_height_count[v] = n.vertex_height_count[v].saturating_sub(1).max(1);
            n.vertex_height[v] = n.vertex_height_sum[v] / n.vertex_height_count[v] as f64;
            record(board, changed, nx, ny);
        }
    }
}

/// Apply one server-side tile change to an already loaded tile.
/// Returns false when the tile has no loaded data to change.
pub fn apply_tile_change(
    board: &mut Board,
    segment: SegmentId,
    change: &ChangedTile,
    changed: &mut ChangedTiles,
) -> bool {
    let (x, y) = (segment.x + change.x, segment.y + change.y);
    let Some(tile) = board.tile_mut(x, y).filter(|t| t.is_loaded()) else {
        return false;
    };

    let old_height = tile.height;
    if let Some(category) = &change.category {
        tile.category = TileCategory::from_server(category);
    }
    if let Some(z) = change.z {
        tile.height = z;
    }
    if let Some(token_id) = change.token_id {
        tile.token_id = Some(token_id);
    }
    for p in &change.parameters {
        tile.parameters.insert(p.parameter_index, p.quantity);
    }
    let new_height = tile.height;

    pull_vertex_heights(board, x, y);
    if new_height != old_height {
        // Every loaded target already counts this tile.
        push_height(board, x, y, Some(old_height), None, changed);
    }
    mark_adjacency(board, x, y, changed);
    record(board, changed, x, y);
    true
}

/// A placed tile makes the empty tiles of its adjacent hexagon placeable; an
/// empty tile whose hexagon borders a placed tile becomes placeable itself.
fn mark_adjacency(board: &mut Board, x: i64, y: i64, changed: &mut ChangedTiles) {
    let Some(tile) = board.tile(x, y) else {
        return;
    };
    let k = tile.hex_tile_index() as usize;
    let placed = tile.category.is_placed();
    let empty = tile.category == TileCategory::Empty;

    if placed {
        for (dx, dy) in NEIGHBOR_HEX[k] {
            let (nx, ny) = (x + dx, y + dy);
            if let Some(n) = board
                .tile_mut(nx, ny)
                .filter(|n| n.category == TileCategory::Empty)
            {
                n.category = TileCategory::Placeable;
                record(board, changed, nx, ny);
            }
        }
    } else if empty {
        // Tile j of a neighbouring hexagon faces back at tile 5 - j of ours.
        let (ax, ay) = hex_anchor(x, y);
        let borders_token = (0..6).any(|j| {
            let (dx, dy) = NEIGHBOR_HEX[j][5 - j];
            let (tx, ty) = (ax + (j % 3) as i64 + dx, ay + (j / 3) as i64 + dy);
            board.tile(tx, ty).is_some_and(|n| n.category.is_placed())
        });
        if borders_token {
            if let Some(tile) = board.tile_mut(x, y) {
                tile.category = TileCategory::Placeable;
            }
            record(board, changed, x, y);
        }
    }
}

/// Recompute all three vertex accumulators of a tile from its loaded sources.
fn pull_vertex_heights(board: &mut Board, x: i64, y: i64) {
    let Some(tile) = board.tile(x, y) else {
        return;
    };
    let k = tile.hex_tile_index() as usize;
    let height = tile.height;

    let mut sums = [0.0; 3];
    let mut counts = [0u32; 3];
    for (v, sources) in VERTEX_HEIGHT_SOURCES[k].iter().enumerate() {
        let mut sum = height;
        let mut count = 1;
        for source in sources {
            match source {
                Some((dx, dy)) => {
                    if let Some(n) = board.tile(x + dx, y + dy).filter(|n| n.is_loaded()) {
                        sum += n.height;
                        count += 1;
                    }
                }
                // Centre of the hexagon: the tile stands in for its own neighbours.
                None => {
                    sum += height;
                    count += 1;
                }
            }
        }
        sums[v] = sum;
        counts[v] = count;
    }

    if let Some(tile) = board.tile_mut(x, y) {
        tile.vertex_height_sum = sums;
        tile.vertex_height_count = counts;
        tile.vertex_height = std::array::from_fn(|v| sums[v] / counts[v] as f64);
    }
}

/// Add this tile's height to the running averages of loaded targets.
/// With a `previous` height only the difference is added, the tile being counted already.
fn push_height(
    board: &mut Board,
    x: i64,
    y: i64,
    previous: Option<f64>,
    skip: Option<SegmentId>,
    changed: &mut ChangedTiles,
) {
    let Some(tile) = board.tile(x, y) else {
        return;
    };
    let k = tile.hex_tile_index() as usize;
    let height = tile.height;
    if previous == Some(height) {
        return;
    }

    for target in VERTEX_PROPAGATION[k] {
        let (nx, ny) = (x + target.dx, y + target.dy);
        if skip == Some(board.segment_id_at(nx, ny)) {
            continue;
        }
        let Some(n) = board.tile_mut(nx, ny).filter(|n| n.is_loaded()) else {
            continue;
        };
        let v = target.vertex;
        match previous {
            Some(old) => n.vertex_height_sum[v] += height - old,
            None => {
                n.vertex_height_sum[v] += height;
                n.vertex_height_count[v] += 1;
            }
        }
        n.vertex_height[v] = n.vertex_height_sum[v] / n.vertex_height_count[v].max(1) as f64;
        record(board, changed, nx, ny);
    }
}

/// Note a changed tile. A segment with fresh changes is wanted on screen again,
/// so any not-visible mark on it is dropped.
fn record(board: &mut Board, changed: &mut ChangedTiles, x: i64, y: i64) {
    let segment = board.segment_id_at(x, y);
    if let Some(index) = segment.tile_index(x, y, board.segment_size()) {
        changed.entry(segment).or_default().insert(index);
        board.segments.mark_visible(&segment);
    }
}
