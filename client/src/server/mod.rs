//! Remote segment fetching

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod structs;

use crate::board::tile::SegmentId;
use crate::error::BoardError;

pub use http::HttpSegmentFetcher;
pub use structs::{SegmentChange, SegmentTile, SegmentTileCollection};

/// A rectangular region of tiles to fetch for one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRequest {
    pub game_id: String,
    pub segment_id: SegmentId,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl SegmentRequest {
    /// Build the segment endpoint URL under `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/game/{}/segment?x={}&y={}&width={}&height={}",
            base_url.trim_end_matches('/'),
            self.game_id,
            self.x,
            self.y,
            self.width,
            self.height
        )
    }
}

/// Result of a segment fetch
#[derive(Debug)]
pub enum SegmentLoadResult {
    Success(SegmentId, SegmentTileCollection),
    Failed(SegmentId, BoardError),
}

/// Fetches segments in the background; results are collected with `poll`.
pub trait SegmentFetcher {
    /// Start a fetch. Must not block.
    fn fetch(&mut self, request: SegmentRequest);

    /// Next completed fetch, if any
    fn poll(&mut self) -> Option<SegmentLoadResult>;
}
