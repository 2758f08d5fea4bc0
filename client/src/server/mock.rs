//! Scripted fetcher for tests: records requests, tests decide when and how they resolve.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::structs::{SegmentTile, SegmentTileCollection};
use super::{SegmentFetcher, SegmentLoadResult, SegmentRequest};
use crate::board::tile::SegmentId;
use crate::error::BoardError;

#[derive(Default)]
struct Script {
    requests: Vec<SegmentRequest>,
    ready: VecDeque<SegmentLoadResult>,
}

#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    script: Rc<RefCell<Script>>,
}

impl ScriptedFetcher {
    pub fn requests(&self) -> Vec<SegmentRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.borrow().requests.len()
    }

    /// Queue a successful response
    pub fn respond(&self, segment: SegmentId, tiles: Vec<SegmentTile>) {
        let collection = SegmentTileCollection {
            size_x: 0,
            size_y: 0,
            segments: tiles,
        };
        self.push(SegmentLoadResult::Success(segment, collection));
    }

    /// Queue a transport failure
    pub fn fail(&self, segment: SegmentId) {
        self.push(SegmentLoadResult::Failed(
            segment,
            BoardError::Transport {
                segment,
                reason: "connection reset".to_string(),
            },
        ));
    }

    pub fn push(&self, result: SegmentLoadResult) {
        self.script.borrow_mut().ready.push_back(result);
    }
}

impl SegmentFetcher for ScriptedFetcher {
    fn fetch(&mut self, request: SegmentRequest) {
        self.script.borrow_mut().requests.push(request);
    }

    fn poll(&mut self) -> Option<SegmentLoadResult> {
        self.script.borrow_mut().ready.pop_front()
    }
}

/// The 6 server tiles of a token whose hexagon is anchored at (x, y)
pub fn token_tiles(x: i64, y: i64, category: &str, token_id: i64, height: f64) -> Vec<SegmentTile> {
    (0..6)
        .map(|i| SegmentTile {
            x: x + i % 3,
            y: y + i / 3,
            height,
            category: category.to_string(),
            token_id,
            parameters: Vec::new(),
        })
        .collect()
}
