//! Board state manager: segment loading, derived tile data and status handlers

pub mod cache;
pub mod events;
pub mod loader;
pub mod propagate;
pub mod state;
pub mod tables;
pub mod tile;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::server::{HttpSegmentFetcher, SegmentChange, SegmentFetcher};
use cache::StoreStats;
use events::{BoardEvent, BoardStatusHandler, dispatch};
use loader::{SegmentLoadOutcome, SegmentLoader};
use propagate::{ChangedTiles, apply_tile_change, retract_segment};
use state::{Board, Tile};
use tile::{SegmentId, normalize_to_segment_origin};

/// Segments handled by one `BoardManager::update` call
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<SegmentId>,
    /// Transient fetch failures; these segments stay in `Loading`.
    pub failed: Vec<(SegmentId, BoardError)>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.failed.is_empty()
    }
}

struct Registration {
    handler: Rc<dyn BoardStatusHandler>,
    active: Rc<Cell<bool>>,
}

struct BoardInner {
    board: Board,
    loader: SegmentLoader,
    handlers: Vec<Registration>,
}

impl BoardInner {
    fn handlers(&self) -> Vec<Rc<dyn BoardStatusHandler>> {
        self.handlers.iter().map(|r| r.handler.clone()).collect()
    }
}

/// Owns the board. Call `update` once per frame to apply completed fetches.
pub struct BoardManager {
    inner: Rc<RefCell<BoardInner>>,
}

impl BoardManager {
    pub fn new(config: &BoardConfig, fetcher: Box<dyn SegmentFetcher>) -> Result<Self> {
        config.validate()?;
        let size = config.segment_size();
        info!(
            "Board for game {} with {}x{} segments",
            config.game_id, size.width, size.height
        );

        let inner = BoardInner {
            board: Board::new(size, &config.parameter_types),
            loader: SegmentLoader::new(&config.game_id, fetcher),
            handlers: Vec::new(),
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(inner)),
        })
    }

    /// Manager fetching from the configured game server
    pub fn connect(config: &BoardConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpSegmentFetcher::new(&config.server_url, &config.user_agent);
        Self::new(config, Box::new(fetcher))
    }

    /// Register a handler and hand out its request capability
    pub fn register_handler(&self, handler: Rc<dyn BoardStatusHandler>) -> BoardRequests {
        let active = Rc::new(Cell::new(true));
        self.inner.borrow_mut().handlers.push(Registration {
            handler,
            active: active.clone(),
        });
        BoardRequests {
            inner: Rc::downgrade(&self.inner),
            active,
        }
    }

    /// Stop notifying a handler and disable every capability issued for it.
    pub fn remove_handler(&self, handler: &Rc<dyn BoardStatusHandler>) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.handlers.len();
        inner.handlers.retain(|r| {
            let matches = Rc::ptr_eq(&r.handler, handler);
            if matches {
                r.active.set(false);
            }
            !matches
        });
        inner.handlers.len() != before
    }

    /// Apply all completed fetches and notify handlers.
    /// A contract violation from the server stops processing and is returned.
    /// Segments applied before it stay loaded and their handlers have already
    /// run; results still queued are picked up by the next call.
    pub fn update(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        loop {
            let (outcome, handlers) = {
                let mut inner = self.inner.borrow_mut();
                let inner = &mut *inner;
                let Some(outcome) = inner.loader.poll(&mut inner.board) else {
                    break;
                };
                (outcome, inner.handlers())
            };

            match outcome {
                SegmentLoadOutcome::Loaded { segment, neighbors } => {
                    debug!("Segment {} loaded", segment);
                    dispatch(&handlers, &BoardEvent::Loaded(segment));
                    notify_updated(&handlers, neighbors);
                    report.loaded.push(segment);
                }
                SegmentLoadOutcome::Failed { segment, error } => {
                    if error.is_contract_violation() {
                        error!("Segment {} rejected: {}", segment, error);
                        if !report.is_empty() {
                            warn!(
                                "Update stopped after loading {:?} ({} failed)",
                                report.loaded,
                                report.failed.len()
                            );
                        }
                        return Err(error);
                    }
                    warn!("Segment {} failed to load: {}", segment, error);
                    report.failed.push((segment, error));
                }
            }
        }
        Ok(report)
    }

    /// Apply tile changes pushed by the server after a turn.
    /// Returns the number of tiles changed; tiles of segments not loaded are skipped.
    pub fn apply_segment_changes(&self, changes: &[SegmentChange]) -> Result<usize> {
        let (count, changed, handlers) = {
            let mut inner = self.inner.borrow_mut();
            let board = &mut inner.board;
            let size = board.segment_size();

            for change in changes {
                let id = SegmentId::new(change.x, change.y);
                if board.segment_id_at(change.x, change.y) != id {
                    return Err(BoardError::MalformedPayload {
                        segment: id,
                        reason: "change anchor is not a segment origin".to_string(),
                    });
                }
                if let Some(tile) = change.tiles.iter().find(|t| {
                    id.tile_index(id.x + t.x, id.y + t.y, size).is_none()
                }) {
                    return Err(BoardError::MalformedPayload {
                        segment: id,
                        reason: format!("changed tile ({}, {}) outside the segment", tile.x, tile.y),
                    });
                }
            }

            let mut count = 0;
            let mut changed = ChangedTiles::new();
            for change in changes {
                let id = SegmentId::new(change.x, change.y);
                if !board.contains_segment(&id) {
                    debug!("Skipping changes for segment {} not in the board", id);
                    continue;
                }
                for tile in &change.tiles {
                    if apply_tile_change(board, id, tile, &mut changed) {
                        count += 1;
                    }
                }
            }
            if count > 0 {
                board.bump_load_id();
            }
            (count, changed, inner.handlers())
        };

        notify_updated(&handlers, changed);
        Ok(count)
    }

    /// Drop every segment marked not visible that has no fetch in flight.
    pub fn evict_not_visible(&self) -> Vec<SegmentId> {
        let (removed, changed, handlers) = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let removed: Vec<SegmentId> = inner
                .board
                .segments
                .not_visible()
                .into_iter()
                .filter(|id| !inner.loader.is_loading(id) || inner.loader.has_failed(id))
                .collect();

            let mut changed = ChangedTiles::new();
            for id in &removed {
                retract_segment(&mut inner.board, *id, &mut changed);
                inner.board.remove_segment(id);
                inner.loader.forget(id);
            }
            for id in &removed {
                changed.remove(id);
            }
            if !removed.is_empty() {
                inner.board.bump_load_id();
                debug!("Evicted {} segments", removed.len());
            }
            (removed, changed, inner.handlers())
        };

        for id in &removed {
            dispatch(&handlers, &BoardEvent::Removed(*id));
        }
        notify_updated(&handlers, changed);
        removed
    }

    /// Fetch a stored segment again. Returns false if it is absent or already loading.
    pub fn reload_segment(&self, id: SegmentId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        inner.loader.reload_segment(&mut inner.board, id)
    }

    /// Read-only view of the board
    pub fn with_board<R>(&self, f: impl FnOnce(&Board) -> R) -> R {
        f(&self.inner.borrow().board)
    }

    pub fn load_id(&self) -> u64 {
        self.inner.borrow().board.load_id()
    }

    pub fn has_failed(&self, id: &SegmentId) -> bool {
        self.inner.borrow().loader.has_failed(id)
    }

    pub fn loading_elapsed(&self, id: &SegmentId) -> Option<Duration> {
        self.inner.borrow().loader.loading_elapsed(id)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().loader.pending_count()
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.borrow().board.segments.stats()
    }
}

fn notify_updated(handlers: &[Rc<dyn BoardStatusHandler>], changed: ChangedTiles) {
    for (id, tiles) in changed {
        dispatch(handlers, &BoardEvent::Updated(id, tiles.into_iter().collect()));
    }
}

/// Request capability handed to a registered handler.
/// Every call fails with `HandlerRemoved` once the handler is removed.
#[derive(Clone)]
pub struct BoardRequests {
    inner: Weak<RefCell<BoardInner>>,
    active: Rc<Cell<bool>>,
}

impl BoardRequests {
    pub fn is_active(&self) -> bool {
        self.active.get() && self.inner.strong_count() > 0
    }

    fn inner(&self) -> Result<Rc<RefCell<BoardInner>>> {
        if !self.active.get() {
            return Err(BoardError::HandlerRemoved);
        }
        self.inner.upgrade().ok_or(BoardError::HandlerRemoved)
    }

    fn read<R>(&self, f: impl FnOnce(&BoardInner) -> R) -> Result<R> {
        let inner = self.inner()?;
        let inner = inner.try_borrow().map_err(|_| BoardError::BoardBusy)?;
        Ok(f(&inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut BoardInner) -> R) -> Result<R> {
        let inner = self.inner()?;
        let mut inner = inner.try_borrow_mut().map_err(|_| BoardError::BoardBusy)?;
        Ok(f(&mut inner))
    }

    /// Id of the segment containing the absolute tile position
    pub fn segment_id(&self, x: i64, y: i64) -> Result<SegmentId> {
        self.read(|inner| inner.board.segment_id_at(x, y))
    }

    pub fn normalized_segment_position(&self, x: i64, y: i64) -> Result<(i64, i64)> {
        self.read(|inner| normalize_to_segment_origin(x, y, inner.board.segment_size()))
    }

    /// Load the segment containing (x, y) unless it is present or loading.
    pub fn request_segment(&self, x: i64, y: i64) -> Result<SegmentId> {
        self.write(|inner| {
            let id = inner.board.segment_id_at(x, y);
            inner.loader.request_segment(&mut inner.board, id);
            id
        })
    }

    /// Allow the segment to be evicted by `BoardManager::evict_not_visible`.
    pub fn mark_segment_not_visible(&self, id: SegmentId) -> Result<bool> {
        self.write(|inner| inner.board.segments.mark_not_visible(id))
    }

    pub fn with_board<R>(&self, f: impl FnOnce(&Board) -> R) -> Result<R> {
        self.read(|inner| f(&inner.board))
    }

    pub fn tile_at(&self, x: i64, y: i64) -> Result<Option<Tile>> {
        self.read(|inner| inner.board.tile(x, y).cloned())
    }

    pub fn load_id(&self) -> Result<u64> {
        self.read(|inner| inner.board.load_id())
    }

    /// Show the player's token before the server acknowledges it.
    pub fn mark_played_token(
        &self,
        segment: SegmentId,
        x: i64,
        y: i64,
        tiles: [Tile; 6],
    ) -> Result<()> {
        self.write(|inner| {
            let token = inner.board.client_placed_token_mut();
            token.tiles = tiles;
            token.x = x;
            token.y = y;
            token.segment_id = Some(segment);
            inner.board.bump_load_id();
        })
    }

    pub fn clear_played_token(&self) -> Result<()> {
        self.write(|inner| {
            *inner.board.client_placed_token_mut() = Default::default();
            inner.board.bump_load_id();
        })
    }
}
