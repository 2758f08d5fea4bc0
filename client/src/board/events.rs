//! Board status notifications

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use log::{error, warn};

use super::tile::SegmentId;

/// Receives board changes. Called from `BoardManager::update` and friends,
/// after the manager released the board, so handlers may call back into
/// their `BoardRequests`.
pub trait BoardStatusHandler {
    /// All tiles of the segment now hold server data.
    fn on_segment_loaded(&self, x: i64, y: i64, segment: SegmentId) -> anyhow::Result<()>;

    /// Derived data or server data of some tiles changed. `tiles` are row-major indices.
    fn on_segment_updated(
        &self,
        _x: i64,
        _y: i64,
        _segment: SegmentId,
        _tiles: &[usize],
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// The segment was evicted from the board.
    fn on_segment_removed(&self, _x: i64, _y: i64, _segment: SegmentId) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoardEvent {
    Loaded(SegmentId),
    Updated(SegmentId, Vec<usize>),
    Removed(SegmentId),
}

impl BoardEvent {
    pub fn segment(&self) -> SegmentId {
        match self {
            BoardEvent::Loaded(id) | BoardEvent::Updated(id, _) | BoardEvent::Removed(id) => *id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BoardEvent::Loaded(_) => "on_segment_loaded",
            BoardEvent::Updated(..) => "on_segment_updated",
            BoardEvent::Removed(_) => "on_segment_removed",
        }
    }

    fn deliver(&self, handler: &dyn BoardStatusHandler) -> anyhow::Result<()> {
        let id = self.segment();
        match self {
            BoardEvent::Loaded(_) => handler.on_segment_loaded(id.x, id.y, id),
            BoardEvent::Updated(_, tiles) => handler.on_segment_updated(id.x, id.y, id, tiles),
            BoardEvent::Removed(_) => handler.on_segment_removed(id.x, id.y, id),
        }
    }
}

/// Deliver an event to every handler; a failing handler never stops the others.
/// Returns how many handlers failed.
pub fn dispatch(handlers: &[Rc<dyn BoardStatusHandler>], event: &BoardEvent) -> usize {
    let mut failures = 0;
    for handler in handlers {
        match catch_unwind(AssertUnwindSafe(|| event.deliver(handler.as_ref()))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("{} for segment {} failed: {:#}", event.name(), event.segment(), e);
                failures += 1;
            }
            Err(_) => {
                error!("{} for segment {} panicked", event.name(), event.segment());
                failures += 1;
            }
        }
    }
    failures
}
