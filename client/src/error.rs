//! Error taxonomy for the board state client

use thiserror::Error;

use crate::board::tile::SegmentId;

#[derive(Error, Debug)]
pub enum BoardError {
    /// A request capability was used after its handler was removed.
    #[error("handler deactivated")]
    HandlerRemoved,

    /// A request capability was used while the board is being read or updated.
    #[error("board is busy")]
    BoardBusy,

    #[error("invalid segment id {0:?}")]
    InvalidSegmentId(String),

    #[error("malformed payload for segment {segment}: {reason}")]
    MalformedPayload { segment: SegmentId, reason: String },

    #[error("fetch of segment {segment} failed: {reason}")]
    Transport { segment: SegmentId, reason: String },

    #[error("fetch of segment {segment} returned HTTP {status}")]
    HttpStatus { segment: SegmentId, status: u16 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardError {
    /// Errors that indicate a collaborator broke its contract, as opposed to
    /// a transient network condition.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, BoardError::Transport { .. } | BoardError::HttpStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
