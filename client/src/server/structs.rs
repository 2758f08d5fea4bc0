//! Structures in the REST API
//! Segment tiles use condensed keys for smaller packets.

use serde::{Deserialize, Serialize};

use crate::board::tile::SegmentId;
use crate::error::BoardError;

/// Response body of a segment fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTileCollection {
    #[serde(rename = "sizeX")]
    pub size_x: i64,
    #[serde(rename = "sizeY")]
    pub size_y: i64,
    /// Only populated tiles; everything else in the rectangle is empty.
    pub segments: Vec<SegmentTile>,
}

impl SegmentTileCollection {
    /// Parse a response body; any missing field is a malformed payload.
    pub fn parse(segment: SegmentId, body: &[u8]) -> Result<Self, BoardError> {
        serde_json::from_slice(body).map_err(|e| BoardError::MalformedPayload {
            segment,
            reason: e.to_string(),
        })
    }
}

/// A single populated tile, in absolute board coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTile {
    pub x: i64,
    pub y: i64,
    #[serde(rename = "h")]
    pub height: f64,
    #[serde(rename = "c")]
    pub category: String,
    #[serde(rename = "t")]
    pub token_id: i64,
    #[serde(rename = "p", default)]
    pub parameters: Vec<SegmentTileParameter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentTileParameter {
    #[serde(rename = "i")]
    pub index: u32,
    #[serde(rename = "q")]
    pub quantity: f64,
}

/// Tiles of one segment altered by a completed turn.
/// Only the changed fields of the changed tiles are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentChange {
    /// Segment anchor
    pub x: i64,
    pub y: i64,
    pub tiles: Vec<ChangedTile>,
}

/// Tile position is relative to the segment anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedTile {
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub token_id: Option<i64>,
    #[serde(default)]
    pub parameters: Vec<ChangedParameter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedParameter {
    pub parameter_index: u32,
    pub quantity: f64,
}
