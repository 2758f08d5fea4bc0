//! Board client configuration

use serde::{Deserialize, Serialize};

use crate::board::state::TileParameterType;
use crate::board::tile::SegmentSize;
use crate::error::{BoardError, Result};

/// Connection and board geometry for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    pub game_id: String,
    /// Base URL of the game server API
    pub server_url: String,
    pub user_agent: String,

    // === Segment geometry ===
    /// Tiles per segment row
    pub segment_width: u32,
    /// Tile rows per segment
    pub segment_height: u32,

    pub parameter_types: Vec<TileParameterType>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            game_id: String::new(),
            server_url: "http://localhost:3000/api".to_string(),
            user_agent: concat!("board-client/", env!("CARGO_PKG_VERSION")).to_string(),
            segment_width: 16,
            segment_height: 9,
            parameter_types: Vec::new(),
        }
    }
}

impl BoardConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.game_id.is_empty() {
            return Err(BoardError::InvalidConfig("game id is empty".to_string()));
        }
        if self.segment_width == 0 || self.segment_height == 0 {
            return Err(BoardError::InvalidConfig(format!(
                "segment size {}x{} is empty",
                self.segment_width, self.segment_height
            )));
        }
        Ok(())
    }

    pub fn segment_size(&self) -> SegmentSize {
        SegmentSize::new(self.segment_width, self.segment_height)
    }
}
