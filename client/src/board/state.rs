//! Client side board state: tiles, segments and the partially loaded board

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::cache::SegmentStore;
use super::tables::NEIGHBOR_HEX;
use super::tile::{SegmentId, SegmentSize, hex_tile_index};

/// Height given to tiles that have no server data
pub const EMPTY_TILE_HEIGHT: f64 = -2.0;

/// Tile category state machine:
/// `Unset -> Loading -> Empty | Placed`, and `Empty -> Placeable` through propagation.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TileCategory {
    #[default]
    Unset,
    Loading,
    Empty,
    Placeable,
    Placed(String),
}

impl TileCategory {
    /// Map a server category string
    pub fn from_server(category: &str) -> Self {
        match category {
            "" | "empty" => TileCategory::Empty,
            other => TileCategory::Placed(other.to_string()),
        }
    }

    /// The tile holds real server data
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            TileCategory::Empty | TileCategory::Placeable | TileCategory::Placed(_)
        )
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, TileCategory::Placed(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TileCategory::Unset => None,
            TileCategory::Loading => Some("loading"),
            TileCategory::Empty => Some("empty"),
            TileCategory::Placeable => Some("placeable"),
            TileCategory::Placed(c) => Some(c),
        }
    }
}

/// A single triangle on the board
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub category: TileCategory,
    /// Shared by the 6 tiles of one token
    pub token_id: Option<i64>,
    pub variation: u32,
    pub height: f64,
    /// Parameter key -> quantity
    pub parameters: BTreeMap<u32, f64>,
    hex_tile_index: u8,

    pub vertex_height: [f64; 3],
    pub vertex_height_sum: [f64; 3],
    pub vertex_height_count: [u32; 3],
}

impl Tile {
    /// Blank tile for the absolute position (x, y)
    pub fn new(x: i64, y: i64) -> Self {
        Self::with_hex_index(hex_tile_index(x, y))
    }

    pub(crate) fn with_hex_index(hex_tile_index: u8) -> Self {
        Self {
            category: TileCategory::Unset,
            token_id: None,
            variation: 0,
            height: EMPTY_TILE_HEIGHT,
            parameters: BTreeMap::new(),
            hex_tile_index,
            vertex_height: [0.0; 3],
            vertex_height_sum: [0.0; 3],
            vertex_height_count: [0; 3],
        }
    }

    pub fn hex_tile_index(&self) -> u8 {
        self.hex_tile_index
    }

    pub fn is_loaded(&self) -> bool {
        self.category.is_loaded()
    }

    pub(crate) fn reset_vertex_heights(&mut self) {
        self.vertex_height = [0.0; 3];
        self.vertex_height_sum = [0.0; 3];
        self.vertex_height_count = [0; 3];
    }

    /// Drop all server data, keeping the tile's position in the hexagon.
    pub(crate) fn clear_to(&mut self, category: TileCategory) {
        self.category = category;
        self.token_id = None;
        self.variation = 0;
        self.height = EMPTY_TILE_HEIGHT;
        self.parameters.clear();
        self.reset_vertex_heights();
    }
}

/// A rectangle of tiles fetched from the server in a single batch
#[derive(Clone, Debug)]
pub struct Segment {
    pub id: SegmentId,
    pub x: i64,
    pub y: i64,
    /// Row-major, always fully populated
    pub tiles: Vec<Tile>,
}

impl Segment {
    /// Allocate a segment of `Loading` placeholder tiles
    pub fn placeholder(id: SegmentId, size: SegmentSize) -> Self {
        let tiles = (0..size.tile_count())
            .map(|index| {
                let (x, y) = id.tile_position(index, size);
                let mut tile = Tile::new(x, y);
                tile.category = TileCategory::Loading;
                tile
            })
            .collect();
        Self {
            id,
            x: id.x,
            y: id.y,
            tiles,
        }
    }

    /// Still waiting on its first server response
    pub fn is_placeholder(&self) -> bool {
        self.tiles.iter().all(|t| t.category == TileCategory::Loading)
    }
}

/// A value type a tile parameter can hold, for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileParameterType {
    pub name: String,
    pub l10n: String,
    pub key: u32,
}

/// Total tile rectangle covered by the stored segments (max exclusive)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardExtent {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl BoardExtent {
    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }
}

/// Optimistic token placed by the player, not yet acknowledged by the server
#[derive(Clone, Debug)]
pub struct ClientPlacedToken {
    pub tiles: [Tile; 6],
    pub x: i64,
    pub y: i64,
    pub segment_id: Option<SegmentId>,
}

impl Default for ClientPlacedToken {
    fn default() -> Self {
        Self {
            tiles: std::array::from_fn(|i| Tile::with_hex_index(i as u8)),
            x: 0,
            y: 0,
            segment_id: None,
        }
    }
}

/// The potentially partial in-memory representation of the active game board
pub struct Board {
    segment_size: SegmentSize,
    parameter_types: BTreeMap<u32, TileParameterType>,
    pub(crate) segments: SegmentStore,
    load_id: u64,
    extent: Option<BoardExtent>,
    client_placed: ClientPlacedToken,
}

impl Board {
    /// # Panics
    ///
    /// Panics if `segment_size` has a zero dimension.
    pub fn new(segment_size: SegmentSize, parameter_types: &[TileParameterType]) -> Self {
        assert!(!segment_size.is_empty(), "board needs a non-empty segment size");
        Self {
            segment_size,
            parameter_types: parameter_types
                .iter()
                .map(|pt| (pt.key, pt.clone()))
                .collect(),
            segments: SegmentStore::default(),
            load_id: 0,
            extent: None,
            client_placed: ClientPlacedToken::default(),
        }
    }

    pub fn segment_size(&self) -> SegmentSize {
        self.segment_size
    }

    /// Changes whenever visible board state changes
    pub fn load_id(&self) -> u64 {
        self.load_id
    }

    pub(crate) fn bump_load_id(&mut self) {
        self.load_id += 1;
    }

    pub fn parameter_type(&self, key: u32) -> Option<&TileParameterType> {
        self.parameter_types.get(&key)
    }

    pub fn extent(&self) -> Option<BoardExtent> {
        self.extent
    }

    pub fn client_placed_token(&self) -> &ClientPlacedToken {
        &self.client_placed
    }

    pub(crate) fn client_placed_token_mut(&mut self) -> &mut ClientPlacedToken {
        &mut self.client_placed
    }

    pub fn segment_id_at(&self, x: i64, y: i64) -> SegmentId {
        SegmentId::containing(x, y, self.segment_size)
    }

    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub(crate) fn segment_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id)
    }

    pub fn contains_segment(&self, id: &SegmentId) -> bool {
        self.segments.contains(id)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Look up a tile; absent when its segment is not in the store.
    pub fn tile(&self, x: i64, y: i64) -> Option<&Tile> {
        let id = self.segment_id_at(x, y);
        let index = id.tile_index(x, y, self.segment_size)?;
        self.segments.get(&id).map(|s| &s.tiles[index])
    }

    pub(crate) fn tile_mut(&mut self, x: i64, y: i64) -> Option<&mut Tile> {
        let id = self.segment_id_at(x, y);
        let index = id.tile_index(x, y, self.segment_size)?;
        self.segments.get_mut(&id).map(|s| &mut s.tiles[index])
    }

    /// Tiles of the hexagon sharing the outer edge of the tile at (x, y).
    pub fn adjacent_hex(&self, x: i64, y: i64) -> [Option<&Tile>; 6] {
        let k = hex_tile_index(x, y) as usize;
        let offsets = &NEIGHBOR_HEX[k];
        std::array::from_fn(|i| {
            let (dx, dy) = offsets[i];
            self.tile(x + dx, y + dy)
        })
    }

    /// Idempotent; a new segment is filled with `Loading` placeholders.
    pub fn get_or_create_segment(&mut self, id: SegmentId) -> &mut Segment {
        let size = self.segment_size;
        if !self.segments.contains(&id) {
            self.grow_extent(id);
        }
        self.segments
            .get_or_insert_with(id, || Segment::placeholder(id, size))
    }

    pub(crate) fn remove_segment(&mut self, id: &SegmentId) -> Option<Segment> {
        let removed = self.segments.remove(id)?;
        self.extent = None;
        let ids: Vec<SegmentId> = self.segments.iter().map(|s| s.id).collect();
        for id in ids {
            self.grow_extent(id);
        }
        Some(removed)
    }

    fn grow_extent(&mut self, id: SegmentId) {
        let w = self.segment_size.width as i64;
        let h = self.segment_size.height as i64;
        let seg = BoardExtent {
            min_x: id.x,
            max_x: id.x + w,
            min_y: id.y,
            max_y: id.y + h,
        };
        self.extent = Some(match self.extent {
            None => seg,
            Some(e) => BoardExtent {
                min_x: e.min_x.min(seg.min_x),
                max_x: e.max_x.max(seg.max_x),
                min_y: e.min_y.min(seg.min_y),
                max_y: e.max_y.max(seg.max_y),
            },
        });
    }

    /// Segments grouped into rows (ascending y), each row sorted by x.
    pub fn segments_by_row(&self) -> Vec<Vec<&Segment>> {
        let mut rows: BTreeMap<i64, Vec<&Segment>> = BTreeMap::new();
        for segment in self.segments.iter() {
            rows.entry(segment.y).or_default().push(segment);
        }
        rows.into_values()
            .map(|mut row| {
                row.sort_by_key(|s| s.x);
                row
            })
            .collect()
    }
}
