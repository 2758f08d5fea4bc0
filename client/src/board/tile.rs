//! Tile coordinate system and conversions
//! Tiles are equilateral triangles; six of them make a hexagon that spans
//! 3 columns x 2 rows. Every other 3-column block of hexagons is shifted
//! down by one row.

use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// Fixed segment dimensions for a board instance
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct SegmentSize {
    pub width: u32,
    pub height: u32,
}

impl SegmentSize {
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "segment size {width}x{height} is empty"
        );
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Unique identifier for a board segment, keyed by its upper-left tile
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SegmentId {
    pub x: i64,
    pub y: i64,
}

impl SegmentId {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Segment covering the absolute tile coordinate
    pub fn containing(x: i64, y: i64, size: SegmentSize) -> Self {
        let (sx, sy) = normalize_to_segment_origin(x, y, size);
        Self { x: sx, y: sy }
    }

    /// Row-major index of an absolute tile inside this segment, if it is inside.
    pub fn tile_index(&self, x: i64, y: i64, size: SegmentSize) -> Option<usize> {
        let col = x - self.x;
        let row = y - self.y;
        if col < 0 || row < 0 || col >= size.width as i64 || row >= size.height as i64 {
            return None;
        }
        Some((col + row * size.width as i64) as usize)
    }

    /// Absolute coordinate of a tile index inside this segment
    pub fn tile_position(&self, index: usize, size: SegmentSize) -> (i64, i64) {
        let w = size.width as usize;
        (self.x + (index % w) as i64, self.y + (index / w) as i64)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for SegmentId {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BoardError::InvalidSegmentId(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

/// Build the segment id for a segment anchor
pub fn segment_id(seg_x: i64, seg_y: i64) -> SegmentId {
    SegmentId::new(seg_x, seg_y)
}

/// Upper-left anchor of the segment containing (x, y), using floor division
pub fn normalize_to_segment_origin(x: i64, y: i64, size: SegmentSize) -> (i64, i64) {
    let w = size.width as i64;
    let h = size.height as i64;
    (x.div_euclid(w) * w, y.div_euclid(h) * h)
}

/// Position of a tile inside its hexagon.
/// ```text
///      ._____.
///     / \ 1 / \
///    /_0_\./_2_\
///    \ 3 / \ 5 /
///     \./_4_\./
/// ```
pub fn hex_tile_index(x: i64, y: i64) -> u8 {
    let col = x.rem_euclid(3);
    let row = if x.rem_euclid(6) < 3 {
        y.rem_euclid(2)
    } else {
        (y + 1).rem_euclid(2)
    };
    (col + row * 3) as u8
}

/// Absolute position of hex tile index 0 for the hexagon containing (x, y)
pub fn hex_anchor(x: i64, y: i64) -> (i64, i64) {
    let index = hex_tile_index(x, y) as i64;
    (x - index % 3, y - index / 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_negative() {
        let size = SegmentSize::new(10, 10);
        assert_eq!(normalize_to_segment_origin(-8, 8, size), (-10, 0));
        assert_eq!(normalize_to_segment_origin(-10, -11, size), (-10, -20));
        assert_eq!(normalize_to_segment_origin(9, 10, size), (0, 10));
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn test_zero_segment_size_is_rejected() {
        SegmentSize::new(16, 0);
    }

    #[test]
    fn test_segment_id_string() {
        let id = segment_id(-16, 9);
        assert_eq!(id.to_string(), "-16,9");
        assert_eq!("-16,9".parse::<SegmentId>().unwrap(), id);
        assert!("16".parse::<SegmentId>().is_err());
        assert!("a,b".parse::<SegmentId>().is_err());
    }

    #[test]
    fn test_tile_index_round_trip() {
        let size = SegmentSize::new(16, 9);
        let id = segment_id(-16, 9);
        assert_eq!(id.tile_index(-16, 9, size), Some(0));
        assert_eq!(id.tile_index(-1, 10, size), Some(31));
        assert_eq!(id.tile_position(31, size), (-1, 10));
        assert_eq!(id.tile_index(0, 10, size), None);
        assert_eq!(id.tile_index(-17, 10, size), None);
    }

    #[test]
    fn test_hex_tile_index() {
        // First block: rows start at even rows
        assert_eq!(hex_tile_index(0, 0), 0);
        assert_eq!(hex_tile_index(1, 0), 1);
        assert_eq!(hex_tile_index(2, 0), 2);
        assert_eq!(hex_tile_index(0, 1), 3);
        assert_eq!(hex_tile_index(2, 1), 5);
        // Second block is shifted down a row
        assert_eq!(hex_tile_index(3, 1), 0);
        assert_eq!(hex_tile_index(5, 2), 5);
        assert_eq!(hex_tile_index(4, 0), 4);
        // Negative coordinates follow the same pattern
        assert_eq!(hex_tile_index(-3, 0), 3);
        assert_eq!(hex_tile_index(-1, -1), 2);
        assert_eq!(hex_tile_index(-6, -2), 0);
    }

    #[test]
    fn test_hex_anchor() {
        assert_eq!(hex_anchor(5, 4), (3, 3));
        assert_eq!(hex_anchor(7, 2), (6, 2));
        assert_eq!(hex_anchor(-1, 0), (-3, -1));
    }

    proptest! {
        #[test]
        fn normalize_contains_coordinate(x in -100_000i64..100_000, y in -100_000i64..100_000, w in 1u32..64, h in 1u32..64) {
            let (ax, ay) = normalize_to_segment_origin(x, y, SegmentSize::new(w, h));
            prop_assert!(ax <= x && x < ax + w as i64);
            prop_assert!(ay <= y && y < ay + h as i64);
            prop_assert_eq!(ax.rem_euclid(w as i64), 0);
            prop_assert_eq!(ay.rem_euclid(h as i64), 0);
        }

        #[test]
        fn hex_tiles_share_anchor(x in -1000i64..1000, y in -1000i64..1000) {
            let (ax, ay) = hex_anchor(x, y);
            prop_assert_eq!(hex_tile_index(ax, ay), 0);
            let index = hex_tile_index(x, y) as i64;
            prop_assert_eq!((x - ax, y - ay), (index % 3, index / 3));
        }
    }
}
