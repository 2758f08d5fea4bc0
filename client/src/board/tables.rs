//! Static adjacency and vertex height lookup tables, indexed by hex tile index.
//!
//! Hexagon neighbours relative to the hexagon at anchor (0, 0):
//! ```text
//!   A (-3, -1)    B (0, -2)    C (3, -1)
//!   D (-3,  1)    E (0,  2)    F (3,  1)
//! ```
//! Hex tile 0 borders A, 1 borders B, 2 borders C, 3 borders D, 4 borders E
//! and 5 borders F. Each corner of a hexagon is shared with two other
//! hexagons, so a tile vertex averages the tile with one tile from each.

/// Relative tile offset
pub type Offset = (i64, i64);

/// A neighbouring tile and which of its vertices consumes this tile's height
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VertexTarget {
    pub dx: i64,
    pub dy: i64,
    pub vertex: usize,
}

const fn target(dx: i64, dy: i64, vertex: usize) -> VertexTarget {
    VertexTarget { dx, dy, vertex }
}

/// Offsets to the 6 tiles (hex index order) of the hexagon sharing this tile's outer edge.
pub const NEIGHBOR_HEX: [[Offset; 6]; 6] = [
    // T(0, 0) -> H(A)
    [(-3, -1), (-2, -1), (-1, -1), (-3, 0), (-2, 0), (-1, 0)],
    // T(1, 0) -> H(B)
    [(-1, -2), (0, -2), (1, -2), (-1, -1), (0, -1), (1, -1)],
    // T(2, 0) -> H(C)
    [(1, -1), (2, -1), (3, -1), (1, 0), (2, 0), (3, 0)],
    // T(0, 1) -> H(D)
    [(-3, 0), (-2, 0), (-1, 0), (-3, 1), (-2, 1), (-1, 1)],
    // T(1, 1) -> H(E)
    [(-1, 1), (0, 1), (1, 1), (-1, 2), (0, 2), (1, 2)],
    // T(2, 1) -> H(F)
    [(1, 0), (2, 0), (3, 0), (1, 1), (2, 1), (3, 1)],
];

/// For each vertex, the other tiles averaged with the tile's own height.
/// `None` stands for the tile itself, so the centre vertex of the hexagon averages
/// the tile's height three times and always counts 3.
pub const VERTEX_HEIGHT_SOURCES: [[[Option<Offset>; 2]; 3]; 6] = [
    // T(0, 0)
    [
        [Some((-1, 0)), Some((1, -1))], // P0: H(A):T(2, 1), H(B):T(1, 1)
        [Some((-1, 0)), Some((-1, 1))], // P2: H(A):T(2, 1), H(D):T(2, 0)
        [None, None],                   // P3
    ],
    // T(1, 0)
    [
        [None, None],                   // P3
        [Some((0, -1)), Some((2, 0))],  // P1: H(B):T(1, 1), H(C):T(0, 1)
        [Some((-2, 0)), Some((0, -1))], // P0: H(A):T(2, 1), H(B):T(1, 1)
    ],
    // T(2, 0)
    [
        [Some((-1, -1)), Some((1, 0))], // P1: H(B):T(1, 1), H(C):T(0, 1)
        [None, None],                   // P3
        [Some((1, 0)), Some((1, 1))],   // P4: H(C):T(0, 1), H(F):T(0, 0)
    ],
    // T(0, 1)
    [
        [Some((-1, 0)), Some((1, 1))],   // P5: H(D):T(2, 0), H(E):T(1, 0)
        [None, None],                    // P3
        [Some((-1, -1)), Some((-1, 0))], // P2: H(A):T(2, 1), H(D):T(2, 0)
    ],
    // T(1, 1)
    [
        [None, None],                  // P3
        [Some((-2, 0)), Some((0, 1))], // P5: H(D):T(2, 0), H(E):T(1, 0)
        [Some((0, 1)), Some((2, 0))],  // P6: H(E):T(1, 0), H(F):T(0, 0)
    ],
    // T(2, 1)
    [
        [Some((-1, 1)), Some((1, 0))], // P6: H(E):T(1, 0), H(F):T(0, 0)
        [Some((1, -1)), Some((1, 0))], // P4: H(C):T(0, 1), H(F):T(0, 0)
        [None, None],                  // P3
    ],
];

/// Tiles in other hexagons whose vertex averages include this tile's height.
pub const VERTEX_PROPAGATION: [[VertexTarget; 4]; 6] = [
    // T(0, 0)
    [target(-1, -1, 2), target(-2, 0, 2), target(-1, 0, 0), target(-1, 0, 1)],
    // T(1, 0)
    [target(-1, -1, 0), target(0, -1, 1), target(0, -1, 2), target(1, -1, 0)],
    // T(2, 0)
    [target(1, -1, 1), target(1, 0, 0), target(1, 0, 2), target(2, 0, 1)],
    // T(0, 1)
    [target(-2, 0, 1), target(-1, 0, 0), target(-1, 0, 2), target(-1, 1, 1)],
    // T(1, 1)
    [target(-1, 1, 0), target(0, 1, 1), target(0, 1, 2), target(1, 1, 0)],
    // T(2, 1)
    [target(1, 0, 0), target(1, 0, 1), target(2, 0, 2), target(1, 1, 2)],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tile::{hex_anchor, hex_tile_index};

    /// One tile of each hex index, in both row parities of hexagon blocks.
    fn sample_tiles() -> Vec<(i64, i64)> {
        let mut tiles = Vec::new();
        for (ax, ay) in [(0, 0), (3, 1), (-3, -1), (6, -4)] {
            for i in 0..6 {
                tiles.push((ax + i % 3, ay + i / 3));
            }
        }
        tiles
    }

    #[test]
    fn test_neighbor_hex_is_whole_adjacent_hexagon() {
        for (x, y) in sample_tiles() {
            let k = hex_tile_index(x, y) as usize;
            let own = hex_anchor(x, y);
            let (fx, fy) = NEIGHBOR_HEX[k][0];
            let neighbor = hex_anchor(x + fx, y + fy);
            assert_ne!(own, neighbor);
            for (i, (dx, dy)) in NEIGHBOR_HEX[k].iter().enumerate() {
                assert_eq!(hex_anchor(x + dx, y + dy), neighbor);
                assert_eq!(hex_tile_index(x + dx, y + dy) as usize, i);
            }
        }
    }

    #[test]
    fn test_sources_live_in_other_hexagons() {
        for (x, y) in sample_tiles() {
            let k = hex_tile_index(x, y) as usize;
            for offsets in VERTEX_HEIGHT_SOURCES[k] {
                for (dx, dy) in offsets.into_iter().flatten() {
                    assert_ne!(hex_anchor(x + dx, y + dy), hex_anchor(x, y));
                }
            }
        }
    }

    #[test]
    fn test_propagation_inverts_sources() {
        let mut source_count = 0;
        for (x, y) in sample_tiles() {
            let m = hex_tile_index(x, y) as usize;
            for (vertex, offsets) in VERTEX_HEIGHT_SOURCES[m].iter().enumerate() {
                for &(dx, dy) in offsets.iter().flatten() {
                    source_count += 1;
                    let k = hex_tile_index(x + dx, y + dy) as usize;
                    assert!(
                        VERTEX_PROPAGATION[k].contains(&target(-dx, -dy, vertex)),
                        "T{} vertex {} source ({}, {}) missing from T{}",
                        m, vertex, dx, dy, k
                    );
                }
            }
            for t in VERTEX_PROPAGATION[m] {
                let n = hex_tile_index(x + t.dx, y + t.dy) as usize;
                assert!(VERTEX_HEIGHT_SOURCES[n][t.vertex].contains(&Some((-t.dx, -t.dy))));
            }
        }
        assert_eq!(source_count, 24 * 4);
    }
}
