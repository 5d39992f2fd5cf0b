//! Block merging: compress a pixel map into square blocks of power-of-two size.
//!
//! Every retained pixel starts as a block of scale 1. At each scale, four
//! blocks of identical color forming a 2x2 square are promoted to a single
//! block of twice the scale. The process repeats up to the largest scale the
//! level format has a tile for.
//!
//! Two strategies are available:
//!
//! | Strategy | Anchors | Cost per scale |
//! |----------|---------|----------------|
//! | `quadtree` | aligned to `2 * scale` | linear |
//! | `rescan` | any block | one full scan per merge |
//!
//! Both produce a partition of exactly the input pixels: no pixel is covered
//! twice and none is dropped.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::color::Color;
use crate::pixels::Coord;

/// Blocks at a single scale, keyed by anchor.
pub type BlockMap = BTreeMap<Coord, Color>;

/// Largest block side supported by the default tile table.
pub const DEFAULT_MAX_SCALE: u32 = 16;

/// How 2x2 groups are found at each scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// One pass per scale over anchors aligned to the next scale's grid
    #[default]
    Quadtree,
    /// Repeated scans from scratch, one merge per scan, until nothing merges
    Rescan,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeStrategy::Quadtree => write!(f, "quadtree"),
            MergeStrategy::Rescan => write!(f, "rescan"),
        }
    }
}

/// A square region of uniform color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    /// Top-left corner in base-pixel units
    pub anchor: Coord,
    /// Side length in base pixels
    pub scale: u32,
    pub color: Color,
}

impl Block {
    /// Every base-pixel coordinate this block covers.
    pub fn covered(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.scale)
            .flat_map(move |dx| (0..self.scale).map(move |dy| self.anchor.offset(dx, dy)))
    }
}

/// The three partners of an anchor at the given scale: right, down, diagonal.
///
/// "Right" steps along `y` and "down" along `x`, matching the column-major
/// scan order of the pixel map.
fn group_neighbors(anchor: Coord, scale: u32) -> [Coord; 3] {
    [anchor.offset(0, scale), anchor.offset(scale, 0), anchor.offset(scale, scale)]
}

/// Outcome of a single rescan pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePass {
    /// The block promoted to the next scale, if any group merged
    pub promoted: Option<Block>,
    /// Blocks left at the current scale
    pub remaining: BlockMap,
}

/// Run one scan over a snapshot of `blocks` at `scale`.
///
/// Anchors are visited in coordinate order. The first anchor whose group of
/// four shares one color, with no member already visited in this pass, is
/// promoted and the scan stops. Anchors that fail are marked visited.
pub fn merge_pass(blocks: &BlockMap, scale: u32) -> MergePass {
    let mut visited: HashSet<Coord> = HashSet::new();

    for (&anchor, &color) in blocks {
        if visited.contains(&anchor) {
            continue;
        }

        let neighbors = group_neighbors(anchor, scale);
        let eligible = neighbors
            .iter()
            .all(|n| !visited.contains(n) && blocks.get(n) == Some(&color));

        if eligible {
            let mut remaining = blocks.clone();
            remaining.remove(&anchor);
            for n in &neighbors {
                remaining.remove(n);
            }
            return MergePass {
                promoted: Some(Block { anchor, scale: scale * 2, color }),
                remaining,
            };
        }

        visited.insert(anchor);
    }

    MergePass { promoted: None, remaining: blocks.clone() }
}

/// Repeat [`merge_pass`] until a pass merges nothing.
///
/// Returns `(remaining, promoted)`: the blocks left at `scale` and the new
/// blocks at `2 * scale`.
pub fn rescan_level(blocks: BlockMap, scale: u32) -> (BlockMap, BlockMap) {
    let mut current = blocks;
    let mut promoted = BlockMap::new();
    let mut passes = 0usize;

    loop {
        passes += 1;
        let pass = merge_pass(&current, scale);
        match pass.promoted {
            Some(block) => {
                promoted.insert(block.anchor, block.color);
                current = pass.remaining;
            }
            None => break,
        }
    }

    tracing::debug!(scale, passes, merged = promoted.len(), "rescan level done");
    (current, promoted)
}

/// Promote every 2x2 group anchored on the `2 * scale` grid in a single pass.
///
/// Returns `(remaining, promoted)` like [`rescan_level`].
pub fn quadtree_level(blocks: &BlockMap, scale: u32) -> (BlockMap, BlockMap) {
    let step = scale * 2;
    let mut remaining = BlockMap::new();
    let mut promoted = BlockMap::new();
    let mut absorbed: HashSet<Coord> = HashSet::new();

    for (&anchor, &color) in blocks {
        if absorbed.contains(&anchor) {
            continue;
        }

        if anchor.x % step == 0 && anchor.y % step == 0 {
            let neighbors = group_neighbors(anchor, scale);
            if neighbors.iter().all(|n| blocks.get(n) == Some(&color)) {
                promoted.insert(anchor, color);
                absorbed.extend(neighbors);
                continue;
            }
        }

        remaining.insert(anchor, color);
    }

    tracing::debug!(scale, merged = promoted.len(), "quadtree level done");
    (remaining, promoted)
}

/// The final multi-scale partition of an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockLayers {
    layers: BTreeMap<u32, BlockMap>,
}

impl BlockLayers {
    /// All blocks, smallest scale first, then in coordinate order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.layers.iter().flat_map(|(&scale, map)| {
            map.iter().map(move |(&anchor, &color)| Block { anchor, scale, color })
        })
    }

    /// Blocks at one scale.
    pub fn layer(&self, scale: u32) -> Option<&BlockMap> {
        self.layers.get(&scale)
    }

    /// `(scale, block count)` for every non-empty scale.
    pub fn counts(&self) -> Vec<(u32, usize)> {
        self.layers.iter().map(|(&s, m)| (s, m.len())).collect()
    }

    /// Total number of blocks.
    pub fn len(&self) -> usize {
        self.layers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merge base pixels into blocks up to `max_scale`.
///
/// `max_scale` must be a power of two; blocks are never promoted past it.
pub fn merge_blocks(pixels: BlockMap, max_scale: u32, strategy: MergeStrategy) -> BlockLayers {
    let mut layers = BTreeMap::new();
    let mut current = pixels;
    let mut scale = 1;

    while scale < max_scale && !current.is_empty() {
        let (remaining, promoted) = match strategy {
            MergeStrategy::Quadtree => quadtree_level(&current, scale),
            MergeStrategy::Rescan => rescan_level(current, scale),
        };
        if !remaining.is_empty() {
            layers.insert(scale, remaining);
        }
        current = promoted;
        scale *= 2;
    }

    if !current.is_empty() {
        layers.insert(scale, current);
    }

    BlockLayers { layers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const RED: Color = Color::new(255, 0, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    fn filled(width: u32, height: u32, color: Color) -> BlockMap {
        let mut map = BlockMap::new();
        for x in 0..width {
            for y in 0..height {
                map.insert(Coord::new(x, y), color);
            }
        }
        map
    }

    /// Deterministic pseudo-random image with holes and a small palette
    fn noisy(width: u32, height: u32, seed: u64) -> BlockMap {
        let palette = [RED, BLUE, Color::new(0, 255, 0)];
        let mut state = seed;
        let mut map = BlockMap::new();
        for x in 0..width {
            for y in 0..height {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let roll = (state >> 33) % 8;
                // Blocky regions make merges likely at several scales
                if (x / 4 + y / 4) % 5 == 0 {
                    map.insert(Coord::new(x, y), RED);
                } else if roll < 6 {
                    map.insert(Coord::new(x, y), palette[(roll % 3) as usize]);
                }
            }
        }
        map
    }

    fn assert_partition(original: &BlockMap, layers: &BlockLayers) {
        let mut seen: HashMap<Coord, Color> = HashMap::new();
        for block in layers.blocks() {
            for coord in block.covered() {
                assert!(
                    seen.insert(coord, block.color).is_none(),
                    "pixel {:?} covered twice",
                    coord
                );
            }
        }
        assert_eq!(seen.len(), original.len());
        for (coord, color) in original {
            assert_eq!(seen.get(coord), Some(color), "pixel {:?} lost or recolored", coord);
        }
    }

    #[test]
    fn test_uniform_2x2_merges_into_one_block() {
        for strategy in [MergeStrategy::Quadtree, MergeStrategy::Rescan] {
            let layers = merge_blocks(filled(2, 2, RED), DEFAULT_MAX_SCALE, strategy);
            let blocks: Vec<Block> = layers.blocks().collect();
            assert_eq!(blocks, vec![Block { anchor: Coord::new(0, 0), scale: 2, color: RED }]);
        }
    }

    #[test]
    fn test_differing_color_blocks_merge() {
        for strategy in [MergeStrategy::Quadtree, MergeStrategy::Rescan] {
            let mut map = filled(2, 2, RED);
            map.insert(Coord::new(1, 1), BLUE);
            let layers = merge_blocks(map, DEFAULT_MAX_SCALE, strategy);
            assert_eq!(layers.counts(), vec![(1, 4)]);
        }
    }

    #[test]
    fn test_uniform_4x4_becomes_scale_4() {
        for strategy in [MergeStrategy::Quadtree, MergeStrategy::Rescan] {
            let layers = merge_blocks(filled(4, 4, BLUE), DEFAULT_MAX_SCALE, strategy);
            assert_eq!(layers.counts(), vec![(4, 1)]);
        }
    }

    #[test]
    fn test_max_scale_caps_promotion() {
        let layers = merge_blocks(filled(32, 32, RED), DEFAULT_MAX_SCALE, MergeStrategy::Quadtree);
        assert_eq!(layers.counts(), vec![(16, 4)]);

        let layers = merge_blocks(filled(4, 4, RED), 2, MergeStrategy::Quadtree);
        assert_eq!(layers.counts(), vec![(2, 4)]);
    }

    #[test]
    fn test_missing_neighbor_blocks_merge() {
        let mut map = filled(2, 2, RED);
        map.remove(&Coord::new(1, 0));
        for strategy in [MergeStrategy::Quadtree, MergeStrategy::Rescan] {
            let layers = merge_blocks(map.clone(), DEFAULT_MAX_SCALE, strategy);
            assert_eq!(layers.counts(), vec![(1, 3)]);
        }
    }

    #[test]
    fn test_rescan_merges_unaligned_groups() {
        // Column 0 is red, columns 1-2 are blue
        let mut map = filled(3, 2, BLUE);
        map.insert(Coord::new(0, 0), RED);
        map.insert(Coord::new(0, 1), RED);

        let rescan = merge_blocks(map.clone(), DEFAULT_MAX_SCALE, MergeStrategy::Rescan);
        assert_eq!(rescan.counts(), vec![(1, 2), (2, 1)]);
        assert_eq!(rescan.layer(2).and_then(|m| m.get(&Coord::new(1, 0))), Some(&BLUE));
        assert_partition(&map, &rescan);

        let quadtree = merge_blocks(map.clone(), DEFAULT_MAX_SCALE, MergeStrategy::Quadtree);
        assert_eq!(quadtree.counts(), vec![(1, 6)]);
        assert_partition(&map, &quadtree);
    }

    #[test]
    fn test_merge_pass_stops_after_first_merge() {
        let map = filled(4, 2, RED);
        let pass = merge_pass(&map, 1);
        assert_eq!(pass.promoted, Some(Block { anchor: Coord::new(0, 0), scale: 2, color: RED }));
        assert_eq!(pass.remaining.len(), 4);
        assert!(pass.remaining.contains_key(&Coord::new(2, 0)));
        assert!(!pass.remaining.contains_key(&Coord::new(1, 1)));
    }

    #[test]
    fn test_merge_pass_leaves_snapshot_untouched() {
        let map = filled(2, 2, RED);
        let before = map.clone();
        let _ = merge_pass(&map, 1);
        assert_eq!(map, before);
    }

    #[test]
    fn test_merge_pass_without_merge_returns_all_blocks() {
        let mut map = BlockMap::new();
        map.insert(Coord::new(0, 0), RED);
        map.insert(Coord::new(5, 5), BLUE);
        let pass = merge_pass(&map, 1);
        assert_eq!(pass.promoted, None);
        assert_eq!(pass.remaining, map);
    }

    #[test]
    fn test_rescan_level_reaches_fixpoint() {
        let (remaining, promoted) = rescan_level(filled(4, 2, RED), 1);
        assert!(remaining.is_empty());
        assert_eq!(promoted.keys().copied().collect::<Vec<_>>(), vec![
            Coord::new(0, 0),
            Coord::new(2, 0)
        ]);
    }

    #[test]
    fn test_quadtree_level_ignores_unaligned_anchor() {
        let mut map = BlockMap::new();
        for (x, y) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            map.insert(Coord::new(x, y), RED);
        }
        let (remaining, promoted) = quadtree_level(&map, 1);
        assert!(promoted.is_empty());
        assert_eq!(remaining, map);
    }

    #[test]
    fn test_partition_invariant_on_noisy_images() {
        for seed in [1u64, 7, 42, 1234] {
            let map = noisy(37, 23, seed);
            for strategy in [MergeStrategy::Quadtree, MergeStrategy::Rescan] {
                let layers = merge_blocks(map.clone(), DEFAULT_MAX_SCALE, strategy);
                assert_partition(&map, &layers);
                assert!(layers.len() <= map.len());
            }
        }
    }

    #[test]
    fn test_empty_input() {
        let layers = merge_blocks(BlockMap::new(), DEFAULT_MAX_SCALE, MergeStrategy::Quadtree);
        assert!(layers.is_empty());
        assert!(layers.counts().is_empty());
    }

    #[test]
    fn test_block_covered() {
        let block = Block { anchor: Coord::new(2, 4), scale: 2, color: RED };
        let coords: Vec<Coord> = block.covered().collect();
        assert_eq!(
            coords,
            vec![Coord::new(2, 4), Coord::new(2, 5), Coord::new(3, 4), Coord::new(3, 5)]
        );
    }
}
