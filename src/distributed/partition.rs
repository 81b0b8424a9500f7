//! Splitting image rows between nodes and between the tiles of one node.
//!
//! Ranges are contiguous, ordered by node, never empty, and differ in size
//! by at most one row. When rows do not divide evenly the first nodes get
//! the extra row, e.g. 10 rows over 3 nodes give `[0,4) [4,7) [7,10)`.

use std::ops::Range;

use crate::error::{RenderError, RenderResult};

use super::tile::TileId;

/// Rows `[begin, end)` owned by `node_index` out of `node_count` nodes.
pub fn row_range(
    node_count: usize,
    node_index: usize,
    total_rows: usize,
) -> RenderResult<Range<usize>> {
    if node_count == 0 {
        return Err(RenderError::InvalidPartition(
            "at least one node is needed".to_string(),
        ));
    }
    if node_index >= node_count {
        return Err(RenderError::InvalidPartition(format!(
            "node {} does not exist in a cluster of {}",
            node_index, node_count
        )));
    }
    if total_rows < node_count {
        return Err(RenderError::InvalidPartition(format!(
            "{} rows cannot be split into {} non-empty ranges",
            total_rows, node_count
        )));
    }

    let base = total_rows / node_count;
    let remainder = total_rows % node_count;
    let begin = node_index * base + node_index.min(remainder);
    let len = if node_index < remainder { base + 1 } else { base };
    Ok(begin..begin + len)
}

/// Row ranges of the tiles of `node_index`, in ascending row order. The
/// position in the returned vector is the tile's local index.
pub fn sub_ranges(
    node_count: usize,
    node_index: usize,
    total_rows: usize,
    fragments_per_node: usize,
) -> RenderResult<Vec<Range<usize>>> {
    let node_rows = row_range(node_count, node_index, total_rows)?;
    if fragments_per_node == 0 {
        return Err(RenderError::InvalidPartition(
            "at least one fragment per node is needed".to_string(),
        ));
    }
    if fragments_per_node > node_rows.len() {
        return Err(RenderError::InvalidPartition(format!(
            "node {} owns {} rows, too few for {} fragments",
            node_index,
            node_rows.len(),
            fragments_per_node
        )));
    }
    (0..fragments_per_node)
        .map(|fragment| {
            let range = row_range(fragments_per_node, fragment, node_rows.len())?;
            Ok(node_rows.start + range.start..node_rows.start + range.end)
        })
        .collect()
}

/// Every tile of the render, in merge order (node, then local index). This
/// is what the boundary fragment waits on.
pub fn fan_out(
    node_count: usize,
    total_rows: usize,
    fragments_per_node: usize,
) -> RenderResult<Vec<TileId>> {
    let mut tiles = Vec::with_capacity(node_count * fragments_per_node);
    for node in 0..node_count {
        let ranges = sub_ranges(node_count, node, total_rows, fragments_per_node)?;
        tiles.extend((0..ranges.len()).map(|index| TileId::new(node, index)));
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn all_ranges(node_count: usize, total_rows: usize) -> Vec<Range<usize>> {
        (0..node_count)
            .map(|node| row_range(node_count, node, total_rows).unwrap())
            .collect()
    }

    #[test]
    fn test_three_nodes_ten_rows() {
        assert_eq!(all_ranges(3, 10), vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn test_even_split() {
        assert_eq!(all_ranges(4, 8), vec![0..2, 2..4, 4..6, 6..8]);
        assert_eq!(all_ranges(1, 5), vec![0..5]);
    }

    #[test]
    fn test_ranges_cover_rows_exactly_once() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let node_count = rng.gen_range(1..40);
            let total_rows = rng.gen_range(node_count..400);
            let ranges = all_ranges(node_count, total_rows);

            let mut next = 0;
            for range in &ranges {
                assert_eq!(range.start, next);
                assert!(!range.is_empty());
                next = range.end;
            }
            assert_eq!(next, total_rows);

            let max = ranges.iter().map(|r| r.len()).max().unwrap();
            let min = ranges.iter().map(|r| r.len()).min().unwrap();
            assert!(max - min <= 1);
        }
    }

    #[test]
    fn test_sub_ranges_flatten_to_parent() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..300 {
            let node_count = rng.gen_range(1..10);
            let total_rows = rng.gen_range(node_count * 3..200);
            let node = rng.gen_range(0..node_count);
            let parent = row_range(node_count, node, total_rows).unwrap();
            let fragments = rng.gen_range(1..=parent.len());

            let mut subs = sub_ranges(node_count, node, total_rows, fragments).unwrap();
            assert_eq!(subs.len(), fragments);
            subs.sort_by_key(|r| r.start);
            assert_eq!(subs.first().unwrap().start, parent.start);
            assert_eq!(subs.last().unwrap().end, parent.end);
            for pair in subs.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_sub_ranges_keep_row_order() {
        // node 1 of 3 over 10 rows owns [4, 7)
        assert_eq!(sub_ranges(3, 1, 10, 2).unwrap(), vec![4..6, 6..7]);
        assert_eq!(sub_ranges(3, 0, 10, 4).unwrap(), vec![0..1, 1..2, 2..3, 3..4]);
    }

    #[test]
    fn test_malformed_partitions_are_rejected() {
        assert!(row_range(0, 0, 10).is_err());
        assert!(row_range(3, 3, 10).is_err());
        assert!(row_range(4, 0, 3).is_err());
        // node 2 of 3 owns only 3 rows
        assert!(sub_ranges(3, 2, 10, 4).is_err());
        assert!(fan_out(3, 10, 4).is_err());
        assert!(sub_ranges(1, 0, 10, 0).is_err());
        assert!(fan_out(3, 10, 0).is_err());
    }

    #[test]
    fn test_fan_out_order() {
        let tiles = fan_out(2, 9, 2).unwrap();
        assert_eq!(
            tiles,
            vec![
                TileId::new(0, 0),
                TileId::new(0, 1),
                TileId::new(1, 0),
                TileId::new(1, 1),
            ]
        );
    }
}
