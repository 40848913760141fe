//! Maps octree nodes to absolute coordinates of the finest voxel grid.
//!
//! A node at depth `d` in a tree whose finest cells sit at `max_depth` has a side length of
//! `2^(max_depth - d)`. All coordinates are inclusive, so a node spans
//! `node_location..=node_extent` along every axis.
//!
//! Every function here requires the node to lie at or above `max_depth` and panics otherwise.
//! [`Octree::check_depth`](super::Octree::check_depth) turns that into a recoverable error.

use glam::IVec3;

use super::{
    octant::{Octant, OctreeDepth},
    NodeRef,
};
use crate::{bounds::IBounds3, cell::Cell};

/// The number of finest cells along each axis of a node at `depth`.
///
/// # Panics
///
/// Panics if `depth` exceeds `max_depth`.
pub fn side_length(depth: OctreeDepth, max_depth: OctreeDepth) -> i32 {
    assert_depth(depth, max_depth);
    1 << (max_depth.get() - depth.get())
}

/// The inclusive minimum corner of a node.
///
/// # Panics
///
/// Panics if the octant lies deeper than `max_depth`.
pub fn node_location(octant: Octant, max_depth: OctreeDepth) -> IVec3 {
    assert_depth(octant.depth(), max_depth);
    octant
        .into_iter()
        .zip(1..)
        .fold(IVec3::ZERO, |location, (corner, child_depth)| {
            location + IVec3::from(corner) * (1 << (max_depth.get() - child_depth))
        })
}

/// The inclusive maximum corner of a node.
///
/// # Panics
///
/// Panics if the octant lies deeper than `max_depth`.
pub fn node_extent(octant: Octant, max_depth: OctreeDepth) -> IVec3 {
    node_location(octant, max_depth) + side_length(octant.depth(), max_depth) - 1
}

/// The cells covered by a node.
///
/// # Panics
///
/// Panics if the octant lies deeper than `max_depth`.
pub fn node_bounds(octant: Octant, max_depth: OctreeDepth) -> IBounds3 {
    IBounds3::new(
        node_location(octant, max_depth),
        node_extent(octant, max_depth),
    )
}

/// The number of finest cells covered by a node.
///
/// # Panics
///
/// Panics if `depth` exceeds `max_depth`.
pub fn node_volume(depth: OctreeDepth, max_depth: OctreeDepth) -> u64 {
    u64::from(side_length(depth, max_depth).unsigned_abs()).pow(3)
}

/// The number of fluid cells within a node and all of its children.
///
/// # Panics
///
/// Panics if any leaf of the node lies deeper than `max_depth`.
pub fn count_fluid_nodes(node: NodeRef<'_, Cell>, max_depth: OctreeDepth) -> u64 {
    match node.children() {
        Some(children) => children
            .map(|child| count_fluid_nodes(child, max_depth))
            .sum(),
        None => match node.value() {
            Some(Cell::Fluid) => node_volume(node.depth(), max_depth),
            _ => 0,
        },
    }
}

fn assert_depth(depth: OctreeDepth, max_depth: OctreeDepth) {
    assert!(
        depth <= max_depth,
        "node at depth {depth} lies below the max depth of {max_depth}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math_enums::Corner3, octree::Octree};

    fn depth(depth: u8) -> OctreeDepth {
        OctreeDepth::new(depth).unwrap()
    }

    #[test]
    fn side_length_halves_per_level() {
        assert_eq!(side_length(depth(0), depth(0)), 1);
        assert_eq!(side_length(depth(0), depth(2)), 4);
        assert_eq!(side_length(depth(1), depth(2)), 2);
        assert_eq!(side_length(depth(2), depth(2)), 1);
        assert_eq!(side_length(OctreeDepth::MIN, OctreeDepth::MAX), 1 << 21);
    }

    #[test]
    #[should_panic(expected = "node at depth 3 lies below the max depth of 2")]
    fn side_length_below_max_depth() {
        side_length(depth(3), depth(2));
    }

    #[test]
    fn root_spans_whole_grid() {
        assert_eq!(node_location(Octant::ROOT, depth(2)), IVec3::ZERO);
        assert_eq!(node_extent(Octant::ROOT, depth(2)), IVec3::splat(3));
    }

    #[test]
    fn nested_location_and_extent() {
        // upper octant of the upper octant along X, lower along Y, upper then lower along Z
        let octant = Octant::from_corners([Corner3::X1Y0Z1, Corner3::X1Y0Z0]);
        assert_eq!(node_location(octant, depth(2)), IVec3::new(3, 0, 2));
        assert_eq!(node_extent(octant, depth(2)), IVec3::new(3, 0, 2));

        assert_eq!(node_location(octant, depth(3)), IVec3::new(6, 0, 4));
        assert_eq!(node_extent(octant, depth(3)), IVec3::new(7, 1, 5));
    }

    #[test]
    fn scenario_leaf_location() {
        // the cube [2,2,2]-[3,3,3] in a tree of max depth 2
        let octant = Octant::new(Corner3::X1Y1Z1);
        assert_eq!(
            node_bounds(octant, depth(2)),
            IBounds3::new(IVec3::splat(2), IVec3::splat(3))
        );
        assert_eq!(node_volume(octant.depth(), depth(2)), 8);
    }

    #[test]
    fn count_fluid_nodes_sums_leaves() {
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::new(Corner3::X0Y0Z0), Cell::Fluid);
        octree.set(
            Octant::from_corners([Corner3::X1Y1Z1, Corner3::X0Y1Z0]),
            Cell::Fluid,
        );

        assert_eq!(count_fluid_nodes(octree.root(), depth(2)), 8 + 1);
        assert_eq!(count_fluid_nodes(octree.root(), depth(3)), 64 + 8);

        let wall = octree.root().child_at(Corner3::X1Y0Z0).unwrap();
        assert_eq!(count_fluid_nodes(wall, depth(2)), 0);
    }

    #[test]
    fn count_fluid_nodes_full_tree() {
        let octree = Octree::new(Cell::Fluid);
        assert_eq!(count_fluid_nodes(octree.root(), depth(4)), 16 * 16 * 16);
    }
}
