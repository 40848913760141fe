//! Computes the tightest axis-aligned box enclosing all fluid leaves of an octree.

use rayon::prelude::*;
use tracing::debug;

use crate::{
    bounds::IBounds3,
    cell::Cell,
    error::GridResult,
    octree::{
        geometry::{node_extent, node_location},
        octant::{Octant, OctreeDepth},
        visit::OctreeVisitor,
        NodeRef, Octree,
    },
};

/// Number of levels below the root at which the parallel traversals fork.
///
/// Two levels yield up to 64 tasks, which is plenty for the workloads this runs on.
pub(crate) const PARALLEL_LEVELS: u8 = 2;

/// Accumulates the envelope of all fluid leaves it visits.
///
/// Wall leaves are skipped. Until the first fluid leaf is seen, the bounds stay
/// [`IBounds3::EMPTY`].
#[derive(Clone, Copy, Debug)]
pub struct ExtentScanner {
    max_depth: OctreeDepth,
    bounds: IBounds3,
}

impl ExtentScanner {
    pub fn new(max_depth: OctreeDepth) -> Self {
        Self {
            max_depth,
            bounds: IBounds3::EMPTY,
        }
    }

    /// The envelope of all fluid leaves visited so far.
    pub fn bounds(&self) -> IBounds3 {
        self.bounds
    }
}

impl OctreeVisitor for ExtentScanner {
    type Value = Cell;

    fn visit_value(&mut self, octant: Octant, value: &Cell) {
        if value.is_fluid() {
            self.bounds.include(
                node_location(octant, self.max_depth),
                node_extent(octant, self.max_depth),
            );
        }
    }
}

/// Returns the tightest bounds enclosing every fluid leaf of the `octree`.
///
/// The result is [`IBounds3::EMPTY`] if the octree contains no fluid at all, which callers must
/// check via [`IBounds3::is_empty`] before sizing anything based on it.
///
/// Fails if the octree is deeper than `max_depth`.
pub fn scan_fluid_extent(octree: &Octree<Cell>, max_depth: OctreeDepth) -> GridResult<IBounds3> {
    octree.check_depth(max_depth)?;
    let mut scanner = ExtentScanner::new(max_depth);
    octree.visit(&mut scanner);
    debug!(bounds = %scanner.bounds(), "scanned fluid extent");
    Ok(scanner.bounds())
}

/// Same as [`scan_fluid_extent`], but scans the top levels of the octree in parallel.
///
/// Subtrees are reduced with [`IBounds3::union`], so the result is identical to the sequential
/// scan.
pub fn par_scan_fluid_extent(
    octree: &Octree<Cell>,
    max_depth: OctreeDepth,
) -> GridResult<IBounds3> {
    octree.check_depth(max_depth)?;
    let bounds = par_scan_node(octree.root(), max_depth, PARALLEL_LEVELS);
    debug!(bounds = %bounds, "scanned fluid extent in parallel");
    Ok(bounds)
}

fn par_scan_node(node: NodeRef<'_, Cell>, max_depth: OctreeDepth, levels: u8) -> IBounds3 {
    match node.children() {
        Some(children) if levels > 0 => children
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|child| par_scan_node(child, max_depth, levels - 1))
            .reduce(|| IBounds3::EMPTY, IBounds3::union),
        _ => {
            let mut scanner = ExtentScanner::new(max_depth);
            node.visit(&mut scanner);
            scanner.bounds()
        }
    }
}
