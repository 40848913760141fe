use arrayvec::ArrayVec;
use rayon::prelude::*;
use tracing::debug;

use super::Subdomain;
use crate::{
    cell::Cell,
    error::GridResult,
    extent::PARALLEL_LEVELS,
    math_enums::{Corner3, Corners3},
    octree::{
        geometry::{node_bounds, node_volume},
        octant::{Octant, OctreeDepth},
        NodeRef, Octree,
    },
};

/// A copy of an [`Octree<Cell>`] that only retains subtrees containing fluid.
///
/// Wall leaves are dropped entirely, as are split nodes whose children were all dropped. Every
/// remaining node caches the number of fluid cells below it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FluidTree {
    max_depth: OctreeDepth,
    root: FluidNode,
}

/// A node of a [`FluidTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FluidNode {
    /// A fluid leaf of the original octree.
    Leaf { octant: Octant, fluid_nodes: u64 },
    /// A split node with at least one child containing fluid.
    Split {
        octant: Octant,
        fluid_nodes: u64,
        /// The corners of the original node whose children survived.
        occupied: Corners3,
        /// The surviving children in [`Corner3`] order.
        children: Box<ArrayVec<FluidNode, 8>>,
    },
}

impl FluidTree {
    /// Prunes all wall cells from `octree`.
    ///
    /// Returns [`None`] if the octree does not contain any fluid.
    ///
    /// Fails if the octree is deeper than `max_depth`.
    pub fn prune(octree: &Octree<Cell>, max_depth: OctreeDepth) -> GridResult<Option<Self>> {
        octree.check_depth(max_depth)?;
        let tree = prune_node(octree.root(), max_depth).map(|root| Self { max_depth, root });
        log_pruned(tree.as_ref());
        Ok(tree)
    }

    /// Same as [`FluidTree::prune`], but prunes the top levels of the octree in parallel.
    pub fn par_prune(octree: &Octree<Cell>, max_depth: OctreeDepth) -> GridResult<Option<Self>> {
        octree.check_depth(max_depth)?;
        let tree = par_prune_node(octree.root(), max_depth, PARALLEL_LEVELS)
            .map(|root| Self { max_depth, root });
        log_pruned(tree.as_ref());
        Ok(tree)
    }

    /// The depth at which nodes have a side length of a single cell.
    pub fn max_depth(&self) -> OctreeDepth {
        self.max_depth
    }

    pub fn root(&self) -> &FluidNode {
        &self.root
    }

    /// The total number of fluid cells.
    pub fn fluid_nodes(&self) -> u64 {
        self.root.fluid_nodes()
    }

    /// The tight envelope of all fluid cells along with their count.
    pub fn subdomain(&self) -> Subdomain {
        self.root.subdomain(self.max_depth)
    }
}

impl FluidNode {
    pub fn octant(&self) -> Octant {
        match self {
            Self::Leaf { octant, .. } | Self::Split { octant, .. } => *octant,
        }
    }

    pub fn fluid_nodes(&self) -> u64 {
        match self {
            Self::Leaf { fluid_nodes, .. } | Self::Split { fluid_nodes, .. } => *fluid_nodes,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// The corners of all surviving children; empty for leaves.
    pub fn occupied(&self) -> Corners3 {
        match self {
            Self::Leaf { .. } => Corners3::empty(),
            Self::Split { occupied, .. } => *occupied,
        }
    }

    /// The surviving children in [`Corner3`] order; empty for leaves.
    pub fn children(&self) -> &[FluidNode] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Split { children, .. } => children.as_slice(),
        }
    }

    /// The child at the given `corner`; [`None`] if it was pruned or this is a leaf.
    pub fn child_at(&self, corner: Corner3) -> Option<&FluidNode> {
        let occupied = self.occupied();
        if !occupied.contains(corner) {
            return None;
        }
        let index = occupied.iter().take_while(|&other| other != corner).count();
        self.children().get(index)
    }

    /// The number of leaves below this node, counting itself if it is one.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Split { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }

    /// The region covered by fluid below this node along with its fluid count.
    ///
    /// Leaves cover their full footprint, since they are fluid throughout. Split nodes only cover
    /// the envelope of their surviving children, so pruned walls never widen the region.
    pub fn subdomain(&self, max_depth: OctreeDepth) -> Subdomain {
        match self {
            Self::Leaf {
                octant,
                fluid_nodes,
            } => Subdomain {
                bounds: node_bounds(*octant, max_depth),
                fluid_nodes: *fluid_nodes,
            },
            Self::Split { children, .. } => children
                .iter()
                .map(|child| child.subdomain(max_depth))
                .sum(),
        }
    }

    fn split(
        octant: Octant,
        children: impl IntoIterator<Item = (Corner3, Option<FluidNode>)>,
    ) -> Option<Self> {
        let mut occupied = Corners3::empty();
        let mut kept = ArrayVec::new();
        for (corner, child) in children {
            if let Some(child) = child {
                occupied.insert(corner);
                kept.push(child);
            }
        }

        if kept.is_empty() {
            return None;
        }
        Some(Self::Split {
            octant,
            fluid_nodes: kept.iter().map(Self::fluid_nodes).sum(),
            occupied,
            children: Box::new(kept),
        })
    }
}

fn prune_node(node: NodeRef<'_, Cell>, max_depth: OctreeDepth) -> Option<FluidNode> {
    match node.children() {
        Some(children) => FluidNode::split(
            node.octant(),
            Corners3::all()
                .iter()
                .zip(children)
                .map(|(corner, child)| (corner, prune_node(child, max_depth))),
        ),
        None => prune_leaf(node, max_depth),
    }
}

fn par_prune_node(node: NodeRef<'_, Cell>, max_depth: OctreeDepth, levels: u8) -> Option<FluidNode> {
    match node.children() {
        Some(children) if levels > 0 => {
            let pruned = Corners3::all()
                .iter()
                .zip(children)
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|(corner, child)| (corner, par_prune_node(child, max_depth, levels - 1)))
                .collect::<Vec<_>>();
            FluidNode::split(node.octant(), pruned)
        }
        _ => prune_node(node, max_depth),
    }
}

fn prune_leaf(node: NodeRef<'_, Cell>, max_depth: OctreeDepth) -> Option<FluidNode> {
    node.value()
        .is_some_and(|cell| cell.is_fluid())
        .then(|| FluidNode::Leaf {
            octant: node.octant(),
            fluid_nodes: node_volume(node.depth(), max_depth),
        })
}

fn log_pruned(tree: Option<&FluidTree>) {
    match tree {
        Some(tree) => debug!(
            fluid_nodes = tree.fluid_nodes(),
            leaves = tree.root().leaf_count(),
            "pruned wall subtrees"
        ),
        None => debug!("pruned the entire octree, it contains no fluid"),
    }
}
