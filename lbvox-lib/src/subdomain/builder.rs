use arrayvec::ArrayVec;
use tracing::debug;

use super::{FluidNode, FluidTree, Subdomain};
use crate::{
    cell::Cell,
    error::GridResult,
    octree::{octant::OctreeDepth, Octree},
};

/// Decides how far up the tree subdomains are merged before they are emitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Granularity {
    /// Emits one subdomain per fluid leaf.
    Leaves,
    /// Merges sibling subdomains into their parent for as long as the result stays dense and
    /// small enough.
    Merged {
        /// Parents with a lower share of fluid cells are split into their children.
        min_fill_fraction: f64,
        /// Parents spanning more cells are split into their children.
        max_volume: u64,
    },
}

impl Granularity {
    /// The union of sibling `parts` if they may be kept as a single subdomain.
    fn unite(self, parts: &[Subdomain]) -> Option<Subdomain> {
        match self {
            Self::Leaves => None,
            Self::Merged {
                min_fill_fraction,
                max_volume,
            } => {
                let united = parts.iter().copied().sum::<Subdomain>();
                (united.fill_fraction() >= min_fill_fraction && united.volume() <= max_volume)
                    .then_some(united)
            }
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::Merged {
            min_fill_fraction: 0.5,
            max_volume: u64::MAX,
        }
    }
}

/// Decomposes a [`FluidTree`] into disjoint [`Subdomain`]s.
///
/// The tree is folded bottom-up. Every fluid leaf starts out as its own subdomain and siblings are
/// united into their parent as long as the [`Granularity`] allows it. Once a node is split, so are
/// all of its ancestors, and the subdomains of its children are emitted as they are.
///
/// Subdomains are emitted in post-order with children in [`Corner3`](crate::math_enums::Corner3)
/// order, so the output is deterministic. They never overlap and their fluid counts add up to the
/// total amount of fluid in the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubdomainBuilder {
    granularity: Granularity,
}

impl SubdomainBuilder {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn build(&self, tree: &FluidTree) -> Vec<Subdomain> {
        let mut subdomains = Vec::new();
        if let Some(root) = self.fold(tree.root(), tree.max_depth(), &mut subdomains) {
            subdomains.push(root);
        }
        debug!(
            count = subdomains.len(),
            fluid_nodes = tree.fluid_nodes(),
            granularity = ?self.granularity,
            "built subdomains"
        );
        subdomains
    }

    /// Prunes `octree` and builds its subdomains.
    ///
    /// An octree without any fluid yields no subdomains at all.
    pub fn build_octree(
        &self,
        octree: &Octree<Cell>,
        max_depth: OctreeDepth,
    ) -> GridResult<Vec<Subdomain>> {
        Ok(FluidTree::par_prune(octree, max_depth)?
            .map(|tree| self.build(&tree))
            .unwrap_or_default())
    }

    /// Returns the subdomain of `node` if it stays whole; otherwise emits its parts.
    fn fold(
        &self,
        node: &FluidNode,
        max_depth: OctreeDepth,
        subdomains: &mut Vec<Subdomain>,
    ) -> Option<Subdomain> {
        let children = match node {
            FluidNode::Leaf { .. } => return Some(node.subdomain(max_depth)),
            FluidNode::Split { children, .. } => children,
        };

        let folded = children
            .iter()
            .map(|child| self.fold(child, max_depth, subdomains))
            .collect::<ArrayVec<_, 8>>();

        if let Some(whole) = folded.iter().copied().collect::<Option<ArrayVec<_, 8>>>() {
            if let Some(united) = self.granularity.unite(&whole) {
                return Some(united);
            }
            subdomains.extend(whole);
        } else {
            subdomains.extend(folded.into_iter().flatten());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;
    use itertools::Itertools;

    use super::*;
    use crate::{
        math_enums::Corner3,
        octree::{geometry::count_fluid_nodes, octant::Octant, BuildAction},
    };

    fn depth(depth: u8) -> OctreeDepth {
        OctreeDepth::new(depth).unwrap()
    }

    fn merged(min_fill_fraction: f64, max_volume: u64) -> SubdomainBuilder {
        SubdomainBuilder::new(Granularity::Merged {
            min_fill_fraction,
            max_volume,
        })
    }

    /// Trees with scattered fluid at various depths.
    fn sample_trees() -> Vec<Octree<Cell>> {
        (1..16u32)
            .map(|seed| {
                Octree::build(depth(4), |octant| {
                    let hash = octant.into_iter().fold(seed, |hash, corner| {
                        hash.wrapping_mul(131).wrapping_add(corner.index() as u32 * 7 + 1)
                    });
                    if octant.depth() < depth(4) && hash % 5 < 3 {
                        BuildAction::Split
                    } else {
                        BuildAction::Fill(Cell::from(hash % 3 != 0))
                    }
                })
            })
            .collect()
    }

    fn builders() -> [SubdomainBuilder; 5] {
        [
            SubdomainBuilder::new(Granularity::Leaves),
            SubdomainBuilder::default(),
            merged(0.0, u64::MAX),
            merged(0.9, 64),
            merged(0.25, 8),
        ]
    }

    #[test]
    fn subdomains_are_disjoint_and_conserve_fluid() {
        for octree in sample_trees() {
            let expected = count_fluid_nodes(octree.root(), depth(4));
            for builder in builders() {
                let subdomains = builder.build_octree(&octree, depth(4)).unwrap();

                assert_eq!(
                    subdomains.iter().map(Subdomain::fluid_nodes).sum::<u64>(),
                    expected
                );
                for (a, b) in subdomains.iter().tuple_combinations() {
                    assert!(!a.bounds().overlaps(b.bounds()), "{a} overlaps {b}");
                }
                for subdomain in &subdomains {
                    let fill_fraction = subdomain.fill_fraction();
                    assert!((0.0..=1.0).contains(&fill_fraction));
                    assert!(subdomain.fluid_nodes() > 0);
                }
            }
        }
    }

    #[test]
    fn merged_subdomains_meet_the_fill_fraction() {
        for octree in sample_trees() {
            for min_fill_fraction in [0.3, 0.5, 0.8] {
                let subdomains = merged(min_fill_fraction, u64::MAX)
                    .build_octree(&octree, depth(4))
                    .unwrap();
                assert!(subdomains
                    .iter()
                    .all(|subdomain| subdomain.fill_fraction() >= min_fill_fraction));
            }
        }
    }

    #[test]
    fn leaves_emit_one_subdomain_per_fluid_leaf() {
        for octree in sample_trees() {
            let subdomains = SubdomainBuilder::new(Granularity::Leaves)
                .build_octree(&octree, depth(4))
                .unwrap();
            let leaves = FluidTree::prune(&octree, depth(4))
                .unwrap()
                .map_or(0, |tree| tree.root().leaf_count());
            assert_eq!(subdomains.len(), leaves);
            assert!(subdomains
                .iter()
                .all(|subdomain| subdomain.fill_fraction() == 1.0));
        }
    }

    #[test]
    fn all_wall_has_no_subdomains() {
        let octree = Octree::new(Cell::Wall);
        for builder in builders() {
            assert_eq!(builder.build_octree(&octree, depth(3)), Ok(Vec::new()));
        }
    }

    #[test]
    fn all_fluid_is_a_single_subdomain() {
        let octree = Octree::new(Cell::Fluid);
        for builder in builders() {
            let subdomains = builder.build_octree(&octree, depth(2)).unwrap();
            assert_eq!(
                subdomains,
                [Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::splat(3), 64)]
            );
        }
    }

    #[test]
    fn sparse_siblings_stay_split() {
        // two opposite fluid cells within the first octant, tight box 2x2x2 with 2/8 fluid
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::from_corners([Corner3::X0Y0Z0; 2]), Cell::Fluid);
        octree.set(
            Octant::from_corners([Corner3::X0Y0Z0, Corner3::X1Y1Z1]),
            Cell::Fluid,
        );

        let split = SubdomainBuilder::default()
            .build_octree(&octree, depth(2))
            .unwrap();
        assert_eq!(
            split,
            [
                Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::ZERO, 1),
                Subdomain::with_fluid_nodes(IVec3::ONE, IVec3::ONE, 1),
            ]
        );

        let whole = merged(0.25, u64::MAX)
            .build_octree(&octree, depth(2))
            .unwrap();
        assert_eq!(
            whole,
            [Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::ONE, 2)]
        );
    }

    #[test]
    fn wall_siblings_do_not_dilute_merged_subdomains() {
        // one fluid octant next to seven wall octants; the full root footprint has 1/8 fluid
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::new(Corner3::X1Y1Z0), Cell::Fluid);

        let subdomains = SubdomainBuilder::default()
            .build_octree(&octree, depth(3))
            .unwrap();
        assert_eq!(
            subdomains,
            [Subdomain::with_fluid_nodes(
                IVec3::new(4, 4, 0),
                IVec3::new(7, 7, 3),
                64
            )]
        );
    }

    #[test]
    fn max_volume_splits_large_parents() {
        // two full fluid octants along x, each 2x2x2
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::new(Corner3::X0Y0Z0), Cell::Fluid);
        octree.set(Octant::new(Corner3::X1Y0Z0), Cell::Fluid);

        let whole = merged(0.5, 16).build_octree(&octree, depth(2)).unwrap();
        assert_eq!(
            whole,
            [Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::new(3, 1, 1), 16)]
        );

        let split = merged(0.5, 15).build_octree(&octree, depth(2)).unwrap();
        assert_eq!(
            split,
            [
                Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::ONE, 8),
                Subdomain::with_fluid_nodes(IVec3::new(2, 0, 0), IVec3::new(3, 1, 1), 8),
            ]
        );
    }

    #[test]
    fn l_shaped_leaves() {
        // three cells of the first octant whose envelopes overlap once two of them are united
        let mut octree = Octree::new(Cell::Wall);
        for corner in [Corner3::X1Y0Z0, Corner3::X0Y1Z0, Corner3::X1Y1Z0] {
            octree.set(Octant::from_corners([Corner3::X0Y0Z0, corner]), Cell::Fluid);
        }

        let leaves = SubdomainBuilder::new(Granularity::Leaves)
            .build_octree(&octree, depth(2))
            .unwrap();
        assert_eq!(
            leaves,
            [IVec3::new(1, 0, 0), IVec3::new(0, 1, 0), IVec3::new(1, 1, 0)]
                .map(|cell| Subdomain::with_fluid_nodes(cell, cell, 1))
        );

        let merged = SubdomainBuilder::default()
            .build_octree(&octree, depth(2))
            .unwrap();
        assert_eq!(
            merged,
            [Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::new(1, 1, 0), 3)]
        );
    }

    #[test]
    fn split_children_propagate_to_ancestors() {
        // a dense octant that merges and a sparse octant that does not
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::new(Corner3::X0Y0Z0), Cell::Fluid);
        octree.set(
            Octant::from_corners([Corner3::X1Y1Z1, Corner3::X0Y0Z0]),
            Cell::Fluid,
        );
        octree.set(
            Octant::from_corners([Corner3::X1Y1Z1, Corner3::X1Y1Z1]),
            Cell::Fluid,
        );

        let subdomains = SubdomainBuilder::default()
            .build_octree(&octree, depth(2))
            .unwrap();
        // the sparse octant emits its cells first, the whole sibling follows once the root splits
        assert_eq!(
            subdomains,
            [
                Subdomain::with_fluid_nodes(IVec3::splat(2), IVec3::splat(2), 1),
                Subdomain::with_fluid_nodes(IVec3::splat(3), IVec3::splat(3), 1),
                Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::ONE, 8),
            ]
        );
    }
}
