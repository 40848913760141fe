//! Rectangular regions annotated with their fluid cell count.
//!
//! [`Subdomain`]s are the raw material for load-balanced partitioning of a simulation: the
//! [`SubdomainBuilder`] decomposes a [`FluidTree`] into disjoint subdomains whose fluid counts add
//! up to the total amount of fluid.

mod builder;
mod prune;

use std::{fmt, iter::Sum, ops::Add};

use glam::IVec3;
use serde::Serialize;

use crate::{
    bounds::IBounds3,
    cell::Cell,
    octree::{
        geometry::{count_fluid_nodes, node_bounds},
        octant::OctreeDepth,
        NodeRef,
    },
};

pub use builder::{Granularity, SubdomainBuilder};
pub use prune::{FluidNode, FluidTree};

/// An axis-aligned region of the voxel grid along with the number of fluid cells inside it.
///
/// The region spans `origin..=extent` along every axis. Subdomains are immutable values; new ones
/// are created from nodes or via [`Subdomain::union`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Subdomain {
    bounds: IBounds3,
    fluid_nodes: u64,
}

impl Subdomain {
    /// A region without any fluid.
    ///
    /// # Panics
    ///
    /// Panics if `origin` exceeds `extent` along any axis.
    pub fn new(origin: IVec3, extent: IVec3) -> Self {
        Self::with_fluid_nodes(origin, extent, 0)
    }

    /// A region containing `fluid_nodes` fluid cells.
    ///
    /// # Panics
    ///
    /// Panics if `origin` exceeds `extent` along any axis or if there are more fluid cells than
    /// cells in the region.
    pub fn with_fluid_nodes(origin: IVec3, extent: IVec3, fluid_nodes: u64) -> Self {
        Self::checked_new(origin, extent, fluid_nodes)
            .expect("subdomain should span a non-empty region with at most one fluid node per cell")
    }

    /// Same as [`Subdomain::with_fluid_nodes`], but returns [`None`] instead of panicking.
    pub fn checked_new(origin: IVec3, extent: IVec3, fluid_nodes: u64) -> Option<Self> {
        let bounds = IBounds3::checked_new(origin, extent)?;
        (fluid_nodes <= bounds.volume()).then_some(Self {
            bounds,
            fluid_nodes,
        })
    }

    /// The full footprint of a node along with the number of fluid cells inside it.
    ///
    /// # Panics
    ///
    /// Panics if the node or any of its leaves lies deeper than `max_depth`.
    pub fn from_node(node: NodeRef<'_, Cell>, max_depth: OctreeDepth) -> Self {
        Self {
            bounds: node_bounds(node.octant(), max_depth),
            fluid_nodes: count_fluid_nodes(node, max_depth),
        }
    }

    /// The inclusive minimum corner.
    pub fn origin(&self) -> IVec3 {
        self.bounds.min()
    }

    /// The inclusive maximum corner, opposite to [`Subdomain::origin`].
    pub fn extent(&self) -> IVec3 {
        self.bounds.max()
    }

    pub fn bounds(&self) -> IBounds3 {
        self.bounds
    }

    pub fn fluid_nodes(&self) -> u64 {
        self.fluid_nodes
    }

    /// The number of cells in the region; always at least 1.
    pub fn volume(&self) -> u64 {
        self.bounds.volume()
    }

    /// The share of fluid cells in the region, within `0.0..=1.0`.
    pub fn fill_fraction(&self) -> f64 {
        self.fluid_nodes as f64 / self.volume() as f64
    }

    /// The envelope of both regions with the sum of both fluid counts.
    ///
    /// Fluid counts are added rather than recounted, so this is only meaningful if the fluid
    /// cells of `self` and `other` are distinct, which is always true for sibling nodes of an
    /// octree. The envelopes themselves may well overlap, e.g. once three siblings in an L-shape
    /// are united one after another.
    pub fn union(self, other: Self) -> Self {
        Self {
            bounds: self.bounds.union(other.bounds),
            fluid_nodes: self.fluid_nodes + other.fluid_nodes,
        }
    }
}

impl Add for Subdomain {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl Sum for Subdomain {
    /// Unites all subdomains.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is empty, since there is no empty subdomain.
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.reduce(Self::union)
            .expect("at least one subdomain should be summed")
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fluid: {}/{}",
            self.bounds,
            self.fluid_nodes,
            self.volume()
        )
    }
}

impl Serialize for Subdomain {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Subdomain", 3)?;
        state.serialize_field("origin", &self.origin())?;
        state.serialize_field("extent", &self.extent())?;
        state.serialize_field("fluid_nodes", &self.fluid_nodes)?;
        state.end()
    }
}

/// Totals over a list of disjoint subdomains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SubdomainStats {
    pub count: usize,
    pub total_volume: u64,
    pub fluid_nodes: u64,
}

impl SubdomainStats {
    pub fn new<'a>(subdomains: impl IntoIterator<Item = &'a Subdomain>) -> Self {
        subdomains
            .into_iter()
            .fold(Self::default(), |stats, subdomain| Self {
                count: stats.count + 1,
                total_volume: stats.total_volume + subdomain.volume(),
                fluid_nodes: stats.fluid_nodes + subdomain.fluid_nodes(),
            })
    }

    /// The share of fluid cells across all subdomains; `0.0` if there are none.
    pub fn fill_fraction(&self) -> f64 {
        if self.total_volume == 0 {
            0.0
        } else {
            self.fluid_nodes as f64 / self.total_volume as f64
        }
    }
}

impl fmt::Display for SubdomainStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subdomains, {} cells, {} fluid ({:.3})",
            self.count,
            self.total_volume,
            self.fluid_nodes,
            self.fill_fraction()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math_enums::Corner3,
        octree::{octant::Octant, Octree},
    };

    fn depth(depth: u8) -> OctreeDepth {
        OctreeDepth::new(depth).unwrap()
    }

    fn cube(origin: i32, side: i32, fluid_nodes: u64) -> Subdomain {
        Subdomain::with_fluid_nodes(
            IVec3::splat(origin),
            IVec3::splat(origin + side - 1),
            fluid_nodes,
        )
    }

    #[test]
    fn volume_is_product_of_inclusive_spans() {
        let subdomain = Subdomain::new(IVec3::new(1, 2, 3), IVec3::new(1, 4, 6));
        assert_eq!(subdomain.volume(), 12);
        assert_eq!(Subdomain::new(IVec3::ZERO, IVec3::ZERO).volume(), 1);
    }

    #[test]
    fn checked_new_enforces_invariants() {
        assert!(Subdomain::checked_new(IVec3::ONE, IVec3::ZERO, 0).is_none());
        assert!(Subdomain::checked_new(IVec3::ZERO, IVec3::ONE, 9).is_none());
        assert!(Subdomain::checked_new(IVec3::ZERO, IVec3::ONE, 8).is_some());
    }

    #[test]
    #[should_panic(expected = "subdomain should span a non-empty region")]
    fn with_fluid_nodes_panics_on_overfull() {
        Subdomain::with_fluid_nodes(IVec3::ZERO, IVec3::ZERO, 2);
    }

    #[test]
    fn fill_fraction() {
        assert_eq!(cube(0, 2, 0).fill_fraction(), 0.0);
        assert_eq!(cube(0, 2, 4).fill_fraction(), 0.5);
        assert_eq!(cube(0, 2, 8).fill_fraction(), 1.0);
    }

    #[test]
    fn union_is_envelope_with_summed_fluid() {
        let a = cube(0, 2, 3);
        let b = Subdomain::with_fluid_nodes(IVec3::new(4, 0, 0), IVec3::new(4, 5, 1), 7);
        let united = a.union(b);
        assert_eq!(united.origin(), IVec3::ZERO);
        assert_eq!(united.extent(), IVec3::new(4, 5, 1));
        assert_eq!(united.fluid_nodes(), 10);
        assert_eq!(a + b, united);
    }

    #[test]
    fn union_is_commutative_and_associative() {
        let a = cube(0, 2, 1);
        let b = cube(2, 1, 1);
        let c = Subdomain::with_fluid_nodes(IVec3::new(-3, 5, 0), IVec3::new(-1, 6, 0), 6);
        assert_eq!(a.union(b), b.union(a));
        assert_eq!(a.union(b).union(c), a.union(b.union(c)));
        assert_eq!([a, b, c].into_iter().sum::<Subdomain>(), c + b + a);
    }

    #[test]
    fn l_shaped_siblings_unite_one_after_another() {
        // the envelope of the first two cells already covers the third one
        let cells = [IVec3::new(1, 0, 0), IVec3::new(0, 1, 0), IVec3::new(1, 1, 0)]
            .map(|cell| Subdomain::with_fluid_nodes(cell, cell, 1));
        assert!(cells[0].union(cells[1]).bounds().contains(cells[2].origin()));

        let united = cells.into_iter().sum::<Subdomain>();
        assert_eq!(united.to_string(), "(0, 0, 0) - (1, 1, 0) fluid: 3/4");
        assert_eq!(united, cells[2] + cells[1] + cells[0]);
    }

    #[test]
    fn sibling_leaves_unite_without_double_counting() {
        // a fluid and a wall leaf, both 2x2x2, next to each other
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::new(Corner3::X0Y0Z0), Cell::Fluid);

        let root = octree.root();
        let fluid = Subdomain::from_node(root.child_at(Corner3::X0Y0Z0).unwrap(), depth(2));
        let wall = Subdomain::from_node(root.child_at(Corner3::X1Y0Z0).unwrap(), depth(2));
        assert_eq!(fluid.fluid_nodes(), 8);
        assert_eq!(wall.fluid_nodes(), 0);

        let parent = fluid.union(wall);
        assert_eq!(parent.fluid_nodes(), 8);
        assert_eq!(parent.volume(), 16);
        assert_eq!(parent.origin(), IVec3::ZERO);
        assert_eq!(parent.extent(), IVec3::new(3, 1, 1));
        assert_eq!(parent.fill_fraction(), 0.5);
    }

    #[test]
    fn from_node_uses_full_footprint() {
        let mut octree = Octree::new(Cell::Wall);
        octree.set(Octant::from_corners([Corner3::X1Y1Z1; 2]), Cell::Fluid);
        let subdomain = Subdomain::from_node(octree.root(), depth(2));
        assert_eq!(subdomain.origin(), IVec3::ZERO);
        assert_eq!(subdomain.extent(), IVec3::splat(3));
        assert_eq!(subdomain.fluid_nodes(), 1);
        assert_eq!(subdomain.fill_fraction(), 1.0 / 64.0);
    }

    #[test]
    fn display_and_serialize() {
        let subdomain = cube(2, 2, 5);
        assert_eq!(subdomain.to_string(), "(2, 2, 2) - (3, 3, 3) fluid: 5/8");
        assert_eq!(
            serde_json::to_value(subdomain).unwrap(),
            serde_json::json!({ "origin": [2, 2, 2], "extent": [3, 3, 3], "fluid_nodes": 5 })
        );
    }

    #[test]
    fn stats() {
        let subdomains = [cube(0, 2, 8), cube(2, 2, 4)];
        let stats = SubdomainStats::new(&subdomains);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_volume, 16);
        assert_eq!(stats.fluid_nodes, 12);
        assert_eq!(stats.fill_fraction(), 0.75);
        assert_eq!(SubdomainStats::new(&[] as &[Subdomain]).fill_fraction(), 0.0);
    }
}
