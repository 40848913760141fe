pub mod geometry;
mod node;
pub mod octant;
pub mod visit;

use derive_where::derive_where;

use node::Node;
use octant::{Octant, OctreeDepth};
use visit::{OctreeVisitor, VisitSplit};

use crate::{
    error::{GridError, GridResult},
    math_enums::Corner3,
};

/// An octree storing values of type `T`.
///
/// Implemented as a recursive data structure where every node is either a leaf holding a single
/// value or split into exactly 8 octants. Sibling octants holding the same value are always merged
/// back into a single leaf, so a leaf is never split without reason.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Octree<T> {
    root: Node<T>,
}

/// Returned by the callback of [`Octree::build`] for each visited octant.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BuildAction<T> {
    /// Turns the octant into a leaf holding the given value.
    Fill(T),
    /// Splits the octant into 8 octants, which are then visited in [`Corner3`] order.
    Split,
}

impl<T> Octree<T> {
    /// Wraps the given `value` in an [`Octree`].
    pub fn new(value: T) -> Self {
        Self {
            root: Node::Value(value),
        }
    }

    /// Builds an [`Octree`] top-down, starting at the root.
    ///
    /// `action` is called for each octant and decides whether the octant is filled with a single
    /// value or split further. Octants whose children all end up holding the same value are merged.
    ///
    /// # Panics
    ///
    /// Panics if `action` asks to split an octant at `max_depth`.
    pub fn build(max_depth: OctreeDepth, mut action: impl FnMut(Octant) -> BuildAction<T>) -> Self
    where
        T: Clone + PartialEq,
    {
        Self {
            root: Node::build(Octant::ROOT, max_depth, &mut action),
        }
    }

    /// Returns the value at the specified octant.
    ///
    /// Returns [`None`] if the specified octant contains multiple different values.
    pub fn get(&self, octant: Octant) -> Option<&T> {
        self.root.get(octant)
    }

    /// Sets the specified `octant` to the provided `value`.
    ///
    /// Values must be [`Clone`], since values are duplicated when an octant is split.
    ///
    /// Values must be [`PartialEq`], since octants merge back together if all its child nodes have
    /// the same value.
    pub fn set(&mut self, octant: Octant, value: T)
    where
        T: Clone + PartialEq,
    {
        // ignore the return value regarding merging; the root has no parent
        self.root.set(octant.into_iter(), value);
    }

    /// A read-only view of the root node.
    pub fn root(&self) -> NodeRef<'_, T> {
        NodeRef {
            node: &self.root,
            octant: Octant::ROOT,
        }
    }

    /// The depth of the deepest leaf in the octree.
    pub fn depth(&self) -> OctreeDepth {
        OctreeDepth::new(self.root.depth()).expect("octants should never exceed the max depth")
    }

    /// Ensures that no leaf lies deeper than `max_depth`.
    ///
    /// Node geometry is only defined for nodes at or above the max depth it is calculated for.
    pub fn check_depth(&self, max_depth: OctreeDepth) -> GridResult<()> {
        let actual = self.depth();
        if actual > max_depth {
            Err(GridError::DepthExceeded {
                actual: actual.get(),
                max: max_depth.get(),
            })
        } else {
            Ok(())
        }
    }

    /// Visits the octree depth-first, see [`NodeRef::visit`].
    pub fn visit(&self, visitor: &mut impl OctreeVisitor<Value = T>) {
        self.root().visit(visitor);
    }
}

/// A reference to a node within an [`Octree`] along with its location in the tree.
#[derive(Debug)]
#[derive_where(Clone, Copy)]
pub struct NodeRef<'a, T> {
    node: &'a Node<T>,
    octant: Octant,
}

impl<'a, T> NodeRef<'a, T> {
    /// The path from the root to this node.
    pub fn octant(self) -> Octant {
        self.octant
    }

    pub fn depth(self) -> OctreeDepth {
        self.octant.depth()
    }

    pub fn is_leaf(self) -> bool {
        matches!(self.node, Node::Value(_))
    }

    /// The value of a leaf; [`None`] for split nodes.
    pub fn value(self) -> Option<&'a T> {
        self.node.as_value()
    }

    /// The child at the given `corner`; [`None`] for leaves.
    pub fn child_at(self, corner: Corner3) -> Option<Self> {
        let octants = self.node.as_octants()?;
        Some(Self {
            node: &octants[corner],
            octant: self.octant.corner(corner),
        })
    }

    /// The child with the given `index` in `0..8`; [`None`] for leaves or out of range indices.
    pub fn child(self, index: usize) -> Option<Self> {
        self.child_at(Corner3::from_index(index)?)
    }

    /// All 8 children in [`Corner3`] order; [`None`] for leaves.
    pub fn children(self) -> Option<impl Iterator<Item = NodeRef<'a, T>> + 'a> {
        let octants = self.node.as_octants()?;
        let octant = self.octant;
        Some(octants.iter().map(move |(corner, node)| NodeRef {
            node,
            octant: octant.corner(corner),
        }))
    }

    /// Recursively visits this node and everything below it, depth-first.
    ///
    /// Children are visited in [`Corner3`] order unless [`OctreeVisitor::visit_split`] skips them.
    pub fn visit(self, visitor: &mut impl OctreeVisitor<Value = T>) {
        match self.node {
            Node::Value(value) => visitor.visit_value(self.octant, value),
            Node::Octants(octants) => match visitor.visit_split(self.octant) {
                VisitSplit::Skip => {}
                VisitSplit::Enter => {
                    for (corner, node) in octants.iter() {
                        NodeRef {
                            node,
                            octant: self.octant.corner(corner),
                        }
                        .visit(visitor);
                    }
                }
            },
        }
    }
}
