use array_init::array_init;
use enum_map::{Enum, EnumMap};
use itertools::Itertools;

use super::{
    octant::{Octant, OctantCorners, OctreeDepth},
    BuildAction,
};
use crate::math_enums::Corner3;

/// A node within an octree holding either a value or a split into 8 octants which are also nodes.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub(crate) enum Node<T> {
    /// A leaf node holding a `T`.
    Value(T),
    /// A node that was split into 8 octants.
    Octants(Octants<T>),
}

impl<T: Default> Default for Node<T> {
    fn default() -> Self {
        Self::Value(Default::default())
    }
}

impl<T> Node<T> {
    /// Returns the value at the specified octant.
    ///
    /// Returns [`None`] if the specified octant contains multiple different values.
    pub(crate) fn get(&self, octant: Octant) -> Option<&T> {
        let mut current = self;
        let mut corners = octant.into_iter();
        loop {
            match current {
                Node::Value(value) => break Some(value),
                Node::Octants(octants) => current = &octants[corners.next()?],
            }
        }
    }

    /// The depth of the deepest leaf relative to this node.
    pub(crate) fn depth(&self) -> u8 {
        match self {
            Node::Value(_) => 0,
            Node::Octants(octants) => {
                1 + octants
                    .values()
                    .map(Self::depth)
                    .max()
                    .expect("octants should not be empty")
            }
        }
    }

    pub(crate) fn as_value(&self) -> Option<&T> {
        if let Self::Value(value) = self {
            Some(value)
        } else {
            None
        }
    }

    pub(crate) fn as_octants(&self) -> Option<&Octants<T>> {
        if let Self::Octants(octants) = self {
            Some(octants)
        } else {
            None
        }
    }

    /// Returns a mutable reference to the octants of a split node.
    ///
    /// # Panics
    ///
    /// Panics if the node is not split.
    fn octants_mut(&mut self) -> &mut Octants<T> {
        if let Self::Octants(octants) = self {
            octants
        } else {
            panic!("should contain a split")
        }
    }
}

impl<T: Clone + PartialEq> Node<T> {
    /// Recursively builds a node for the given `octant`, asking `action` whether to fill or split.
    ///
    /// Splits whose octants all end up holding the same value are merged back into that value.
    ///
    /// # Panics
    ///
    /// Panics if `action` asks to split a node at `max_depth`.
    pub(crate) fn build<F>(octant: Octant, max_depth: OctreeDepth, action: &mut F) -> Self
    where
        F: FnMut(Octant) -> BuildAction<T>,
    {
        match action(octant) {
            BuildAction::Fill(value) => Self::Value(value),
            BuildAction::Split => {
                assert!(
                    octant.depth() < max_depth,
                    "cannot split an octant at max depth {max_depth}"
                );
                let nodes: [Self; 8] = array_init(|index| {
                    Self::build(
                        octant.corner(Corner3::from_usize(index)),
                        max_depth,
                        &mut *action,
                    )
                });
                let node = Self::Octants(Box::new(EnumMap::from_array(nodes)));
                node.merged()
            }
        }
    }

    /// Sets the specified `octant` to the provided `value`.
    ///
    /// Returns `true` if the parent node must be checked for merging.
    pub(crate) fn set(&mut self, mut corners: OctantCorners, value: T) -> bool {
        if let Self::Value(existing_value) = self {
            if existing_value != &value {
                if corners.len() == 0 {
                    *self = Self::Value(value);
                    true
                } else {
                    *self.multi_split(corners) = Self::Value(value);
                    false
                }
            } else {
                false
            }
        } else if let Some(corner) = corners.next() {
            if self.octants_mut()[corner].set(corners, value) {
                if let Some(merged) = self.uniform_value().cloned() {
                    *self = Self::Value(merged);
                    true
                } else {
                    false
                }
            } else {
                false
            }
        } else {
            *self = Self::Value(value);
            true
        }
    }

    /// Returns the shared value if this is a split whose octants all hold the same single value.
    fn uniform_value(&self) -> Option<&T> {
        let octants = self.as_octants()?;
        octants
            .values()
            .map(Self::as_value)
            .all_equal_value()
            .ok()
            .flatten()
    }

    /// Collapses a split into a single value if all of its octants hold the same value.
    fn merged(self) -> Self {
        match self.uniform_value().cloned() {
            Some(value) => Self::Value(value),
            None => self,
        }
    }

    /// Splits along the given corners and returns a mutable reference to the final [`Node`].
    ///
    /// # Panics
    ///
    /// Panics if the initial octant is already split.
    fn multi_split(&mut self, corners: OctantCorners) -> &mut Self {
        assert!(matches!(self, Self::Value(_)));
        let mut current = self;
        for corner in corners {
            current.split();
            current = &mut current.octants_mut()[corner];
        }
        current
    }

    /// Splits the node into 8 octants, [cloning](Clone) the original value.
    ///
    /// # Panics
    ///
    /// Panics if the octant is already split.
    fn split(&mut self) {
        if let Self::Value(value) = self {
            let value = value.clone();
            *self = Self::Octants(Box::new(EnumMap::from_array(array_init(|_| {
                Self::Value(value.clone())
            }))));
        } else {
            panic!("node already split");
        }
    }
}

pub(crate) type Octants<T> = Box<EnumMap<Corner3, Node<T>>>;
