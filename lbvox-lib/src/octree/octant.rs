//! Paths from the root of an octree down to one of its nodes.

use std::{cmp::Ordering, fmt, iter::FusedIterator, ops::Range};

use bitvec::{bitarr, field::BitField, order::Lsb0, BitArr};
use enum_map::Enum;

use crate::math_enums::Corner3;

const CORNER_BITS: usize = 3;
const PATH_BITS: usize = OctreeDepth::MAX.0 as usize * CORNER_BITS;

/// The corners taken at each level to descend from the root of an octree to one of its nodes.
///
/// Level `i` of the path occupies bits `3 * i..3 * i + 3`. Octants only ever grow by appending a
/// corner, so bits past the depth stay zero and equality can compare the raw bits.
#[derive(Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct Octant {
    depth: OctreeDepth,
    path: BitArr!(for PATH_BITS, in u64),
}

impl Octant {
    /// The empty path, pointing at the root itself.
    pub const ROOT: Self = Self {
        depth: OctreeDepth::MIN,
        path: bitarr!(u64, Lsb0; 0; PATH_BITS),
    };

    /// The child of the root at `corner`.
    pub fn new(corner: Corner3) -> Self {
        Self::ROOT.corner(corner)
    }

    /// Descends from the root along `corners`.
    ///
    /// # Panics
    ///
    /// Panics if more than [`OctreeDepth::MAX`] corners are given.
    pub fn from_corners(corners: impl IntoIterator<Item = Corner3>) -> Self {
        corners
            .into_iter()
            .fold(Self::ROOT, |octant, corner| octant.corner(corner))
    }

    pub fn depth(self) -> OctreeDepth {
        self.depth
    }

    /// The child of this octant at `corner`.
    ///
    /// # Panics
    ///
    /// Panics if this octant already lies at [`OctreeDepth::MAX`].
    pub fn corner(mut self, corner: Corner3) -> Self {
        let level = usize::from(self.depth.0);
        self.depth = OctreeDepth::new(self.depth.0 + 1)
            .expect("octant should not descend below the max depth");
        self.path[level * CORNER_BITS..][..CORNER_BITS].store_le(corner.into_usize());
        self
    }

    fn corner_at(self, level: u8) -> Corner3 {
        let start = usize::from(level) * CORNER_BITS;
        Corner3::from_usize(self.path[start..][..CORNER_BITS].load_le())
    }
}

impl fmt::Debug for Octant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(*self).finish()
    }
}

/// Octants are ordered the way a depth-first traversal reaches them, with parents first.
impl Ord for Octant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.into_iter().cmp(*other)
    }
}

impl PartialOrd for Octant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl IntoIterator for Octant {
    type Item = Corner3;
    type IntoIter = OctantCorners;

    fn into_iter(self) -> Self::IntoIter {
        OctantCorners {
            octant: self,
            levels: 0..self.depth.0,
        }
    }
}

/// The corners of an [`Octant`], starting at the root.
#[derive(Clone, Debug)]
pub struct OctantCorners {
    octant: Octant,
    levels: Range<u8>,
}

impl Iterator for OctantCorners {
    type Item = Corner3;

    fn next(&mut self) -> Option<Corner3> {
        let level = self.levels.next()?;
        Some(self.octant.corner_at(level))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.levels.size_hint()
    }
}

impl ExactSizeIterator for OctantCorners {}

impl FusedIterator for OctantCorners {}

/// The depth of a node within an octree, where the root lies at depth zero.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OctreeDepth(u8);

impl OctreeDepth {
    pub const MIN: Self = Self(0);
    /// Single cells of a tree this deep still number at most 2^63, so cell counts fit into a
    /// [`u64`].
    pub const MAX: Self = Self(21);

    /// Returns [`None`] if `depth` exceeds [`OctreeDepth::MAX`].
    pub const fn new(depth: u8) -> Option<Self> {
        if depth <= Self::MAX.0 {
            Some(Self(depth))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for OctreeDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
