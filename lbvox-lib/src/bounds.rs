use std::fmt;

use glam::IVec3;
use serde::Serialize;

/// Signed integer axis-aligned bounds in 3D-space, inclusive on both ends.
///
/// Bounds with `min > max` along any axis are empty. [`IBounds3::EMPTY`] is the canonical empty
/// bounds and the identity of [`IBounds3::union`], which makes it the natural starting point for
/// min/max reductions.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize)]
pub struct IBounds3 {
    /// The inclusive lower limit of the bounds.
    min: IVec3,
    /// The inclusive upper limit of the bounds.
    max: IVec3,
}

impl IBounds3 {
    /// Empty bounds that leave any other bounds unchanged under [`IBounds3::union`].
    pub const EMPTY: Self = Self {
        min: IVec3::MAX,
        max: IVec3::MIN,
    };

    /// Constructs [`IBounds3`] from the given inclusive `min` and `max`.
    ///
    /// # Panics
    ///
    /// Panics if `min` exceeds `max` along any axis.
    pub const fn new(min: IVec3, max: IVec3) -> Self {
        if let Some(bounds) = Self::checked_new(min, max) {
            bounds
        } else {
            panic!("min must not exceed max");
        }
    }

    /// Constructs [`IBounds3`] from the given inclusive `min` and `max`.
    ///
    /// Returns [`None`] if `min` exceeds `max` along any axis.
    pub const fn checked_new(min: IVec3, max: IVec3) -> Option<Self> {
        if min.x <= max.x && min.y <= max.y && min.z <= max.z {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Constructs bounds covering the single given `point`.
    pub const fn point(point: IVec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// The inclusive lower limit of the bounds.
    pub const fn min(self) -> IVec3 {
        self.min
    }

    /// The inclusive upper limit of the bounds.
    pub const fn max(self) -> IVec3 {
        self.max
    }

    /// Whether the bounds are empty along _any_ axis.
    pub fn is_empty(self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// The number of cells along each axis.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are empty.
    pub fn size(self) -> IVec3 {
        assert!(!self.is_empty(), "empty bounds have no size");
        self.max - self.min + IVec3::ONE
    }

    /// The number of cells within the bounds; zero if empty.
    pub fn volume(self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let size = self.size().as_uvec3();
        u64::from(size.x) * u64::from(size.y) * u64::from(size.z)
    }

    pub fn contains(self, point: IVec3) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }

    /// Whether `other` lies completely within `self`.
    ///
    /// Empty bounds are enclosed by anything.
    pub fn encloses(self, other: Self) -> bool {
        other.is_empty() || (self.contains(other.min) && self.contains(other.max))
    }

    /// Whether `self` and `other` share at least one cell.
    pub fn overlaps(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.cmple(other.max).all()
            && other.min.cmple(self.max).all()
    }

    /// The smallest bounds enclosing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows the bounds so that they include the region from `min` to `max`.
    pub fn include(&mut self, min: IVec3, max: IVec3) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }
}

impl Default for IBounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for IBounds3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("(empty)")
        } else {
            write!(
                f,
                "({}, {}, {}) - ({}, {}, {})",
                self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_union_identity() {
        let bounds = IBounds3::new(IVec3::new(-1, 2, 3), IVec3::new(4, 5, 6));
        assert!(IBounds3::EMPTY.is_empty());
        assert_eq!(IBounds3::EMPTY.union(bounds), bounds);
        assert_eq!(bounds.union(IBounds3::EMPTY), bounds);
        assert_eq!(IBounds3::EMPTY.volume(), 0);
    }

    #[test]
    fn checked_new_rejects_inverted() {
        assert_eq!(IBounds3::checked_new(IVec3::ONE, IVec3::ZERO), None);
        assert!(IBounds3::checked_new(IVec3::ONE, IVec3::ONE).is_some());
    }

    #[test]
    #[should_panic(expected = "min must not exceed max")]
    fn new_panics_on_inverted() {
        IBounds3::new(IVec3::new(0, 2, 0), IVec3::new(1, 1, 1));
    }

    #[test]
    fn size_and_volume_are_inclusive() {
        let bounds = IBounds3::new(IVec3::new(2, 2, 2), IVec3::new(3, 4, 2));
        assert_eq!(bounds.size(), IVec3::new(2, 3, 1));
        assert_eq!(bounds.volume(), 6);
        assert_eq!(IBounds3::point(IVec3::splat(7)).volume(), 1);
    }

    #[test]
    fn contains_and_encloses() {
        let outer = IBounds3::new(IVec3::ZERO, IVec3::splat(3));
        let inner = IBounds3::new(IVec3::ONE, IVec3::splat(2));
        assert!(outer.contains(IVec3::splat(3)));
        assert!(!outer.contains(IVec3::new(4, 0, 0)));
        assert!(outer.encloses(inner));
        assert!(!inner.encloses(outer));
        assert!(inner.encloses(IBounds3::EMPTY));
    }

    #[test]
    fn overlaps_requires_shared_cell() {
        let a = IBounds3::new(IVec3::ZERO, IVec3::ONE);
        let b = IBounds3::new(IVec3::new(2, 0, 0), IVec3::new(3, 1, 1));
        let c = IBounds3::new(IVec3::ONE, IVec3::splat(2));
        assert!(!a.overlaps(b));
        assert!(a.overlaps(c));
        assert!(!a.overlaps(IBounds3::EMPTY));
    }

    #[test]
    fn include_grows() {
        let mut bounds = IBounds3::EMPTY;
        bounds.include(IVec3::new(2, 2, 2), IVec3::new(3, 3, 3));
        bounds.include(IVec3::new(0, 4, 2), IVec3::new(1, 5, 2));
        assert_eq!(
            bounds,
            IBounds3::new(IVec3::new(0, 2, 2), IVec3::new(3, 5, 3))
        );
    }

    #[test]
    fn display() {
        let bounds = IBounds3::new(IVec3::new(2, 2, 2), IVec3::new(3, 3, 3));
        assert_eq!(bounds.to_string(), "(2, 2, 2) - (3, 3, 3)");
        assert_eq!(IBounds3::EMPTY.to_string(), "(empty)");
    }
}
