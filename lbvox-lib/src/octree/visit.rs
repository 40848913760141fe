use super::octant::Octant;

/// A visitor for an octree.
pub trait OctreeVisitor {
    /// The type of the value stored in the octree.
    type Value;

    /// Called for each value in the octree, i.e. leaf nodes in the octree.
    fn visit_value(&mut self, octant: Octant, value: &Self::Value);

    /// Called when a split was encountered, i.e. non-leaf nodes in the octree.
    ///
    /// Returns whether the split should be entered or skipped. Enters every split by default.
    fn visit_split(&mut self, octant: Octant) -> VisitSplit {
        let _ = octant;
        VisitSplit::Enter
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum VisitSplit {
    Skip,
    #[default]
    Enter,
}
