//! Materializes an octree into a dense, padded grid of cells.

use glam::{IVec3, UVec3};
use ndarray::{s, Array3};
use tracing::{debug, trace};

use crate::{
    bounds::IBounds3,
    cell::Cell,
    error::{GridError, GridResult},
    extent::scan_fluid_extent,
    octree::{
        geometry::node_bounds,
        octant::{Octant, OctreeDepth},
        visit::OctreeVisitor,
        Octree,
    },
};

/// A dense grid of cells indexed by `[x, y, z]`, with `z` varying fastest in memory.
///
/// Cell `[0, 0, 0]` corresponds to `bounds.min() - padding` in octree coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseGrid {
    cells: Array3<Cell>,
    /// The octree coordinates of cell `[0, 0, 0]`.
    origin: IVec3,
}

impl DenseGrid {
    /// Materializes all fluid leaves of `octree` that lie within `bounds` into a grid surrounded by
    /// `padding` layers of wall cells.
    ///
    /// The grid has `bounds.size() + 2 * padding` cells along each axis, all of which are walls
    /// except for the cells covered by fluid leaves.
    ///
    /// `bounds` must be the result of [`scan_fluid_extent`] on the same `octree` and `max_depth`.
    ///
    /// # Errors
    ///
    /// - [`GridError::EmptyFluidRegion`] if `bounds` is empty, i.e. there is no fluid to write.
    /// - [`GridError::DepthExceeded`] if the octree is deeper than `max_depth`.
    /// - [`GridError::PaddingTooLarge`] if the padded grid cannot be indexed with an `i32`.
    ///
    /// # Panics
    ///
    /// Panics if a fluid leaf is not enclosed by `bounds`, which means that `bounds` is stale or
    /// was computed for a different max depth.
    pub fn materialize(
        octree: &Octree<Cell>,
        max_depth: OctreeDepth,
        bounds: IBounds3,
        padding: u32,
    ) -> GridResult<Self> {
        if bounds.is_empty() {
            return Err(GridError::EmptyFluidRegion);
        }
        octree.check_depth(max_depth)?;

        let (padding, dim) =
            padded_size(bounds, padding).ok_or(GridError::PaddingTooLarge { padding })?;
        debug!(%bounds, padding, ?dim, "materializing dense grid");

        let mut materializer = GridMaterializer {
            max_depth,
            bounds,
            padding,
            cells: Array3::from_elem(
                (dim.x as usize, dim.y as usize, dim.z as usize),
                Cell::Wall,
            ),
        };
        octree.visit(&mut materializer);

        Ok(Self {
            cells: materializer.cells,
            origin: bounds.min() - padding,
        })
    }

    /// Scans the fluid extent of `octree` and materializes it with the given `padding`.
    pub fn from_octree(
        octree: &Octree<Cell>,
        max_depth: OctreeDepth,
        padding: u32,
    ) -> GridResult<Self> {
        let bounds = scan_fluid_extent(octree, max_depth)?;
        Self::materialize(octree, max_depth, bounds, padding)
    }

    /// The number of cells along each axis.
    pub fn dim(&self) -> [usize; 3] {
        let (x, y, z) = self.cells.dim();
        [x, y, z]
    }

    /// The octree coordinates of cell `[0, 0, 0]`.
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    /// Returns the cell at the given grid index; [`None`] if out of range.
    pub fn get(&self, index: [usize; 3]) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn fluid_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_fluid()).count()
    }

    pub fn as_array(&self) -> &Array3<Cell> {
        &self.cells
    }
}

/// The padding as an `i32` along with the number of cells per axis; [`None`] on overflow.
fn padded_size(bounds: IBounds3, padding: u32) -> Option<(i32, UVec3)> {
    let padding = i32::try_from(padding).ok()?;
    let border = padding.checked_mul(2)?;
    let size = bounds.size().to_array().map(|size| size.checked_add(border));
    match size {
        [Some(x), Some(y), Some(z)] => Some((padding, IVec3::new(x, y, z).as_uvec3())),
        _ => None,
    }
}

/// Writes fluid leaves into a grid that was already allocated and filled with walls.
struct GridMaterializer {
    max_depth: OctreeDepth,
    bounds: IBounds3,
    padding: i32,
    cells: Array3<Cell>,
}

impl OctreeVisitor for GridMaterializer {
    type Value = Cell;

    fn visit_value(&mut self, octant: Octant, value: &Cell) {
        // the grid is already filled with walls
        if value.is_wall() {
            return;
        }

        let leaf = node_bounds(octant, self.max_depth);
        assert!(
            self.bounds.encloses(leaf),
            "fluid leaf {leaf} lies outside of the scanned bounds {}",
            self.bounds
        );

        let offset = self.padding - self.bounds.min();
        let lower = (leaf.min() + offset).as_uvec3();
        let upper = (leaf.max() + offset).as_uvec3();
        trace!(?octant, %leaf, "writing fluid leaf");
        self.cells
            .slice_mut(s![
                lower.x as usize..=upper.x as usize,
                lower.y as usize..=upper.y as usize,
                lower.z as usize..=upper.z as usize,
            ])
            .fill(Cell::Fluid);
    }
}
