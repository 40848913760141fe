//! Classifies the cells of a regular grid as inside (fluid) or outside (wall) of a closed mesh.
//!
//! Each `(x, y)` column of the grid casts a ray along +z. The surface crossings along that ray are
//! collected once, after which a cell is fluid if an odd number of crossings lies below its center.

use glam::{DVec2, DVec3};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    bounds::IBounds3,
    cell::Cell,
    error::{VoxelizeError, VoxelizeResult},
    mesh::{Triangle, TriangleMesh},
    octree::{
        geometry::{node_bounds, side_length},
        octant::OctreeDepth,
        BuildAction, Octree,
    },
};

/// Sub-voxel offset of every sample point, so that rays do not hit shared edges and vertices of
/// axis-aligned meshes exactly.
const JITTER: DVec3 = DVec3::new(1.37e-4, 0.73e-4, 0.51e-4);

/// Triangles whose projection onto the xy-plane is smaller than this are parallel to the rays.
const PARALLEL_EPSILON: f64 = 1e-12;

/// The octree depth needed for a grid with at least `num_voxels` cells along each axis.
///
/// This is the bit length of `num_voxels`, so 100 voxels require a depth of 7 with 128 cells.
pub fn requested_depth(num_voxels: u32) -> VoxelizeResult<OctreeDepth> {
    if num_voxels == 0 {
        return Err(VoxelizeError::InvalidVoxelCount);
    }
    let depth = u32::BITS - num_voxels.leading_zeros();
    u8::try_from(depth)
        .ok()
        .and_then(OctreeDepth::new)
        .ok_or(VoxelizeError::DepthTooLarge {
            requested: num_voxels,
            depth,
            max: OctreeDepth::MAX.get(),
        })
}

/// Maps a mesh onto a grid of cubic voxels starting at the minimum corner of the mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voxelizer {
    origin: DVec3,
    voxel_size: f64,
    max_depth: OctreeDepth,
}

impl Voxelizer {
    /// Sizes voxels so that `num_voxels` of them cover the longest axis of the `mesh`.
    pub fn new(mesh: &TriangleMesh, num_voxels: u32) -> VoxelizeResult<Self> {
        let max_depth = requested_depth(num_voxels)?;
        let voxel_size = mesh.voxel_size(num_voxels)?;
        let bounds = mesh.bounds().ok_or(VoxelizeError::EmptyMesh)?;
        Ok(Self {
            origin: bounds.min.as_dvec3(),
            voxel_size,
            max_depth,
        })
    }

    /// The position of the minimum corner of cell `[0, 0, 0]`.
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// The depth of single-cell octree nodes.
    pub fn max_depth(&self) -> OctreeDepth {
        self.max_depth
    }

    /// The number of cells along each axis.
    pub fn cells_per_axis(&self) -> usize {
        side_length(OctreeDepth::MIN, self.max_depth) as usize
    }

    /// Classifies every cell and collects the result in an octree, merging uniform octants.
    pub fn voxelize(&self, mesh: &TriangleMesh) -> Octree<Cell> {
        let columns = self.cast_columns(mesh);
        let octree = Octree::build(self.max_depth, |octant| {
            match columns.uniform_cell(node_bounds(octant, self.max_depth)) {
                Some(cell) => BuildAction::Fill(cell),
                None => BuildAction::Split,
            }
        });
        debug!(
            triangles = mesh.len(),
            depth = %octree.depth(),
            max_depth = %self.max_depth,
            "voxelized mesh"
        );
        octree
    }

    fn sample(&self, cell: DVec3) -> DVec3 {
        self.origin + (cell + 0.5 + JITTER) * self.voxel_size
    }

    /// The range of cell indices whose sample points lie within `min..=max` along one axis.
    fn cell_range(&self, min: f64, max: f64, origin: f64, jitter: f64) -> Option<(usize, usize)> {
        let to_cell = |value: f64| (value - origin) / self.voxel_size - 0.5 - jitter;
        let first = to_cell(min).ceil().max(0.0);
        let last = to_cell(max)
            .floor()
            .min(self.cells_per_axis() as f64 - 1.0);
        (first <= last).then_some((first as usize, last as usize))
    }

    fn cast_columns(&self, mesh: &TriangleMesh) -> Columns {
        let cells = self.cells_per_axis();
        let mut columns = Columns {
            cells,
            z_origin: self.origin.z,
            z_step: self.voxel_size,
            z_jitter: JITTER.z,
            crossings: vec![Vec::new(); cells * cells],
        };

        for triangle in mesh.triangles() {
            let [a, b, c] = triangle.map(|vertex| vertex.as_dvec3());
            let min = a.min(b).min(c);
            let max = a.max(b).max(c);
            let Some((x_first, x_last)) = self.cell_range(min.x, max.x, self.origin.x, JITTER.x)
            else {
                continue;
            };
            let Some((y_first, y_last)) = self.cell_range(min.y, max.y, self.origin.y, JITTER.y)
            else {
                continue;
            };

            for x in x_first..=x_last {
                for y in y_first..=y_last {
                    let sample = self.sample(DVec3::new(x as f64, y as f64, 0.0));
                    if let Some(z) = ray_crossing(triangle, sample.truncate()) {
                        columns.crossings[x * cells + y].push(z);
                    }
                }
            }
        }

        columns
            .crossings
            .par_iter_mut()
            .for_each(|column| column.sort_unstable_by(f64::total_cmp));
        columns
    }
}

/// The height at which a ray along +z through `point` crosses the triangle, if it does.
fn ray_crossing(triangle: &Triangle, point: DVec2) -> Option<f64> {
    let [a, b, c] = triangle.map(|vertex| vertex.as_dvec3());
    let edge = |from: DVec3, to: DVec3| (to - from).truncate().perp_dot(point - from.truncate());

    let area = (b - a).truncate().perp_dot((c - a).truncate());
    if area.abs() < PARALLEL_EPSILON {
        return None;
    }
    let weights = DVec3::new(edge(b, c), edge(c, a), edge(a, b)) / area;
    (weights.min_element() >= 0.0).then(|| weights.dot(DVec3::new(a.z, b.z, c.z)))
}

/// Sorted surface crossings along the +z ray of every `(x, y)` column.
struct Columns {
    cells: usize,
    z_origin: f64,
    z_step: f64,
    z_jitter: f64,
    crossings: Vec<Vec<f64>>,
}

impl Columns {
    fn crossings_below(&self, x: usize, y: usize, z: i32) -> usize {
        let height = self.z_origin + (f64::from(z) + 0.5 + self.z_jitter) * self.z_step;
        self.crossings[x * self.cells + y].partition_point(|&crossing| crossing < height)
    }

    /// The cell shared by every cell within `bounds`; [`None`] if they differ.
    fn uniform_cell(&self, bounds: IBounds3) -> Option<Cell> {
        let (min, max) = (bounds.min().as_uvec3(), bounds.max().as_uvec3());
        let mut uniform = None;
        for x in min.x as usize..=max.x as usize {
            for y in min.y as usize..=max.y as usize {
                let below = self.crossings_below(x, y, bounds.min().z);
                if below != self.crossings_below(x, y, bounds.max().z) {
                    return None;
                }
                let cell = Cell::from(below % 2 == 1);
                if *uniform.get_or_insert(cell) != cell {
                    return None;
                }
            }
        }
        uniform
    }
}
