//! Recoverable errors of the grid and subdomain pipeline.
//!
//! Internal invariant violations, such as a fluid leaf lying outside of a previously scanned
//! bounding box, are not represented here; they panic instead.

use thiserror::Error;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridError {
    /// The octree does not contain a single fluid cell.
    #[error("the octree contains no fluid cells, there is nothing to voxelize")]
    EmptyFluidRegion,

    /// A leaf lies deeper than the max depth used to map nodes to grid coordinates.
    #[error("the octree has a depth of {actual}, which exceeds the max depth of {max}")]
    DepthExceeded { actual: u8, max: u8 },

    /// The padded grid would span more cells along an axis than an `i32` can index.
    #[error("a padding of {padding} cells makes the grid too large to index")]
    PaddingTooLarge { padding: u32 },
}

pub type VoxelizeResult<T> = Result<T, VoxelizeError>;

#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum VoxelizeError {
    #[error("the mesh contains no triangles")]
    EmptyMesh,

    /// All triangles collapse into a single point or contain non-finite coordinates.
    #[error("the mesh bounding box has no finite, positive extent")]
    DegenerateMesh,

    #[error("the number of voxels must be positive")]
    InvalidVoxelCount,

    #[error("{requested} voxels require a depth of {depth}, but at most {max} is supported")]
    DepthTooLarge { requested: u32, depth: u32, max: u8 },
}
