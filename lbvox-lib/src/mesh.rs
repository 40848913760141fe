//! A plain triangle soup as read from mesh files.

use glam::Vec3;

use crate::error::{VoxelizeError, VoxelizeResult};

pub type Triangle = [Vec3; 3];

/// A closed surface given as a list of triangles.
///
/// Neither orientation nor connectivity are stored; voxelization only relies on the surface being
/// watertight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
}

/// The axis-aligned bounding box of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl TriangleMesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// An axis-aligned box spanning from `min` to `max`, made of 12 triangles.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let corner = |x: bool, y: bool, z: bool| {
            Vec3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };
        let quads = [
            [(0, 0, 0), (0, 1, 0), (1, 1, 0), (1, 0, 0)],
            [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)],
            [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)],
            [(0, 1, 0), (0, 1, 1), (1, 1, 1), (1, 1, 0)],
            [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)],
            [(1, 0, 0), (1, 1, 0), (1, 1, 1), (1, 0, 1)],
        ];
        let triangles = quads
            .into_iter()
            .flat_map(|quad| {
                let [a, b, c, d] = quad.map(|(x, y, z)| corner(x == 1, y == 1, z == 1));
                [[a, b, c], [a, c, d]]
            })
            .collect();
        Self { triangles }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The bounding box of all vertices; [`None`] if there are no triangles.
    pub fn bounds(&self) -> Option<MeshBounds> {
        let mut vertices = self.triangles.iter().flatten();
        let first = *vertices.next()?;
        Some(vertices.fold(
            MeshBounds {
                min: first,
                max: first,
            },
            |bounds, &vertex| MeshBounds {
                min: bounds.min.min(vertex),
                max: bounds.max.max(vertex),
            },
        ))
    }

    /// The edge length of a voxel, so that `num_voxels` voxels cover the longest axis of the mesh.
    pub fn voxel_size(&self, num_voxels: u32) -> VoxelizeResult<f64> {
        if num_voxels == 0 {
            return Err(VoxelizeError::InvalidVoxelCount);
        }
        let bounds = self.bounds().ok_or(VoxelizeError::EmptyMesh)?;
        let max_span = bounds.max_span();
        if max_span.is_finite() && max_span > 0.0 {
            Ok(max_span / f64::from(num_voxels))
        } else {
            Err(VoxelizeError::DegenerateMesh)
        }
    }
}

impl MeshBounds {
    /// The extent along each axis.
    pub fn span(&self) -> Vec3 {
        self.max - self.min
    }

    /// The extent along the longest axis.
    pub fn max_span(&self) -> f64 {
        (self.max.as_dvec3() - self.min.as_dvec3()).max_element()
    }
}
