//! Turns a fluid/wall occupancy octree into a dense, padded simulation grid and into rectangular
//! subdomain candidates for load-balanced partitioning.

pub mod bounds;
pub mod cell;
pub mod error;
pub mod extent;
pub mod grid;
pub mod math_enums;
pub mod mesh;
pub mod octree;
pub mod subdomain;
pub mod voxelize;
