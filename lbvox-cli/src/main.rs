//! Voxelizes a closed STL mesh into a dense fluid/wall grid for lattice Boltzmann simulations.
//!
//! The grid is saved as a NumPy array of `u8`, where `0` marks fluid and `1` marks walls. The
//! fluid region is cropped to its bounding box and surrounded by a layer of walls. Optionally, the
//! fluid is also decomposed into rectangular subdomains which are saved as JSON.

mod npy;
mod stl;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use lbvox_lib::{
    extent::par_scan_fluid_extent,
    grid::DenseGrid,
    subdomain::{Granularity, Subdomain, SubdomainBuilder, SubdomainStats},
    voxelize::Voxelizer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Voxelizes a closed STL mesh into a padded fluid/wall grid.
#[derive(Parser, Debug)]
#[command(name = "lbvox", version)]
struct Args {
    /// Path to the STL mesh, either binary or ASCII.
    mesh: PathBuf,

    /// Number of voxels along the longest axis of the mesh.
    #[arg(default_value_t = 100)]
    num_voxels: u32,

    /// Layers of wall cells around the fluid bounding box.
    #[arg(long, default_value_t = 1)]
    padding: u32,

    /// Output path of the grid; a `.gz` suffix compresses it.
    #[arg(short, long, default_value = "test.npy")]
    output: PathBuf,

    /// Also writes the fluid subdomains to this JSON file.
    #[arg(long)]
    subdomains: Option<PathBuf>,

    /// How far subdomains are merged before they are emitted.
    #[arg(long, value_enum, default_value_t = GranularityArg::Merged)]
    granularity: GranularityArg,

    /// Merged subdomains must have at least this share of fluid cells.
    #[arg(long, default_value_t = 0.5)]
    min_fill_fraction: f64,

    /// Merged subdomains must not span more cells than this.
    #[arg(long)]
    max_volume: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GranularityArg {
    /// One subdomain per fluid leaf of the octree.
    Leaves,
    /// Merges sibling subdomains while they stay dense enough.
    Merged,
}

impl Args {
    fn granularity(&self) -> Result<Granularity> {
        Ok(match self.granularity {
            GranularityArg::Leaves => Granularity::Leaves,
            GranularityArg::Merged => {
                ensure!(
                    (0.0..=1.0).contains(&self.min_fill_fraction),
                    "the minimum fill fraction must lie within 0 and 1, got {}",
                    self.min_fill_fraction
                );
                Granularity::Merged {
                    min_fill_fraction: self.min_fill_fraction,
                    max_volume: self.max_volume.unwrap_or(u64::MAX),
                }
            }
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let granularity = args.granularity()?;
    let mesh = stl::read_stl(&args.mesh)?;

    if let Some(bounds) = mesh.bounds() {
        let span = bounds.span();
        info!(
            x = span.x,
            y = span.y,
            z = span.z,
            triangles = mesh.len(),
            "mesh bounding box"
        );
    }

    let voxelizer = Voxelizer::new(&mesh, args.num_voxels)
        .with_context(|| format!("cannot voxelize {}", args.mesh.display()))?;
    info!(voxel_size = voxelizer.voxel_size(), "voxel size");

    let octree = voxelizer.voxelize(&mesh);
    let max_depth = voxelizer.max_depth();
    info!(actual = %octree.depth(), requested = %max_depth, "tree depth");

    let fluid_bounds = par_scan_fluid_extent(&octree, max_depth)?;
    info!(bounds = %fluid_bounds, "fluid bounding box");

    let grid = DenseGrid::materialize(&octree, max_depth, fluid_bounds, args.padding)
        .context("failed to build the dense grid")?;
    let [x, y, z] = grid.dim();
    info!(x, y, z, fluid = grid.fluid_count(), "array size");

    npy::save_npy(&args.output, grid.as_array())?;
    info!(path = %args.output.display(), "saved grid");

    let subdomains = SubdomainBuilder::new(granularity).build_octree(&octree, max_depth)?;
    let stats = SubdomainStats::new(&subdomains);
    info!(
        count = stats.count,
        total_volume = stats.total_volume,
        fluid_nodes = stats.fluid_nodes,
        fill_fraction = stats.fill_fraction(),
        "subdomains"
    );

    if let Some(path) = &args.subdomains {
        save_subdomains(path, &subdomains)?;
        info!(path = %path.display(), "saved subdomains");
    }

    Ok(())
}

fn save_subdomains(path: &Path, subdomains: &[Subdomain]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), subdomains)
        .with_context(|| format!("failed to write {}", path.display()))
}
