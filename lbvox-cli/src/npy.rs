//! Writes cell grids as NumPy `.npy` arrays of `u8`, optionally gzipped.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression};
use lbvox_lib::cell::Cell;
use ndarray::Array3;

const MAGIC: &[u8] = b"\x93NUMPY";
const VERSION: [u8; 2] = [1, 0];
/// The combined length of magic, version, header length and header is a multiple of this.
const ALIGNMENT: usize = 64;

/// Saves `cells` to `path`, compressing it if the path ends in `.gz`.
pub fn save_npy(path: &Path, cells: &Array3<Cell>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let writer = BufWriter::new(file);

    let result = if path.extension().is_some_and(|extension| extension == "gz") {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        write_npy(&mut encoder, cells).and_then(|()| encoder.finish()?.flush())
    } else {
        let mut writer = writer;
        write_npy(&mut writer, cells).and_then(|()| writer.flush())
    };
    result.with_context(|| format!("failed to write {}", path.display()))
}

/// Writes `cells` in C order, where the last axis varies fastest.
pub fn write_npy(writer: &mut impl Write, cells: &Array3<Cell>) -> io::Result<()> {
    writer.write_all(&header(cells.dim()))?;
    let data = cells.iter().map(|cell| cell.to_u8()).collect::<Vec<_>>();
    writer.write_all(&data)
}

fn header((x, y, z): (usize, usize, usize)) -> Vec<u8> {
    let mut dict =
        format!("{{'descr': '|u1', 'fortran_order': False, 'shape': ({x}, {y}, {z}), }}");
    let unpadded = MAGIC.len() + VERSION.len() + 2 + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let mut header = Vec::with_capacity(unpadded + padding);
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&VERSION);
    let len = u16::try_from(dict.len()).expect("npy header should fit into a u16");
    header.extend_from_slice(&len.to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header
}
