//! Reads triangle meshes from binary and ASCII STL files.

use std::{fs, io::Cursor, path::Path, str};

use anyhow::{bail, ensure, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;
use lbvox_lib::mesh::{Triangle, TriangleMesh};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

pub fn read_stl(path: &Path) -> Result<TriangleMesh> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_stl(&bytes).with_context(|| format!("failed to parse STL file {}", path.display()))
}

/// Parses either flavor of STL.
///
/// Binary files may start with `solid` as well, so a file only counts as ASCII if its size does
/// not match the triangle count of the binary header.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh> {
    if bytes.starts_with(b"solid") && !is_binary_size(bytes) {
        let text = str::from_utf8(bytes).context("ASCII STL is not valid UTF-8")?;
        parse_ascii(text)
    } else {
        parse_binary(bytes)
    }
}

fn is_binary_size(bytes: &[u8]) -> bool {
    bytes
        .get(HEADER_LEN..HEADER_LEN + 4)
        .map(|count| {
            let count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]) as usize;
            bytes.len() == HEADER_LEN + 4 + count * RECORD_LEN
        })
        .unwrap_or(false)
}

fn parse_binary(bytes: &[u8]) -> Result<TriangleMesh> {
    ensure!(
        bytes.len() >= HEADER_LEN + 4,
        "binary STL is truncated: {} bytes is too short for the header",
        bytes.len()
    );
    let mut reader = Cursor::new(&bytes[HEADER_LEN..]);
    let count = reader.read_u32::<LittleEndian>()? as usize;
    let expected = HEADER_LEN + 4 + count * RECORD_LEN;
    ensure!(
        bytes.len() >= expected,
        "binary STL with {count} triangles should have {expected} bytes, got {}",
        bytes.len()
    );

    let mut triangles = Vec::with_capacity(count);
    for _ in 0..count {
        let _normal = read_vec3(&mut reader)?;
        triangles.push([
            read_vec3(&mut reader)?,
            read_vec3(&mut reader)?,
            read_vec3(&mut reader)?,
        ]);
        let _attribute_byte_count = reader.read_u16::<LittleEndian>()?;
    }
    Ok(TriangleMesh::new(triangles))
}

fn read_vec3(reader: &mut impl ReadBytesExt) -> Result<Vec3> {
    Ok(Vec3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

fn parse_ascii(text: &str) -> Result<TriangleMesh> {
    let mut triangles = Vec::new();
    let mut vertices = Vec::with_capacity(3);
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "vertex" => {
                let mut coordinate = || -> Result<f32> {
                    let token = tokens.next().context("vertex is missing a coordinate")?;
                    token
                        .parse()
                        .with_context(|| format!("invalid vertex coordinate {token:?}"))
                };
                vertices.push(Vec3::new(coordinate()?, coordinate()?, coordinate()?));
            }
            "endloop" => {
                let triangle: Triangle = match vertices[..] {
                    [a, b, c] => [a, b, c],
                    _ => bail!("facet has {} vertices instead of 3", vertices.len()),
                };
                triangles.push(triangle);
                vertices.clear();
            }
            _ => {}
        }
    }
    ensure!(vertices.is_empty(), "ASCII STL ends within a facet");
    Ok(TriangleMesh::new(triangles))
}
