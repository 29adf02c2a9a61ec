//! Mesh file I/O for STL.
//!
//! Both binary and ASCII STL are read through `stl_io`. The decoded mesh is
//! checked for out-of-range indices and non-finite coordinates before it is
//! handed to the extractor, so a corrupt file fails instead of producing a
//! made-up volume.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{CoreResult, QuoteError};
use crate::{Mesh, Vertex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "stl" => Some(MeshFormat::Stl),
                _ => None,
            })
    }
}

/// Load a mesh from file, detecting the format from the extension.
pub fn load_mesh(path: &Path) -> CoreResult<Mesh> {
    let format = MeshFormat::from_path(path).ok_or_else(|| QuoteError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })?;

    info!("Loading mesh from {:?} (format: {:?})", path, format);

    match format {
        MeshFormat::Stl => load_stl(path),
    }
}

/// Load mesh from STL file (binary or ASCII).
pub fn load_stl(path: &Path) -> CoreResult<Mesh> {
    let file = File::open(path).map_err(|e| QuoteError::io_read(path, e))?;
    let mut reader = BufReader::new(file);
    read_stl(&mut reader, &path.display().to_string())
}

/// Decode STL data from any seekable reader.
///
/// `origin` names the data in error messages and logs.
pub fn read_stl<R: Read + Seek>(reader: &mut R, origin: &str) -> CoreResult<Mesh> {
    let stl =
        stl_io::read_stl(reader).map_err(|e| QuoteError::parse_error(origin, e.to_string()))?;

    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());

    // stl_io::Vertex is Vector<f32> with .0 being [f32; 3]
    for v in &stl.vertices {
        mesh.vertices.push(Vertex::from_coords(
            f64::from(v.0[0]),
            f64::from(v.0[1]),
            f64::from(v.0[2]),
        ));
    }

    let mut dropped = 0usize;
    for face in &stl.faces {
        let indices = [
            face.vertices[0] as u32,
            face.vertices[1] as u32,
            face.vertices[2] as u32,
        ];

        // Repeated indices span no volume
        if indices[0] != indices[1] && indices[1] != indices[2] && indices[0] != indices[2] {
            mesh.faces.push(indices);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!(origin, dropped, "Dropped degenerate triangles");
    }

    if mesh.faces.is_empty() {
        warn!(origin, "STL contains no triangles");
    }

    validate_mesh_data(&mesh)?;

    Ok(mesh)
}

/// Check that every face index is in range and every coordinate is finite.
pub fn validate_mesh_data(mesh: &Mesh) -> CoreResult<()> {
    for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        let coords = [
            ("x", vertex.position.x),
            ("y", vertex.position.y),
            ("z", vertex.position.z),
        ];
        for (coordinate, value) in coords {
            if !value.is_finite() {
                return Err(QuoteError::InvalidCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                });
            }
        }
    }

    let vertex_count = mesh.vertices.len();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if let Some(&vertex_index) = face.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(QuoteError::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            });
        }
    }

    Ok(())
}

/// Save mesh to STL file (binary format).
pub fn save_stl(mesh: &Mesh, path: &Path) -> CoreResult<()> {
    info!("Saving mesh to {:?}", path);

    let file = File::create(path).map_err(|e| QuoteError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);

    write_stl(mesh, &mut writer).map_err(|e| QuoteError::io_write(path, e))?;
    writer.flush().map_err(|e| QuoteError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);

    Ok(())
}

/// Encode a mesh as binary STL into any writer.
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> std::io::Result<()> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|tri| stl_io::Triangle {
            normal: stl_io::Normal::new([0.0, 0.0, 0.0]), // Readers recompute
            vertices: [
                stl_io::Vertex::new([tri.v0.x as f32, tri.v0.y as f32, tri.v0.z as f32]),
                stl_io::Vertex::new([tri.v1.x as f32, tri.v1.y as f32, tri.v1.z as f32]),
                stl_io::Vertex::new([tri.v2.x as f32, tri.v2.y as f32, tri.v2.z as f32]),
            ],
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}
