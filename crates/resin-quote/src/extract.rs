//! Geometry extraction: physical measurements from a triangle mesh.
//!
//! Coordinates are taken as millimeters. The mesh is centered on its
//! bounding box first, then
//!
//! - volume = |Σ v0 · (v1 × v2) / 6| / 1000, in cm³
//! - height = max − min along the vertical axis, in mm
//!
//! # Known limitation
//!
//! The triangle sum is exact for closed, consistently wound meshes. Open or
//! self-intersecting input yields a finite but wrong volume. Nothing here
//! detects or repairs that.

use std::io::Cursor;

use tracing::debug;

use crate::error::CoreResult;
use crate::io::{load_mesh, read_stl};
use crate::registry::SourceHandle;
use crate::tracing_ext::OperationTimer;
use crate::types::{Mesh, VerticalAxis};

/// Cubic millimeters per cubic centimeter.
pub const MM3_PER_CM3: f64 = 1000.0;

/// Measurements derived from one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extraction {
    /// Enclosed volume in cm³.
    pub volume_cm3: f64,
    /// Extent along the vertical axis in mm.
    pub height_mm: f64,
}

/// Measure a mesh. An empty mesh measures zero.
pub fn extract_geometry(mesh: &Mesh, axis: VerticalAxis) -> Extraction {
    let mut centered = mesh.clone();
    let offset = centered.center_on_bounds();
    debug!(
        "Centered mesh by ({:.3}, {:.3}, {:.3})",
        offset.x, offset.y, offset.z
    );

    Extraction {
        volume_cm3: centered.volume() / MM3_PER_CM3,
        height_mm: centered.extent_along(axis),
    }
}

/// Decode a source and measure it.
pub fn extract_from_source(source: &SourceHandle, axis: VerticalAxis) -> CoreResult<Extraction> {
    let origin = source.describe();
    let timer = OperationTimer::with_origin("extract_geometry", &origin);
    let _span = timer.span().enter();

    let mesh = match source {
        SourceHandle::Path(path) => load_mesh(path)?,
        SourceHandle::Bytes(bytes) => read_stl(&mut Cursor::new(bytes.as_ref()), &origin)?,
    };

    Ok(extract_geometry(&mesh, axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_stl;
    use crate::types::test_meshes::cuboid;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_empty_mesh_measures_zero() {
        let extraction = extract_geometry(&Mesh::new(), VerticalAxis::Z);
        assert_eq!(extraction.volume_cm3, 0.0);
        assert_eq!(extraction.height_mm, 0.0);
    }

    #[test]
    fn test_cuboid_volume_and_height() {
        let mesh = cuboid([12.0, -40.0, 3.0], 20.0, 30.0, 50.0);
        let extraction = extract_geometry(&mesh, VerticalAxis::Z);

        assert_relative_eq!(extraction.volume_cm3, 20.0 * 30.0 * 50.0 / 1000.0, epsilon = 1e-9);
        assert_relative_eq!(extraction.height_mm, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_axis_selects_dimension() {
        let mesh = cuboid([0.0, 0.0, 0.0], 20.0, 30.0, 50.0);
        assert_relative_eq!(extract_geometry(&mesh, VerticalAxis::Y).height_mm, 30.0);
        assert_relative_eq!(extract_geometry(&mesh, VerticalAxis::X).height_mm, 20.0);
    }

    #[test]
    fn test_inside_out_mesh_reports_positive_volume() {
        let mut mesh = cuboid([0.0, 0.0, 0.0], 10.0, 10.0, 10.0);
        for face in &mut mesh.faces {
            face.swap(0, 1);
        }
        assert_relative_eq!(extract_geometry(&mesh, VerticalAxis::Z).volume_cm3, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_input_mesh_is_not_moved() {
        let mesh = cuboid([100.0, 100.0, 100.0], 1.0, 1.0, 1.0);
        let before = mesh.bounds();
        let _ = extract_geometry(&mesh, VerticalAxis::Z);
        assert_eq!(mesh.bounds(), before);
    }

    #[test]
    fn test_extract_from_bytes() {
        let mut bytes = Vec::new();
        write_stl(&cuboid([0.0, 0.0, 0.0], 10.0, 10.0, 40.0), &mut bytes).unwrap();

        let source = SourceHandle::Bytes(Arc::from(bytes));
        let extraction = extract_from_source(&source, VerticalAxis::Z).unwrap();
        assert_relative_eq!(extraction.volume_cm3, 4.0, epsilon = 1e-6);
        assert_relative_eq!(extraction.height_mm, 40.0, epsilon = 1e-6);
    }

    #[test]
    fn test_extract_from_garbage_fails() {
        let source = SourceHandle::Bytes(Arc::from(vec![1u8, 2, 3]));
        assert!(extract_from_source(&source, VerticalAxis::Z).is_err());
    }
}
