//! Core mesh data types.

use nalgebra::{Point3, Vector3};
use std::str::FromStr;

/// A mesh vertex.
///
/// Coordinates are assumed to be millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A triangle mesh with indexed vertices and faces.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is [v0, v1, v2] in the winding order of the source file.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Build an unindexed mesh from ordered triangle triples.
    ///
    /// Each triple becomes one face with three fresh vertices, so winding is
    /// kept exactly as supplied.
    pub fn from_triangle_soup(triangles: &[[Point3<f64>; 3]]) -> Self {
        let mut mesh = Self::with_capacity(triangles.len() * 3, triangles.len());
        for (i, tri) in triangles.iter().enumerate() {
            let base = (i * 3) as u32;
            mesh.vertices.extend(tri.iter().map(|&p| Vertex::new(p)));
            mesh.faces.push([base, base + 1, base + 2]);
        }
        mesh
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh has no vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Translate mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Translate the mesh so its bounding box is symmetric about the origin.
    ///
    /// Returns the offset that was applied (zero for a mesh without vertices).
    pub fn center_on_bounds(&mut self) -> Vector3<f64> {
        let Some((min, max)) = self.bounds() else {
            return Vector3::zeros();
        };
        let offset = -(min.coords + max.coords) / 2.0;
        self.translate(offset);
        offset
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Sum of the signed tetrahedra formed by each face and the origin. For a
    /// closed mesh with outward-facing (CCW) winding this is positive.
    ///
    /// # Note
    /// Exact only for closed, consistently wound meshes. Open or
    /// self-intersecting meshes give a finite but meaningless value, and the
    /// result then also depends on where the origin sits.
    pub fn signed_volume(&self) -> f64 {
        self.triangles().map(|tri| tri.signed_volume()).sum()
    }

    /// Compute the absolute volume of the mesh.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }

    /// Extent of the bounding box along `axis`, or 0 for a mesh without vertices.
    pub fn extent_along(&self, axis: VerticalAxis) -> f64 {
        self.bounds()
            .map(|(min, max)| axis.component(&max) - axis.component(&min))
            .unwrap_or(0.0)
    }
}

/// A triangle with concrete vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Signed volume of the tetrahedron spanned by this triangle and the origin:
    /// `v0 · (v1 × v2) / 6`.
    #[inline]
    pub fn signed_volume(&self) -> f64 {
        self.v0.coords.dot(&self.v1.coords.cross(&self.v2.coords)) / 6.0
    }

    /// Compute the triangle area.
    #[inline]
    pub fn area(&self) -> f64 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0)).norm() * 0.5
    }
}

/// The axis treated as "up" when measuring print height.
///
/// STL files are conventionally Z-up, which is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAxis {
    X,
    Y,
    #[default]
    Z,
}

impl VerticalAxis {
    /// Pick this axis' coordinate out of a point.
    #[inline]
    pub fn component(&self, p: &Point3<f64>) -> f64 {
        match self {
            VerticalAxis::X => p.x,
            VerticalAxis::Y => p.y,
            VerticalAxis::Z => p.z,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAxis::X => "x",
            VerticalAxis::Y => "y",
            VerticalAxis::Z => "z",
        }
    }
}

impl FromStr for VerticalAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(VerticalAxis::X),
            "y" => Ok(VerticalAxis::Y),
            "z" => Ok(VerticalAxis::Z),
            other => Err(format!("unknown axis `{}` (expected x, y or z)", other)),
        }
    }
}

impl std::fmt::Display for VerticalAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod test_meshes {
    use super::*;

    /// Axis-aligned cuboid with a corner at `origin`, CCW winding seen from outside.
    pub fn cuboid(origin: [f64; 3], a: f64, b: f64, c: f64) -> Mesh {
        let [ox, oy, oz] = origin;
        let mut mesh = Mesh::new();
        let corners = [
            (0.0, 0.0, 0.0),
            (a, 0.0, 0.0),
            (a, b, 0.0),
            (0.0, b, 0.0),
            (0.0, 0.0, c),
            (a, 0.0, c),
            (a, b, c),
            (0.0, b, c),
        ];
        for (x, y, z) in corners {
            mesh.vertices.push(Vertex::from_coords(ox + x, oy + y, oz + z));
        }
        mesh.faces.extend_from_slice(&[
            // Bottom (z = 0)
            [0, 2, 1],
            [0, 3, 2],
            // Top
            [4, 5, 6],
            [4, 6, 7],
            // Front (y = 0)
            [0, 1, 5],
            [0, 5, 4],
            // Back
            [3, 7, 6],
            [3, 6, 2],
            // Left (x = 0)
            [0, 4, 7],
            [0, 7, 3],
            // Right
            [1, 2, 6],
            [1, 6, 5],
        ]);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::test_meshes::cuboid;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_signed_volume_is_positive() {
        let mesh = cuboid([0.0, 0.0, 0.0], 10.0, 20.0, 30.0);
        assert_relative_eq!(mesh.signed_volume(), 6000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inverted_winding_flips_sign_only() {
        let mut mesh = cuboid([0.0, 0.0, 0.0], 10.0, 10.0, 10.0);
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        assert_relative_eq!(mesh.signed_volume(), -1000.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.volume(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_center_on_bounds() {
        let mut mesh = cuboid([5.0, -3.0, 100.0], 4.0, 6.0, 8.0);
        let offset = mesh.center_on_bounds();
        assert_relative_eq!(offset, Vector3::new(-7.0, 0.0, -104.0), epsilon = 1e-12);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.coords, -max.coords, epsilon = 1e-12);
        assert_relative_eq!(max.z, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_center_empty_mesh_is_noop() {
        let mut mesh = Mesh::new();
        assert_eq!(mesh.center_on_bounds(), Vector3::zeros());
        assert!(mesh.bounds().is_none());
        assert_eq!(mesh.extent_along(VerticalAxis::Z), 0.0);
    }

    #[test]
    fn test_triangle_soup_preserves_winding() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::from_triangle_soup(&[tri, [tri[0], tri[2], tri[1]]]);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(mesh.vertices[4].position, tri[2]);
    }

    #[test]
    fn test_extent_along_axes() {
        let mesh = cuboid([0.0, 0.0, 0.0], 1.0, 2.0, 3.0);
        assert_relative_eq!(mesh.extent_along(VerticalAxis::X), 1.0);
        assert_relative_eq!(mesh.extent_along(VerticalAxis::Y), 2.0);
        assert_relative_eq!(mesh.extent_along(VerticalAxis::Z), 3.0);
    }

    #[test]
    fn test_triangle_area() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        );
        assert_relative_eq!(tri.area(), 6.0);
    }

    #[test]
    fn test_axis_parse() {
        assert_eq!("Z".parse::<VerticalAxis>(), Ok(VerticalAxis::Z));
        assert_eq!("y".parse::<VerticalAxis>(), Ok(VerticalAxis::Y));
        assert!("w".parse::<VerticalAxis>().is_err());
    }
}
