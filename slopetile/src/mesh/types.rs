//! Geographic triangle meshes.

use super::decoder::MeshDecodeError;
use crate::coord::EARTH_RADIUS_M;

/// Triangulated terrain with vertices as `[lon, lat, height_m]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerrainMesh {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[u32; 3]>,
}

impl TerrainMesh {
    /// Builds a mesh, checking every index against the vertex count.
    pub fn new(vertices: Vec<[f64; 3]>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshDecodeError> {
        let vertex_count = vertices.len() as u32;
        if let Some(&index) = triangles.iter().flatten().find(|&&i| i >= vertex_count) {
            return Err(MeshDecodeError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Builds a mesh from indices already checked by the decoder.
    pub(crate) fn from_parts(vertices: Vec<[f64; 3]>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Appends another mesh, shifting its indices past this mesh's vertices.
    pub fn append(&mut self, other: TerrainMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.triangles.extend(
            other
                .triangles
                .into_iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    /// Corner positions of triangle `i`.
    pub fn triangle(&self, i: usize) -> [[f64; 3]; 3] {
        let [a, b, c] = self.triangles[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }
}

/// Slope of a triangle in degrees, or `None` when it is degenerate.
///
/// Corners are `[lon, lat, height_m]`. They are projected to local meters
/// with an equirectangular projection around the triangle's mean latitude,
/// and the slope is the angle between the face normal and the vertical axis.
pub fn triangle_slope(corners: [[f64; 3]; 3]) -> Option<f64> {
    let ref_lat = (corners[0][1] + corners[1][1] + corners[2][1]) / 3.0;
    let lon_scale = EARTH_RADIUS_M * ref_lat.to_radians().cos();
    let project = |[lon, lat, h]: [f64; 3]| {
        [
            lon.to_radians() * lon_scale,
            lat.to_radians() * EARTH_RADIUS_M,
            h,
        ]
    };
    let [a, b, c] = corners.map(project);

    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    // Winding may point the normal down; the angle to vertical is the same.
    Some((n[2].abs() / len).clamp(0.0, 1.0).acos().to_degrees())
}
