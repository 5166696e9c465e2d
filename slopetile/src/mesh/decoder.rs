//! Quantized-mesh terrain tile decoding.
//!
//! # Layout
//!
//! All values are little-endian.
//!
//! ```text
//! header (88 bytes)
//!   center            3 × f64
//!   min/max height    2 × f32
//!   bounding sphere   4 × f64
//!   horizon occlusion 3 × f64
//! vertex data
//!   vertexCount       u32
//!   u, v, height      3 × vertexCount × u16 (zig-zag delta encoded)
//! index data          (aligned to the index width)
//!   triangleCount     u32
//!   indices           3 × triangleCount × u16|u32 (high-water-mark encoded)
//! ```
//!
//! Edge index lists and extensions that follow the triangles are ignored.

use super::types::TerrainMesh;
use crate::coord::TileBounds;
use thiserror::Error;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 88;

/// Quantized coordinates span `0..=32767`.
const QUANTIZED_MAX: f64 = 32767.0;

/// Vertex counts above this use 32-bit indices.
const U16_INDEX_LIMIT: u32 = 65536;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors decoding a quantized-mesh payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshDecodeError {
    /// Payload is still gzip-compressed
    #[error("Mesh payload is gzip-compressed")]
    Compressed,

    /// Payload ended before `section` was complete
    #[error("Mesh payload truncated in {section} at byte {offset}")]
    Truncated { section: &'static str, offset: usize },

    /// A triangle refers to a vertex that does not exist
    #[error("Triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: u32 },
}

/// Fixed header of a quantized-mesh tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHeader {
    /// Tile center in earth-centered fixed coordinates
    pub center: [f64; 3],
    pub min_height: f32,
    pub max_height: f32,
    pub bounding_sphere_center: [f64; 3],
    pub bounding_sphere_radius: f64,
    pub horizon_occlusion_point: [f64; 3],
}

/// A decoded tile in quantized form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedMesh {
    pub header: MeshHeader,
    pub u: Vec<u16>,
    pub v: Vec<u16>,
    pub height: Vec<u16>,
    pub triangles: Vec<[u32; 3]>,
}

impl QuantizedMesh {
    pub fn vertex_count(&self) -> usize {
        self.u.len()
    }

    /// Maps the quantized vertices onto `bounds` and the header's height range.
    pub fn to_terrain(&self, bounds: &TileBounds) -> TerrainMesh {
        let min_h = self.header.min_height as f64;
        let span_h = self.header.max_height as f64 - min_h;
        let span_lon = bounds.east - bounds.west;
        let span_lat = bounds.north - bounds.south;

        let vertices = self
            .u
            .iter()
            .zip(&self.v)
            .zip(&self.height)
            .map(|((&u, &v), &h)| {
                [
                    bounds.west + u as f64 / QUANTIZED_MAX * span_lon,
                    bounds.south + v as f64 / QUANTIZED_MAX * span_lat,
                    min_h + h as f64 / QUANTIZED_MAX * span_h,
                ]
            })
            .collect();

        TerrainMesh::from_parts(vertices, self.triangles.clone())
    }
}

/// Little-endian reader over the payload.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self, section: &'static str) -> Result<[u8; N], MeshDecodeError> {
        let end = self.pos + N;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(MeshDecodeError::Truncated {
                section,
                offset: self.pos,
            })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn f64(&mut self, section: &'static str) -> Result<f64, MeshDecodeError> {
        self.take(section).map(f64::from_le_bytes)
    }

    fn f32(&mut self, section: &'static str) -> Result<f32, MeshDecodeError> {
        self.take(section).map(f32::from_le_bytes)
    }

    fn u32(&mut self, section: &'static str) -> Result<u32, MeshDecodeError> {
        self.take(section).map(u32::from_le_bytes)
    }

    fn u16(&mut self, section: &'static str) -> Result<u16, MeshDecodeError> {
        self.take(section).map(u16::from_le_bytes)
    }

    fn vec3(&mut self, section: &'static str) -> Result<[f64; 3], MeshDecodeError> {
        Ok([self.f64(section)?, self.f64(section)?, self.f64(section)?])
    }

    fn align_to(&mut self, width: usize) {
        let rem = self.pos % width;
        if rem != 0 {
            self.pos += width - rem;
        }
    }

    /// Fails early when fewer than `len` bytes remain, so counts read from the
    /// payload cannot trigger huge allocations.
    fn require(&self, len: usize, section: &'static str) -> Result<(), MeshDecodeError> {
        match self.pos.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(MeshDecodeError::Truncated {
                section,
                offset: self.pos,
            }),
        }
    }
}

#[inline]
fn zigzag_decode(value: u16) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Decodes one zig-zag delta-encoded coordinate array.
fn read_delta_array(
    cursor: &mut Cursor<'_>,
    count: usize,
    section: &'static str,
) -> Result<Vec<u16>, MeshDecodeError> {
    let mut values = Vec::with_capacity(count);
    let mut acc: u16 = 0;
    for _ in 0..count {
        acc = acc.wrapping_add(zigzag_decode(cursor.u16(section)?) as u16);
        values.push(acc);
    }
    Ok(values)
}

/// Decodes a quantized-mesh payload.
///
/// # Errors
///
/// Fails on gzip-compressed input, on truncation, and when a triangle index
/// is not below the vertex count.
pub fn decode(data: &[u8]) -> Result<QuantizedMesh, MeshDecodeError> {
    if data.starts_with(&GZIP_MAGIC) {
        return Err(MeshDecodeError::Compressed);
    }

    let mut cursor = Cursor::new(data);

    let header = MeshHeader {
        center: cursor.vec3("header")?,
        min_height: cursor.f32("header")?,
        max_height: cursor.f32("header")?,
        bounding_sphere_center: cursor.vec3("header")?,
        bounding_sphere_radius: cursor.f64("header")?,
        horizon_occlusion_point: cursor.vec3("header")?,
    };

    let vertex_count = cursor.u32("vertex count")?;
    let count = vertex_count as usize;
    cursor.require(count.saturating_mul(6), "vertex data")?;
    let u = read_delta_array(&mut cursor, count, "vertex data")?;
    let v = read_delta_array(&mut cursor, count, "vertex data")?;
    let height = read_delta_array(&mut cursor, count, "vertex data")?;

    let wide = vertex_count > U16_INDEX_LIMIT;
    let index_width = if wide { 4 } else { 2 };
    cursor.align_to(index_width);

    let triangle_count = cursor.u32("triangle count")? as usize;
    cursor.require(
        triangle_count.saturating_mul(3).saturating_mul(index_width),
        "index data",
    )?;

    let mut triangles = Vec::with_capacity(triangle_count);
    let mut highest: u32 = 0;
    for _ in 0..triangle_count {
        let mut triangle = [0u32; 3];
        for slot in &mut triangle {
            let code = if wide {
                cursor.u32("index data")?
            } else {
                cursor.u16("index data")? as u32
            };
            let index = highest.wrapping_sub(code);
            if code == 0 {
                highest += 1;
            }
            if index >= vertex_count {
                return Err(MeshDecodeError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
            *slot = index;
        }
        triangles.push(triangle);
    }

    Ok(QuantizedMesh {
        header,
        u,
        v,
        height,
        triangles,
    })
}


#[cfg(test)]
mod tests {
    use super::encode::encode_mesh;
    use super::*;

    fn unit_square() -> Vec<u8> {
        encode_mesh(
            100.0,
            200.0,
            &[(0, 0, 0), (32767, 0, 0), (32767, 32767, 32767), (0, 32767, 32767)],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_decode(0), 0);
        assert_eq!(zigzag_decode(1), -1);
        assert_eq!(zigzag_decode(2), 1);
        assert_eq!(zigzag_decode(3), -2);
        assert_eq!(zigzag_decode(65534), 32767);
    }

    #[test]
    fn test_long_positive_delta_run_wraps() {
        let vertex_count = 65_600u32;
        let mut payload = vec![0u8; HEADER_SIZE];
        payload.extend_from_slice(&vertex_count.to_le_bytes());
        for _ in 0..3 * vertex_count {
            payload.extend_from_slice(&65534u16.to_le_bytes());
        }
        payload.extend_from_slice(&0u32.to_le_bytes());

        let mesh = decode(&payload).unwrap();

        assert_eq!(mesh.vertex_count(), vertex_count as usize);
        assert_eq!(mesh.u[0], 32767);
        assert_eq!(mesh.u[1], 65534);
        assert_eq!(mesh.u[2], 32765);
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn test_decode_square() {
        let mesh = decode(&unit_square()).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.u, vec![0, 32767, 32767, 0]);
        assert_eq!(mesh.v, vec![0, 0, 32767, 32767]);
        assert_eq!(mesh.height, vec![0, 0, 32767, 32767]);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.header.min_height, 100.0);
        assert_eq!(mesh.header.max_height, 200.0);
    }

    #[test]
    fn test_high_water_mark_indices() {
        // Codes 0,0,0 then 3,0,2 decode to 0,1,2 then 0,3,2.
        let mut payload = encode_mesh(0.0, 1.0, &[(0, 0, 0); 4], &[]);
        let count_at = payload.len() - 4;
        payload[count_at..].copy_from_slice(&2u32.to_le_bytes());
        for code in [0u16, 0, 0, 3, 0, 2] {
            payload.extend_from_slice(&code.to_le_bytes());
        }

        let mesh = decode(&payload).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 3, 2]]);
    }

    #[test]
    fn test_unquantize_to_bounds() {
        let mesh = decode(&unit_square()).unwrap();
        let bounds = TileBounds {
            west: 10.0,
            south: 40.0,
            east: 11.0,
            north: 41.0,
        };
        let terrain = mesh.to_terrain(&bounds);

        assert_eq!(terrain.vertices()[0], [10.0, 40.0, 100.0]);
        assert_eq!(terrain.vertices()[2], [11.0, 41.0, 200.0]);
    }

    #[test]
    fn test_rejects_gzip() {
        let mut payload = unit_square();
        payload[0] = 0x1f;
        payload[1] = 0x8b;
        assert_eq!(decode(&payload), Err(MeshDecodeError::Compressed));
    }

    #[test]
    fn test_rejects_truncated() {
        let payload = unit_square();

        assert!(matches!(
            decode(&payload[..40]),
            Err(MeshDecodeError::Truncated { section: "header", .. })
        ));
        assert!(matches!(
            decode(&payload[..payload.len() - 1]),
            Err(MeshDecodeError::Truncated { section: "index data", .. })
        ));
    }

    #[test]
    fn test_huge_vertex_count_is_truncation() {
        let mut payload = vec![0u8; HEADER_SIZE];
        payload.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&payload),
            Err(MeshDecodeError::Truncated { section: "vertex data", .. })
        ));
    }

    #[test]
    fn test_rejects_index_out_of_range() {
        // Code 0 three times on a 2-vertex mesh yields index 2.
        let mut payload = encode_mesh(0.0, 1.0, &[(0, 0, 0), (1, 1, 1)], &[]);
        let count_at = payload.len() - 4;
        payload[count_at..].copy_from_slice(&1u32.to_le_bytes());
        for _ in 0..3 {
            payload.extend_from_slice(&0u16.to_le_bytes());
        }

        assert_eq!(
            decode(&payload),
            Err(MeshDecodeError::IndexOutOfRange {
                index: 2,
                vertex_count: 2
            })
        );
    }
}
