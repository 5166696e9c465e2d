//! Quantized-mesh terrain: decoding, tiling scheme and slope rasterization.

mod decoder;
mod rasterize;
mod scheme;
mod types;

pub use decoder::{decode, MeshDecodeError, MeshHeader, QuantizedMesh, HEADER_SIZE};
pub use rasterize::{rasterize_slopes, BUFFER_SIZE, OUTLINE_COLOR};
pub use scheme::{covering_tiles, source_level, GeographicTile};
pub use types::{triangle_slope, TerrainMesh};

#[cfg(test)]
pub(crate) use decoder::encode::encode_mesh;
