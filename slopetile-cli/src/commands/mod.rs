//! CLI command implementations.
//!
//! - [`render`] - Render one composite tile to PNG
//! - [`catalogue`] - Tilespec validation and layer listing
//! - [`init`] - Configuration initialization

pub mod catalogue;
pub mod init;
pub mod render;
