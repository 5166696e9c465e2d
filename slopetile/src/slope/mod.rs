//! Slope-angle fields and their color classification.

mod classify;
mod field;

pub use classify::{classify, colorize, SlopeClass, SLOPE_THRESHOLDS};
pub use field::{slope_field, slope_field_resampled, SlopeField};
