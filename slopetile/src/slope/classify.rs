//! Slope angle → color ramp.

use super::field::SlopeField;
use image::{Rgba, RgbaImage};
use std::fmt;

/// Lower bounds, in degrees, of every colored bucket.
pub const SLOPE_THRESHOLDS: [f64; 7] = [27.0, 30.0, 32.0, 35.0, 46.0, 51.0, 60.0];

/// Discrete slope bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlopeClass {
    /// Below 27°
    None,
    Yellow,
    LightOrange,
    Orange,
    Red,
    Purple,
    Blue,
    /// 60° and steeper
    Black,
}

impl SlopeClass {
    const ALL: [SlopeClass; 8] = [
        SlopeClass::None,
        SlopeClass::Yellow,
        SlopeClass::LightOrange,
        SlopeClass::Orange,
        SlopeClass::Red,
        SlopeClass::Purple,
        SlopeClass::Blue,
        SlopeClass::Black,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SlopeClass::None => "none",
            SlopeClass::Yellow => "yellow",
            SlopeClass::LightOrange => "light-orange",
            SlopeClass::Orange => "orange",
            SlopeClass::Red => "red",
            SlopeClass::Purple => "purple",
            SlopeClass::Blue => "blue",
            SlopeClass::Black => "black",
        }
    }

    /// Fill color; [`SlopeClass::None`] is fully transparent.
    pub fn color(&self) -> Rgba<u8> {
        match self {
            SlopeClass::None => Rgba([0, 0, 0, 0]),
            SlopeClass::Yellow => Rgba([255, 255, 0, 255]),
            SlopeClass::LightOrange => Rgba([255, 192, 0, 255]),
            SlopeClass::Orange => Rgba([255, 128, 0, 255]),
            SlopeClass::Red => Rgba([255, 0, 0, 255]),
            SlopeClass::Purple => Rgba([192, 0, 192, 255]),
            SlopeClass::Blue => Rgba([0, 0, 255, 255]),
            SlopeClass::Black => Rgba([0, 0, 0, 255]),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SlopeClass::None)
    }
}

impl fmt::Display for SlopeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buckets an angle in degrees.
///
/// The angle is clamped to `[0, 90]` first. An angle equal to a threshold
/// belongs to the bucket above it.
pub fn classify(degrees: f64) -> SlopeClass {
    let clamped = degrees.clamp(0.0, 90.0);
    let bucket = SLOPE_THRESHOLDS.partition_point(|&t| t <= clamped);
    SlopeClass::ALL[bucket]
}

/// Paints a slope field with the ramp colors.
pub fn colorize(field: &SlopeField) -> RgbaImage {
    RgbaImage::from_fn(field.width(), field.height(), |x, y| {
        classify(field.at(x, y)).color()
    })
}
