//! Alpha compositing of rendered layers.

use image::{Rgba, RgbaImage};

/// Caps every pixel's alpha at `max_alpha`. Lower alphas are kept.
pub fn clip_image_alpha(image: &mut RgbaImage, max_alpha: u8) {
    if max_alpha == u8::MAX {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel[3] = pixel[3].min(max_alpha);
    }
}

/// Blends one pixel over another with the "over" operator.
#[inline]
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let a = top[3] as u32;
    if a == 0 {
        return base;
    }
    if a == 255 {
        return top;
    }
    let inv = 255 - a;
    let channel = |i: usize| ((top[i] as u32 * a + base[i] as u32 * inv + 127) / 255) as u8;
    let alpha = a + (base[3] as u32 * inv + 127) / 255;
    Rgba([channel(0), channel(1), channel(2), alpha.min(255) as u8])
}

/// Composites `overlay` onto `base` in place.
///
/// Only the region both images cover is touched.
pub fn overlay_onto(base: &mut RgbaImage, overlay: &RgbaImage) {
    let width = base.width().min(overlay.width());
    let height = base.height().min(overlay.height());
    for y in 0..height {
        for x in 0..width {
            let blended = blend_over(*base.get_pixel(x, y), *overlay.get_pixel(x, y));
            base.put_pixel(x, y, blended);
        }
    }
}

/// Composites `overlays` in order onto a copy of `base`.
pub fn overlay_image(base: &RgbaImage, overlays: &[RgbaImage]) -> RgbaImage {
    let mut result = base.clone();
    for overlay in overlays {
        overlay_onto(&mut result, overlay);
    }
    result
}
