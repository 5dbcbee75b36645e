//! Pure-computation conversion from a premultiplied [`Raster`] to RGBA8.

use flowfield_core::color::Srgb;
use flowfield_core::surface::Raster;

fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Converts a raster to a row-major RGBA8 buffer of `pixel_width * pixel_height * 4` bytes.
///
/// With a `background`, each pixel is composited over that opaque color and
/// alpha is 255. Without one, color is unpremultiplied and alpha is kept.
pub fn raster_to_rgba(raster: &Raster, background: Option<Srgb>) -> Vec<u8> {
    raster
        .pixels()
        .iter()
        .flat_map(|&[r, g, b, a]| match background {
            Some(bg) => {
                let keep = 1.0 - a.clamp(0.0, 1.0);
                [
                    to_u8(r + bg.r as f32 * keep),
                    to_u8(g + bg.g as f32 * keep),
                    to_u8(b + bg.b as f32 * keep),
                    255,
                ]
            }
            None if a <= 0.0 => [0, 0, 0, 0],
            None => [to_u8(r / a), to_u8(g / a), to_u8(b / a), to_u8(a)],
        })
        .collect()
}
