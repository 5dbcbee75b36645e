//! PNG snapshots of a [`Raster`].
//!
//! Feature-gated behind `png` (default on). The byte conversion itself lives
//! in [`crate::pixel`].

use flowfield_core::color::Srgb;
use flowfield_core::error::EngineError;
use flowfield_core::surface::Raster;
use std::path::Path;

use crate::pixel::raster_to_rgba;

/// Writes a raster as a PNG at its backing resolution.
///
/// With a `background` the image is opaque; without one, transparency is kept.
/// Returns `EngineError::InvalidDimensions` if the raster is empty or its
/// size overflows `u32`, or `EngineError::Io` on write failure.
pub fn write_png(raster: &Raster, background: Option<Srgb>, path: &Path) -> Result<(), EngineError> {
    if raster.pixels().is_empty() {
        return Err(EngineError::InvalidDimensions);
    }
    let rgba = raster_to_rgba(raster, background);
    let w = u32::try_from(raster.pixel_width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(raster.pixel_height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))?;
    log::debug!("wrote {w}x{h} snapshot to {}", path.display());
    Ok(())
}
