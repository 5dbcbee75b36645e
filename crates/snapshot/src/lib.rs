#![deny(unsafe_code)]
//! Turns a [`Raster`](flowfield_core::Raster) into 8-bit pixels and PNG files.
//!
//! The conversion lives in [`pixel`] and is always available. PNG encoding
//! is behind the `png` feature (default on) so that builds which only need
//! bytes do not pull in the `image` crate.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

pub use pixel::raster_to_rgba;

#[cfg(feature = "png")]
pub use snapshot::write_png;
