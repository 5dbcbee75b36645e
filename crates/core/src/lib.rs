#![deny(unsafe_code)]
//! Core types and traits for the flowfield engine.
//!
//! Provides the `Engine` trait, the time-varying [`ScalarField`], the
//! contour-following [`ContourSampler`], stimulus state, drawing surfaces
//! with `source-over`/`lighter` blending, color types, a seedable PRNG,
//! and option parsing.

pub mod color;
pub mod engine;
pub mod error;
pub mod field;
pub mod options;
pub mod params;
pub mod prng;
pub mod sampler;
pub mod stimulus;
pub mod surface;

pub use color::{Hsla, Srgb};
pub use engine::Engine;
pub use error::EngineError;
pub use field::ScalarField;
pub use options::{FlowfieldOptions, RenderStyle};
pub use prng::Xorshift64;
pub use sampler::{ContourSampler, VectorField};
pub use stimulus::{SharedStimulus, StimulusState};
pub use surface::{BlendMode, DrawSurface, Raster, SurfaceDimensions};
