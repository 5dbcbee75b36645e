#![deny(unsafe_code)]
//! Particle flowfield engine.
//!
//! A fixed population of particles drifts left to right along the contours
//! of a slowly changing scalar field. Each frame fades the previous one and
//! strokes every particle's step with additive blending, leaving glowing
//! trails. A pointer raises a local hotspot in the field and a burst
//! briefly speeds the particles and brightens the strokes.
//!
//! [`Flowfield`] implements the core `Engine` trait for one frame at a time;
//! [`AnimationDriver`] runs it against a host's frame scheduler.

pub mod driver;
pub mod flowfield;
pub mod particles;
pub mod renderer;

pub use driver::{mount, AnimationDriver, BurstHandle, DriverState, FrameHost, FrameId, HeadlessHost};
pub use flowfield::Flowfield;
pub use particles::{Particle, ParticleSystem};
pub use renderer::Renderer;
