//! The scalar field whose contours the particles follow.
//!
//! Three phase-shifted sinusoids over normalized coordinates drift slowly
//! with time. An active pointer adds a Gaussian hotspot, and burst energy
//! adds a horizontal band centered at mid-height.

use std::f64::consts::TAU;

use glam::DVec2;

use crate::stimulus::StimulusState;
use crate::surface::SurfaceDimensions;

/// Spatial frequency of the x-only term.
const FREQ_X: f64 = 1.1;
/// Spatial frequency of the y-only term.
const FREQ_Y: f64 = 1.3;
/// Spatial frequencies of the diagonal term.
const FREQ_DIAG: (f64, f64) = (0.7, 0.9);
/// Temporal rates (cycles per second) of the three terms.
const RATE_X: f64 = 0.03;
const RATE_Y: f64 = 0.025;
const RATE_DIAG: f64 = 0.02;

/// Falloff of the pointer hotspot: `exp(-POINTER_FALLOFF * r²)`.
const POINTER_FALLOFF: f64 = 20.0;
/// Peak height of the pointer hotspot.
const POINTER_GAIN: f64 = 2.0;
/// Peak height of the burst band at full energy.
const BURST_GAIN: f64 = 0.8;
/// Falloff of the burst band away from mid-height.
const BURST_FALLOFF: f64 = 3.0;

/// Bounds on [`ScalarField::sample`]: three unit sinusoids plus the
/// non-negative pointer and burst terms.
pub const FIELD_MIN: f64 = -3.0;
pub const FIELD_MAX: f64 = 3.0 + POINTER_GAIN + BURST_GAIN;

/// A time-varying scalar field over a surface.
///
/// Sampling is pure: the result depends only on the position, the time,
/// the surface size the field was built for, and the stimulus snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarField {
    dims: SurfaceDimensions,
}

impl ScalarField {
    /// Builds a field normalized against the given surface.
    pub fn new(dims: &SurfaceDimensions) -> Self {
        Self { dims: *dims }
    }

    /// Samples the field at logical position `pos` and time `t` in seconds.
    pub fn sample(&self, pos: DVec2, t: f64, stimulus: &StimulusState) -> f64 {
        let DVec2 { x: nx, y: ny } = self.dims.normalize(pos);

        let base = (TAU * (nx * FREQ_X + t * RATE_X)).sin()
            + (TAU * (ny * FREQ_Y - t * RATE_Y)).cos()
            + (TAU * (nx * FREQ_DIAG.0 + ny * FREQ_DIAG.1 + t * RATE_DIAG)).sin();

        let pointer = stimulus.pointer().map_or(0.0, |p| {
            let r2 = DVec2::new(nx, ny).distance_squared(p);
            (-r2 * POINTER_FALLOFF).exp() * POINTER_GAIN
        });

        let burst = stimulus.burst_energy() * BURST_GAIN * (-(ny - 0.5).abs() * BURST_FALLOFF).exp();

        base + pointer + burst
    }
}
