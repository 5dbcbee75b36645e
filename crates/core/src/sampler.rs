//! Velocity sampling from a scalar field.
//!
//! A [`VectorField`] produces a velocity at any point in space and time.
//! [`ContourSampler`] estimates the gradient of a [`ScalarField`] with
//! central differences and rotates it a quarter turn, so flow runs along
//! the field's contours instead of climbing them, then adds a constant
//! drift.

use glam::DVec2;

use crate::field::ScalarField;
use crate::stimulus::StimulusState;

/// Finite-difference step in logical units.
pub const DIFFERENCE_STEP: f64 = 1.5;
/// Constant drift added after rotation.
pub const RIGHTWARD_BIAS: DVec2 = DVec2::new(0.6, 0.0);

/// A source of 2D velocities. Implementations must be deterministic:
/// the same inputs give the same output.
pub trait VectorField: Send + Sync {
    /// Velocity at logical position `pos` at time `t` (seconds).
    fn velocity(&self, pos: DVec2, t: f64, stimulus: &StimulusState) -> DVec2;
}

/// Rotated-gradient sampler over a [`ScalarField`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourSampler {
    field: ScalarField,
    step: f64,
    bias: DVec2,
}

impl ContourSampler {
    /// Sampler with the default step and rightward bias.
    pub fn new(field: ScalarField) -> Self {
        Self {
            field,
            step: DIFFERENCE_STEP,
            bias: RIGHTWARD_BIAS,
        }
    }

    /// Replaces the drift vector.
    pub fn with_bias(mut self, bias: DVec2) -> Self {
        self.bias = bias;
        self
    }

    /// Half the central differences along x and y. Four field samples.
    pub fn half_differences(&self, pos: DVec2, t: f64, stimulus: &StimulusState) -> DVec2 {
        let e = self.step;
        let f = |offset: DVec2| self.field.sample(pos + offset, t, stimulus);
        let dfx = (f(DVec2::new(e, 0.0)) - f(DVec2::new(-e, 0.0))) * 0.5;
        let dfy = (f(DVec2::new(0.0, e)) - f(DVec2::new(0.0, -e))) * 0.5;
        DVec2::new(dfx, dfy)
    }
}

impl VectorField for ContourSampler {
    fn velocity(&self, pos: DVec2, t: f64, stimulus: &StimulusState) -> DVec2 {
        let d = self.half_differences(pos, t, stimulus);
        // (dfx, dfy) -> (dfy, -dfx): perpendicular to the gradient.
        DVec2::new(d.y, -d.x) + self.bias
    }
}
