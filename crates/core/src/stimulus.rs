//! External stimuli that bend the flow: pointer proximity and burst energy.
//!
//! [`StimulusState`] is the plain value read by the scalar field each tick.
//! [`SharedStimulus`] lets event handlers on any thread write it while the
//! frame loop takes one consistent snapshot per tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Per-frame multiplicative decay applied to burst energy.
pub const BURST_DECAY: f64 = 0.95;
/// Burst energy below this snaps to exactly zero.
pub const BURST_EPSILON: f64 = 0.001;

/// Pointer position (normalized to [0, 1]), pointer activity, and burst energy in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StimulusState {
    pointer_x: f64,
    pointer_y: f64,
    pointer_active: bool,
    burst_energy: f64,
}

impl StimulusState {
    /// Records a pointer position in normalized coordinates and marks the pointer active.
    ///
    /// Coordinates are clamped to [0, 1]. Non-finite input is ignored.
    pub fn pointer_move(&mut self, nx: f64, ny: f64) {
        if !nx.is_finite() || !ny.is_finite() {
            return;
        }
        self.pointer_x = nx.clamp(0.0, 1.0);
        self.pointer_y = ny.clamp(0.0, 1.0);
        self.pointer_active = true;
    }

    /// Marks the pointer inactive. The last coordinates are kept.
    pub fn pointer_leave(&mut self) {
        self.pointer_active = false;
    }

    /// Sets burst energy to full. Re-triggering resets rather than stacks.
    pub fn burst(&mut self) {
        self.burst_energy = 1.0;
    }

    /// Applies one frame of burst decay and returns the new energy.
    pub fn decay(&mut self) -> f64 {
        self.burst_energy *= BURST_DECAY;
        if self.burst_energy < BURST_EPSILON {
            self.burst_energy = 0.0;
        }
        self.burst_energy
    }

    /// The normalized pointer position if the pointer is active.
    pub fn pointer(&self) -> Option<DVec2> {
        self.pointer_active
            .then(|| DVec2::new(self.pointer_x, self.pointer_y))
    }

    /// Last recorded normalized pointer position, active or not.
    pub fn last_pointer(&self) -> DVec2 {
        DVec2::new(self.pointer_x, self.pointer_y)
    }

    /// Whether the pointer is over the surface.
    pub fn pointer_active(&self) -> bool {
        self.pointer_active
    }

    /// Current burst energy in [0, 1].
    pub fn burst_energy(&self) -> f64 {
        self.burst_energy
    }
}

/// Thread-safe handle to a single [`StimulusState`].
///
/// Clones share the same state. Every access takes the lock once, so a
/// reader never sees the pointer coordinates of one event mixed with the
/// activity flag of another.
#[derive(Debug, Clone, Default)]
pub struct SharedStimulus {
    inner: Arc<Mutex<StimulusState>>,
}

impl SharedStimulus {
    /// Creates an idle stimulus: pointer inactive, no burst.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StimulusState> {
        // The state is plain data, so a panic mid-update cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> StimulusState {
        *self.lock()
    }

    /// See [`StimulusState::pointer_move`].
    pub fn pointer_move(&self, nx: f64, ny: f64) {
        self.lock().pointer_move(nx, ny);
    }

    /// See [`StimulusState::pointer_leave`].
    pub fn pointer_leave(&self) {
        self.lock().pointer_leave();
    }

    /// See [`StimulusState::burst`].
    pub fn burst(&self) {
        self.lock().burst();
    }

    /// Decays burst energy by one frame and returns the resulting state.
    pub fn decay(&self) -> StimulusState {
        let mut state = self.lock();
        state.decay();
        *state
    }
}
