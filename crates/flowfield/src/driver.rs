//! Frame-loop driver: owns a surface, an engine and a frame scheduler, and
//! walks the `Idle -> Running -> Stopped` lifecycle.
//!
//! The host side is abstracted by [`FrameHost`], which schedules the next
//! frame and owns any event listeners. In a browser that is
//! `requestAnimationFrame`; headless callers use [`HeadlessHost`] and call
//! [`AnimationDriver::tick`] themselves.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use flowfield_core::engine::Engine;
use flowfield_core::error::EngineError;
use flowfield_core::options::FlowfieldOptions;
use flowfield_core::stimulus::SharedStimulus;
use flowfield_core::surface::{DrawSurface, SurfaceDimensions};

use crate::flowfield::Flowfield;

/// Handle to a scheduled frame, as returned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// Host services the driver needs: frame scheduling and listener teardown.
pub trait FrameHost {
    /// Schedules one future call to [`AnimationDriver::tick`].
    fn request_frame(&mut self) -> Result<FrameId, EngineError>;

    /// Cancels a frame previously returned by `request_frame`.
    fn cancel_frame(&mut self, id: FrameId);

    /// Removes pointer and resize listeners. Hosts without listeners keep the default.
    fn detach_listeners(&mut self) {}
}

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DriverState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl DriverState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => DriverState::Idle,
            1 => DriverState::Running,
            _ => DriverState::Stopped,
        }
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(DriverState::Idle as u8)))
    }

    fn get(&self) -> DriverState {
        DriverState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: DriverState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Capability returned by mount: the one way for outside code to pulse the field.
///
/// Clones share the same target. Once the driver stops, `burst` does nothing.
#[derive(Debug, Clone)]
pub struct BurstHandle {
    stimulus: SharedStimulus,
    state: SharedState,
}

impl BurstHandle {
    /// Sets burst energy to full. Returns `false` if the driver has stopped.
    pub fn burst(&self) -> bool {
        if self.state.get() != DriverState::Running {
            return false;
        }
        self.stimulus.burst();
        true
    }

    /// Whether the driver behind this handle is still running.
    pub fn is_live(&self) -> bool {
        self.state.get() == DriverState::Running
    }
}

/// Runs a [`Flowfield`] on a surface, one host frame at a time.
#[derive(Debug)]
pub struct AnimationDriver<S: DrawSurface, H: FrameHost> {
    surface: S,
    host: H,
    options: FlowfieldOptions,
    stimulus: SharedStimulus,
    state: SharedState,
    engine: Option<Flowfield>,
    pending: Option<FrameId>,
}

impl<S: DrawSurface, H: FrameHost> AnimationDriver<S, H> {
    /// An idle driver. Nothing is drawn or scheduled until [`start`](Self::start).
    pub fn new(options: FlowfieldOptions, surface: S, host: H) -> Self {
        Self {
            surface,
            host,
            options,
            stimulus: SharedStimulus::new(),
            state: SharedState::new(),
            engine: None,
            pending: None,
        }
    }

    /// Sizes the surface, seeds the particles and schedules the first frame.
    ///
    /// Fails with `EngineError::Lifecycle` unless the driver is idle. Any
    /// other failure leaves the driver idle with nothing scheduled.
    pub fn start(&mut self, dims: SurfaceDimensions) -> Result<BurstHandle, EngineError> {
        let state = self.state.get();
        if state != DriverState::Idle {
            return Err(EngineError::Lifecycle(format!(
                "start requires an idle driver, found {state:?}"
            )));
        }
        self.surface.resize(dims)?;
        let engine = Flowfield::new(self.options.clone(), dims)?.with_stimulus(self.stimulus.clone());
        let first = self.host.request_frame()?;

        self.engine = Some(engine);
        self.pending = Some(first);
        self.state.set(DriverState::Running);
        log::debug!("driver started at {}x{}", dims.width(), dims.height());
        Ok(self.burst_handle())
    }

    /// Runs one frame at host timestamp `timestamp_ms` and schedules the next.
    /// Does nothing unless the driver is running.
    pub fn tick(&mut self, timestamp_ms: f64) -> Result<(), EngineError> {
        if self.state.get() != DriverState::Running {
            return Ok(());
        }
        self.pending = None;
        if let Some(engine) = self.engine.as_mut() {
            engine.tick(timestamp_ms * 0.001, &mut self.surface)?;
        }
        self.pending = Some(self.host.request_frame()?);
        Ok(())
    }

    /// Adopts new surface dimensions without reseeding particles.
    pub fn resize(&mut self, dims: SurfaceDimensions) -> Result<(), EngineError> {
        if self.state.get() != DriverState::Running {
            return Ok(());
        }
        self.surface.resize(dims)?;
        if let Some(engine) = self.engine.as_mut() {
            engine.resize(dims);
        }
        Ok(())
    }

    /// Pointer moved to logical surface coordinates `(x, y)`.
    pub fn pointer_move(&self, x: f64, y: f64) {
        if self.state.get() != DriverState::Running {
            return;
        }
        if let Some(engine) = &self.engine {
            let dims = engine.dimensions();
            self.stimulus
                .pointer_move(x / dims.safe_width(), y / dims.safe_height());
        }
    }

    /// Pointer left the surface.
    pub fn pointer_leave(&self) {
        if self.state.get() == DriverState::Running {
            self.stimulus.pointer_leave();
        }
    }

    /// Same as [`BurstHandle::burst`].
    pub fn burst(&self) -> bool {
        self.burst_handle().burst()
    }

    /// Cancels the pending frame, detaches listeners and releases the
    /// particles. Safe to call any number of times.
    pub fn unmount(&mut self) {
        if self.state.get() == DriverState::Stopped {
            return;
        }
        if let Some(id) = self.pending.take() {
            self.host.cancel_frame(id);
        }
        self.host.detach_listeners();
        if let Some(mut engine) = self.engine.take() {
            engine.release();
            log::debug!("driver stopped after {} frames", engine.frame_count());
        }
        self.state.set(DriverState::Stopped);
    }

    /// A new handle onto this driver's stimulus.
    pub fn burst_handle(&self) -> BurstHandle {
        BurstHandle {
            stimulus: self.stimulus.clone(),
            state: self.state.clone(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state.get()
    }

    pub fn engine(&self) -> Option<&Flowfield> {
        self.engine.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, for hosts that register callbacks after construction.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn stimulus(&self) -> &SharedStimulus {
        &self.stimulus
    }

    /// The frame scheduled but not yet run, if any.
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending
    }
}

/// Creates a driver and starts it in one step.
pub fn mount<S: DrawSurface, H: FrameHost>(
    surface: S,
    host: H,
    dims: SurfaceDimensions,
    options: FlowfieldOptions,
) -> Result<(AnimationDriver<S, H>, BurstHandle), EngineError> {
    let mut driver = AnimationDriver::new(options, surface, host);
    let handle = driver.start(dims)?;
    Ok((driver, handle))
}

/// A frame host that only records what was asked of it.
///
/// The caller decides when frames run by calling [`AnimationDriver::tick`].
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next: u64,
    unavailable: bool,
    requested: Vec<FrameId>,
    cancelled: Vec<FrameId>,
    detached: usize,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose scheduler refuses every request.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn requested(&self) -> &[FrameId] {
        &self.requested
    }

    pub fn cancelled(&self) -> &[FrameId] {
        &self.cancelled
    }

    /// How many times listeners were detached.
    pub fn detach_count(&self) -> usize {
        self.detached
    }
}

impl FrameHost for HeadlessHost {
    fn request_frame(&mut self) -> Result<FrameId, EngineError> {
        if self.unavailable {
            return Err(EngineError::ContextUnavailable(
                "frame scheduler unavailable".into(),
            ));
        }
        self.next += 1;
        let id = FrameId(self.next);
        self.requested.push(id);
        Ok(id)
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.cancelled.push(id);
    }

    fn detach_listeners(&mut self) {
        self.detached += 1;
    }
}
