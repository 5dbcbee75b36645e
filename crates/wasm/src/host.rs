//! `FrameHost` backed by `requestAnimationFrame` and DOM event listeners.

use flowfield_core::error::EngineError;
use flowfield_engine::driver::{FrameHost, FrameId};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, Window};

use crate::surface::js_error;

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Owns the frame callback and every listener the flowfield registers,
/// so dropping or detaching releases them together.
pub struct RafHost {
    window: Window,
    on_frame: Option<Closure<dyn FnMut(f64)>>,
    listeners: Vec<Listener>,
}

impl RafHost {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            on_frame: None,
            listeners: Vec::new(),
        }
    }

    /// Sets the callback each requested frame invokes with its timestamp in ms.
    pub fn set_frame_callback(&mut self, callback: Closure<dyn FnMut(f64)>) {
        self.on_frame = Some(callback);
    }

    /// Adds an event listener that lives until [`FrameHost::detach_listeners`].
    pub fn listen(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<(), EngineError> {
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|e| js_error("addEventListener", &e))?;
        self.listeners.push(Listener {
            target: target.clone(),
            event,
            callback,
        });
        Ok(())
    }
}

impl FrameHost for RafHost {
    fn request_frame(&mut self) -> Result<FrameId, EngineError> {
        let callback = self
            .on_frame
            .as_ref()
            .ok_or_else(|| EngineError::ContextUnavailable("no frame callback registered".into()))?;
        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| js_error("requestAnimationFrame", &e))?;
        Ok(FrameId(u64::from(id as u32)))
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if let Err(e) = self.window.cancel_animation_frame(id.0 as i32) {
            log::warn!("cancelAnimationFrame failed: {e:?}");
        }
    }

    fn detach_listeners(&mut self) {
        for listener in self.listeners.drain(..) {
            if let Err(e) = listener
                .target
                .remove_event_listener_with_callback(listener.event, listener.callback.as_ref().unchecked_ref())
            {
                log::warn!("removeEventListener({}) failed: {e:?}", listener.event);
            }
        }
    }
}
