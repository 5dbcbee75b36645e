#![deny(unsafe_code)]
//! Browser bindings: run a flowfield on a `<canvas>` element.
//!
//! ```js
//! const field = FlowfieldCanvas.mount(canvas, "#0fa6ff", 1200);
//! button.addEventListener("mouseenter", () => field.burst());
//! // later
//! field.unmount();
//! ```

pub mod host;
pub mod surface;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use flowfield_core::color::Srgb;
use flowfield_core::error::EngineError;
use flowfield_core::options::FlowfieldOptions;
use flowfield_engine::driver::{AnimationDriver, BurstHandle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlCanvasElement, MouseEvent, Window};

use host::RafHost;
use surface::{measure, CanvasSurface};

type Driver = AnimationDriver<CanvasSurface, RafHost>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Warn).ok();
}

/// A running flowfield bound to one canvas.
#[wasm_bindgen]
pub struct FlowfieldCanvas {
    driver: Rc<RefCell<Driver>>,
    handle: BurstHandle,
}

#[wasm_bindgen]
impl FlowfieldCanvas {
    /// Starts animating `canvas`. `accent` is a `#rrggbb` color and `density`
    /// the particle count; both are optional.
    ///
    /// Throws if the canvas has no 2D context or an option is invalid.
    pub fn mount(
        canvas: HtmlCanvasElement,
        accent: Option<String>,
        density: Option<u32>,
    ) -> Result<FlowfieldCanvas, JsValue> {
        mount_canvas(canvas, accent.as_deref(), density).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Pulses the field. Returns `false` after unmount.
    pub fn burst(&self) -> bool {
        self.handle.burst()
    }

    /// Stops the loop, removes listeners and frees the particles. Idempotent.
    pub fn unmount(&self) {
        match self.driver.try_borrow_mut() {
            Ok(mut driver) => driver.unmount(),
            Err(_) => log::warn!("unmount called while a frame is running"),
        }
    }
}

impl Drop for FlowfieldCanvas {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn mount_canvas(
    canvas: HtmlCanvasElement,
    accent: Option<&str>,
    density: Option<u32>,
) -> Result<FlowfieldCanvas, EngineError> {
    let window = web_sys::window().ok_or_else(|| EngineError::ContextUnavailable("no window".into()))?;
    let mut options = FlowfieldOptions::default();
    if let Some(hex) = accent {
        options.accent = Srgb::from_hex(hex)?;
    }
    if let Some(density) = density {
        options.density = density as usize;
    }

    let surface = CanvasSurface::new(canvas.clone())?;
    let dims = measure(&canvas, &window)?;
    let driver = Rc::new(RefCell::new(AnimationDriver::new(
        options,
        surface,
        RafHost::new(window.clone()),
    )));

    let started = wire(&driver, &canvas, &window).and_then(|()| driver.borrow_mut().start(dims));
    match started {
        Ok(handle) => Ok(FlowfieldCanvas { driver, handle }),
        Err(e) => {
            driver.borrow_mut().unmount();
            Err(e)
        }
    }
}

/// Registers the frame callback and the pointer and resize listeners.
fn wire(driver: &Rc<RefCell<Driver>>, canvas: &HtmlCanvasElement, window: &Window) -> Result<(), EngineError> {
    let mut guard = driver.borrow_mut();
    let host = guard.host_mut();
    host.set_frame_callback(on_frame(Rc::downgrade(driver)));
    host.listen(canvas.as_ref(), "pointermove", on_pointer_move(Rc::downgrade(driver), canvas.clone()))?;
    host.listen(canvas.as_ref(), "pointerleave", on_pointer_leave(Rc::downgrade(driver)))?;
    host.listen(
        window.as_ref(),
        "resize",
        on_resize(Rc::downgrade(driver), canvas.clone(), window.clone()),
    )?;
    Ok(())
}

fn on_frame(driver: Weak<RefCell<Driver>>) -> Closure<dyn FnMut(f64)> {
    Closure::wrap(Box::new(move |timestamp_ms: f64| {
        let Some(driver) = driver.upgrade() else {
            return;
        };
        let Ok(mut running) = driver.try_borrow_mut() else {
            return;
        };
        if let Err(e) = running.tick(timestamp_ms) {
            log::error!("flowfield frame failed, stopping: {e}");
            running.unmount();
        }
    }) as Box<dyn FnMut(f64)>)
}

fn on_pointer_move(driver: Weak<RefCell<Driver>>, canvas: HtmlCanvasElement) -> Closure<dyn FnMut(Event)> {
    Closure::wrap(Box::new(move |event: Event| {
        let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let rect = canvas.get_bounding_client_rect();
        let x = f64::from(mouse.client_x()) - rect.left();
        let y = f64::from(mouse.client_y()) - rect.top();
        if let Some(driver) = driver.upgrade() {
            if let Ok(running) = driver.try_borrow() {
                running.pointer_move(x, y);
            }
        }
    }) as Box<dyn FnMut(Event)>)
}

fn on_pointer_leave(driver: Weak<RefCell<Driver>>) -> Closure<dyn FnMut(Event)> {
    Closure::wrap(Box::new(move |_event: Event| {
        if let Some(driver) = driver.upgrade() {
            if let Ok(running) = driver.try_borrow() {
                running.pointer_leave();
            }
        }
    }) as Box<dyn FnMut(Event)>)
}

fn on_resize(
    driver: Weak<RefCell<Driver>>,
    canvas: HtmlCanvasElement,
    window: Window,
) -> Closure<dyn FnMut(Event)> {
    Closure::wrap(Box::new(move |_event: Event| {
        let Some(driver) = driver.upgrade() else {
            return;
        };
        let dims = match measure(&canvas, &window) {
            Ok(dims) => dims,
            Err(e) => {
                log::warn!("ignoring resize: {e}");
                return;
            }
        };
        if let Ok(mut running) = driver.try_borrow_mut() {
            if let Err(e) = running.resize(dims) {
                log::warn!("resize failed: {e}");
            }
        };
    }) as Box<dyn FnMut(Event)>)
}
