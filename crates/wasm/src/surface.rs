//! `DrawSurface` over a 2D canvas context.

use flowfield_core::color::{Hsla, Srgb};
use flowfield_core::error::EngineError;
use flowfield_core::surface::{BlendMode, DrawSurface, SurfaceDimensions};
use glam::DVec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

pub(crate) fn js_error(call: &str, err: &JsValue) -> EngineError {
    EngineError::ContextUnavailable(format!("{call} failed: {err:?}"))
}

/// CSS color for a fill: `rgba(r,g,b,a)` with 8-bit channels.
pub fn rgba_css(color: Srgb, alpha: f64) -> String {
    let [r, g, b] = color.to_rgb8();
    format!("rgba({r},{g},{b},{})", alpha.clamp(0.0, 1.0))
}

/// Logical size of the canvas on the page and the window's device pixel ratio.
pub fn measure(canvas: &HtmlCanvasElement, window: &Window) -> Result<SurfaceDimensions, EngineError> {
    let rect = canvas.get_bounding_client_rect();
    SurfaceDimensions::new(rect.width(), rect.height(), window.device_pixel_ratio())
}

/// A canvas element and its 2D context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dims: SurfaceDimensions,
}

impl CanvasSurface {
    /// Acquires the canvas's 2D context.
    ///
    /// Returns `EngineError::ContextUnavailable` if the canvas cannot provide one.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, EngineError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| js_error("getContext", &e))?
            .ok_or_else(|| EngineError::ContextUnavailable("canvas has no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| EngineError::ContextUnavailable("2d context has an unexpected type".into()))?;
        Ok(Self {
            canvas,
            ctx,
            dims: SurfaceDimensions::new(0.0, 0.0, 1.0)?,
        })
    }
}

impl DrawSurface for CanvasSurface {
    fn resize(&mut self, dims: SurfaceDimensions) -> Result<(), EngineError> {
        let (w, h) = dims.backing_size();
        let w = u32::try_from(w).map_err(|_| EngineError::InvalidDimensions)?;
        let h = u32::try_from(h).map_err(|_| EngineError::InvalidDimensions)?;
        // Setting the backing size also clears the canvas and resets the transform.
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        let dpr = dims.device_pixel_ratio();
        self.ctx
            .set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)
            .map_err(|e| js_error("setTransform", &e))?;
        self.ctx.clear_rect(0.0, 0.0, dims.width(), dims.height());
        self.dims = dims;
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        if let Err(e) = self
            .ctx
            .set_global_composite_operation(mode.composite_operation())
        {
            log::warn!("globalCompositeOperation rejected: {e:?}");
        }
    }

    fn fill(&mut self, color: Srgb, alpha: f64) {
        self.ctx.set_fill_style_str(&rgba_css(color, alpha));
        self.ctx
            .fill_rect(0.0, 0.0, self.dims.width(), self.dims.height());
    }

    fn stroke_segment(&mut self, from: DVec2, to: DVec2, color: Hsla, width: f64) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_fill_matches_canvas_syntax() {
        let bg = Srgb::from_hex("#0a0a0b").unwrap();
        assert_eq!(rgba_css(bg, 0.08), "rgba(10,10,11,0.08)");
    }

    #[test]
    fn fill_alpha_is_clamped() {
        let white = Srgb::from_rgb8(255, 255, 255);
        assert_eq!(rgba_css(white, 3.0), "rgba(255,255,255,1)");
        assert_eq!(rgba_css(white, -1.0), "rgba(255,255,255,0)");
    }
}
