//! Trail rendering: a translucent fade each frame, then additive strokes.

use flowfield_core::color::Hsla;
use flowfield_core::options::RenderStyle;
use flowfield_core::surface::{BlendMode, DrawSurface, SurfaceDimensions};
use glam::DVec2;

/// Draws particle motion onto a [`DrawSurface`] using a [`RenderStyle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    /// Fades the previous frame with a translucent background fill, then
    /// switches to additive blending for the particle strokes.
    pub fn begin_frame(&self, surface: &mut dyn DrawSurface) {
        surface.set_blend_mode(BlendMode::Normal);
        surface.fill(self.style.background, self.style.fade_alpha);
        surface.set_blend_mode(BlendMode::Additive);
    }

    /// Stroke color for a particle at logical height `y`.
    ///
    /// Hue shifts by `hue_spread` across the surface height, centered on
    /// `base_hue` at mid-height. Alpha rises with burst energy.
    pub fn stroke_color(&self, y: f64, dims: &SurfaceDimensions, burst_energy: f64) -> Hsla {
        let y_norm = y / dims.safe_height();
        Hsla {
            h: self.style.base_hue + (y_norm - 0.5) * self.style.hue_spread,
            s: self.style.saturation,
            l: self.style.lightness,
            a: self.style.base_alpha + burst_energy * self.style.burst_alpha,
        }
    }

    /// Strokes one particle's step from `from` to `to`. Color follows the pre-step height.
    pub fn draw_segment(
        &self,
        surface: &mut dyn DrawSurface,
        from: DVec2,
        to: DVec2,
        dims: &SurfaceDimensions,
        burst_energy: f64,
    ) {
        let color = self.stroke_color(from.y, dims, burst_energy);
        surface.stroke_segment(from, to, color, self.style.line_width);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderStyle::default())
    }
}
