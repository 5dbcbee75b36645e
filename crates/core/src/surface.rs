//! Drawing surfaces: dimensions, blend modes, and a software raster.
//!
//! All drawing code works in logical (CSS) units. A surface maps logical
//! coordinates onto its backing pixels through a uniform device-pixel-ratio
//! scale, the same way a 2D canvas context does after `setTransform(dpr, 0, 0, dpr, 0, 0)`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::{Hsla, Srgb};
use crate::error::EngineError;

/// Largest backing edge in pixels a surface may request.
const MAX_BACKING_EDGE: usize = 16_384;

/// Compositing mode for subsequent draws.
///
/// `Normal` is canvas `source-over`; `Additive` is canvas `lighter`, where
/// overlapping strokes sum and the result is order independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
}

impl BlendMode {
    /// The `globalCompositeOperation` name for this mode.
    pub fn composite_operation(self) -> &'static str {
        match self {
            BlendMode::Normal => "source-over",
            BlendMode::Additive => "lighter",
        }
    }
}

/// Logical surface size plus the device pixel ratio used for the backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDimensions {
    width: f64,
    height: f64,
    device_pixel_ratio: f64,
}

impl SurfaceDimensions {
    /// Builds dimensions from a measured logical size and device pixel ratio.
    ///
    /// Logical sizes are floored to whole units. The ratio is clamped to
    /// [1, 2]; a non-finite ratio falls back to 1. Zero sizes are accepted
    /// (a collapsed layout) and normalize against a divisor of 1.
    ///
    /// Returns `EngineError::InvalidDimensions` for negative or non-finite
    /// sizes, or when the backing buffer would exceed the maximum edge.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Result<Self, EngineError> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            log::warn!("rejecting surface size {width}x{height}");
            return Err(EngineError::InvalidDimensions);
        }
        let device_pixel_ratio = if device_pixel_ratio.is_finite() {
            device_pixel_ratio.clamp(1.0, 2.0)
        } else {
            log::warn!("non-finite device pixel ratio {device_pixel_ratio}, using 1");
            1.0
        };
        let dims = Self {
            width: width.floor(),
            height: height.floor(),
            device_pixel_ratio,
        };
        let (bw, bh) = dims.backing_size();
        if bw > MAX_BACKING_EDGE || bh > MAX_BACKING_EDGE {
            return Err(EngineError::InvalidDimensions);
        }
        Ok(dims)
    }

    /// Logical width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Logical height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Device pixel ratio in [1, 2].
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Width used as a normalization divisor, never below 1.
    pub fn safe_width(&self) -> f64 {
        self.width.max(1.0)
    }

    /// Height used as a normalization divisor, never below 1.
    pub fn safe_height(&self) -> f64 {
        self.height.max(1.0)
    }

    /// Backing buffer size in device pixels: `floor(logical * dpr)` per axis.
    pub fn backing_size(&self) -> (usize, usize) {
        (
            (self.width * self.device_pixel_ratio).floor() as usize,
            (self.height * self.device_pixel_ratio).floor() as usize,
        )
    }

    /// Maps a logical position to normalized [0, 1] coordinates.
    pub fn normalize(&self, pos: DVec2) -> DVec2 {
        DVec2::new(pos.x / self.safe_width(), pos.y / self.safe_height())
    }
}

/// A target the renderer can draw trails onto.
///
/// Coordinates are logical units. The trait is object safe so hosts can
/// swap a software raster for a browser canvas context.
pub trait DrawSurface {
    /// Resizes the backing buffer for new dimensions and reapplies the
    /// device-pixel scale. Existing content is cleared.
    fn resize(&mut self, dims: SurfaceDimensions) -> Result<(), EngineError>;

    /// Sets the compositing mode for subsequent draws.
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Fills the whole logical surface with `color` at `alpha`.
    fn fill(&mut self, color: Srgb, alpha: f64);

    /// Strokes a straight segment from `from` to `to`.
    fn stroke_segment(&mut self, from: DVec2, to: DVec2, color: Hsla, width: f64);
}

/// Software RGBA surface with premultiplied `f32` pixels at backing resolution.
#[derive(Debug, Clone)]
pub struct Raster {
    dims: SurfaceDimensions,
    pixel_width: usize,
    pixel_height: usize,
    pixels: Vec<[f32; 4]>,
    blend_mode: BlendMode,
}

impl Raster {
    /// Creates a transparent raster sized for `dims`.
    pub fn new(dims: SurfaceDimensions) -> Self {
        let (pixel_width, pixel_height) = dims.backing_size();
        Self {
            dims,
            pixel_width,
            pixel_height,
            pixels: vec![[0.0; 4]; pixel_width * pixel_height],
            blend_mode: BlendMode::Normal,
        }
    }

    /// Current logical dimensions.
    pub fn dimensions(&self) -> SurfaceDimensions {
        self.dims
    }

    /// Backing width in device pixels.
    pub fn pixel_width(&self) -> usize {
        self.pixel_width
    }

    /// Backing height in device pixels.
    pub fn pixel_height(&self) -> usize {
        self.pixel_height
    }

    /// Premultiplied RGBA pixels in row-major order.
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Premultiplied RGBA at device pixel `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; 4]> {
        if x < self.pixel_width && y < self.pixel_height {
            Some(self.pixels[y * self.pixel_width + x])
        } else {
            None
        }
    }

    /// The active blend mode.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn blend(&mut self, idx: usize, src: [f32; 4]) {
        let dst = &mut self.pixels[idx];
        match self.blend_mode {
            BlendMode::Normal => {
                let keep = 1.0 - src[3];
                for c in 0..4 {
                    dst[c] = src[c] + dst[c] * keep;
                }
            }
            BlendMode::Additive => {
                for c in 0..4 {
                    dst[c] = (dst[c] + src[c]).min(1.0);
                }
            }
        }
    }

    /// Stamps a square pen centered on device pixel `(cx, cy)`, clipped to the buffer.
    fn stamp(&mut self, cx: isize, cy: isize, pen: isize, src: [f32; 4]) {
        let lo = -(pen - 1) / 2;
        let hi = pen / 2;
        let Some((x0, x1)) = clip_span(cx, lo, hi, self.pixel_width) else {
            return;
        };
        let Some((y0, y1)) = clip_span(cy, lo, hi, self.pixel_height) else {
            return;
        };
        for y in y0..=y1 {
            let row = y * self.pixel_width;
            for x in x0..=x1 {
                self.blend(row + x, src);
            }
        }
    }
}

/// Intersects `center + lo ..= center + hi` with `0..len`.
fn clip_span(center: isize, lo: isize, hi: isize, len: usize) -> Option<(usize, usize)> {
    let last = isize::try_from(len).ok()?.checked_sub(1)?;
    let start = center.saturating_add(lo).max(0);
    let end = center.saturating_add(hi).min(last);
    (start <= end).then(|| (start as usize, end as usize))
}

fn premultiply(color: Srgb, alpha: f64) -> [f32; 4] {
    let a = alpha.clamp(0.0, 1.0);
    [
        (color.r.clamp(0.0, 1.0) * a) as f32,
        (color.g.clamp(0.0, 1.0) * a) as f32,
        (color.b.clamp(0.0, 1.0) * a) as f32,
        a as f32,
    ]
}

impl DrawSurface for Raster {
    fn resize(&mut self, dims: SurfaceDimensions) -> Result<(), EngineError> {
        let (pixel_width, pixel_height) = dims.backing_size();
        let len = pixel_width
            .checked_mul(pixel_height)
            .ok_or(EngineError::InvalidDimensions)?;
        self.dims = dims;
        self.pixel_width = pixel_width;
        self.pixel_height = pixel_height;
        self.pixels.clear();
        self.pixels.resize(len, [0.0; 4]);
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    fn fill(&mut self, color: Srgb, alpha: f64) {
        let src = premultiply(color, alpha);
        for idx in 0..self.pixels.len() {
            self.blend(idx, src);
        }
    }

    fn stroke_segment(&mut self, from: DVec2, to: DVec2, color: Hsla, width: f64) {
        if !from.is_finite() || !to.is_finite() || self.pixels.is_empty() {
            return;
        }
        let scale = self.dims.device_pixel_ratio();
        let a = from * scale;
        let b = to * scale;
        let delta = b - a;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        let pen = ((width * scale).round() as isize).max(1);
        let src = premultiply(color.to_srgb(), color.a);

        let mut last = None;
        for i in 0..=steps {
            let p = a + delta * (i as f64 / steps as f64);
            let cell = (p.x.floor() as isize, p.y.floor() as isize);
            if last == Some(cell) {
                continue;
            }
            last = Some(cell);
            self.stamp(cell.0, cell.1, pen, src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: f64, h: f64, dpr: f64) -> SurfaceDimensions {
        SurfaceDimensions::new(w, h, dpr).unwrap()
    }

    fn white() -> Srgb {
        Srgb {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        }
    }

    fn red(a: f64) -> Hsla {
        Hsla {
            h: 0.0,
            s: 1.0,
            l: 0.5,
            a,
        }
    }

    // ── SurfaceDimensions ──────────────────────────────────────────

    #[test]
    fn device_pixel_ratio_is_clamped() {
        assert_eq!(dims(10.0, 10.0, 3.0).device_pixel_ratio(), 2.0);
        assert_eq!(dims(10.0, 10.0, 0.5).device_pixel_ratio(), 1.0);
        assert_eq!(dims(10.0, 10.0, f64::NAN).device_pixel_ratio(), 1.0);
    }

    #[test]
    fn logical_size_is_floored() {
        let d = dims(800.7, 600.2, 1.0);
        assert_eq!(d.width(), 800.0);
        assert_eq!(d.height(), 600.0);
    }

    #[test]
    fn backing_size_scales_by_ratio() {
        assert_eq!(dims(800.0, 600.0, 1.5).backing_size(), (1200, 900));
    }

    #[test]
    fn rejects_negative_and_non_finite_sizes() {
        assert!(SurfaceDimensions::new(-1.0, 10.0, 1.0).is_err());
        assert!(SurfaceDimensions::new(10.0, f64::INFINITY, 1.0).is_err());
        assert!(SurfaceDimensions::new(f64::NAN, 10.0, 1.0).is_err());
        assert!(SurfaceDimensions::new(100_000.0, 10.0, 1.0).is_err());
    }

    #[test]
    fn zero_size_normalizes_against_one() {
        let d = dims(0.0, 0.0, 1.0);
        assert_eq!(d.safe_width(), 1.0);
        assert_eq!(d.safe_height(), 1.0);
        let n = d.normalize(DVec2::new(5.0, -5.0));
        assert!(n.is_finite());
        assert_eq!(n, DVec2::new(5.0, -5.0));
    }

    // ── BlendMode ──────────────────────────────────────────────────

    #[test]
    fn blend_mode_default_is_normal() {
        assert_eq!(BlendMode::default(), BlendMode::Normal);
    }

    #[test]
    fn blend_mode_maps_to_canvas_operations() {
        assert_eq!(BlendMode::Normal.composite_operation(), "source-over");
        assert_eq!(BlendMode::Additive.composite_operation(), "lighter");
    }

    #[test]
    fn blend_mode_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&BlendMode::Additive).unwrap(),
            "\"additive\""
        );
    }

    // ── Raster ─────────────────────────────────────────────────────

    #[test]
    fn new_raster_is_transparent_at_backing_size() {
        let r = Raster::new(dims(4.0, 3.0, 2.0));
        assert_eq!(r.pixel_width(), 8);
        assert_eq!(r.pixel_height(), 6);
        assert!(r.pixels().iter().all(|p| *p == [0.0; 4]));
    }

    #[test]
    fn repeated_translucent_fill_converges_to_color() {
        let mut r = Raster::new(dims(2.0, 2.0, 1.0));
        for _ in 0..200 {
            r.fill(white(), 0.08);
        }
        let p = r.pixel(0, 0).unwrap();
        assert!(p[3] > 0.99, "alpha should approach 1, got {}", p[3]);
        assert!(p[0] > 0.99);
    }

    #[test]
    fn single_fill_is_source_over() {
        let mut r = Raster::new(dims(1.0, 1.0, 1.0));
        r.fill(white(), 0.5);
        r.fill(white(), 0.5);
        let p = r.pixel(0, 0).unwrap();
        assert!((p[3] - 0.75).abs() < 1e-6, "got {p:?}");
    }

    #[test]
    fn additive_strokes_sum_and_clamp() {
        let mut r = Raster::new(dims(4.0, 4.0, 1.0));
        r.set_blend_mode(BlendMode::Additive);
        let from = DVec2::new(1.5, 1.5);
        let to = DVec2::new(1.6, 1.5);
        r.stroke_segment(from, to, red(0.3), 1.0);
        let once = r.pixel(1, 1).unwrap();
        r.stroke_segment(from, to, red(0.3), 1.0);
        let twice = r.pixel(1, 1).unwrap();
        assert!((twice[0] - 2.0 * once[0]).abs() < 1e-6);
        for _ in 0..10 {
            r.stroke_segment(from, to, red(0.3), 1.0);
        }
        assert_eq!(r.pixel(1, 1).unwrap()[0], 1.0);
    }

    #[test]
    fn additive_order_is_commutative() {
        let mut a = Raster::new(dims(4.0, 4.0, 1.0));
        let mut b = a.clone();
        a.set_blend_mode(BlendMode::Additive);
        b.set_blend_mode(BlendMode::Additive);
        let s1 = (DVec2::new(0.0, 1.0), DVec2::new(3.0, 1.0), red(0.1));
        let mut blue = red(0.2);
        blue.h = 240.0;
        let s2 = (DVec2::new(1.0, 0.0), DVec2::new(1.0, 3.0), blue);
        a.stroke_segment(s1.0, s1.1, s1.2, 1.0);
        a.stroke_segment(s2.0, s2.1, s2.2, 1.0);
        b.stroke_segment(s2.0, s2.1, s2.2, 1.0);
        b.stroke_segment(s1.0, s1.1, s1.2, 1.0);
        for (pa, pb) in a.pixels().iter().zip(b.pixels()) {
            for c in 0..4 {
                assert!((pa[c] - pb[c]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn stroke_uses_device_pixel_scale() {
        let mut r = Raster::new(dims(4.0, 4.0, 2.0));
        r.stroke_segment(DVec2::new(3.0, 3.0), DVec2::new(3.0, 3.0), red(1.0), 0.5);
        assert!(r.pixel(6, 6).unwrap()[3] > 0.0);
        assert_eq!(r.pixel(3, 3).unwrap()[3], 0.0);
    }

    #[test]
    fn off_surface_and_non_finite_strokes_are_ignored() {
        let mut r = Raster::new(dims(4.0, 4.0, 1.0));
        r.stroke_segment(DVec2::new(-20.0, -20.0), DVec2::new(-15.0, -15.0), red(1.0), 1.0);
        r.stroke_segment(DVec2::new(f64::NAN, 0.0), DVec2::new(1.0, 1.0), red(1.0), 1.0);
        assert!(r.pixels().iter().all(|p| *p == [0.0; 4]));
    }

    #[test]
    fn resize_clears_and_reallocates() {
        let mut r = Raster::new(dims(2.0, 2.0, 1.0));
        r.fill(white(), 1.0);
        r.resize(dims(3.0, 1.0, 2.0)).unwrap();
        assert_eq!((r.pixel_width(), r.pixel_height()), (6, 2));
        assert_eq!(r.pixels().len(), 12);
        assert!(r.pixels().iter().all(|p| *p == [0.0; 4]));
    }

    #[test]
    fn zero_sized_raster_accepts_draws() {
        let mut r = Raster::new(dims(0.0, 0.0, 1.0));
        r.fill(white(), 0.5);
        r.stroke_segment(DVec2::ZERO, DVec2::ONE, red(1.0), 1.0);
        assert!(r.pixels().is_empty());
    }

    #[test]
    fn wide_pen_is_clipped_to_the_buffer() {
        let mut r = Raster::new(dims(10.0, 10.0, 1.0));
        let started = std::time::Instant::now();
        r.stroke_segment(DVec2::new(2.0, 2.0), DVec2::new(8.0, 8.0), red(1.0), 1e7);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert!(r.pixels().iter().all(|p| p[3] > 0.0));
    }

    #[test]
    fn pen_partly_off_the_edge_paints_the_visible_part() {
        let mut r = Raster::new(dims(4.0, 4.0, 1.0));
        r.stroke_segment(DVec2::new(0.0, 0.0), DVec2::new(0.0, 0.0), red(1.0), 3.0);
        assert!(r.pixel(0, 0).unwrap()[3] > 0.0);
        assert!(r.pixel(1, 1).unwrap()[3] > 0.0);
        assert_eq!(r.pixel(2, 2).unwrap()[3], 0.0);
    }

    #[test]
    fn clip_span_handles_extremes() {
        assert_eq!(clip_span(5, -2, 2, 10), Some((3, 7)));
        assert_eq!(clip_span(0, isize::MIN / 2, isize::MAX / 2, 4), Some((0, 3)));
        assert_eq!(clip_span(-10, -1, 1, 4), None);
        assert_eq!(clip_span(0, 0, 0, 0), None);
    }

    #[test]
    fn draw_surface_is_object_safe() {
        let mut r = Raster::new(dims(2.0, 2.0, 1.0));
        let surface: &mut dyn DrawSurface = &mut r;
        surface.set_blend_mode(BlendMode::Additive);
        surface.fill(white(), 0.1);
        assert_eq!(r.blend_mode(), BlendMode::Additive);
    }
}
