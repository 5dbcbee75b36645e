//! The flowfield engine: particles advected along the contours of a
//! drifting scalar field, drawn as fading additive trails.

use flowfield_core::engine::Engine;
use flowfield_core::error::EngineError;
use flowfield_core::field::ScalarField;
use flowfield_core::options::{
    FlowfieldOptions, DEFAULT_ACCENT, DEFAULT_DENSITY, DEFAULT_SEED, MAX_DENSITY, MAX_LINE_WIDTH,
};
use flowfield_core::sampler::ContourSampler;
use flowfield_core::stimulus::SharedStimulus;
use flowfield_core::surface::{DrawSurface, SurfaceDimensions};
use serde_json::{json, Value};

use crate::particles::ParticleSystem;
use crate::renderer::Renderer;

/// One flowfield instance. All mutable animation state lives here.
#[derive(Debug)]
pub struct Flowfield {
    options: FlowfieldOptions,
    dims: SurfaceDimensions,
    particles: ParticleSystem,
    renderer: Renderer,
    stimulus: SharedStimulus,
    frame: u64,
}

impl Flowfield {
    /// Creates an engine and seeds its particles over `dims`.
    ///
    /// Returns `EngineError::InvalidParam` if the options fail validation.
    pub fn new(options: FlowfieldOptions, dims: SurfaceDimensions) -> Result<Self, EngineError> {
        options.validate()?;
        let particles = ParticleSystem::new(options.density, &dims, options.seed);
        let renderer = Renderer::new(options.style);
        log::debug!(
            "flowfield seeded: {} particles over {}x{} (dpr {})",
            particles.len(),
            dims.width(),
            dims.height(),
            dims.device_pixel_ratio()
        );
        Ok(Self {
            options,
            dims,
            particles,
            renderer,
            stimulus: SharedStimulus::new(),
            frame: 0,
        })
    }

    /// Creates an engine from a loose JSON params object.
    pub fn from_json(params: &Value, dims: SurfaceDimensions) -> Result<Self, EngineError> {
        Self::new(FlowfieldOptions::from_json(params)?, dims)
    }

    /// Replaces the stimulus with one shared with a host or driver.
    pub fn with_stimulus(mut self, stimulus: SharedStimulus) -> Self {
        self.stimulus = stimulus;
        self
    }

    pub fn stimulus(&self) -> &SharedStimulus {
        &self.stimulus
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn options(&self) -> &FlowfieldOptions {
        &self.options
    }

    /// Number of ticks run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Drops the particle buffer. Later ticks only fade the surface.
    pub fn release(&mut self) {
        self.particles.release();
    }
}

impl Engine for Flowfield {
    fn tick(&mut self, time_secs: f64, surface: &mut dyn DrawSurface) -> Result<(), EngineError> {
        let dims = self.dims;
        let stimulus = self.stimulus.decay();
        let burst = stimulus.burst_energy();
        let sampler = ContourSampler::new(ScalarField::new(&dims));
        let renderer = &self.renderer;

        renderer.begin_frame(surface);
        self.particles
            .advance(&sampler, &dims, time_secs, &stimulus, |from, to| {
                renderer.draw_segment(surface, from, to, &dims, burst);
            });

        self.frame += 1;
        log::trace!(
            "frame {} at t={time_secs:.3}s burst={burst:.4} pointer={:?}",
            self.frame,
            stimulus.pointer()
        );
        Ok(())
    }

    fn resize(&mut self, dims: SurfaceDimensions) {
        log::debug!(
            "flowfield resized to {}x{} (dpr {})",
            dims.width(),
            dims.height(),
            dims.device_pixel_ratio()
        );
        self.dims = dims;
    }

    fn dimensions(&self) -> SurfaceDimensions {
        self.dims
    }

    fn params(&self) -> Value {
        let style = &self.options.style;
        json!({
            "accent": self.options.accent.to_hex(),
            "density": self.options.density,
            "seed": self.options.seed,
            "style": {
                "background": style.background.to_hex(),
                "fade_alpha": style.fade_alpha,
                "base_hue": style.base_hue,
                "hue_spread": style.hue_spread,
                "saturation": style.saturation,
                "lightness": style.lightness,
                "base_alpha": style.base_alpha,
                "burst_alpha": style.burst_alpha,
                "line_width": style.line_width,
            },
        })
    }

    fn param_schema(&self) -> Value {
        schema()
    }
}

/// Parameter schema shared by every flowfield instance.
pub fn schema() -> Value {
    let d = FlowfieldOptions::default().style;
    let unit = |default: f64, description: &str| {
        json!({
            "type": "number",
            "default": default,
            "min": 0.0,
            "max": 1.0,
            "description": description
        })
    };
    json!({
        "accent": {
            "type": "string",
            "default": DEFAULT_ACCENT,
            "description": "Accent color as #rrggbb; reserved for palette extensions"
        },
        "density": {
            "type": "integer",
            "default": DEFAULT_DENSITY,
            "min": 1,
            "max": MAX_DENSITY,
            "description": "Fixed particle population"
        },
        "seed": {
            "type": "integer",
            "default": DEFAULT_SEED,
            "description": "Seed for particle placement and respawn draws"
        },
        "style": {
            "background": {
                "type": "string",
                "default": d.background.to_hex(),
                "description": "Trail fade color as #rrggbb"
            },
            "fade_alpha": unit(d.fade_alpha, "Opacity of the per-frame fade; higher means shorter trails"),
            "base_hue": {
                "type": "number",
                "default": d.base_hue,
                "description": "Stroke hue in degrees at mid-height"
            },
            "hue_spread": {
                "type": "number",
                "default": d.hue_spread,
                "description": "Hue shift in degrees from top to bottom"
            },
            "saturation": unit(d.saturation, "Stroke saturation"),
            "lightness": unit(d.lightness, "Stroke lightness"),
            "base_alpha": unit(d.base_alpha, "Stroke opacity at rest"),
            "burst_alpha": unit(d.burst_alpha, "Extra stroke opacity at full burst energy"),
            "line_width": {
                "type": "number",
                "default": d.line_width,
                "min": 0.0,
                "max": MAX_LINE_WIDTH,
                "description": "Stroke width in logical units"
            }
        }
    })
}
