//! Mount options and render style for a flowfield instance.
//!
//! Options can be built in code, deserialized with serde, or read from a
//! loose JSON params object with [`FlowfieldOptions::from_json`], where
//! missing keys take their defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Srgb;
use crate::error::EngineError;
use crate::params::{param_f64, param_object, param_str, param_u64, param_usize};

/// Default particle population.
pub const DEFAULT_DENSITY: usize = 1200;
/// Largest accepted particle population.
pub const MAX_DENSITY: usize = 100_000;
/// Widest accepted stroke, in logical units.
pub const MAX_LINE_WIDTH: f64 = 64.0;
/// Default PRNG seed.
pub const DEFAULT_SEED: u64 = 42;
/// Default accent color.
pub const DEFAULT_ACCENT: &str = "#0fa6ff";

/// Everything the host chooses when mounting a flowfield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowfieldOptions {
    /// Accent color. Carried for palette extensions; the field math does not read it.
    pub accent: Srgb,
    /// Fixed particle population.
    pub density: usize,
    /// Seed for initial placement and respawn draws.
    pub seed: u64,
    /// Trail rendering constants.
    pub style: RenderStyle,
}

impl Default for FlowfieldOptions {
    fn default() -> Self {
        Self {
            accent: Srgb::from_rgb8(0x0f, 0xa6, 0xff),
            density: DEFAULT_DENSITY,
            seed: DEFAULT_SEED,
            style: RenderStyle::default(),
        }
    }
}

impl FlowfieldOptions {
    /// Reads options from a JSON object, defaulting anything missing.
    ///
    /// Returns `EngineError::InvalidColor` for an unparseable accent or
    /// background, and the errors of [`validate`](Self::validate).
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let defaults = Self::default();
        let accent = match param_str(params, "accent") {
            Some(hex) => Srgb::from_hex(hex)?,
            None => defaults.accent,
        };
        let options = Self {
            accent,
            density: param_usize(params, "density", defaults.density),
            seed: param_u64(params, "seed", defaults.seed),
            style: RenderStyle::from_json(param_object(params, "style"))?,
        };
        options.validate()?;
        Ok(options)
    }

    /// Checks density bounds and the render style.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.density == 0 || self.density > MAX_DENSITY {
            return Err(EngineError::InvalidParam {
                name: "density".into(),
                reason: format!("must be in 1..={MAX_DENSITY}, got {}", self.density),
            });
        }
        self.style.validate()
    }
}

/// Constants for trail fade and stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Color of the translucent fade overlay.
    pub background: Srgb,
    /// Alpha of the fade overlay; lower values give longer trails.
    pub fade_alpha: f64,
    /// Hue (degrees) at mid-height.
    pub base_hue: f64,
    /// Total hue range (degrees) from top to bottom.
    pub hue_spread: f64,
    pub saturation: f64,
    pub lightness: f64,
    /// Stroke alpha with no burst.
    pub base_alpha: f64,
    /// Extra stroke alpha at full burst energy.
    pub burst_alpha: f64,
    /// Stroke width in logical units.
    pub line_width: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Srgb::from_rgb8(10, 10, 11),
            fade_alpha: 0.08,
            base_hue: 200.0,
            hue_spread: 20.0,
            saturation: 0.95,
            lightness: 0.60,
            base_alpha: 0.08,
            burst_alpha: 0.06,
            line_width: 1.2,
        }
    }
}

impl RenderStyle {
    /// Reads a style object, defaulting anything missing.
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let d = Self::default();
        let background = match param_str(params, "background") {
            Some(hex) => Srgb::from_hex(hex)?,
            None => d.background,
        };
        let style = Self {
            background,
            fade_alpha: param_f64(params, "fade_alpha", d.fade_alpha),
            base_hue: param_f64(params, "base_hue", d.base_hue),
            hue_spread: param_f64(params, "hue_spread", d.hue_spread),
            saturation: param_f64(params, "saturation", d.saturation),
            lightness: param_f64(params, "lightness", d.lightness),
            base_alpha: param_f64(params, "base_alpha", d.base_alpha),
            burst_alpha: param_f64(params, "burst_alpha", d.burst_alpha),
            line_width: param_f64(params, "line_width", d.line_width),
        };
        style.validate()?;
        Ok(style)
    }

    /// Checks that fractions are in [0, 1] and the stroke width is in (0, `MAX_LINE_WIDTH`].
    pub fn validate(&self) -> Result<(), EngineError> {
        let unit = [
            ("fade_alpha", self.fade_alpha),
            ("saturation", self.saturation),
            ("lightness", self.lightness),
            ("base_alpha", self.base_alpha),
            ("burst_alpha", self.burst_alpha),
        ];
        if let Some((name, value)) = unit
            .iter()
            .find(|(_, v)| !v.is_finite() || !(0.0..=1.0).contains(v))
        {
            return Err(EngineError::InvalidParam {
                name: (*name).into(),
                reason: format!("must be in [0, 1], got {value}"),
            });
        }
        if !(self.line_width > 0.0 && self.line_width <= MAX_LINE_WIDTH) {
            return Err(EngineError::InvalidParam {
                name: "line_width".into(),
                reason: format!("must be in (0, {MAX_LINE_WIDTH}], got {}", self.line_width),
            });
        }
        if !self.base_hue.is_finite() || !self.hue_spread.is_finite() {
            return Err(EngineError::InvalidParam {
                name: "base_hue".into(),
                reason: "hue values must be finite".into(),
            });
        }
        Ok(())
    }
}
