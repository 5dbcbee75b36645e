//! The `Engine` trait implemented by frame-driven animations.
//!
//! The trait is object-safe so drivers and hosts can hold a `dyn Engine`.

use crate::error::EngineError;
use crate::surface::{DrawSurface, SurfaceDimensions};
use serde_json::Value;

/// A frame-stepped animation that draws onto a [`DrawSurface`].
///
/// Each call to [`tick`](Engine::tick) advances the simulation by exactly one
/// frame. Motion per tick is constant, so perceived speed follows the
/// host's frame rate.
pub trait Engine {
    /// Advances one frame at absolute time `time_secs` and draws it.
    fn tick(&mut self, time_secs: f64, surface: &mut dyn DrawSurface) -> Result<(), EngineError>;

    /// Adopts new surface dimensions. Simulation state is kept.
    fn resize(&mut self, dims: SurfaceDimensions);

    /// Dimensions the next tick will use.
    fn dimensions(&self) -> SurfaceDimensions;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema of the parameters: types, ranges, defaults and descriptions.
    fn param_schema(&self) -> Value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Srgb;
    use crate::surface::Raster;
    use serde_json::json;

    /// Minimal engine used to verify trait object safety.
    struct MockEngine {
        dims: SurfaceDimensions,
        ticks: usize,
    }

    impl MockEngine {
        fn new() -> Self {
            Self {
                dims: SurfaceDimensions::new(4.0, 4.0, 1.0).unwrap(),
                ticks: 0,
            }
        }
    }

    impl Engine for MockEngine {
        fn tick(&mut self, _time_secs: f64, surface: &mut dyn DrawSurface) -> Result<(), EngineError> {
            surface.fill(Srgb::from_rgb8(255, 255, 255), 1.0);
            self.ticks += 1;
            Ok(())
        }

        fn resize(&mut self, dims: SurfaceDimensions) {
            self.dims = dims;
        }

        fn dimensions(&self) -> SurfaceDimensions {
            self.dims
        }

        fn params(&self) -> Value {
            json!({"ticks": self.ticks})
        }

        fn param_schema(&self) -> Value {
            json!({"ticks": {"type": "integer", "default": 0}})
        }
    }

    #[test]
    fn engine_trait_is_object_safe() {
        let engine: Box<dyn Engine> = Box::new(MockEngine::new());
        assert_eq!(engine.dimensions().width(), 4.0);
        assert_eq!(engine.param_schema()["ticks"]["type"], "integer");
    }

    #[test]
    fn dyn_engine_ticks_onto_dyn_surface() {
        let mut engine = MockEngine::new();
        let mut raster = Raster::new(engine.dimensions());
        {
            let e: &mut dyn Engine = &mut engine;
            e.tick(0.0, &mut raster).unwrap();
            e.tick(0.016, &mut raster).unwrap();
            assert_eq!(e.params()["ticks"], 2);
        }
        assert_eq!(raster.pixel(0, 0).unwrap()[3], 1.0);
    }

    #[test]
    fn resize_is_reflected_in_dimensions() {
        let mut engine = MockEngine::new();
        engine.resize(SurfaceDimensions::new(10.0, 20.0, 2.0).unwrap());
        assert_eq!(engine.dimensions().height(), 20.0);
        assert_eq!(engine.dimensions().device_pixel_ratio(), 2.0);
    }
}
