//! Error types for the flowfield core.

use thiserror::Error;

/// Errors produced by engine, surface and host operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A surface size was negative, non-finite, or too large to back with pixels.
    #[error("invalid dimensions: width and height must be finite and non-negative")]
    InvalidDimensions,

    /// A configuration value was outside its accepted range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The host could not provide a drawing context or frame scheduler.
    #[error("drawing context unavailable: {0}")]
    ContextUnavailable(String),

    /// The driver was asked to do something its lifecycle state does not allow.
    #[error("invalid lifecycle transition: {0}")]
    Lifecycle(String),

    /// Writing an output artifact failed.
    #[error("i/o error: {0}")]
    Io(String),
}
