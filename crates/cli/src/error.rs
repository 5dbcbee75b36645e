//! CLI errors and their exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: engine error (bad options, bad dimensions, lifecycle misuse)
//! - 11: snapshot could not be written
//! - 12: bad `--params` JSON or frame rate
//! - 13: JSON output could not be produced

use flowfield_core::EngineError;
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// The engine rejected its options or surface, or a frame failed.
    Engine(EngineError),
    /// The PNG at `path` could not be written.
    Snapshot { path: PathBuf, reason: String },
    /// `--params` is not a JSON document.
    Params(String),
    /// `--fps` is zero, negative or not finite.
    FrameRate(f64),
    /// JSON output could not be produced.
    Serialization(String),
}

impl CliError {
    /// Routes a snapshot failure: I/O problems name the output path, anything
    /// else is an engine error.
    pub fn snapshot(path: &Path, err: EngineError) -> Self {
        match err {
            EngineError::Io(reason) => CliError::Snapshot {
                path: path.to_path_buf(),
                reason,
            },
            other => CliError::Engine(other),
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(EngineError::Io(_)) | CliError::Snapshot { .. } => 11,
            CliError::Engine(_) => 10,
            CliError::Params(_) | CliError::FrameRate(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }

    /// Payload printed on stderr in `--json` mode.
    pub fn to_json(&self) -> Value {
        json!({"error": self.to_string(), "exit_code": self.exit_code()})
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(e) => write!(f, "{e}"),
            CliError::Snapshot { path, reason } => {
                write!(f, "cannot write snapshot {}: {reason}", path.display())
            }
            CliError::Params(msg) => write!(f, "invalid --params JSON: {msg}"),
            CliError::FrameRate(fps) => write!(f, "--fps must be positive, got {fps}"),
            CliError::Serialization(msg) => write!(f, "cannot serialize output: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
