use std::path::PathBuf;

use engine::{LevelLoadError, StartupError};
use thiserror::Error;

pub(crate) mod bootstrap;
pub(crate) mod gameplay;
mod json;
pub(crate) mod loop_runner;
mod script;

use gameplay::{SessionError, TuningError};
use script::ScriptError;

/// Everything that can stop the headless runner before or during replay.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Levels(#[from] LevelLoadError),
    #[error("environment variable {var}={value:?} is invalid: {message}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        message: String,
    },
    #[error("failed to read tuning file {path}: {source}")]
    ReadTuning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {message}")]
    ParseTuning { path: PathBuf, message: String },
    #[error("{path}: {source}")]
    InvalidTuning {
        path: PathBuf,
        #[source]
        source: TuningError,
    },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
