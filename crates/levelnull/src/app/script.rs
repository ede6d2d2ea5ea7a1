use std::fs;
use std::path::{Path, PathBuf};

use engine::{InputAction, Vec2};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::json::parse_json_with_path;

const DEFAULT_FRAME_MS: u64 = 16;

/// Key names accepted in input scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptKey {
    Up,
    Down,
    Left,
    Right,
    Sprint,
    Interact,
    Light,
    Escape,
}

impl ScriptKey {
    pub fn action(self) -> InputAction {
        match self {
            Self::Up => InputAction::MoveUp,
            Self::Down => InputAction::MoveDown,
            Self::Left => InputAction::MoveLeft,
            Self::Right => InputAction::MoveRight,
            Self::Sprint => InputAction::Sprint,
            Self::Interact => InputAction::Interact,
            Self::Light => InputAction::TogglePlayerLight,
            Self::Escape => InputAction::Escape,
        }
    }
}

/// `hold` keys stay down for the whole step; `tap` keys are pressed for the
/// first frame only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptStep {
    pub frames: u32,
    #[serde(default)]
    pub hold: Vec<ScriptKey>,
    #[serde(default)]
    pub tap: Vec<ScriptKey>,
    #[serde(default)]
    pub cursor: Option<Vec2>,
}

impl ScriptStep {
    pub fn cursor_world(&self) -> Option<Vec2> {
        self.cursor
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputScript {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    pub steps: Vec<ScriptStep>,
}

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read input script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{path}: frame_ms must be > 0")]
    ZeroFrameTime { path: PathBuf },
}

impl InputScript {
    /// Starts the game from the menu, idles, then walks a short square.
    pub fn builtin_idle() -> Self {
        let walk = |key: ScriptKey| ScriptStep {
            frames: 30,
            hold: vec![key],
            tap: Vec::new(),
            cursor: None,
        };
        Self {
            frame_ms: DEFAULT_FRAME_MS,
            steps: vec![
                ScriptStep {
                    frames: 1,
                    hold: Vec::new(),
                    tap: vec![ScriptKey::Interact],
                    cursor: Some(Vec2::ZERO),
                },
                ScriptStep {
                    frames: 60,
                    hold: Vec::new(),
                    tap: Vec::new(),
                    cursor: None,
                },
                walk(ScriptKey::Up),
                walk(ScriptKey::Right),
                walk(ScriptKey::Down),
                walk(ScriptKey::Left),
            ],
        }
    }

    pub fn from_json_str(raw: &str, path: &Path) -> Result<Self, ScriptError> {
        let script: Self =
            parse_json_with_path(raw, "input script").map_err(|message| ScriptError::Parse {
                path: path.to_path_buf(),
                message,
            })?;
        if script.frame_ms == 0 {
            return Err(ScriptError::ZeroFrameTime {
                path: path.to_path_buf(),
            });
        }
        for (index, step) in script.steps.iter().enumerate() {
            if step.frames == 0 {
                warn!(path = %path.display(), step = index, "script_step_has_no_frames");
            }
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.frames)).sum()
    }
}
