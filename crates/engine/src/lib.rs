use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod geometry;
pub mod physics;

pub use app::{
    plan_sim_steps, ActionStates, FixedStepLoop, GameSinks, InputAction, InputCollector,
    InputSnapshot, KeyState, LightDesc, LightId, LoopConfig, LoopMetricsSnapshot, MetricsHandle,
    RecordingSinks, SinkEvent, Simulation, SoundId, StepPlan, ViewKey,
};
pub use content::{
    compile_level_file, compile_level_str, EnemyKind, EnemySpawnDef, HandlerKind,
    InteractableDef, InteractableType, LevelCatalog, LevelCompileError, LevelData,
    LevelErrorCode, LevelLoadError, LevelSource, LightDef, Rgba, SourceLocation,
};
pub use geometry::{Aabb, Vec2};
pub use physics::{BlockerId, BlockerKind, CollisionWorld, LineOfSight, ObstructionSet};

pub const ROOT_ENV_VAR: &str = "LEVELNULL_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let levels_dir = root.join("assets").join("levels");
        Self { root, levels_dir }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} could not be read: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("executable path {0} has no parent directory")]
    ExeHasNoParent(PathBuf),
    #[error(
        "LEVELNULL_ROOT={path} is not a Level.Null root; \
expected Cargo.toml next to an assets/levels directory"
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no Level.Null root above {start_dir}; \
expected Cargo.toml next to an assets/levels directory. \
Point {env_var} at the checkout, e.g. export {env_var}=\"/path/to/levelnull\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Finds the project root from `LEVELNULL_ROOT`, or by walking up from the
/// executable until a directory holds both `Cargo.toml` and `assets/levels`.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let candidate = canonical_or_raw(Path::new(&value));
            if !is_project_root(&candidate) {
                return Err(StartupError::InvalidEnvRoot { path: candidate });
            }
            candidate
        }
        Err(env::VarError::NotPresent) => root_above_executable()?,
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(AppPaths::from_root(root))
}

fn root_above_executable() -> Result<PathBuf, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let Some(exe_dir) = exe.parent() else {
        return Err(StartupError::ExeHasNoParent(exe));
    };
    match exe_dir.ancestors().find(|dir| is_project_root(dir)) {
        Some(root) => Ok(canonical_or_raw(root)),
        None => Err(StartupError::RootNotFound {
            start_dir: canonical_or_raw(exe_dir),
            env_var: ROOT_ENV_VAR,
        }),
    }
}

fn is_project_root(dir: &Path) -> bool {
    dir.join("Cargo.toml").is_file() && dir.join("assets").join("levels").is_dir()
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn project_root_needs_manifest_and_levels_dir() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]").expect("manifest");
        assert!(!is_project_root(temp.path()));

        fs::create_dir_all(temp.path().join("assets/levels")).expect("levels");
        assert!(is_project_root(temp.path()));
    }

    #[test]
    fn levels_dir_lives_under_assets() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(paths.levels_dir, PathBuf::from("/game/assets/levels"));
    }
}
