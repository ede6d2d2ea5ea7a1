use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use engine::{resolve_app_paths, LevelCatalog, LevelSource, LoopConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{SessionConfig, SimulationTuning};
use super::json::parse_json_with_path;
use super::script::InputScript;
use super::AppError;

const START_LEVEL_ENV_VAR: &str = "LEVELNULL_START_LEVEL";
const SEED_ENV_VAR: &str = "LEVELNULL_SEED";
const TUNING_ENV_VAR: &str = "LEVELNULL_TUNING";
const SCRIPT_ENV_VAR: &str = "LEVELNULL_SCRIPT";
const DEFAULT_SEED: u64 = 42;

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) catalog: LevelCatalog,
    pub(crate) session: SessionConfig,
    pub(crate) script: InputScript,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Level.Null Startup ===");

    let paths = resolve_app_paths()?;
    let catalog = LevelCatalog::discover(&paths.levels_dir)?;
    info!(
        root = %paths.root.display(),
        levels_dir = %catalog.levels_dir().display(),
        level_count = catalog.level_count(),
        "levels_discovered"
    );

    let start_level = parse_env_number(START_LEVEL_ENV_VAR)?.unwrap_or(1);
    let seed = parse_env_number(SEED_ENV_VAR)?.unwrap_or(DEFAULT_SEED);
    let tuning = match env_path(TUNING_ENV_VAR) {
        Some(path) => load_tuning(&path)?,
        None => SimulationTuning::default(),
    };
    let script = match env_path(SCRIPT_ENV_VAR) {
        Some(path) => InputScript::load(&path)?,
        None => InputScript::builtin_idle(),
    };
    info!(
        start_level,
        seed,
        script_frames = script.total_frames(),
        frame_ms = script.frame_ms,
        "session_configured"
    );

    Ok(AppWiring {
        loop_config: LoopConfig::default(),
        catalog,
        session: SessionConfig {
            start_level,
            seed,
            tuning,
        },
        script,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_path(var: &'static str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn parse_env_number<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    let Ok(raw) = env::var(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|error| AppError::InvalidEnv {
            var,
            value: raw.clone(),
            message: error.to_string(),
        })
}

fn load_tuning(path: &Path) -> Result<SimulationTuning, AppError> {
    let raw = fs::read_to_string(path).map_err(|source| AppError::ReadTuning {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tuning(&raw, path)
}

fn parse_tuning(raw: &str, path: &Path) -> Result<SimulationTuning, AppError> {
    let tuning: SimulationTuning =
        parse_json_with_path(raw, "tuning").map_err(|message| AppError::ParseTuning {
            path: path.to_path_buf(),
            message,
        })?;
    tuning.validate().map_err(|source| AppError::InvalidTuning {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tuning)
}
