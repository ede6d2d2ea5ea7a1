mod compiler;
mod discovery;
mod hashing;
mod types;

pub use compiler::{
    compile_level_file, compile_level_str, LevelCompileError, LevelErrorCode, SourceLocation,
    REQUIRED_LAYERS,
};
pub use discovery::LevelCatalog;
pub use types::{
    EnemyKind, EnemySpawnDef, HandlerKind, InteractableDef, InteractableType, LevelData,
    LevelLoadError, LevelSource, LightDef, Rgba,
};
