use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::{Aabb, Vec2};

use super::compiler::LevelCompileError;

/// 8-bit color. Level files write it as `#RRGGBB` or `#AARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn parse_hex(raw: &str) -> Option<Self> {
        let digits = raw.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte_at = |index: usize| u8::from_str_radix(digits.get(index..index + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::opaque(byte_at(0)?, byte_at(2)?, byte_at(4)?)),
            8 => Some(Self {
                a: byte_at(0)?,
                r: byte_at(2)?,
                g: byte_at(4)?,
                b: byte_at(6)?,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDef {
    pub object_id: u32,
    pub position: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

/// Per-type patrol flavour for an enemy spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnemyKind {
    #[default]
    Crawler,
    Stalker,
    Drifter,
}

impl EnemyKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "crawler" => Some(Self::Crawler),
            "stalker" => Some(Self::Stalker),
            "drifter" => Some(Self::Drifter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crawler => "crawler",
            Self::Stalker => "stalker",
            Self::Drifter => "drifter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawnDef {
    pub object_id: u32,
    pub bounds: Aabb,
    pub kind: EnemyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractableType {
    Switch,
    Sign,
}

impl InteractableType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "switch" => Some(Self::Switch),
            "sign" => Some(Self::Sign),
            _ => None,
        }
    }
}

/// Interaction handler, resolved from the `oninteract` property at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    ToggleSwitch,
    DrawText { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractableDef {
    pub object_id: u32,
    pub bounds: Aabb,
    pub kind: InteractableType,
    pub handler: HandlerKind,
    /// Every `<property>` on the object, including the ones already resolved.
    pub properties: BTreeMap<String, String>,
}

/// Static description of one level, validated at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub file_path: PathBuf,
    pub source_hash_sha256_hex: String,
    pub spawn: Aabb,
    pub walls: Vec<Aabb>,
    pub doors: Vec<Aabb>,
    pub floor: Vec<Aabb>,
    pub details: Vec<Aabb>,
    pub lights: Vec<LightDef>,
    pub enemy_spawns: Vec<EnemySpawnDef>,
    pub interactables: Vec<InteractableDef>,
    pub exit: Aabb,
}

/// Ordered, 1-based collection of levels.
pub trait LevelSource {
    fn level_count(&self) -> u32;

    fn load_level(&self, number: u32) -> Result<LevelData, LevelLoadError>;
}

impl LevelSource for Vec<LevelData> {
    fn level_count(&self) -> u32 {
        self.len() as u32
    }

    fn load_level(&self, number: u32) -> Result<LevelData, LevelLoadError> {
        number
            .checked_sub(1)
            .and_then(|index| self.get(index as usize))
            .cloned()
            .ok_or(LevelLoadError::UnknownLevel {
                number,
                level_count: self.level_count(),
            })
    }
}

#[derive(Debug, Error)]
pub enum LevelLoadError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory entry in {path}: {source}")]
    ReadDirEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no level files (lvl1.xml, lvl2.xml, ...) found in {path}")]
    NoLevels { path: PathBuf },
    #[error("level numbering has a gap: lvl{missing}.xml is missing in {path}")]
    LevelGap { path: PathBuf, missing: u32 },
    #[error("level {number} does not exist; {level_count} levels available")]
    UnknownLevel { number: u32, level_count: u32 },
    #[error(transparent)]
    Compile(#[from] LevelCompileError),
}
