use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::compiler::compile_level_file;
use super::types::{LevelData, LevelLoadError, LevelSource};

/// Level files found on disk, named `lvl{N}.xml` and numbered from 1 without
/// gaps. Files are compiled lazily on [`LevelSource::load_level`].
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl LevelCatalog {
    pub fn discover(levels_dir: &Path) -> Result<Self, LevelLoadError> {
        let entries = fs::read_dir(levels_dir).map_err(|source| LevelLoadError::ReadDir {
            path: levels_dir.to_path_buf(),
            source,
        })?;

        let mut numbered = BTreeMap::<u32, PathBuf>::new();
        for entry in entries {
            let entry = entry.map_err(|source| LevelLoadError::ReadDirEntry {
                path: levels_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(number) = level_number_from_path(&path) {
                numbered.insert(number, path);
            }
        }

        if numbered.is_empty() {
            return Err(LevelLoadError::NoLevels {
                path: levels_dir.to_path_buf(),
            });
        }

        let mut files = Vec::with_capacity(numbered.len());
        for (expected, (number, path)) in (1u32..).zip(numbered) {
            if number != expected {
                return Err(LevelLoadError::LevelGap {
                    path: levels_dir.to_path_buf(),
                    missing: expected,
                });
            }
            files.push(path);
        }

        Ok(Self {
            levels_dir: levels_dir.to_path_buf(),
            files,
        })
    }

    pub fn levels_dir(&self) -> &Path {
        &self.levels_dir
    }

    pub fn level_path(&self, number: u32) -> Option<&Path> {
        number
            .checked_sub(1)
            .and_then(|index| self.files.get(index as usize))
            .map(PathBuf::as_path)
    }
}

impl LevelSource for LevelCatalog {
    fn level_count(&self) -> u32 {
        self.files.len() as u32
    }

    fn load_level(&self, number: u32) -> Result<LevelData, LevelLoadError> {
        let path = self
            .level_path(number)
            .ok_or(LevelLoadError::UnknownLevel {
                number,
                level_count: self.level_count(),
            })?;
        Ok(compile_level_file(path)?)
    }
}

fn level_number_from_path(path: &Path) -> Option<u32> {
    let is_xml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if !is_xml {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix("lvl")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|number| *number > 0)
}
