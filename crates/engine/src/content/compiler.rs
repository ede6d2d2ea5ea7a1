use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::app::LightId;
use crate::geometry::{Aabb, Vec2};

use super::hashing::hash_level_source;
use super::types::{
    EnemyKind, EnemySpawnDef, HandlerKind, InteractableDef, InteractableType, LevelData,
    LightDef, Rgba,
};

pub const LAYER_SPAWN: &str = "spawn";
pub const LAYER_WALLS: &str = "walls";
pub const LAYER_DOORS: &str = "doors";
pub const LAYER_FLOOR: &str = "floor";
pub const LAYER_DETAILS: &str = "details";
pub const LAYER_LIGHTS: &str = "lights";
pub const LAYER_ENEMY_SPAWN: &str = "enemy_spawn";
pub const LAYER_INTERACTABLES: &str = "Interactables";
pub const LAYER_EXIT: &str = "exit";

pub const REQUIRED_LAYERS: [&str; 9] = [
    LAYER_SPAWN,
    LAYER_WALLS,
    LAYER_DOORS,
    LAYER_FLOOR,
    LAYER_DETAILS,
    LAYER_LIGHTS,
    LAYER_ENEMY_SPAWN,
    LAYER_INTERACTABLES,
    LAYER_EXIT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownLayer,
    DuplicateLayer,
    MissingLayer,
    ObjectCount,
    DuplicateObjectId,
    MissingAttribute,
    MissingProperty,
    InvalidValue,
    UnknownInteractableType,
    UnknownHandler,
}

#[derive(Debug, Clone)]
pub struct LevelCompileError {
    pub code: LevelErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for LevelCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for LevelCompileError {}

pub fn compile_level_file(path: &Path) -> Result<LevelData, LevelCompileError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelCompileError {
        code: LevelErrorCode::ReadFile,
        message: format!("failed to read level file: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    compile_level_str(&raw, path)
}

/// Compiles one level document. Every layer and handler is validated here so
/// a level that compiles can always be instantiated.
pub fn compile_level_str(raw: &str, file_path: &Path) -> Result<LevelData, LevelCompileError> {
    let doc = Document::parse(raw).map_err(|error| LevelCompileError {
        code: LevelErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = Ctx {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Level" {
        return Err(ctx.error_at(
            LevelErrorCode::InvalidRoot,
            "root element must be <Level>".to_string(),
            root,
        ));
    }

    let mut layers = BTreeMap::<&str, Node<'_, '_>>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "layer" {
            return Err(ctx.error_at(
                LevelErrorCode::UnknownElement,
                format!(
                    "unexpected element <{}>; <Level> holds only <layer>",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        let name = ctx.required_attr(child, "name")?;
        let Some(known) = REQUIRED_LAYERS.iter().copied().find(|layer| *layer == name) else {
            return Err(ctx.error_at(
                LevelErrorCode::UnknownLayer,
                format!("unknown layer '{name}'"),
                child,
            ));
        };
        if layers.insert(known, child).is_some() {
            return Err(ctx.error_at(
                LevelErrorCode::DuplicateLayer,
                format!("layer '{name}' is declared more than once"),
                child,
            ));
        }
    }

    for layer in REQUIRED_LAYERS {
        if !layers.contains_key(layer) {
            return Err(ctx.error_at(
                LevelErrorCode::MissingLayer,
                format!("missing required layer '{layer}'"),
                root,
            ));
        }
    }
    let layer = |name: &str| layers.get(name).copied().unwrap_or(root);
    let mut seen_ids = HashSet::<u32>::new();
    let mut objects_of = |name: &str| ctx.layer_objects(layer(name), &mut seen_ids);

    let spawn = ctx.single_area(layer(LAYER_SPAWN), objects_of(LAYER_SPAWN)?)?;
    let walls = ctx.areas(objects_of(LAYER_WALLS)?)?;
    let doors = ctx.areas(objects_of(LAYER_DOORS)?)?;
    let floor = ctx.areas(objects_of(LAYER_FLOOR)?)?;
    let details = ctx.areas(objects_of(LAYER_DETAILS)?)?;

    let mut lights = Vec::new();
    for object in objects_of(LAYER_LIGHTS)? {
        let radius_raw = ctx.required_property(&object, "radius")?;
        let radius = ctx.parse_number(object.node, "radius", radius_raw)?;
        if radius <= 0.0 {
            return Err(ctx.error_at(
                LevelErrorCode::InvalidValue,
                "light radius must be > 0".to_string(),
                object.node,
            ));
        }
        let color_raw = ctx.required_property(&object, "color")?;
        let color = Rgba::parse_hex(color_raw).ok_or_else(|| {
            ctx.error_at(
                LevelErrorCode::InvalidValue,
                format!("light color '{color_raw}' is not #RRGGBB or #AARRGGBB"),
                object.node,
            )
        })?;
        lights.push(LightDef {
            object_id: object.id,
            position: object.bounds.center,
            radius,
            color,
        });
    }

    let mut enemy_spawns = Vec::new();
    for object in objects_of(LAYER_ENEMY_SPAWN)? {
        ctx.require_area(&object)?;
        let kind = match object.properties.get("kind") {
            None => EnemyKind::default(),
            Some(raw) => EnemyKind::parse(raw).ok_or_else(|| {
                ctx.error_at(
                    LevelErrorCode::InvalidValue,
                    format!("unknown enemy kind '{raw}'; allowed: crawler, stalker, drifter"),
                    object.node,
                )
            })?,
        };
        enemy_spawns.push(EnemySpawnDef {
            object_id: object.id,
            bounds: object.bounds,
            kind,
        });
    }

    let mut interactables = Vec::new();
    for object in objects_of(LAYER_INTERACTABLES)? {
        interactables.push(ctx.interactable(object)?);
    }

    let exit = ctx.single_area(layer(LAYER_EXIT), objects_of(LAYER_EXIT)?)?;

    Ok(LevelData {
        file_path: file_path.to_path_buf(),
        source_hash_sha256_hex: hash_level_source(raw),
        spawn,
        walls,
        doors,
        floor,
        details,
        lights,
        enemy_spawns,
        interactables,
        exit,
    })
}

struct RawObject<'a, 'input> {
    node: Node<'a, 'input>,
    id: u32,
    bounds: Aabb,
    properties: BTreeMap<String, String>,
}

struct Ctx<'d, 'input> {
    file_path: &'d Path,
    doc: &'d Document<'input>,
}

impl<'d, 'input> Ctx<'d, 'input> {
    fn error_at(&self, code: LevelErrorCode, message: String, node: Node<'_, '_>) -> LevelCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        LevelCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_attr<'n>(&self, node: Node<'n, '_>, name: &str) -> Result<&'n str, LevelCompileError> {
        match node.attribute(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.error_at(
                LevelErrorCode::MissingAttribute,
                format!(
                    "<{}> requires a non-empty '{}' attribute",
                    node.tag_name().name(),
                    name
                ),
                node,
            )),
        }
    }

    fn parse_number(&self, node: Node<'_, '_>, field: &str, raw: &str) -> Result<f32, LevelCompileError> {
        match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.error_at(
                LevelErrorCode::InvalidValue,
                format!("{field} '{raw}' is not a finite number"),
                node,
            )),
        }
    }

    fn optional_number(&self, node: Node<'_, '_>, name: &str) -> Result<f32, LevelCompileError> {
        match node.attribute(name) {
            Some(raw) => self.parse_number(node, name, raw),
            None => Ok(0.0),
        }
    }

    fn layer_objects(
        &self,
        layer: Node<'d, 'input>,
        seen_ids: &mut HashSet<u32>,
    ) -> Result<Vec<RawObject<'d, 'input>>, LevelCompileError> {
        let mut objects = Vec::new();
        for node in layer.children().filter(|node| node.is_element()) {
            let object = self.parse_object(node)?;
            if !seen_ids.insert(object.id) {
                return Err(self.error_at(
                    LevelErrorCode::DuplicateObjectId,
                    format!("object id {} is used more than once", object.id),
                    node,
                ));
            }
            objects.push(object);
        }
        Ok(objects)
    }

    fn parse_object<'n>(&self, node: Node<'n, 'input>) -> Result<RawObject<'n, 'input>, LevelCompileError> {
        if node.tag_name().name() != "object" {
            return Err(self.error_at(
                LevelErrorCode::UnknownElement,
                format!(
                    "unexpected element <{}>; layers hold only <object>",
                    node.tag_name().name()
                ),
                node,
            ));
        }

        let id_raw = self.required_attr(node, "id")?;
        let id = id_raw.parse::<u32>().map_err(|_| {
            self.error_at(
                LevelErrorCode::InvalidValue,
                format!("object id '{id_raw}' is not a non-negative integer"),
                node,
            )
        })?;
        if id == LightId::RESERVED.0 {
            return Err(self.error_at(
                LevelErrorCode::InvalidValue,
                format!("object id {id} is reserved"),
                node,
            ));
        }
        let x = self.parse_number(node, "x", self.required_attr(node, "x")?)?;
        let y = self.parse_number(node, "y", self.required_attr(node, "y")?)?;
        let width = self.optional_number(node, "width")?;
        let height = self.optional_number(node, "height")?;
        if width < 0.0 || height < 0.0 {
            return Err(self.error_at(
                LevelErrorCode::InvalidValue,
                "object width and height must be >= 0".to_string(),
                node,
            ));
        }

        let mut properties = BTreeMap::new();
        for property in node.children().filter(|child| child.is_element()) {
            if property.tag_name().name() != "property" {
                return Err(self.error_at(
                    LevelErrorCode::UnknownElement,
                    format!(
                        "unexpected element <{}>; objects hold only <property>",
                        property.tag_name().name()
                    ),
                    property,
                ));
            }
            let name = self.required_attr(property, "name")?;
            let value = property.attribute("value").unwrap_or_default();
            properties.insert(name.to_string(), value.to_string());
        }

        Ok(RawObject {
            node,
            id,
            bounds: Aabb::from_center_size(Vec2::new(x, y), Vec2::new(width, height)),
            properties,
        })
    }

    fn required_property<'o>(&self, object: &'o RawObject<'_, '_>, name: &str) -> Result<&'o str, LevelCompileError> {
        match object.properties.get(name).map(|value| value.trim()) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.error_at(
                LevelErrorCode::MissingProperty,
                format!("object {} is missing required property '{}'", object.id, name),
                object.node,
            )),
        }
    }

    fn require_area(&self, object: &RawObject<'_, '_>) -> Result<(), LevelCompileError> {
        let size = object.bounds.size();
        if size.x > 0.0 && size.y > 0.0 {
            Ok(())
        } else {
            Err(self.error_at(
                LevelErrorCode::InvalidValue,
                format!("object {} needs a positive width and height", object.id),
                object.node,
            ))
        }
    }

    fn areas(&self, objects: Vec<RawObject<'_, '_>>) -> Result<Vec<Aabb>, LevelCompileError> {
        objects
            .into_iter()
            .map(|object| self.require_area(&object).map(|()| object.bounds))
            .collect()
    }

    fn single_area(&self, layer: Node<'_, '_>, objects: Vec<RawObject<'_, '_>>) -> Result<Aabb, LevelCompileError> {
        let name = layer.attribute("name").unwrap_or_default();
        if objects.len() != 1 {
            return Err(self.error_at(
                LevelErrorCode::ObjectCount,
                format!(
                    "layer '{}' must hold exactly one object, found {}",
                    name,
                    objects.len()
                ),
                layer,
            ));
        }
        let mut areas = self.areas(objects)?;
        areas.pop().ok_or_else(|| {
            self.error_at(
                LevelErrorCode::ObjectCount,
                format!("layer '{name}' is empty"),
                layer,
            )
        })
    }

    fn interactable(&self, object: RawObject<'_, '_>) -> Result<InteractableDef, LevelCompileError> {
        self.require_area(&object)?;
        let type_raw = self.required_property(&object, "type")?;
        let kind = InteractableType::parse(type_raw).ok_or_else(|| {
            self.error_at(
                LevelErrorCode::UnknownInteractableType,
                format!("unknown interactable type '{type_raw}'; allowed: switch, sign"),
                object.node,
            )
        })?;

        let handler_raw = self.required_property(&object, "oninteract")?;
        let handler = match handler_raw {
            "toggle_switch" => HandlerKind::ToggleSwitch,
            "draw_text" => HandlerKind::DrawText {
                text: self.required_property(&object, "text")?.to_string(),
            },
            other => {
                return Err(self.error_at(
                    LevelErrorCode::UnknownHandler,
                    format!(
                        "unknown oninteract handler '{other}'; allowed: toggle_switch, draw_text"
                    ),
                    object.node,
                ))
            }
        };

        Ok(InteractableDef {
            object_id: object.id,
            bounds: object.bounds,
            kind,
            handler,
            properties: object.properties,
        })
    }
}
