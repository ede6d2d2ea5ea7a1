use std::collections::BTreeMap;

use engine::{GameSinks, LightDef, LightDesc, LightId, Rgba, Vec2};

pub(crate) const PLAYER_LIGHT: LightId = LightId::RESERVED;
pub(crate) const PLAYER_LIGHT_COLOR: Rgba = Rgba::opaque(0x36, 0x36, 0x36);

/// Mirror of what this level has pushed into the light layer. Static emitters
/// are keyed by their level object id, so materializing them twice is a no-op.
#[derive(Debug, Clone)]
pub(crate) struct LightLayer {
    statics: BTreeMap<LightId, LightDesc>,
    player: LightDesc,
    player_on: bool,
}

impl LightLayer {
    pub fn new(player_position: Vec2, player_radius: f32) -> Self {
        Self {
            statics: BTreeMap::new(),
            player: LightDesc {
                position: player_position,
                radius: player_radius,
                color: PLAYER_LIGHT_COLOR,
            },
            player_on: false,
        }
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn player_light_on(&self) -> bool {
        self.player_on
    }

    /// Adds every emitter not yet present. Returns how many were added.
    pub fn materialize(&mut self, defs: &[LightDef], sinks: &mut dyn GameSinks) -> usize {
        let mut added = 0;
        for def in defs {
            let id = LightId(def.object_id);
            if self.statics.contains_key(&id) {
                continue;
            }
            let desc = LightDesc {
                position: def.position,
                radius: def.radius,
                color: def.color,
            };
            self.statics.insert(id, desc);
            sinks.add_light(id, desc);
            added += 1;
        }
        added
    }

    pub fn set_player_light(&mut self, on: bool, sinks: &mut dyn GameSinks) {
        if on == self.player_on {
            return;
        }
        self.player_on = on;
        if on {
            sinks.add_light(PLAYER_LIGHT, self.player);
        } else {
            sinks.remove_light(PLAYER_LIGHT);
        }
    }

    pub fn toggle_player_light(&mut self, sinks: &mut dyn GameSinks) -> bool {
        self.set_player_light(!self.player_on, sinks);
        self.player_on
    }

    /// Re-adds the player light so it sits above newly added emitters.
    pub fn raise_player_light(&mut self, sinks: &mut dyn GameSinks) {
        if self.player_on {
            sinks.remove_light(PLAYER_LIGHT);
            sinks.add_light(PLAYER_LIGHT, self.player);
        }
    }

    pub fn move_player_light(&mut self, position: Vec2, sinks: &mut dyn GameSinks) {
        self.player.position = position;
        if self.player_on {
            sinks.move_light(PLAYER_LIGHT, position);
        }
    }

    /// Removes everything this level added.
    pub fn clear(&mut self, sinks: &mut dyn GameSinks) {
        for id in std::mem::take(&mut self.statics).into_keys() {
            sinks.remove_light(id);
        }
        self.set_player_light(false, sinks);
    }
}
