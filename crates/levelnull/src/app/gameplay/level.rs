use engine::{Aabb, BlockerKind, GameSinks, LevelData, LightDef, ObstructionSet, Vec2};
use tracing::info;

use super::audio::{
    LevelAudio, Track, AMBIENCE_HUM, AMBIENCE_WAVES, MUSIC_FIN, MUSIC_LOBBY, MUSIC_SCARY,
};
use super::enemy::Enemy;
use super::interaction::{Interactable, PowerState};
use super::lighting::LightLayer;
use super::motion::{Facing, FootstepCue};
use super::tuning::{SimulationTuning, STAMINA_MAX};

const TORSO_START_ANGLE_DEGREES: f32 = 180.0;

/// Fixed per-level presentation: title card, tracks and starting light state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LevelProfile {
    pub display_number: u32,
    pub subtitle: &'static str,
    pub audio: LevelAudio,
    pub starts_lights_off: bool,
}

impl LevelProfile {
    pub fn title(&self) -> String {
        format!("Level {} : {}", self.display_number, self.subtitle)
    }
}

const LOBBY_AUDIO: LevelAudio = LevelAudio {
    music: Some(Track::new(MUSIC_LOBBY, 0.2)),
    ambience: Some(Track::new(AMBIENCE_HUM, 0.2)),
};
const HABITABLE_AUDIO: LevelAudio = LevelAudio {
    music: Some(Track::new(MUSIC_SCARY, 0.2)),
    ambience: None,
};
const PIPES_AUDIO: LevelAudio = LevelAudio {
    music: Some(Track::new(MUSIC_LOBBY, 0.2)),
    ambience: Some(Track::new(AMBIENCE_HUM, 1.0)),
};
const WAVES_AUDIO: LevelAudio = LevelAudio {
    music: Some(Track::new(MUSIC_FIN, 0.2)),
    ambience: Some(Track::new(AMBIENCE_WAVES, 0.2)),
};

const LEVEL_PROFILES: [LevelProfile; 5] = [
    LevelProfile {
        display_number: 0,
        subtitle: "'The Lobby'",
        audio: LOBBY_AUDIO,
        starts_lights_off: false,
    },
    LevelProfile {
        display_number: 1,
        subtitle: "'Habitable Zone'",
        audio: HABITABLE_AUDIO,
        starts_lights_off: true,
    },
    LevelProfile {
        display_number: 2,
        subtitle: "'Pipe Dreams'",
        audio: PIPES_AUDIO,
        starts_lights_off: false,
    },
    LevelProfile {
        display_number: 3,
        subtitle: "'Electrical Station'",
        audio: PIPES_AUDIO,
        starts_lights_off: false,
    },
    LevelProfile {
        display_number: 100,
        subtitle: "'Silent Waves'",
        audio: WAVES_AUDIO,
        starts_lights_off: false,
    },
];

/// Levels past the table keep the last entry's audio and lighting.
pub(crate) fn level_profile(number: u32) -> LevelProfile {
    let index = number.saturating_sub(1) as usize;
    match LEVEL_PROFILES.get(index) {
        Some(profile) => *profile,
        None => LevelProfile {
            display_number: number.saturating_sub(1),
            subtitle: "'Unknown'",
            ..LEVEL_PROFILES[LEVEL_PROFILES.len() - 1]
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Torso {
    pub position: Vec2,
    pub angle_degrees: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct Player {
    pub body: Aabb,
    pub velocity: Vec2,
    pub facing: Facing,
    pub stamina: f32,
    pub sprinting: bool,
    pub torso: Torso,
    pub footsteps: FootstepCue,
}

impl Player {
    fn at_spawn(spawn: Aabb, tuning: &SimulationTuning) -> Self {
        let size = tuning.player_body_size;
        Self {
            body: Aabb::from_center_size(spawn.center, Vec2::new(size, size)),
            velocity: Vec2::ZERO,
            facing: Facing::North,
            stamina: STAMINA_MAX,
            sprinting: false,
            torso: Torso {
                position: spawn.center,
                angle_degrees: TORSO_START_ANGLE_DEGREES,
            },
            footsteps: FootstepCue::default(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.center
    }
}

/// Everything that lives for one attempt at one level. Built in full from
/// static data before it replaces the previous instance.
#[derive(Debug, Clone)]
pub(crate) struct LevelInstance {
    pub number: u32,
    pub profile: LevelProfile,
    pub source_hash_sha256_hex: String,
    pub obstructions: ObstructionSet,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub interactables: Vec<Interactable>,
    pub exit: Aabb,
    pub power: PowerState,
    pub lights: LightLayer,
    pub light_defs: Vec<LightDef>,
    /// Any enemy saw the player this tick.
    pub alerted: bool,
}

impl LevelInstance {
    pub fn build(number: u32, data: LevelData, tuning: &SimulationTuning, seed: u64) -> Self {
        let profile = level_profile(number);
        let mut obstructions = ObstructionSet::new();
        for wall in &data.walls {
            obstructions.add_wall(*wall);
        }
        for door in &data.doors {
            obstructions.add_door(*door);
        }

        let level_seed = seed ^ (u64::from(number) << 32);
        let enemies = data
            .enemy_spawns
            .iter()
            .enumerate()
            .map(|(index, spawn)| Enemy::spawn(index, spawn, level_seed))
            .collect::<Vec<_>>();
        let interactables = data
            .interactables
            .iter()
            .map(Interactable::from_def)
            .collect::<Vec<_>>();

        let player = Player::at_spawn(data.spawn, tuning);
        let lights = LightLayer::new(player.torso.position, tuning.player_light_radius);

        Self {
            number,
            profile,
            source_hash_sha256_hex: data.source_hash_sha256_hex,
            obstructions,
            player,
            enemies,
            interactables,
            exit: data.exit,
            power: PowerState::default(),
            lights,
            light_defs: data.lights,
            alerted: false,
        }
    }

    /// Pushes the starting light state into the light layer.
    pub fn present(&mut self, sinks: &mut dyn GameSinks) {
        if !self.profile.starts_lights_off {
            self.lights.materialize(&self.light_defs, sinks);
        }
        self.lights.set_player_light(true, sinks);
        info!(
            level = self.number,
            title = %self.profile.title(),
            enemy_count = self.enemies.len(),
            door_count = self.door_count(),
            lights_on = !self.profile.starts_lights_off,
            source_hash = %self.source_hash_sha256_hex,
            "level_loaded"
        );
    }

    /// Withdraws everything this instance put into the sinks.
    pub fn teardown(&mut self, sinks: &mut dyn GameSinks) {
        self.lights.clear(sinks);
        self.player.footsteps.silence(sinks);
    }

    pub fn door_count(&self) -> usize {
        self.obstructions.ids_of_kind(BlockerKind::Door).count()
    }

    pub fn lights_enabled(&self) -> bool {
        !self.profile.starts_lights_off || self.power.on
    }
}
