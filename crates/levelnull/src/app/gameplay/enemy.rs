use std::f32::consts::TAU;

use engine::{Aabb, CollisionWorld, EnemyKind, EnemySpawnDef, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::tuning::SimulationTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BehaviorState {
    Patrol,
    Pursue,
}

/// Wander flavour per enemy kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PatrolProfile {
    pub speed_scale: f32,
    pub retarget_scale: f32,
    /// Chance that a retarget picks standing still instead of a heading.
    pub pause_chance: f64,
    pub seed_salt: u64,
}

impl PatrolProfile {
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Crawler => Self {
                speed_scale: 1.0,
                retarget_scale: 1.0,
                pause_chance: 0.2,
                seed_salt: 0x6372_6177,
            },
            EnemyKind::Stalker => Self {
                speed_scale: 0.6,
                retarget_scale: 1.8,
                pause_chance: 0.45,
                seed_salt: 0x7374_616c,
            },
            EnemyKind::Drifter => Self {
                speed_scale: 1.4,
                retarget_scale: 0.6,
                pause_chance: 0.05,
                seed_salt: 0x6472_6966,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Wander {
    heading: Vec2,
    retarget_in_seconds: f32,
    rng: ChaCha8Rng,
}

#[derive(Debug, Clone)]
pub(crate) struct Enemy {
    spawn_index: usize,
    kind: EnemyKind,
    profile: PatrolProfile,
    body: Aabb,
    velocity: Vec2,
    angle_degrees: f32,
    state: BehaviorState,
    wander: Wander,
}

impl Enemy {
    pub fn spawn(spawn_index: usize, def: &EnemySpawnDef, level_seed: u64) -> Self {
        let profile = PatrolProfile::for_kind(def.kind);
        let seed = level_seed
            ^ profile.seed_salt
            ^ (spawn_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            spawn_index,
            kind: def.kind,
            profile,
            body: def.bounds,
            velocity: Vec2::ZERO,
            angle_degrees: 0.0,
            state: BehaviorState::Patrol,
            wander: Wander {
                heading: Vec2::ZERO,
                retarget_in_seconds: 0.0,
                rng: ChaCha8Rng::seed_from_u64(seed),
            },
        }
    }

    pub fn spawn_index(&self) -> usize {
        self.spawn_index
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn position(&self) -> Vec2 {
        self.body.center
    }

    pub fn body(&self) -> Aabb {
        self.body
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn angle_degrees(&self) -> f32 {
        self.angle_degrees
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Sets state and velocity for this tick from the current sight result.
    /// Returns the new state when it changed.
    pub fn behave(
        &mut self,
        sees_player: bool,
        torso: Vec2,
        dt_seconds: f32,
        tuning: &SimulationTuning,
    ) -> Option<BehaviorState> {
        let previous = self.state;
        if sees_player {
            self.state = BehaviorState::Pursue;
            let to_torso = torso - self.position();
            self.angle_degrees = to_torso.angle_degrees() - 90.0;
            self.velocity = to_torso.normalize_or_zero() * tuning.chase_speed;
        } else {
            self.state = BehaviorState::Patrol;
            if previous == BehaviorState::Pursue {
                self.wander.retarget_in_seconds = 0.0;
            }
            self.patrol(dt_seconds, tuning);
        }
        (self.state != previous).then_some(self.state)
    }

    fn patrol(&mut self, dt_seconds: f32, tuning: &SimulationTuning) {
        self.wander.retarget_in_seconds -= dt_seconds;
        if self.wander.retarget_in_seconds <= 0.0 {
            let wander = &mut self.wander;
            wander.heading = if wander.rng.gen_bool(self.profile.pause_chance) {
                Vec2::ZERO
            } else {
                Vec2::from_angle_radians(wander.rng.gen_range(0.0..TAU))
            };
            let min = tuning.wander_retarget_min_seconds;
            let max = tuning.wander_retarget_max_seconds;
            wander.retarget_in_seconds =
                wander.rng.gen_range(min..=max) * self.profile.retarget_scale;
        }

        self.velocity = self.wander.heading * (tuning.wander_speed * self.profile.speed_scale);
        if self.velocity != Vec2::ZERO {
            self.angle_degrees = self.velocity.angle_degrees() - 90.0;
        }
    }

    pub fn resolve_movement<W: CollisionWorld + ?Sized>(&mut self, world: &W, dt_seconds: f32) {
        let center = world.sweep(self.body, self.velocity * dt_seconds);
        self.body = self.body.with_center(center);
    }
}
