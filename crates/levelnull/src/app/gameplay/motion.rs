use engine::{GameSinks, InputAction, InputSnapshot, Vec2};

use super::audio::FOOTSTEPS;
use super::tuning::{SimulationTuning, STAMINA_MAX};

const FOOTSTEP_VOLUME: f32 = 1.0;

/// Cardinal facing of a walking body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Facing {
    East,
    North,
    West,
    South,
}

impl Facing {
    pub fn degrees(self) -> f32 {
        match self {
            Self::East => 0.0,
            Self::North => 90.0,
            Self::West => 180.0,
            Self::South => 270.0,
        }
    }
}

/// Directional keys plus the sprint modifier, sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MotionInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
}

impl MotionInput {
    pub fn from_snapshot(input: &InputSnapshot) -> Self {
        Self {
            up: input.is_down(InputAction::MoveUp),
            down: input.is_down(InputAction::MoveDown),
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
            sprint: input.is_down(InputAction::Sprint),
        }
    }

    /// Per-axis sign; opposite keys on one axis cancel.
    pub fn axes(self) -> (i8, i8) {
        let x = i8::from(self.right) - i8::from(self.left);
        let y = i8::from(self.up) - i8::from(self.down);
        (x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MotionStep {
    /// World pixels per second.
    pub velocity: Vec2,
    pub sprinting: bool,
    /// `None` when not moving; the previous facing is kept.
    pub facing: Option<Facing>,
}

pub(crate) fn is_resting(velocity: Vec2, tuning: &SimulationTuning) -> bool {
    velocity.length() <= tuning.rest_epsilon
}

/// Turns held keys into a velocity. `resting` describes the previous tick, so
/// sprint never applies on the first tick out of a standstill.
pub(crate) fn step(
    input: MotionInput,
    resting: bool,
    stamina: f32,
    tuning: &SimulationTuning,
) -> MotionStep {
    let (x, y) = input.axes();
    let moving = x != 0 || y != 0;
    let sprinting = input.sprint && !resting && stamina > 0.0 && moving;
    let speed = tuning.player_speed + if sprinting { tuning.sprint_bonus } else { 0.0 };

    let mut facing = None;
    if y > 0 {
        facing = Some(Facing::North);
    } else if y < 0 {
        facing = Some(Facing::South);
    }
    if x > 0 {
        facing = Some(Facing::East);
    } else if x < 0 {
        facing = Some(Facing::West);
    }

    MotionStep {
        velocity: Vec2::new(f32::from(x) * speed, f32::from(y) * speed),
        sprinting,
        facing,
    }
}

pub(crate) fn next_stamina(
    stamina: f32,
    sprinting: bool,
    dt_seconds: f32,
    tuning: &SimulationTuning,
) -> f32 {
    let delta = if sprinting {
        -tuning.stamina_drain_per_second
    } else {
        tuning.stamina_regen_per_second
    };
    (stamina + delta * dt_seconds).clamp(0.0, STAMINA_MAX)
}

/// Looping footstep sound that follows the movement direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FootstepCue {
    direction: Option<(i8, i8)>,
}

impl FootstepCue {
    pub fn is_playing(&self) -> bool {
        self.direction.is_some()
    }

    pub fn update(&mut self, axes: (i8, i8), sinks: &mut dyn GameSinks) {
        let next = (axes != (0, 0)).then_some(axes);
        if next == self.direction {
            return;
        }
        if self.direction.is_some() {
            sinks.stop_sound(FOOTSTEPS);
        }
        if next.is_some() {
            sinks.play_sound(FOOTSTEPS, FOOTSTEP_VOLUME, true);
        }
        self.direction = next;
    }

    pub fn silence(&mut self, sinks: &mut dyn GameSinks) {
        if self.direction.take().is_some() {
            sinks.stop_sound(FOOTSTEPS);
        }
    }
}
