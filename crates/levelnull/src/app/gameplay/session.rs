use engine::{
    CollisionWorld, GameSinks, InputAction, InputSnapshot, LevelLoadError, LevelSource, ViewKey,
};
use thiserror::Error;
use tracing::{debug, info};

use super::audio::AudioDirector;
use super::events::{GameplayEvent, GameplayEventBus, GameplayEventCounts};
use super::hud::HudState;
use super::interaction::{handle_interact, InteractionContext, InteractionOutcome};
use super::level::LevelInstance;
use super::motion::{self, MotionInput};
use super::transition::{self, TransitionTrigger};
use super::tuning::{SimulationTuning, TuningError};
use super::visibility::VisibilityOracle;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SessionConfig {
    pub start_level: u32,
    pub seed: u64,
    pub tuning: SimulationTuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_level: 1,
            seed: 42,
            tuning: SimulationTuning::default(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("start level {requested} is outside the available levels 1..={level_count}")]
    LevelOutOfRange { requested: u32, level_count: u32 },
    #[error("invalid session tuning: {0}")]
    InvalidTuning(#[from] TuningError),
    #[error("failed to load level {level}")]
    Load {
        level: u32,
        #[source]
        source: LevelLoadError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickPhase {
    Controls,
    Interaction,
    Motion,
    PlayerCollision,
    Torso,
    Enemies,
    Transitions,
    Hud,
}

impl TickPhase {
    #[cfg(test)]
    pub fn name(self) -> &'static str {
        match self {
            Self::Controls => "Controls",
            Self::Interaction => "Interaction",
            Self::Motion => "Motion",
            Self::PlayerCollision => "PlayerCollision",
            Self::Torso => "Torso",
            Self::Enemies => "Enemies",
            Self::Transitions => "Transitions",
            Self::Hud => "Hud",
        }
    }
}

/// Interaction runs before motion so a door opened by a switch is already
/// gone when enemies look for the player in the same tick.
pub(crate) const TICK_PHASE_ORDER: [TickPhase; 8] = [
    TickPhase::Controls,
    TickPhase::Interaction,
    TickPhase::Motion,
    TickPhase::PlayerCollision,
    TickPhase::Torso,
    TickPhase::Enemies,
    TickPhase::Transitions,
    TickPhase::Hud,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickReport {
    pub view: ViewKey,
    pub level: u32,
    pub counts: GameplayEventCounts,
}

/// One playthrough: the active view, the current level number and, while a
/// level is running, its [`LevelInstance`].
pub(crate) struct GameSession<S: LevelSource> {
    source: S,
    config: SessionConfig,
    view: ViewKey,
    level_number: u32,
    level: Option<LevelInstance>,
    audio: AudioDirector,
    hud: HudState,
    events: GameplayEventBus,
    oracle: VisibilityOracle,
    last_tick_order: Vec<TickPhase>,
}

impl<S: LevelSource> GameSession<S> {
    pub fn new(source: S, config: SessionConfig) -> Result<Self, SessionError> {
        config.tuning.validate()?;
        let level_count = source.level_count();
        if config.start_level == 0 || config.start_level > level_count {
            return Err(SessionError::LevelOutOfRange {
                requested: config.start_level,
                level_count,
            });
        }
        let oracle = VisibilityOracle::new(config.tuning.perception_radius);
        Ok(Self {
            source,
            level_number: config.start_level,
            config,
            view: ViewKey::Menu,
            level: None,
            audio: AudioDirector::default(),
            hud: HudState::default(),
            events: GameplayEventBus::default(),
            oracle,
            last_tick_order: Vec::with_capacity(TICK_PHASE_ORDER.len()),
        })
    }

    pub fn view(&self) -> ViewKey {
        self.view
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    pub fn level(&self) -> Option<&LevelInstance> {
        self.level.as_ref()
    }

    pub fn hud(&self) -> &HudState {
        &self.hud
    }

    pub fn audio(&self) -> &AudioDirector {
        &self.audio
    }

    pub fn last_tick_order(&self) -> &[TickPhase] {
        &self.last_tick_order
    }

    pub fn last_tick_events(&self) -> &[GameplayEvent] {
        self.events.last_tick_events()
    }

    /// Logs what a renderer would draw for the current state: HUD cards,
    /// tracks, body poses and switch levers.
    pub fn trace_presentation(&self) {
        let hud = &self.hud;
        debug!(
            view = ?self.view,
            title = %hud.title,
            title_alpha = hud.title_alpha,
            objective_alpha = hud.objective_alpha,
            escape_text = hud.escape_text().unwrap_or(""),
            escape_alpha = hud.escape_alpha,
            sanity_overlay = hud.sanity_overlay,
            sprint_fraction = hud.sprint_fraction,
            sprint_bar = ?hud.sprint_bar_color,
            music = self.audio.music().map(|track| track.sound.as_str()).unwrap_or("none"),
            ambience = self.audio.ambience().map(|track| track.sound.as_str()).unwrap_or("none"),
            "presentation_hud"
        );
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let player = &level.player;
        debug!(
            level = level.number,
            position = ?player.position(),
            facing_degrees = player.facing.degrees(),
            torso_degrees = player.torso.angle_degrees,
            sprinting = player.sprinting,
            stamina = player.stamina,
            footsteps = player.footsteps.is_playing(),
            player_light = level.lights.player_light_on(),
            static_lights = level.lights.static_count(),
            lights_enabled = level.lights_enabled(),
            "presentation_player"
        );
        for enemy in &level.enemies {
            debug!(
                spawn_index = enemy.spawn_index(),
                state = ?enemy.state(),
                position = ?enemy.position(),
                angle_degrees = enemy.angle_degrees(),
                speed = enemy.velocity().length(),
                "presentation_enemy"
            );
        }
        for interactable in &level.interactables {
            if let Some(lever_down) = interactable.lever_down(level.power) {
                debug!(object_id = interactable.object_id, lever_down, "presentation_switch");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn level_mut(&mut self) -> Option<&mut LevelInstance> {
        self.level.as_mut()
    }

    /// Shows the menu even when it is already the active view, so a fresh
    /// sink starts out on it.
    pub fn enter_menu(&mut self, sinks: &mut dyn GameSinks) {
        self.view = ViewKey::Menu;
        sinks.show_view(ViewKey::Menu);
        info!(level = self.level_number, "menu_shown");
    }

    /// Loads the current level number and switches to the game view. Called
    /// outside a tick, so the start-up events close out as their own tick.
    pub fn start_game(&mut self, sinks: &mut dyn GameSinks) -> Result<(), SessionError> {
        let outcome = self.begin_level(sinks);
        self.events.finish_tick_rollover();
        outcome
    }

    fn begin_level(&mut self, sinks: &mut dyn GameSinks) -> Result<(), SessionError> {
        self.enter_level(self.level_number, sinks)?;
        self.set_view(ViewKey::Game, sinks);
        Ok(())
    }

    pub fn tick(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        sinks: &mut dyn GameSinks,
    ) -> Result<TickReport, SessionError> {
        self.last_tick_order.clear();
        let outcome = match self.view {
            ViewKey::Menu | ViewKey::Lose => {
                if input.interact_pressed() {
                    self.begin_level(sinks)
                } else {
                    Ok(())
                }
            }
            ViewKey::Game => self.tick_level(dt_seconds, input, sinks),
        };
        self.events.finish_tick_rollover();
        outcome?;
        Ok(TickReport {
            view: self.view,
            level: self.level_number,
            counts: self.events.last_tick_counts(),
        })
    }

    fn tick_level(
        &mut self,
        dt_seconds: f32,
        input: &InputSnapshot,
        sinks: &mut dyn GameSinks,
    ) -> Result<(), SessionError> {
        for phase in TICK_PHASE_ORDER {
            self.last_tick_order.push(phase);
            let Some(level) = self.level.as_mut() else {
                return Ok(());
            };
            match phase {
                TickPhase::Controls => self.run_controls(input, sinks),
                TickPhase::Interaction => {
                    if input.interact_pressed() {
                        Self::run_interaction(level, &mut self.events, sinks);
                    }
                }
                TickPhase::Motion => Self::run_motion(level, input, dt_seconds, &self.config.tuning, sinks),
                TickPhase::PlayerCollision => {
                    let player = &mut level.player;
                    let center = level
                        .obstructions
                        .sweep(player.body, player.velocity * dt_seconds);
                    player.body = player.body.with_center(center);
                }
                TickPhase::Torso => {
                    let torso = &mut level.player.torso;
                    torso.position = level.player.body.center;
                    if let Some(cursor) = input.cursor_world() {
                        torso.angle_degrees = (cursor - torso.position).angle_degrees() - 90.0;
                    }
                    level.lights.move_player_light(torso.position, sinks);
                }
                TickPhase::Enemies => {
                    Self::run_enemies(level, &self.oracle, dt_seconds, &self.config.tuning, &mut self.events)
                }
                TickPhase::Transitions => self.run_transitions(sinks)?,
                TickPhase::Hud => {
                    let player = &level.player;
                    let resting = motion::is_resting(player.velocity, &self.config.tuning);
                    self.hud
                        .advance(player.stamina, resting, level.alerted, &self.config.tuning);
                }
            }
        }
        Ok(())
    }

    fn run_controls(&mut self, input: &InputSnapshot, sinks: &mut dyn GameSinks) {
        if input.was_pressed(InputAction::Escape) {
            self.hud.on_escape();
            self.events.emit(GameplayEvent::EscapeHintShown);
        }
        if input.was_pressed(InputAction::TogglePlayerLight) {
            if let Some(level) = self.level.as_mut() {
                let on = level.lights.toggle_player_light(sinks);
                self.events.emit(GameplayEvent::PlayerLightToggled { on });
            }
        }
    }

    fn run_interaction(
        level: &mut LevelInstance,
        events: &mut GameplayEventBus,
        sinks: &mut dyn GameSinks,
    ) {
        let mut ctx = InteractionContext {
            player_body: level.player.body,
            obstructions: &mut level.obstructions,
            lights: &mut level.lights,
            light_defs: &level.light_defs,
            starts_lights_off: level.profile.starts_lights_off,
            power: &mut level.power,
            sinks,
        };
        for outcome in handle_interact(&level.interactables, &mut ctx) {
            match outcome {
                InteractionOutcome::SwitchToggled {
                    object_id,
                    power_on,
                    doors_opened,
                    lights_added,
                } => {
                    events.emit(GameplayEvent::SwitchToggled {
                        object_id,
                        power_on,
                    });
                    if doors_opened > 0 {
                        events.emit(GameplayEvent::DoorsOpened {
                            count: doors_opened,
                        });
                    }
                    if lights_added > 0 {
                        events.emit(GameplayEvent::LightsMaterialized {
                            count: lights_added,
                        });
                    }
                }
                InteractionOutcome::TextShown { object_id } => {
                    events.emit(GameplayEvent::TextShown { object_id });
                }
            }
        }
    }

    fn run_motion(
        level: &mut LevelInstance,
        input: &InputSnapshot,
        dt_seconds: f32,
        tuning: &SimulationTuning,
        sinks: &mut dyn GameSinks,
    ) {
        let player = &mut level.player;
        let held = MotionInput::from_snapshot(input);
        let resting = motion::is_resting(player.velocity, tuning);
        let step = motion::step(held, resting, player.stamina, tuning);

        player.velocity = step.velocity;
        player.sprinting = step.sprinting;
        if let Some(facing) = step.facing {
            player.facing = facing;
        }
        player.stamina = motion::next_stamina(player.stamina, step.sprinting, dt_seconds, tuning);
        player.footsteps.update(held.axes(), sinks);
    }

    /// Perception, behaviour and collision for every enemy in spawn order.
    /// Sight is measured from the player's committed position this tick.
    fn run_enemies(
        level: &mut LevelInstance,
        oracle: &VisibilityOracle,
        dt_seconds: f32,
        tuning: &SimulationTuning,
        events: &mut GameplayEventBus,
    ) {
        let player_position = level.player.position();
        let torso = level.player.torso.position;
        level.alerted = false;
        for enemy in &mut level.enemies {
            let sees_player = oracle.can_see(player_position, enemy.position(), &level.obstructions);
            level.alerted |= sees_player;
            if let Some(state) = enemy.behave(sees_player, torso, dt_seconds, tuning) {
                debug!(
                    spawn_index = enemy.spawn_index(),
                    kind = enemy.kind().as_str(),
                    state = ?state,
                    "enemy_state_changed"
                );
                events.emit(GameplayEvent::EnemyStateChanged {
                    spawn_index: enemy.spawn_index(),
                    state,
                });
            }
            enemy.resolve_movement(&level.obstructions, dt_seconds);
        }
    }

    fn run_transitions(&mut self, sinks: &mut dyn GameSinks) -> Result<(), SessionError> {
        let Some(level) = self.level.as_ref() else {
            return Ok(());
        };
        match transition::evaluate(level.player.body, &level.enemies, level.exit) {
            None => Ok(()),
            Some(TransitionTrigger::Caught { enemy_index }) => {
                self.lose(enemy_index, sinks);
                Ok(())
            }
            Some(TransitionTrigger::ReachedExit) => self.advance_level(sinks),
        }
    }

    /// Ends the attempt. The level is dropped; leaving the lose view rebuilds
    /// the same level number from its source.
    fn lose(&mut self, enemy_index: usize, sinks: &mut dyn GameSinks) {
        if let Some(mut level) = self.level.take() {
            level.teardown(sinks);
        }
        self.audio.stop_all(sinks);
        info!(level = self.level_number, enemy_index, "player_caught");
        self.events.emit(GameplayEvent::PlayerCaught {
            level: self.level_number,
            enemy_index,
        });
        self.set_view(ViewKey::Lose, sinks);
    }

    fn advance_level(&mut self, sinks: &mut dyn GameSinks) -> Result<(), SessionError> {
        let from = self.level_number;
        match transition::next_level(from, self.source.level_count()) {
            Some(to) => {
                self.enter_level(to, sinks)?;
                info!(from, to, "level_exited");
                self.events.emit(GameplayEvent::LevelExited { from, to });
            }
            None => {
                if let Some(mut level) = self.level.take() {
                    level.teardown(sinks);
                }
                self.audio.stop_all(sinks);
                self.level_number = 1;
                info!(last_level = from, "playthrough_complete");
                self.events
                    .emit(GameplayEvent::PlaythroughComplete { last_level: from });
                self.set_view(ViewKey::Menu, sinks);
            }
        }
        Ok(())
    }

    /// Builds the new level in full before the old one is torn down, so a
    /// load failure leaves the running level untouched.
    fn enter_level(&mut self, number: u32, sinks: &mut dyn GameSinks) -> Result<(), SessionError> {
        let data = self
            .source
            .load_level(number)
            .map_err(|source| SessionError::Load {
                level: number,
                source,
            })?;
        let mut next = LevelInstance::build(number, data, &self.config.tuning, self.config.seed);

        if let Some(mut previous) = self.level.take() {
            previous.teardown(sinks);
        }
        sinks.set_hint_text("");
        next.present(sinks);
        self.audio.apply(next.profile.audio, sinks);
        self.hud.reset_for_level(next.profile.title());
        self.events.emit(GameplayEvent::LevelLoaded {
            level: number,
            enemy_count: next.enemies.len(),
        });
        self.level_number = number;
        self.level = Some(next);
        Ok(())
    }

    fn set_view(&mut self, view: ViewKey, sinks: &mut dyn GameSinks) {
        if self.view == view {
            return;
        }
        self.view = view;
        sinks.show_view(view);
        info!(view = ?view, level = self.level_number, "view_changed");
        self.events.emit(GameplayEvent::ViewChanged { view });
    }
}
