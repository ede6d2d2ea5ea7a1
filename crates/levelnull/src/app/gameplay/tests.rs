use std::path::Path;

use engine::{
    compile_level_str, InputAction, InputSnapshot, LevelData, LevelLoadError, LevelSource,
    LightId, RecordingSinks, SinkEvent, Vec2, ViewKey,
};

use super::audio::{AMBIENCE_HUM, MUSIC_LOBBY, MUSIC_SCARY};
use super::enemy::BehaviorState;
use super::events::GameplayEvent;
use super::interaction::POWER_RESTORED_HINT;
use super::lighting::PLAYER_LIGHT;
use super::session::{GameSession, SessionConfig, SessionError, TickReport, TICK_PHASE_ORDER};
use super::tuning::{SimulationTuning, STAMINA_MAX};
use super::visibility::can_see;

const DT: f32 = 1.0 / 60.0;

/// Builds level XML in the on-disk format. Coordinates are object centers.
struct TestLevel {
    spawn: (f32, f32),
    exit: (f32, f32),
    walls: Vec<[f32; 4]>,
    doors: Vec<[f32; 4]>,
    lights: Vec<(f32, f32)>,
    enemies: Vec<(f32, f32)>,
    switches: Vec<(f32, f32)>,
    signs: Vec<(f32, f32, &'static str)>,
}

impl TestLevel {
    fn new(spawn: (f32, f32), exit: (f32, f32)) -> Self {
        Self {
            spawn,
            exit,
            walls: Vec::new(),
            doors: Vec::new(),
            lights: Vec::new(),
            enemies: Vec::new(),
            switches: Vec::new(),
            signs: Vec::new(),
        }
    }

    fn wall(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.walls.push([x, y, width, height]);
        self
    }

    fn door(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.doors.push([x, y, width, height]);
        self
    }

    fn light(mut self, x: f32, y: f32) -> Self {
        self.lights.push((x, y));
        self
    }

    fn enemy(mut self, x: f32, y: f32) -> Self {
        self.enemies.push((x, y));
        self
    }

    fn switch(mut self, x: f32, y: f32) -> Self {
        self.switches.push((x, y));
        self
    }

    fn sign(mut self, x: f32, y: f32, text: &'static str) -> Self {
        self.signs.push((x, y, text));
        self
    }

    fn to_xml(&self) -> String {
        let mut next_id = 0u32;
        let mut id = || {
            next_id += 1;
            next_id
        };
        let rect = |id: u32, x: f32, y: f32, width: f32, height: f32| {
            format!(r#"<object id="{id}" x="{x}" y="{y}" width="{width}" height="{height}"/>"#)
        };

        let mut xml = String::from("<Level>\n");
        xml += &format!(
            "<layer name=\"spawn\">{}</layer>\n",
            rect(id(), self.spawn.0, self.spawn.1, 28.0, 28.0)
        );
        for (name, boxes) in [("walls", &self.walls), ("doors", &self.doors)] {
            xml += &format!("<layer name=\"{name}\">");
            for [x, y, width, height] in boxes.iter().copied() {
                xml += &rect(id(), x, y, width, height);
            }
            xml += "</layer>\n";
        }
        xml += &format!(
            "<layer name=\"floor\">{}</layer>\n<layer name=\"details\"/>\n",
            rect(id(), 0.0, 0.0, 4000.0, 4000.0)
        );
        xml += "<layer name=\"lights\">";
        for (x, y) in &self.lights {
            xml += &format!(
                r##"<object id="{}" x="{x}" y="{y}"><property name="radius" value="120"/><property name="color" value="#ffeecc"/></object>"##,
                id()
            );
        }
        xml += "</layer>\n<layer name=\"enemy_spawn\">";
        for (x, y) in &self.enemies {
            xml += &rect(id(), *x, *y, 24.0, 24.0);
        }
        xml += "</layer>\n<layer name=\"Interactables\">";
        for (x, y) in &self.switches {
            xml += &format!(
                r#"<object id="{}" x="{x}" y="{y}" width="16" height="16"><property name="type" value="switch"/><property name="oninteract" value="toggle_switch"/></object>"#,
                id()
            );
        }
        for (x, y, text) in &self.signs {
            xml += &format!(
                r#"<object id="{}" x="{x}" y="{y}" width="16" height="16"><property name="type" value="sign"/><property name="oninteract" value="draw_text"/><property name="text" value="{text}"/></object>"#,
                id()
            );
        }
        xml += &format!(
            "</layer>\n<layer name=\"exit\">{}</layer>\n</Level>\n",
            rect(id(), self.exit.0, self.exit.1, 40.0, 40.0)
        );
        xml
    }

    fn compile(&self, number: u32) -> LevelData {
        let file_name = format!("lvl{number}.xml");
        compile_level_str(&self.to_xml(), Path::new(&file_name)).expect("test level compiles")
    }
}

const FAR_EXIT: (f32, f32) = (1500.0, -1500.0);

fn quiet_level() -> TestLevel {
    TestLevel::new((0.0, 0.0), FAR_EXIT)
}

fn build_levels(levels: &[TestLevel]) -> Vec<LevelData> {
    levels
        .iter()
        .enumerate()
        .map(|(index, level)| level.compile(index as u32 + 1))
        .collect()
}

fn started_session(
    levels: &[TestLevel],
    start_level: u32,
) -> (GameSession<Vec<LevelData>>, RecordingSinks) {
    let config = SessionConfig {
        start_level,
        ..SessionConfig::default()
    };
    let mut session = GameSession::new(build_levels(levels), config).expect("session");
    let mut sinks = RecordingSinks::new();
    session.start_game(&mut sinks).expect("start game");
    (session, sinks)
}

fn snapshot_from_actions(actions: &[InputAction]) -> InputSnapshot {
    actions
        .iter()
        .fold(InputSnapshot::empty(), |snapshot, action| {
            snapshot.with_action_down(*action, true)
        })
}

fn tap(action: InputAction) -> InputSnapshot {
    InputSnapshot::empty().with_action_pressed(action)
}

fn tick<S: LevelSource>(
    session: &mut GameSession<S>,
    sinks: &mut RecordingSinks,
    input: &InputSnapshot,
) -> TickReport {
    session.tick(DT, input, sinks).expect("tick")
}

fn player_position(session: &GameSession<Vec<LevelData>>) -> Vec2 {
    session.level().expect("running level").player.position()
}

fn assert_vec2_close(actual: Vec2, expected: Vec2) {
    assert!(
        actual.distance(expected) < 1e-3,
        "expected {expected:?}, got {actual:?}"
    );
}

fn enemy_state_changes(events: &[GameplayEvent]) -> Vec<(usize, BehaviorState)> {
    events
        .iter()
        .filter_map(|event| match event {
            GameplayEvent::EnemyStateChanged { spawn_index, state } => Some((*spawn_index, *state)),
            _ => None,
        })
        .collect()
}

#[test]
fn menu_starts_game_on_interact() {
    let config = SessionConfig::default();
    let mut session = GameSession::new(build_levels(&[quiet_level()]), config).expect("session");
    let mut sinks = RecordingSinks::new();
    session.enter_menu(&mut sinks);
    assert_eq!(sinks.current_view(), Some(ViewKey::Menu));

    let idle = tick(&mut session, &mut sinks, &InputSnapshot::empty());
    assert_eq!(idle.view, ViewKey::Menu);
    assert!(session.last_tick_order().is_empty());

    let report = tick(&mut session, &mut sinks, &tap(InputAction::Interact));
    assert_eq!(report.view, ViewKey::Game);
    assert_eq!(report.level, 1);
    assert_eq!(sinks.current_view(), Some(ViewKey::Game));
    assert_eq!(report.counts.level_loaded, 1);
    assert_eq!(report.counts.view_changed, 1);
}

#[test]
fn start_game_reports_its_events_before_the_first_tick() {
    let config = SessionConfig::default();
    let mut session = GameSession::new(build_levels(&[quiet_level()]), config).expect("session");
    let mut sinks = RecordingSinks::new();
    session.start_game(&mut sinks).expect("start game");

    assert_eq!(
        session.last_tick_events(),
        &[
            GameplayEvent::LevelLoaded {
                level: 1,
                enemy_count: 0
            },
            GameplayEvent::ViewChanged {
                view: ViewKey::Game
            },
        ]
    );

    let report = tick(&mut session, &mut sinks, &InputSnapshot::empty());
    assert_eq!(report.counts.total, 0);
    assert!(session.last_tick_events().is_empty());
}

#[test]
fn door_count_ignores_walls() {
    let level = quiet_level()
        .wall(200.0, 0.0, 10.0, 100.0)
        .wall(-200.0, 0.0, 10.0, 100.0)
        .door(0.0, 200.0, 60.0, 10.0);
    let (session, _sinks) = started_session(&[level], 1);

    let level = session.level().expect("level");
    assert_eq!(level.door_count(), 1);
    assert_eq!(level.obstructions.len(), 3);
}

#[test]
fn level_one_plays_lobby_tracks_and_lights() {
    let level = quiet_level().light(50.0, 50.0).light(-50.0, 50.0);
    let (session, sinks) = started_session(&[level], 1);

    assert_eq!(sinks.volume(MUSIC_LOBBY), Some(0.2));
    assert_eq!(sinks.volume(AMBIENCE_HUM), Some(0.2));
    assert_eq!(sinks.light_count(), 3);
    assert_eq!(sinks.top_light(), Some(PLAYER_LIGHT));
    assert_eq!(session.hud().title, "Level 0 : 'The Lobby'");
    assert_eq!(session.hud().title_alpha, 255.0);
    let torso = session.level().expect("level").player.torso;
    assert_eq!(torso.angle_degrees, 180.0);
}

#[test]
fn game_tick_runs_phases_in_order() {
    let (mut session, mut sinks) = started_session(&[quiet_level()], 1);
    tick(&mut session, &mut sinks, &InputSnapshot::empty());
    assert_eq!(session.last_tick_order(), TICK_PHASE_ORDER.as_slice());
}

#[test]
fn opposite_keys_hold_player_still() {
    let (mut session, mut sinks) = started_session(&[quiet_level()], 1);
    let input = snapshot_from_actions(&[
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
    ]);
    for _ in 0..30 {
        tick(&mut session, &mut sinks, &input);
    }
    assert_vec2_close(player_position(&session), Vec2::ZERO);
    assert!(!sinks.is_playing(super::audio::FOOTSTEPS));

    let up_down_right = snapshot_from_actions(&[
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveRight,
    ]);
    tick(&mut session, &mut sinks, &up_down_right);
    let tuning = SimulationTuning::default();
    assert_vec2_close(player_position(&session), Vec2::new(tuning.player_speed * DT, 0.0));
}

#[test]
fn sprint_starts_after_first_moving_tick_and_drains_stamina() {
    let (mut session, mut sinks) = started_session(&[quiet_level()], 1);
    let tuning = SimulationTuning::default();
    let input = snapshot_from_actions(&[InputAction::MoveUp, InputAction::Sprint]);

    tick(&mut session, &mut sinks, &input);
    let player = &session.level().expect("level").player;
    assert!(!player.sprinting);
    assert_eq!(player.stamina, STAMINA_MAX);
    assert_vec2_close(player.position(), Vec2::new(0.0, tuning.player_speed * DT));

    tick(&mut session, &mut sinks, &input);
    let player = &session.level().expect("level").player;
    assert!(player.sprinting);
    assert!(player.stamina < STAMINA_MAX);
    let expected_y = tuning.player_speed * DT + (tuning.player_speed + tuning.sprint_bonus) * DT;
    assert_vec2_close(player.position(), Vec2::new(0.0, expected_y));
    assert!(sinks.is_playing(super::audio::FOOTSTEPS));
}

#[test]
fn exhausted_stamina_falls_back_to_base_speed() {
    let (mut session, mut sinks) = started_session(&[quiet_level()], 1);
    let input = snapshot_from_actions(&[InputAction::MoveRight, InputAction::Sprint]);

    tick(&mut session, &mut sinks, &input);
    session.level_mut().expect("level").player.stamina = 0.0;
    tick(&mut session, &mut sinks, &input);

    let player = &session.level().expect("level").player;
    assert!(!player.sprinting);
    let tuning = SimulationTuning::default();
    assert_vec2_close(player.position(), Vec2::new(2.0 * tuning.player_speed * DT, 0.0));
}

#[test]
fn switch_opens_door_and_enemy_sees_through_it_same_tick() {
    let level = quiet_level()
        .door(100.0, 0.0, 10.0, 400.0)
        .switch(0.0, 0.0)
        .enemy(200.0, 0.0);
    let (mut session, mut sinks) = started_session(&[level], 1);

    tick(&mut session, &mut sinks, &InputSnapshot::empty());
    assert!(enemy_state_changes(session.last_tick_events()).is_empty());
    assert!(!session.hud().sanity_overlay);

    tick(&mut session, &mut sinks, &tap(InputAction::Interact));

    let level = session.level().expect("level");
    assert_eq!(level.obstructions.active_count(), 0);
    assert!(level.power.on);
    assert_eq!(level.enemies[0].state(), BehaviorState::Pursue);
    assert_eq!(
        enemy_state_changes(session.last_tick_events()),
        vec![(0, BehaviorState::Pursue)]
    );
    assert!(session
        .last_tick_events()
        .contains(&GameplayEvent::DoorsOpened { count: 1 }));
    assert!(session.hud().sanity_overlay);
}

#[test]
fn sanity_overlay_tracks_enemy_sight_every_tick() {
    let level = quiet_level()
        .wall(60.0, -120.0, 10.0, 200.0)
        .enemy(200.0, -100.0);
    let (mut session, mut sinks) = started_session(&[level], 1);
    let walk_up = snapshot_from_actions(&[InputAction::MoveUp]);

    let mut saw_pursuit = false;
    for _ in 0..40 {
        tick(&mut session, &mut sinks, &walk_up);
        let level = session.level().expect("level");
        let pursuing = level.enemies[0].state() == BehaviorState::Pursue;
        saw_pursuit |= pursuing;
        assert_eq!(session.hud().sanity_overlay, pursuing);
    }
    assert!(saw_pursuit);
}

#[test]
fn distant_enemy_behind_wall_stays_on_patrol() {
    let level = quiet_level()
        .wall(500.0, 500.0, 60.0, 60.0)
        .enemy(1000.0, 1000.0);
    let (mut session, mut sinks) = started_session(&[level], 1);
    let world = &session.level().expect("level").obstructions;
    assert!(!can_see(Vec2::ZERO, Vec2::new(1000.0, 1000.0), world, 350.0));

    for _ in 0..120 {
        tick(&mut session, &mut sinks, &InputSnapshot::empty());
        let level = session.level().expect("level");
        assert_eq!(level.enemies[0].state(), BehaviorState::Patrol);
        assert!(!session.hud().sanity_overlay);
    }
}

#[test]
fn exit_overlap_loads_next_level_with_fresh_enemies() {
    let first = TestLevel::new((0.0, 0.0), (60.0, 0.0)).enemy(-1000.0, -1000.0);
    let second = TestLevel::new((500.0, 500.0), FAR_EXIT)
        .enemy(900.0, 900.0)
        .enemy(900.0, 100.0);
    let (mut session, mut sinks) = started_session(&[first, second], 1);
    let walk_right = snapshot_from_actions(&[InputAction::MoveRight]);

    let mut report = tick(&mut session, &mut sinks, &walk_right);
    for _ in 0..60 {
        if report.level == 2 {
            break;
        }
        report = tick(&mut session, &mut sinks, &walk_right);
    }

    assert_eq!(report.level, 2);
    assert_eq!(report.view, ViewKey::Game);
    assert!(session
        .last_tick_events()
        .contains(&GameplayEvent::LevelExited { from: 1, to: 2 }));
    let level = session.level().expect("level");
    assert_eq!(level.number, 2);
    assert_eq!(level.enemies.len(), 2);
    assert_vec2_close(level.enemies[0].position(), Vec2::new(900.0, 900.0));
    assert_vec2_close(level.enemies[1].position(), Vec2::new(900.0, 100.0));
    assert_vec2_close(level.player.position(), Vec2::new(500.0, 500.0));
    assert_eq!(session.hud().title, "Level 1 : 'Habitable Zone'");
    assert!(session.hud().title_alpha > 250.0);
    assert!(sinks.is_playing(MUSIC_SCARY));
    assert!(!sinks.is_playing(MUSIC_LOBBY));
    assert!(!sinks.is_playing(AMBIENCE_HUM));
}

#[test]
fn enemy_contact_loses_and_retry_rebuilds_same_level() {
    let first = quiet_level();
    let second = quiet_level().enemy(10.0, 0.0);
    let (mut session, mut sinks) = started_session(&[first, second], 2);

    let report = tick(&mut session, &mut sinks, &InputSnapshot::empty());

    assert_eq!(report.view, ViewKey::Lose);
    assert_eq!(report.level, 2);
    assert_eq!(report.counts.player_caught, 1);
    assert!(session.level().is_none());
    assert_eq!(sinks.current_view(), Some(ViewKey::Lose));
    assert_eq!(sinks.playing_sounds().count(), 0);
    assert_eq!(sinks.light_count(), 0);

    let idle = tick(&mut session, &mut sinks, &InputSnapshot::empty());
    assert_eq!(idle.view, ViewKey::Lose);

    let retry = tick(&mut session, &mut sinks, &tap(InputAction::Interact));
    assert_eq!(retry.view, ViewKey::Game);
    assert_eq!(retry.level, 2);
    let level = session.level().expect("level");
    assert_vec2_close(level.enemies[0].position(), Vec2::new(10.0, 0.0));
    assert_eq!(level.enemies[0].state(), BehaviorState::Patrol);
    assert!(sinks.is_playing(MUSIC_SCARY));
}

#[test]
fn double_toggle_on_dark_level_never_duplicates_lights() {
    let first = quiet_level();
    let dark = quiet_level()
        .switch(0.0, 0.0)
        .light(50.0, 50.0)
        .light(-50.0, 50.0)
        .door(100.0, 0.0, 10.0, 100.0);
    let (mut session, mut sinks) = started_session(&[first, dark], 2);
    assert_eq!(sinks.light_count(), 1);
    assert_eq!(session.level().expect("level").lights.static_count(), 0);

    tick(&mut session, &mut sinks, &tap(InputAction::Interact));
    assert_eq!(sinks.light_count(), 3);
    assert_eq!(sinks.top_light(), Some(PLAYER_LIGHT));
    assert_eq!(sinks.hint_text(), Some(POWER_RESTORED_HINT));

    tick(&mut session, &mut sinks, &InputSnapshot::empty());
    tick(&mut session, &mut sinks, &tap(InputAction::Interact));

    let level = session.level().expect("level");
    assert!(!level.power.on);
    assert_eq!(level.lights.static_count(), 2);
    assert_eq!(level.obstructions.active_count(), 0);
    assert_eq!(sinks.light_count(), 3);
    let static_adds = sinks.count_events(|event| {
        matches!(event, SinkEvent::AddLight { id, .. } if *id != PLAYER_LIGHT)
    });
    assert_eq!(static_adds, 2);
}

#[test]
fn sign_sets_hint_text() {
    let level = quiet_level().sign(0.0, 0.0, "Keep moving.");
    let (mut session, mut sinks) = started_session(&[level], 1);

    tick(&mut session, &mut sinks, &tap(InputAction::Interact));

    assert_eq!(sinks.hint_text(), Some("Keep moving."));
    assert_eq!(session.last_tick_events().len(), 1);
}

#[test]
fn finishing_last_level_returns_to_menu_at_level_one() {
    let first = quiet_level();
    let last = TestLevel::new((0.0, 0.0), (0.0, 0.0));
    let (mut session, mut sinks) = started_session(&[first, last], 2);

    let report = tick(&mut session, &mut sinks, &InputSnapshot::empty());

    assert_eq!(report.view, ViewKey::Menu);
    assert_eq!(report.level, 1);
    assert_eq!(report.counts.playthrough_complete, 1);
    assert!(session.level().is_none());
    assert_eq!(sinks.playing_sounds().count(), 0);
    assert_eq!(sinks.light_count(), 0);
}

/// Serves level 1 and fails on every other level.
struct BrokenAfterFirst {
    first: LevelData,
}

impl LevelSource for BrokenAfterFirst {
    fn level_count(&self) -> u32 {
        2
    }

    fn load_level(&self, number: u32) -> Result<LevelData, LevelLoadError> {
        if number == 1 {
            Ok(self.first.clone())
        } else {
            Err(LevelLoadError::UnknownLevel {
                number,
                level_count: 1,
            })
        }
    }
}

#[test]
fn failed_level_load_keeps_running_level() {
    let source = BrokenAfterFirst {
        first: TestLevel::new((0.0, 0.0), (0.0, 0.0)).compile(1),
    };
    let mut session = GameSession::new(source, SessionConfig::default()).expect("session");
    let mut sinks = RecordingSinks::new();
    session.start_game(&mut sinks).expect("start game");

    let result = session.tick(DT, &InputSnapshot::empty(), &mut sinks);

    assert!(matches!(result, Err(SessionError::Load { level: 2, .. })));
    assert_eq!(session.level_number(), 1);
    assert!(session.level().is_some());
    assert_eq!(session.view(), ViewKey::Game);
    assert!(sinks.is_playing(MUSIC_LOBBY));
}

#[test]
fn torso_aims_at_cursor_and_player_light_follows() {
    let (mut session, mut sinks) = started_session(&[quiet_level()], 1);
    let input = snapshot_from_actions(&[InputAction::MoveRight])
        .with_cursor_world(Some(Vec2::new(100.0, 0.0)));

    for _ in 0..10 {
        tick(&mut session, &mut sinks, &input);
    }

    let player = &session.level().expect("level").player;
    assert_vec2_close(player.torso.position, player.position());
    assert!((player.torso.angle_degrees + 90.0).abs() < 1e-3);
    let light = sinks.light(PLAYER_LIGHT).expect("player light");
    assert_vec2_close(light.position, player.position());
}

#[test]
fn escape_and_light_toggle_are_edge_triggered() {
    let (mut session, mut sinks) = started_session(&[quiet_level()], 1);

    tick(&mut session, &mut sinks, &tap(InputAction::Escape));
    assert!(session.hud().escape_visible);
    assert!(session.hud().escape_alpha < 255.0);
    assert_eq!(
        session.last_tick_events(),
        &[GameplayEvent::EscapeHintShown]
    );

    tick(&mut session, &mut sinks, &tap(InputAction::TogglePlayerLight));
    assert!(sinks.light(PLAYER_LIGHT).is_none());
    let held = snapshot_from_actions(&[InputAction::TogglePlayerLight]);
    tick(&mut session, &mut sinks, &held);
    assert!(sinks.light(PLAYER_LIGHT).is_none());

    tick(&mut session, &mut sinks, &tap(InputAction::TogglePlayerLight));
    assert!(sinks.light(PLAYER_LIGHT).is_some());
    assert_eq!(
        session.last_tick_events(),
        &[GameplayEvent::PlayerLightToggled { on: true }]
    );
}

#[test]
fn walls_stop_the_player() {
    let level = quiet_level().wall(40.0, 0.0, 10.0, 200.0);
    let (mut session, mut sinks) = started_session(&[level], 1);
    let walk_right = snapshot_from_actions(&[InputAction::MoveRight]);

    for _ in 0..60 {
        tick(&mut session, &mut sinks, &walk_right);
    }

    let half = SimulationTuning::default().player_body_size / 2.0;
    assert_vec2_close(player_position(&session), Vec2::new(35.0 - half, 0.0));
}

#[test]
fn static_light_ids_follow_level_object_ids() {
    let level = quiet_level().light(50.0, 50.0);
    let (_session, sinks) = started_session(&[level], 1);
    // spawn and floor take ids 1 and 2.
    assert!(sinks.light(LightId(3)).is_some());
}
