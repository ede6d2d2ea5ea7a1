use std::process::ExitCode;
use std::time::Duration;

use engine::{
    FixedStepLoop, InputAction, InputCollector, InputSnapshot, KeyState, LevelSource,
    LoopConfig, LoopMetricsSnapshot, MetricsHandle, RecordingSinks, Simulation, ViewKey,
};
use tracing::{debug, error, info};

use super::bootstrap::AppWiring;
use super::gameplay::{GameSession, SessionConfig, SessionError, TickReport};
use super::script::{InputScript, ScriptStep};
use super::AppError;

/// Adapts a session to the fixed-step loop. The first session error stops
/// further ticks and is held until the runner collects it.
pub(crate) struct SessionDriver<S: LevelSource> {
    session: GameSession<S>,
    sinks: RecordingSinks,
    failure: Option<SessionError>,
    last_report: Option<TickReport>,
    ticks: u64,
}

impl<S: LevelSource> SessionDriver<S> {
    pub fn new(session: GameSession<S>, sinks: RecordingSinks) -> Self {
        Self {
            session,
            sinks,
            failure: None,
            last_report: None,
            ticks: 0,
        }
    }

    pub fn take_failure(&mut self) -> Option<SessionError> {
        self.failure.take()
    }

    pub fn session(&self) -> &GameSession<S> {
        &self.session
    }
}

impl<S: LevelSource> Simulation for SessionDriver<S> {
    fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        if self.failure.is_some() {
            return;
        }
        self.ticks += 1;
        match self.session.tick(fixed_dt_seconds, input, &mut self.sinks) {
            Ok(report) => {
                let changed = self
                    .last_report
                    .map_or(true, |last| last.view != report.view || last.level != report.level);
                if changed {
                    info!(tick = self.ticks, view = ?report.view, level = report.level, "runner_view");
                    self.session.trace_presentation();
                }
                if report.counts.total > 0 {
                    debug!(
                        tick = self.ticks,
                        total = report.counts.total,
                        enemy_state_changed = report.counts.enemy_state_changed,
                        player_caught = report.counts.player_caught,
                        level_exited = report.counts.level_exited,
                        "tick_events"
                    );
                }
                self.last_report = Some(report);
            }
            Err(err) => self.failure = Some(err),
        }
        for event in self.session.last_tick_events() {
            debug!(tick = self.ticks, event = ?event, "gameplay_event");
        }
        for event in self.sinks.drain_events() {
            debug!(tick = self.ticks, event = ?event, "sink_event");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ReplaySummary {
    pub frames: u64,
    pub ticks: u64,
    pub view: ViewKey,
    pub level: u32,
    /// Last interval the loop published; zeroed if the replay was shorter
    /// than one interval.
    pub metrics: LoopMetricsSnapshot,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        loop_config,
        catalog,
        session,
        script,
    } = app;
    match replay(catalog, session, &loop_config, &script) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                ticks = summary.ticks,
                view = ?summary.view,
                level = summary.level,
                ticks_per_second = summary.metrics.ticks_per_second,
                clamped_frames = summary.metrics.clamped_frames,
                "replay_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "replay_failed");
            ExitCode::FAILURE
        }
    }
}

/// Plays `script` against a fresh session, starting from the menu.
pub(crate) fn replay<S: LevelSource>(
    source: S,
    config: SessionConfig,
    loop_config: &LoopConfig,
    script: &InputScript,
) -> Result<ReplaySummary, AppError> {
    let mut session = GameSession::new(source, config)?;
    let mut sinks = RecordingSinks::new();
    session.enter_menu(&mut sinks);
    let mut driver = SessionDriver::new(session, sinks);

    let metrics = MetricsHandle::default();
    let mut fixed_loop = FixedStepLoop::new(loop_config, metrics.clone());
    let mut input = InputCollector::new();
    let frame_dt = Duration::from_millis(script.frame_ms);
    let mut frames = 0u64;

    for step in &script.steps {
        begin_step(&mut input, step);
        for frame in 0..step.frames {
            fixed_loop.run_frame(frame_dt, &mut input, &mut driver);
            frames += 1;
            if let Some(err) = driver.take_failure() {
                return Err(err.into());
            }
            if frame == 0 {
                release_taps(&mut input, step);
            }
        }
    }

    driver.session().trace_presentation();
    Ok(ReplaySummary {
        frames,
        ticks: fixed_loop.total_ticks(),
        view: driver.session().view(),
        level: driver.session().level_number(),
        metrics: metrics.snapshot(),
    })
}

fn begin_step(input: &mut InputCollector, step: &ScriptStep) {
    let held = step.hold.iter().map(|key| key.action()).collect::<Vec<_>>();
    for action in InputAction::ALL {
        if input.is_down(action) && !held.contains(&action) {
            input.handle_action(action, KeyState::Released);
        }
    }
    for action in &held {
        input.handle_action(*action, KeyState::Pressed);
    }
    for key in &step.tap {
        let action = key.action();
        // A tap on a key that is already down still needs a fresh edge.
        input.handle_action(action, KeyState::Released);
        input.handle_action(action, KeyState::Pressed);
    }
    if let Some(cursor) = step.cursor_world() {
        input.set_cursor_world(cursor);
    }
}

fn release_taps(input: &mut InputCollector, step: &ScriptStep) {
    for key in &step.tap {
        if !step.hold.contains(key) {
            input.handle_action(key.action(), KeyState::Released);
        }
    }
}
