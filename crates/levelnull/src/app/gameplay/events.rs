use engine::ViewKey;

use super::enemy::BehaviorState;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GameplayEvent {
    LevelLoaded {
        level: u32,
        enemy_count: usize,
    },
    ViewChanged {
        view: ViewKey,
    },
    SwitchToggled {
        object_id: u32,
        power_on: bool,
    },
    DoorsOpened {
        count: usize,
    },
    LightsMaterialized {
        count: usize,
    },
    TextShown {
        object_id: u32,
    },
    PlayerLightToggled {
        on: bool,
    },
    EscapeHintShown,
    EnemyStateChanged {
        spawn_index: usize,
        state: BehaviorState,
    },
    PlayerCaught {
        level: u32,
        enemy_index: usize,
    },
    LevelExited {
        from: u32,
        to: u32,
    },
    PlaythroughComplete {
        last_level: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameplayEventKind {
    LevelLoaded,
    ViewChanged,
    SwitchToggled,
    DoorsOpened,
    LightsMaterialized,
    TextShown,
    PlayerLightToggled,
    EscapeHintShown,
    EnemyStateChanged,
    PlayerCaught,
    LevelExited,
    PlaythroughComplete,
}

impl GameplayEvent {
    pub fn kind(&self) -> GameplayEventKind {
        match self {
            Self::LevelLoaded { .. } => GameplayEventKind::LevelLoaded,
            Self::ViewChanged { .. } => GameplayEventKind::ViewChanged,
            Self::SwitchToggled { .. } => GameplayEventKind::SwitchToggled,
            Self::DoorsOpened { .. } => GameplayEventKind::DoorsOpened,
            Self::LightsMaterialized { .. } => GameplayEventKind::LightsMaterialized,
            Self::TextShown { .. } => GameplayEventKind::TextShown,
            Self::PlayerLightToggled { .. } => GameplayEventKind::PlayerLightToggled,
            Self::EscapeHintShown => GameplayEventKind::EscapeHintShown,
            Self::EnemyStateChanged { .. } => GameplayEventKind::EnemyStateChanged,
            Self::PlayerCaught { .. } => GameplayEventKind::PlayerCaught,
            Self::LevelExited { .. } => GameplayEventKind::LevelExited,
            Self::PlaythroughComplete { .. } => GameplayEventKind::PlaythroughComplete,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GameplayEventCounts {
    pub total: u32,
    pub level_loaded: u32,
    pub view_changed: u32,
    pub switch_toggled: u32,
    pub doors_opened: u32,
    pub lights_materialized: u32,
    pub text_shown: u32,
    pub player_light_toggled: u32,
    pub escape_hint_shown: u32,
    pub enemy_state_changed: u32,
    pub player_caught: u32,
    pub level_exited: u32,
    pub playthrough_complete: u32,
}

impl GameplayEventCounts {
    fn record(&mut self, kind: GameplayEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            GameplayEventKind::LevelLoaded => &mut self.level_loaded,
            GameplayEventKind::ViewChanged => &mut self.view_changed,
            GameplayEventKind::SwitchToggled => &mut self.switch_toggled,
            GameplayEventKind::DoorsOpened => &mut self.doors_opened,
            GameplayEventKind::LightsMaterialized => &mut self.lights_materialized,
            GameplayEventKind::TextShown => &mut self.text_shown,
            GameplayEventKind::PlayerLightToggled => &mut self.player_light_toggled,
            GameplayEventKind::EscapeHintShown => &mut self.escape_hint_shown,
            GameplayEventKind::EnemyStateChanged => &mut self.enemy_state_changed,
            GameplayEventKind::PlayerCaught => &mut self.player_caught,
            GameplayEventKind::LevelExited => &mut self.level_exited,
            GameplayEventKind::PlaythroughComplete => &mut self.playthrough_complete,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Events emitted during the current tick. At rollover they become the
/// previous tick's events and counts.
#[derive(Debug, Default)]
pub(crate) struct GameplayEventBus {
    current_tick_events: Vec<GameplayEvent>,
    last_tick_events: Vec<GameplayEvent>,
    last_tick_counts: GameplayEventCounts,
}

impl GameplayEventBus {
    pub fn emit(&mut self, event: GameplayEvent) {
        self.current_tick_events.push(event);
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = GameplayEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.last_tick_events = std::mem::take(&mut self.current_tick_events);
    }

    pub fn last_tick_events(&self) -> &[GameplayEvent] {
        &self.last_tick_events
    }

    pub fn last_tick_counts(&self) -> GameplayEventCounts {
        self.last_tick_counts
    }
}
