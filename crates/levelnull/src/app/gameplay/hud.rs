use engine::Rgba;

use super::tuning::{SimulationTuning, STAMINA_MAX};

pub(crate) const ESCAPE_HINT: &str = "There is no escape.";
pub(crate) const SPRINT_BAR_RESTING: Rgba = Rgba::opaque(0x70, 0x38, 0x32);
pub(crate) const SPRINT_BAR_ACTIVE: Rgba = Rgba::opaque(0xbd, 0xbd, 0xbd);

const ALPHA_OPAQUE: f32 = 255.0;

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Overlay state derived from the simulation. Fade rates are per tick, so
/// the card timings follow the tick rate rather than wall time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HudState {
    pub title: String,
    pub title_alpha: f32,
    pub objective_alpha: f32,
    pub escape_visible: bool,
    pub escape_alpha: f32,
    /// Set while any enemy can see the player.
    pub sanity_overlay: bool,
    pub sprint_fraction: f32,
    pub sprint_bar_color: Rgba,
}

impl Default for HudState {
    fn default() -> Self {
        Self {
            title: String::new(),
            title_alpha: 0.0,
            objective_alpha: 0.0,
            escape_visible: false,
            escape_alpha: 0.0,
            sanity_overlay: false,
            sprint_fraction: 1.0,
            sprint_bar_color: SPRINT_BAR_RESTING,
        }
    }
}

impl HudState {
    pub fn reset_for_level(&mut self, title: String) {
        *self = Self {
            title,
            title_alpha: ALPHA_OPAQUE,
            ..Self::default()
        };
    }

    pub fn escape_text(&self) -> Option<&'static str> {
        self.escape_visible.then_some(ESCAPE_HINT)
    }

    pub fn on_escape(&mut self) {
        self.escape_visible = true;
        self.escape_alpha = ALPHA_OPAQUE;
    }

    pub fn advance(&mut self, stamina: f32, resting: bool, alerted: bool, tuning: &SimulationTuning) {
        self.title_alpha = lerp(self.title_alpha, 0.0, tuning.title_fade_rate);
        self.objective_alpha = lerp(self.objective_alpha, ALPHA_OPAQUE, tuning.objective_fade_rate);
        if self.escape_visible {
            self.escape_alpha = lerp(self.escape_alpha, 0.0, tuning.escape_fade_rate);
        }
        self.sanity_overlay = alerted;
        self.sprint_fraction = (stamina / STAMINA_MAX).clamp(0.0, 1.0);
        self.sprint_bar_color = if resting {
            SPRINT_BAR_RESTING
        } else {
            SPRINT_BAR_ACTIVE
        };
    }
}
