use serde::Deserialize;
use thiserror::Error;

pub(crate) const STAMINA_MAX: f32 = 100.0;

/// Gameplay constants. Every field has a default, so a tuning file only needs
/// the values it overrides. Speeds are world pixels per second.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationTuning {
    pub player_speed: f32,
    pub sprint_bonus: f32,
    pub stamina_drain_per_second: f32,
    pub stamina_regen_per_second: f32,
    pub rest_epsilon: f32,
    pub player_body_size: f32,
    pub perception_radius: f32,
    pub chase_speed: f32,
    pub wander_speed: f32,
    pub wander_retarget_min_seconds: f32,
    pub wander_retarget_max_seconds: f32,
    pub player_light_radius: f32,
    /// Per-tick lerp factors for the title card, objective and escape hint.
    pub title_fade_rate: f32,
    pub objective_fade_rate: f32,
    pub escape_fade_rate: f32,
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            player_speed: 180.0,
            sprint_bonus: 120.0,
            stamina_drain_per_second: 35.0,
            stamina_regen_per_second: 20.0,
            rest_epsilon: 0.01,
            player_body_size: 28.0,
            perception_radius: 350.0,
            chase_speed: 150.0,
            wander_speed: 60.0,
            wander_retarget_min_seconds: 0.75,
            wander_retarget_max_seconds: 2.5,
            player_light_radius: 300.0,
            title_fade_rate: 0.005,
            objective_fade_rate: 0.01,
            escape_fade_rate: 0.005,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum TuningError {
    #[error("tuning field {field} must be finite and >= 0, got {value}")]
    NegativeOrNonFinite { field: &'static str, value: f32 },
    #[error("tuning field {field} must be > 0, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("tuning field {field} must be within 0..=1, got {value}")]
    NotAFraction { field: &'static str, value: f32 },
    #[error("wander retarget range is empty: min {min} > max {max}")]
    EmptyRetargetRange { min: f32, max: f32 },
}

impl SimulationTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        let non_negative = [
            ("player_speed", self.player_speed),
            ("sprint_bonus", self.sprint_bonus),
            ("stamina_drain_per_second", self.stamina_drain_per_second),
            ("stamina_regen_per_second", self.stamina_regen_per_second),
            ("rest_epsilon", self.rest_epsilon),
            ("chase_speed", self.chase_speed),
            ("wander_speed", self.wander_speed),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::NegativeOrNonFinite { field, value });
            }
        }

        let positive = [
            ("player_body_size", self.player_body_size),
            ("perception_radius", self.perception_radius),
            ("wander_retarget_min_seconds", self.wander_retarget_min_seconds),
            ("wander_retarget_max_seconds", self.wander_retarget_max_seconds),
            ("player_light_radius", self.player_light_radius),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TuningError::NotPositive { field, value });
            }
        }

        let fractions = [
            ("title_fade_rate", self.title_fade_rate),
            ("objective_fade_rate", self.objective_fade_rate),
            ("escape_fade_rate", self.escape_fade_rate),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::NotAFraction { field, value });
            }
        }

        if self.wander_retarget_min_seconds > self.wander_retarget_max_seconds {
            return Err(TuningError::EmptyRetargetRange {
                min: self.wander_retarget_min_seconds,
                max: self.wander_retarget_max_seconds,
            });
        }
        Ok(())
    }
}
