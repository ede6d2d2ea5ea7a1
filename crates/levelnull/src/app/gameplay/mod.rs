mod audio;
mod enemy;
mod events;
mod hud;
mod interaction;
mod level;
mod lighting;
mod motion;
mod session;
mod transition;
mod tuning;
mod visibility;

pub(crate) use session::{GameSession, SessionConfig, SessionError, TickReport};
pub(crate) use tuning::{SimulationTuning, TuningError};

#[cfg(test)]
mod tests;
