mod input;
mod loop_runner;
mod metrics;
mod sinks;

pub use input::{ActionStates, InputAction, InputCollector, InputSnapshot, KeyState};
pub use loop_runner::{plan_sim_steps, FixedStepLoop, LoopConfig, Simulation, StepPlan};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use sinks::{GameSinks, LightDesc, LightId, RecordingSinks, SinkEvent, SoundId, ViewKey};
