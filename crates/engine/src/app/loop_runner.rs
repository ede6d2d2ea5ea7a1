use std::time::Duration;

use tracing::{info, warn};

use super::input::{InputCollector, InputSnapshot};
use super::metrics::IntervalCounters;
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_interval: Duration::from_secs(1),
        }
    }
}

/// Anything advanced in fixed increments by [`FixedStepLoop`].
pub trait Simulation {
    fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

/// Fixed-timestep driver. Frame time is supplied by the caller, so the same
/// loop serves a real clock or a replayed script.
#[derive(Debug)]
pub struct FixedStepLoop {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    elapsed: Duration,
    total_ticks: u64,
    counters: IntervalCounters,
    metrics: MetricsHandle,
}

impl FixedStepLoop {
    pub fn new(config: &LoopConfig, metrics: MetricsHandle) -> Self {
        let target_tps = config.target_tps.max(1);
        let max_frame_delta = non_zero_or(config.max_frame_delta, Duration::from_millis(250));
        let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
        let metrics_interval = non_zero_or(config.metrics_interval, Duration::from_secs(1));

        info!(
            target_tps,
            max_frame_delta_ms = max_frame_delta.as_millis() as u64,
            max_ticks_per_frame,
            metrics_interval_ms = metrics_interval.as_millis() as u64,
            "loop_config"
        );

        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(target_tps)),
            max_frame_delta,
            max_ticks_per_frame,
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            total_ticks: 0,
            counters: IntervalCounters::new(metrics_interval),
            metrics,
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advances by one frame of `raw_frame_dt` and returns the number of
    /// simulation ticks run. Each tick consumes its own input snapshot, so a
    /// press edge reaches only the first tick of the frame.
    pub fn run_frame<S: Simulation + ?Sized>(
        &mut self,
        raw_frame_dt: Duration,
        input: &mut InputCollector,
        simulation: &mut S,
    ) -> u32 {
        let frame_dt = raw_frame_dt.min(self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(frame_dt);
        self.elapsed = self.elapsed.saturating_add(frame_dt);

        let plan = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        let dt_seconds = self.fixed_dt.as_secs_f32();
        for _ in 0..plan.ticks_to_run {
            simulation.tick(dt_seconds, &input.snapshot_for_tick());
        }
        self.accumulator = plan.remaining_accumulator;
        self.total_ticks = self.total_ticks.saturating_add(u64::from(plan.ticks_to_run));

        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        self.counters.record_frame(plan.ticks_to_run, plan.dropped_backlog);
        if let Some(snapshot) = self.counters.close_interval(self.elapsed) {
            self.metrics.publish(snapshot);
            info!(
                ticks_per_second = snapshot.ticks_per_second,
                ticks_per_frame = snapshot.ticks_per_frame,
                clamped_frames = snapshot.clamped_frames,
                total_ticks = snapshot.total_ticks,
                "loop_metrics"
            );
        }

        plan.ticks_to_run
    }
}

pub fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
