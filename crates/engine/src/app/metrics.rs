use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;

/// Loop counters for the latest reporting interval plus running totals.
/// Interval rates are measured in simulated time, so a replayed script
/// reports the same numbers on every machine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub ticks_per_second: f32,
    pub ticks_per_frame: f32,
    pub clamped_frames: u32,
    pub dropped_backlog_ms: u64,
    pub total_frames: u64,
    pub total_ticks: u64,
}

/// Shared read side of the loop counters. Cloning shares the same slot.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.latest.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn!(operation = "read", "loop_metrics_lock_poisoned");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = match self.latest.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(operation = "write", "loop_metrics_lock_poisoned");
                poisoned.into_inner()
            }
        };
        *guard = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct IntervalCounters {
    interval: Duration,
    started_at: Duration,
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
    dropped_backlog: Duration,
    total_frames: u64,
    total_ticks: u64,
}

impl IntervalCounters {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            started_at: Duration::ZERO,
            frames: 0,
            ticks: 0,
            clamped_frames: 0,
            dropped_backlog: Duration::ZERO,
            total_frames: 0,
            total_ticks: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, ticks: u32, dropped_backlog: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.ticks = self.ticks.saturating_add(ticks);
        self.total_frames = self.total_frames.saturating_add(1);
        self.total_ticks = self.total_ticks.saturating_add(u64::from(ticks));
        if !dropped_backlog.is_zero() {
            self.clamped_frames = self.clamped_frames.saturating_add(1);
            self.dropped_backlog = self.dropped_backlog.saturating_add(dropped_backlog);
        }
    }

    /// Closes the interval once `now` has moved past it, resetting the
    /// per-interval counters. Totals carry over.
    pub(crate) fn close_interval(&mut self, now: Duration) -> Option<LoopMetricsSnapshot> {
        let span = now.saturating_sub(self.started_at);
        if span < self.interval {
            return None;
        }

        let seconds = span.as_secs_f32().max(f32::EPSILON);
        let ticks_per_frame = if self.frames == 0 {
            0.0
        } else {
            self.ticks as f32 / self.frames as f32
        };
        let snapshot = LoopMetricsSnapshot {
            ticks_per_second: self.ticks as f32 / seconds,
            ticks_per_frame,
            clamped_frames: self.clamped_frames,
            dropped_backlog_ms: self.dropped_backlog.as_millis() as u64,
            total_frames: self.total_frames,
            total_ticks: self.total_ticks,
        };

        self.started_at = now;
        self.frames = 0;
        self.ticks = 0;
        self.clamped_frames = 0;
        self.dropped_backlog = Duration::ZERO;
        Some(snapshot)
    }
}
