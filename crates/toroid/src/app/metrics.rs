use std::time::{Duration, Instant};

use crate::interaction::DispatchOutcome;

/// Per-interval loop and dispatch rates, published to the scene through
/// [`UiContext::metrics`](super::UiContext).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub events_per_second: f32,
    /// Share of dispatched events that reached a callback, 0 when none were dispatched.
    pub delivered_ratio: f32,
    /// Release-outside and drag deliveries within the interval.
    pub redirected: u32,
    pub hitbox_count: usize,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    frame_time_sum: Duration,
    dispatched: u32,
    delivered: u32,
    redirected: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    fn starting_at(interval_start: Instant, interval: Duration) -> Self {
        Self {
            interval_start,
            interval,
            frames: 0,
            frame_time_sum: Duration::ZERO,
            dispatched: 0,
            delivered: 0,
            redirected: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
    }

    pub(crate) fn record_dispatch(&mut self, outcome: &DispatchOutcome) {
        self.dispatched = self.dispatched.saturating_add(1);
        if outcome.delivered {
            self.delivered = self.delivered.saturating_add(1);
        }
        if outcome.redirected_to.is_some() {
            self.redirected = self.redirected.saturating_add(1);
        }
    }

    pub(crate) fn maybe_snapshot(
        &mut self,
        now: Instant,
        hitbox_count: usize,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };
        let delivered_ratio = if self.dispatched == 0 {
            0.0
        } else {
            self.delivered as f32 / self.dispatched as f32
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            frame_time_ms,
            events_per_second: self.dispatched as f32 / elapsed_seconds,
            delivered_ratio,
            redirected: self.redirected,
            hitbox_count,
        };
        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}
