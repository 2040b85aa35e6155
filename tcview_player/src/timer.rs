//! Tokio interval timer that the player can halt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tcview_core::PlaybackTimer;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Fires every `period` until stopped.
pub struct FrameTimer {
    interval: Interval,
    running: Arc<AtomicBool>,
}

impl FrameTimer {
    /// Creates a running timer. Must be called inside a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle given to the player so `stop()` can halt this timer.
    pub fn stop_handle(&self) -> TimerHandle {
        TimerHandle {
            running: self.running.clone(),
        }
    }

    /// Returns false once the handle has been stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Waits for the next tick. Returns false if the timer was halted.
    pub async fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.interval.tick().await;
        self.is_running()
    }
}

/// Shared stop flag for a [`FrameTimer`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    running: Arc<AtomicBool>,
}

impl PlaybackTimer for TimerHandle {
    fn stop(&mut self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::debug!("Frame timer halted");
        }
    }
}
