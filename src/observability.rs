use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counters for one running orchestrator
#[derive(Debug, Default)]
pub struct AnimationMetrics {
    pub transitions: AtomicU64,
    pub frames: AtomicU64,
    pub rejected_events: AtomicU64,
    pub cycles_completed: AtomicU64,
    pub restarts: AtomicU64,
    pub teardowns: AtomicU64,
}

impl AnimationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_event(&self) {
        self.rejected_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> AnimationStats {
        AnimationStats {
            transitions: self.transitions.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            rejected_events: self.rejected_events.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            teardowns: self.teardowns.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            transitions = stats.transitions,
            frames = stats.frames,
            rejected_events = stats.rejected_events,
            cycles_completed = stats.cycles_completed,
            restarts = stats.restarts,
            "Animation metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStats {
    pub transitions: u64,
    pub frames: u64,
    pub rejected_events: u64,
    pub cycles_completed: u64,
    pub restarts: u64,
    pub teardowns: u64,
}
