use std::time::Duration;

/// Linear 0 → 1 fraction over a fixed duration.
///
/// A tween holds no clock of its own; the scheduler measures elapsed time and
/// asks for the fraction. Cancelling an animation therefore means dropping the
/// frame loop that feeds it, nothing inside the tween needs tearing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tween {
    duration: Duration,
}

impl Tween {
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Fraction of the animation completed after `elapsed`, clamped to [0, 1].
    /// A zero-length tween is complete immediately.
    pub fn fraction(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
