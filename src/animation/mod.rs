// Animation primitives
//
// Everything that moves is expressed as a Tween: a fraction running from 0 to
// 1 over a fixed duration. The interpolator and the path tracker both read the
// same fraction so the indicator and the path fill can never drift apart.

pub mod interpolator;
pub mod progress;
pub mod tween;

pub use interpolator::interpolate;
pub use progress::PathProgressTracker;
pub use tween::Tween;
