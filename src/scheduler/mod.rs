// Scheduler - turns elapsed time into orchestrator events
//
// One tokio task per mounted diagram. Phase timers are plain sleeps, animated
// phases run an interval-driven frame loop, and every write passes through the
// lifecycle gate so teardown is final.

pub mod driver;
pub mod lifecycle;

pub use driver::{spawn, DriverError, OrchestratorHandle};
pub use lifecycle::{HostLifecycle, LifecycleEvent, LifecyclePhase, LivenessGate};
