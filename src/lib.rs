// Workflow Animator Library - looping workflow diagram animation
// This exposes the orchestrator core, its scheduler and the ambient plumbing

pub mod animation;
pub mod config;
pub mod diagram;
pub mod observability;
pub mod orchestrator;
pub mod scheduler;
pub mod shutdown;
pub mod telemetry;

// Re-export key types for easy access
pub use animation::{interpolate, PathProgressTracker, Tween};
pub use config::{AnimatorConfig, RenderConfig, TimingConfig};
pub use diagram::{Connection, Diagram, DiagramError, Point, WorkflowStep};
pub use observability::{AnimationMetrics, AnimationStats};
pub use orchestrator::{
    cycle_timeline, AnimationEvent, AnimationState, Glyph, LoopController, OrchestratorState,
    Phase, RenderState, SignalColor, StatusIndicator, StepSequencer, TimelineEntry,
    TransitionError, WorkflowOrchestrator,
};
pub use scheduler::{spawn, DriverError, LivenessGate, OrchestratorHandle};
pub use shutdown::{ShutdownCoordinator, ShutdownReason};
pub use telemetry::{create_animation_span, generate_correlation_id, init_telemetry};
