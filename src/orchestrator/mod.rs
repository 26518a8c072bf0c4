// Workflow Animation Orchestrator
//
// The sequencer holds the pure transition table; WorkflowOrchestrator owns the
// one mutable AnimationState, feeds events through the table and keeps an
// audit trail. Timing lives elsewhere (see scheduler).

pub mod loop_controller;
pub mod render;
pub mod sequencer;
pub mod status;
pub mod timeline;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AnimatorConfig, RenderConfig};
use crate::diagram::Diagram;
use crate::observability::AnimationMetrics;

pub use loop_controller::LoopController;
pub use render::{ConnectionView, Glyph, IndicatorView, RenderState, StatusLightView};
pub use sequencer::{
    AnimationEvent, AnimationState, OrchestratorState, Phase, StepSequencer, TransitionError,
};
pub use status::{SignalColor, StatusIndicator, StatusLight};
pub use timeline::{cycle_timeline, TimelineEntry};

/// One recorded phase change
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from_phase: Phase,
    pub to_phase: Phase,
    pub active_step_index: usize,
    pub cycle: u64,
    pub event: AnimationEvent,
    pub timestamp: DateTime<Utc>,
}

pub struct WorkflowOrchestrator {
    diagram: Arc<Diagram>,
    sequencer: StepSequencer,
    render_config: RenderConfig,
    state: AnimationState,
    history: VecDeque<TransitionRecord>,
    history_limit: usize,
    metrics: Arc<AnimationMetrics>,
}

impl std::fmt::Debug for WorkflowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("steps", &self.diagram.len())
            .field("state", &self.state.core)
            .field("history", &self.history.len())
            .finish()
    }
}

impl WorkflowOrchestrator {
    pub fn new(diagram: Diagram, config: &AnimatorConfig) -> Self {
        let diagram = Arc::new(diagram);
        let sequencer = StepSequencer::new(diagram.clone(), config.timing.clone());
        let state = sequencer.initial_state();

        Self {
            diagram,
            sequencer,
            render_config: config.render.clone(),
            state,
            history: VecDeque::new(),
            history_limit: config.observability.history_limit,
            metrics: Arc::new(AnimationMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AnimationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Feed one event through the transition table.
    ///
    /// Rejected events leave the state untouched.
    pub fn handle(&mut self, event: AnimationEvent) -> Result<(), TransitionError> {
        let next = match self.sequencer.transition(&self.state, &event) {
            Ok(next) => next,
            Err(e) => {
                self.metrics.record_rejected_event();
                match &e {
                    TransitionError::StaleEvent { .. } => debug!(error = %e, "Dropped stale event"),
                    TransitionError::InvalidTransition { .. } => warn!(error = %e, "Rejected event"),
                }
                return Err(e);
            }
        };

        let from_phase = self.state.core.phase;
        let from_cycle = self.state.core.cycle;
        self.state = next;

        match event {
            AnimationEvent::Frame { .. } => self.metrics.record_frame(),
            AnimationEvent::PhaseElapsed { .. } => {
                self.record_transition(from_phase, event);
                if self.state.core.cycle != from_cycle {
                    self.metrics.record_cycle();
                }
            }
        }

        Ok(())
    }

    fn record_transition(&mut self, from_phase: Phase, event: AnimationEvent) {
        let record = TransitionRecord {
            from_phase,
            to_phase: self.state.core.phase,
            active_step_index: self.state.core.active_step_index,
            cycle: self.state.core.cycle,
            event,
            timestamp: Utc::now(),
        };

        info!(
            from_phase = %record.from_phase,
            to_phase = %record.to_phase,
            active_step = record.active_step_index,
            cycle = record.cycle,
            "Workflow phase transition"
        );

        self.metrics.record_transition();
        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back(record);
        }
    }

    /// Finish the current phase immediately, as if its timers had run out
    pub fn advance_phase(&mut self) -> Result<(), TransitionError> {
        let epoch = self.state.core.epoch;
        if self.state.core.phase.is_animated() {
            let elapsed = self.dwell();
            self.handle(AnimationEvent::Frame { epoch, elapsed })?;
        }
        self.handle(AnimationEvent::PhaseElapsed { epoch })
    }

    /// Start the loop over from step 0 whatever phase is running
    pub fn restart(&mut self) {
        self.state = self.sequencer.loop_controller().reset(&self.state);
        self.metrics.record_restart();
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn core(&self) -> &OrchestratorState {
        &self.state.core
    }

    pub fn phase(&self) -> Phase {
        self.state.core.phase
    }

    pub fn epoch(&self) -> u64 {
        self.state.core.epoch
    }

    pub fn wants_frames(&self) -> bool {
        self.state.wants_frames()
    }

    /// Dwell time of the current phase
    pub fn dwell(&self) -> Duration {
        self.sequencer.timing().dwell(self.state.core.phase)
    }

    pub fn frame_interval(&self) -> Duration {
        self.sequencer.timing().frame_interval()
    }

    pub fn render(&self) -> RenderState {
        RenderState::from_state(&self.diagram, &self.render_config, &self.state)
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn metrics(&self) -> Arc<AnimationMetrics> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Point, WorkflowStep};

    fn orchestrator(history_limit: usize) -> WorkflowOrchestrator {
        let diagram = Diagram::new(vec![
            WorkflowStep::new("a", "A", Point::new(0.0, 0.0)),
            WorkflowStep::new("b", "B", Point::new(10.0, 0.0)),
        ])
        .unwrap();
        let mut config = AnimatorConfig::default();
        config.observability.history_limit = history_limit;
        WorkflowOrchestrator::new(diagram, &config)
    }

    #[test]
    fn test_history_is_bounded() {
        let mut orchestrator = orchestrator(3);
        for _ in 0..6 {
            orchestrator.advance_phase().unwrap();
        }

        let history: Vec<_> = orchestrator.history().collect();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].to_phase, orchestrator.phase());
        assert_eq!(orchestrator.metrics().get_stats().transitions, 6);
    }

    #[test]
    fn test_rejected_event_leaves_state_untouched() {
        let mut orchestrator = orchestrator(8);
        let before = orchestrator.state().clone();

        let result = orchestrator.handle(AnimationEvent::PhaseElapsed { epoch: 42 });
        assert!(result.is_err());
        assert_eq!(orchestrator.state(), &before);
        assert_eq!(orchestrator.metrics().get_stats().rejected_events, 1);
    }

    #[test]
    fn test_restart_returns_to_origin() {
        let mut orchestrator = orchestrator(8);
        orchestrator.advance_phase().unwrap();
        orchestrator.advance_phase().unwrap();
        assert_eq!(orchestrator.phase(), Phase::Traveling);

        orchestrator.restart();
        assert_eq!(orchestrator.phase(), Phase::Processing);
        assert_eq!(orchestrator.core().active_step_index, 0);
        assert_eq!(orchestrator.core().cycle, 1);
        assert_eq!(orchestrator.metrics().get_stats().restarts, 1);
    }
}
