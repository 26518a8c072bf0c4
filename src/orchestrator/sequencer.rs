use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::animation::{interpolate, PathProgressTracker, Tween};
use crate::config::TimingConfig;
use crate::diagram::{Diagram, Point};

use super::loop_controller::LoopController;

/// Phases of the per-step animation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Processing,
    Arrived,
    Traveling,
    SignalA,
    SignalB,
    FinaleHold,
    Fading,
}

impl Phase {
    /// Phases driven by the frame loop rather than a single timer
    pub fn is_animated(self) -> bool {
        matches!(self, Phase::Traveling | Phase::Fading)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Processing => "PROCESSING",
            Phase::Arrived => "ARRIVED",
            Phase::Traveling => "TRAVELING",
            Phase::SignalA => "SIGNAL_A",
            Phase::SignalB => "SIGNAL_B",
            Phase::FinaleHold => "FINALE_HOLD",
            Phase::Fading => "FADING",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Inputs to the transition function. Every event carries the epoch of the
/// phase it was scheduled for so a late timer or frame can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnimationEvent {
    /// The dwell timer of the current phase fired
    PhaseElapsed { epoch: u64 },
    /// A frame inside an animated phase, `elapsed` measured from phase entry
    Frame { epoch: u64, elapsed: Duration },
}

impl AnimationEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            AnimationEvent::PhaseElapsed { epoch } | AnimationEvent::Frame { epoch, .. } => *epoch,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {event:?} not allowed during {phase}")]
    InvalidTransition { phase: Phase, event: AnimationEvent },

    #[error("Stale event for epoch {event_epoch}, current epoch is {current_epoch}")]
    StaleEvent { event_epoch: u64, current_epoch: u64 },
}

/// The single mutable core state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorState {
    pub active_step_index: usize,
    pub phase: Phase,
    /// Set while the terminal step plays its finale signals
    pub finale: bool,
    pub indicator_position: Point,
    pub indicator_opacity: f64,
    /// Bumped on every phase entry and on reset
    pub epoch: u64,
    /// Completed loops since the orchestrator started
    pub cycle: u64,
}

impl OrchestratorState {
    pub fn initial(origin: Point) -> Self {
        Self {
            active_step_index: 0,
            phase: Phase::Processing,
            finale: false,
            indicator_position: origin,
            indicator_opacity: 1.0,
            epoch: 0,
            cycle: 0,
        }
    }

    /// Step the indicator is heading for while traveling
    pub fn travel_target(&self) -> Option<usize> {
        (self.phase == Phase::Traveling).then_some(self.active_step_index + 1)
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.epoch += 1;
    }
}

/// Core state plus the path fills it drives
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub core: OrchestratorState,
    pub paths: PathProgressTracker,
}

impl AnimationState {
    pub fn initial(diagram: &Diagram) -> Self {
        Self {
            core: OrchestratorState::initial(diagram.anchor(0)),
            paths: PathProgressTracker::new(diagram.connections()),
        }
    }

    /// Whether the scheduler should keep delivering frames for this phase
    pub fn wants_frames(&self) -> bool {
        match self.core.phase {
            Phase::Traveling => self.paths.is_animating(),
            Phase::Fading => self.core.indicator_opacity > 0.0,
            _ => false,
        }
    }
}

/// Drives the per-step sequence. `transition` is pure: it never touches a
/// clock and never mutates its input.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    diagram: Arc<Diagram>,
    timing: TimingConfig,
    loop_controller: LoopController,
}

impl StepSequencer {
    pub fn new(diagram: Arc<Diagram>, timing: TimingConfig) -> Self {
        let loop_controller = LoopController::new(&diagram);
        Self {
            diagram,
            timing,
            loop_controller,
        }
    }

    pub fn initial_state(&self) -> AnimationState {
        AnimationState::initial(&self.diagram)
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn loop_controller(&self) -> &LoopController {
        &self.loop_controller
    }

    pub fn transition(
        &self,
        current: &AnimationState,
        event: &AnimationEvent,
    ) -> Result<AnimationState, TransitionError> {
        if event.epoch() != current.core.epoch {
            return Err(TransitionError::StaleEvent {
                event_epoch: event.epoch(),
                current_epoch: current.core.epoch,
            });
        }

        let mut next = current.clone();
        let active = current.core.active_step_index;

        match (current.core.phase, event) {
            (Phase::Processing, AnimationEvent::PhaseElapsed { .. }) => {
                next.core.enter(Phase::Arrived);
            }

            (Phase::Arrived, AnimationEvent::PhaseElapsed { .. }) => {
                if self.loop_controller.is_terminal(active) {
                    self.loop_controller.enter_finale(&mut next.core);
                } else {
                    let target = active + 1;
                    next.paths.begin(active, target);
                    next.core.indicator_position = self.diagram.anchor(active);
                    next.core.enter(Phase::Traveling);
                }
            }

            (Phase::Traveling, AnimationEvent::Frame { elapsed, .. }) => {
                let target = active + 1;
                let t = Tween::new(self.timing.travel()).fraction(*elapsed);
                let fraction = if next.paths.is_animating() {
                    next.paths.advance(t)
                } else {
                    next.paths.progress_of(active, target).unwrap_or(t)
                };
                next.core.indicator_position =
                    interpolate(self.diagram.anchor(active), self.diagram.anchor(target), fraction);
                debug!(fraction, target, "Travel frame");
            }

            (Phase::Traveling, AnimationEvent::PhaseElapsed { .. }) => {
                let target = active + 1;
                next.paths.complete();
                next.core.active_step_index = target;
                next.core.indicator_position = self.diagram.anchor(target);
                next.core.finale = false;
                next.core.enter(Phase::SignalA);
            }

            (Phase::SignalA, AnimationEvent::PhaseElapsed { .. }) => {
                next.core.enter(Phase::SignalB);
            }

            (Phase::SignalB, AnimationEvent::PhaseElapsed { .. }) => {
                if current.core.finale {
                    next.core.enter(Phase::FinaleHold);
                } else {
                    // The terminal step also opens with PROCESSING, so arriving
                    // there needs no special case until ARRIVED elapses.
                    next.core.enter(Phase::Processing);
                }
            }

            (Phase::FinaleHold, AnimationEvent::PhaseElapsed { .. }) => {
                next.core.indicator_opacity = 1.0;
                next.core.enter(Phase::Fading);
            }

            (Phase::Fading, AnimationEvent::Frame { elapsed, .. }) => {
                let t = Tween::new(self.timing.fade()).fraction(*elapsed);
                next.core.indicator_opacity = (1.0 - t).max(0.0).min(current.core.indicator_opacity);
            }

            (Phase::Fading, AnimationEvent::PhaseElapsed { .. }) => {
                return Ok(self.loop_controller.reset(current));
            }

            (phase, event) => {
                return Err(TransitionError::InvalidTransition {
                    phase,
                    event: *event,
                });
            }
        }

        Ok(next)
    }

    /// Run the current phase to completion: a final full-length frame for
    /// animated phases, then the phase timer.
    pub fn complete_phase(&self, current: &AnimationState) -> Result<AnimationState, TransitionError> {
        let epoch = current.core.epoch;
        let mut state = current.clone();

        if current.core.phase.is_animated() {
            let elapsed = self.timing.dwell(current.core.phase);
            state = self.transition(&state, &AnimationEvent::Frame { epoch, elapsed })?;
        }
        self.transition(&state, &AnimationEvent::PhaseElapsed { epoch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::WorkflowStep;

    fn sequencer(count: usize) -> StepSequencer {
        let steps = (0..count)
            .map(|i| WorkflowStep::new(&format!("s{i}"), "Step", Point::new(i as f64 * 10.0, 0.0)))
            .collect();
        StepSequencer::new(Arc::new(Diagram::new(steps).unwrap()), TimingConfig::default())
    }

    fn elapse(sequencer: &StepSequencer, state: &AnimationState) -> AnimationState {
        let epoch = state.core.epoch;
        sequencer
            .transition(state, &AnimationEvent::PhaseElapsed { epoch })
            .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let sequencer = sequencer(3);
        let state = sequencer.initial_state();

        assert_eq!(state.core.active_step_index, 0);
        assert_eq!(state.core.phase, Phase::Processing);
        assert_eq!(state.core.indicator_opacity, 1.0);
        assert_eq!(state.core.indicator_position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_non_terminal_sequence() {
        let sequencer = sequencer(3);
        let mut state = sequencer.initial_state();

        state = elapse(&sequencer, &state);
        assert_eq!(state.core.phase, Phase::Arrived);

        state = elapse(&sequencer, &state);
        assert_eq!(state.core.phase, Phase::Traveling);
        assert_eq!(state.core.travel_target(), Some(1));
        assert_eq!(state.paths.active(), Some(0));

        state = elapse(&sequencer, &state);
        assert_eq!(state.core.phase, Phase::SignalA);
        assert_eq!(state.core.active_step_index, 1);

        state = elapse(&sequencer, &state);
        assert_eq!(state.core.phase, Phase::SignalB);

        state = elapse(&sequencer, &state);
        assert_eq!(state.core.phase, Phase::Processing);
        assert_eq!(state.core.active_step_index, 1);
    }

    #[test]
    fn test_travel_frames_move_indicator_and_fill() {
        let sequencer = sequencer(2);
        let mut state = sequencer.initial_state();
        state = elapse(&sequencer, &state);
        state = elapse(&sequencer, &state);
        let epoch = state.core.epoch;

        state = sequencer
            .transition(
                &state,
                &AnimationEvent::Frame {
                    epoch,
                    elapsed: Duration::from_millis(1250),
                },
            )
            .unwrap();

        assert_eq!(state.core.phase, Phase::Traveling);
        assert_eq!(state.core.indicator_position, Point::new(5.0, 0.0));
        assert_eq!(state.paths.progress_of(0, 1), Some(0.5));
    }

    #[test]
    fn test_stale_event_is_rejected() {
        let sequencer = sequencer(3);
        let state = sequencer.initial_state();
        let advanced = elapse(&sequencer, &state);

        let result = sequencer.transition(&advanced, &AnimationEvent::PhaseElapsed { epoch: 0 });
        assert!(matches!(
            result,
            Err(TransitionError::StaleEvent { event_epoch: 0, current_epoch: 1 })
        ));
    }

    #[test]
    fn test_frame_outside_animated_phase_is_invalid() {
        let sequencer = sequencer(3);
        let state = sequencer.initial_state();

        let result = sequencer.transition(
            &state,
            &AnimationEvent::Frame {
                epoch: 0,
                elapsed: Duration::from_millis(5),
            },
        );
        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition { phase: Phase::Processing, .. })
        ));
    }

    #[test]
    fn test_transition_does_not_mutate_input() {
        let sequencer = sequencer(3);
        let state = sequencer.initial_state();
        let snapshot = state.clone();

        let _ = elapse(&sequencer, &state);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_complete_phase_finishes_fade() {
        let sequencer = sequencer(1);
        let mut state = sequencer.initial_state();
        while state.core.phase != Phase::Fading {
            state = sequencer.complete_phase(&state).unwrap();
        }

        let epoch = state.core.epoch;
        let faded = sequencer
            .transition(
                &state,
                &AnimationEvent::Frame {
                    epoch,
                    elapsed: Duration::from_millis(500),
                },
            )
            .unwrap();
        assert_eq!(faded.core.indicator_opacity, 0.0);
        assert!(!faded.wants_frames());
    }
}
