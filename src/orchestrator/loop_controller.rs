use tracing::info;

use crate::diagram::{Diagram, Point};

use super::sequencer::{AnimationState, OrchestratorState, Phase};

/// Owns the end of the loop: spotting the terminal step, switching into the
/// finale and rebuilding the initial state once the fade is done.
#[derive(Debug, Clone)]
pub struct LoopController {
    last_index: usize,
    origin: Point,
}

impl LoopController {
    pub fn new(diagram: &Diagram) -> Self {
        Self {
            last_index: diagram.last_index(),
            origin: diagram.anchor(0),
        }
    }

    pub fn last_index(&self) -> usize {
        self.last_index
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.last_index
    }

    /// Replace the travel that would follow ARRIVED with the finale signals
    pub fn enter_finale(&self, core: &mut OrchestratorState) {
        info!(
            step = core.active_step_index,
            cycle = core.cycle,
            "Terminal step reached, playing finale"
        );
        core.finale = true;
        core.enter(Phase::SignalA);
    }

    /// Build the initial state for the next cycle in one step.
    ///
    /// Pending path ticks are cancelled before anything is cleared, so a reset
    /// that lands mid-travel leaves nothing for a late frame to write into.
    /// The epoch keeps counting across the reset for the same reason.
    pub fn reset(&self, current: &AnimationState) -> AnimationState {
        let mut paths = current.paths.clone();
        paths.cancel();
        paths.reset();

        let mut core = OrchestratorState::initial(self.origin);
        core.epoch = current.core.epoch + 1;
        core.cycle = current.core.cycle + 1;

        info!(
            completed_cycle = current.core.cycle,
            interrupted_phase = %current.core.phase,
            "Workflow loop reset"
        );

        AnimationState { core, paths }
    }
}
