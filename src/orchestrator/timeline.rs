//! Deterministic schedule of one full loop, computed from the transition
//! function alone. Used by the `timeline` command and handy for checking a
//! timing configuration without waiting on real timers.

use serde::Serialize;

use super::sequencer::{Phase, StepSequencer, TransitionError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub phase: Phase,
    pub active_step_index: usize,
    pub step_id: String,
}

/// Phases of one loop, from the initial PROCESSING up to the reset
pub fn cycle_timeline(sequencer: &StepSequencer) -> Result<Vec<TimelineEntry>, TransitionError> {
    let diagram = sequencer.diagram();
    let timing = sequencer.timing();
    // Five phases per step plus the finale, with slack
    let max_phases = diagram.len() * 5 + 8;

    let mut state = sequencer.initial_state();
    let start_cycle = state.core.cycle;
    let mut offset_ms = 0;
    let mut entries = Vec::new();

    for _ in 0..max_phases {
        let duration_ms = timing.dwell(state.core.phase).as_millis() as u64;
        entries.push(TimelineEntry {
            offset_ms,
            duration_ms,
            phase: state.core.phase,
            active_step_index: state.core.active_step_index,
            step_id: diagram
                .step(state.core.active_step_index)
                .map(|step| step.id.clone())
                .unwrap_or_default(),
        });
        offset_ms += duration_ms;

        state = sequencer.complete_phase(&state)?;
        if state.core.cycle != start_cycle {
            break;
        }
    }

    Ok(entries)
}

pub fn cycle_duration_ms(entries: &[TimelineEntry]) -> u64 {
    entries.iter().map(|e| e.duration_ms).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::diagram::{Diagram, Point, WorkflowStep};
    use std::sync::Arc;

    #[test]
    fn test_two_step_timeline() {
        let diagram = Diagram::new(vec![
            WorkflowStep::new("a", "A", Point::new(0.0, 0.0)),
            WorkflowStep::new("b", "B", Point::new(10.0, 0.0)),
        ])
        .unwrap();
        let sequencer = StepSequencer::new(Arc::new(diagram), TimingConfig::default());

        let entries = cycle_timeline(&sequencer).unwrap();
        let phases: Vec<Phase> = entries.iter().map(|e| e.phase).collect();

        assert_eq!(
            phases,
            vec![
                Phase::Processing,
                Phase::Arrived,
                Phase::Traveling,
                Phase::SignalA,
                Phase::SignalB,
                Phase::Processing,
                Phase::Arrived,
                Phase::SignalA,
                Phase::SignalB,
                Phase::FinaleHold,
                Phase::Fading,
            ]
        );
        assert_eq!(entries[5].step_id, "b");
        assert_eq!(entries[2].offset_ms, 1600);
        assert_eq!(cycle_duration_ms(&entries), 900 + 700 + 2500 + 3000 + 500 + 900 + 700 + 3000 + 500 + 2000 + 500);
    }
}
