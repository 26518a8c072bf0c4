use serde::Serialize;

use crate::diagram::Diagram;

use super::sequencer::{OrchestratorState, Phase};

/// Which half of the two-stage blink is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalColor {
    A,
    B,
}

/// Status light for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLight {
    pub step_id: String,
    pub is_showing_signal: bool,
    pub signal_color: Option<SignalColor>,
}

/// Blink shown on the destination of the last travel. Only the signal phases
/// light anything, and then only the active step, so at most one light is on.
pub struct StatusIndicator;

impl StatusIndicator {
    pub fn active_signal(state: &OrchestratorState) -> Option<(usize, SignalColor)> {
        let color = match state.phase {
            Phase::SignalA => SignalColor::A,
            Phase::SignalB => SignalColor::B,
            _ => return None,
        };
        Some((state.active_step_index, color))
    }

    pub fn lights(diagram: &Diagram, state: &OrchestratorState) -> Vec<StatusLight> {
        let signal = Self::active_signal(state);

        diagram
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let color = signal.and_then(|(lit, color)| (lit == index).then_some(color));
                StatusLight {
                    step_id: step.id.clone(),
                    is_showing_signal: color.is_some(),
                    signal_color: color,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Point, WorkflowStep};

    fn diagram() -> Diagram {
        Diagram::new(vec![
            WorkflowStep::new("a", "A", Point::new(0.0, 0.0)),
            WorkflowStep::new("b", "B", Point::new(10.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_signal_phases_light_active_step() {
        let diagram = diagram();
        let mut state = OrchestratorState::initial(Point::new(10.0, 0.0));
        state.active_step_index = 1;

        state.phase = Phase::SignalA;
        let lights = StatusIndicator::lights(&diagram, &state);
        assert!(!lights[0].is_showing_signal);
        assert_eq!(lights[1].signal_color, Some(SignalColor::A));

        state.phase = Phase::SignalB;
        let lights = StatusIndicator::lights(&diagram, &state);
        assert_eq!(lights[1].signal_color, Some(SignalColor::B));
    }

    #[test]
    fn test_other_phases_show_nothing() {
        let diagram = diagram();
        let mut state = OrchestratorState::initial(Point::new(0.0, 0.0));

        for phase in [
            Phase::Processing,
            Phase::Arrived,
            Phase::Traveling,
            Phase::FinaleHold,
            Phase::Fading,
        ] {
            state.phase = phase;
            let lights = StatusIndicator::lights(&diagram, &state);
            assert!(lights.iter().all(|l| !l.is_showing_signal), "{phase} lit a step");
        }
    }
}
