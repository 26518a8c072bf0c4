use serde::Serialize;

use crate::config::RenderConfig;
use crate::diagram::Diagram;

use super::sequencer::{AnimationState, Phase};
use super::status::{SignalColor, StatusIndicator};

/// What the moving indicator displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Spinner,
    Check,
    /// Icon of the step the indicator is heading for or settled on
    StepIcon(String),
    Finale,
}

impl Glyph {
    pub fn for_state(diagram: &Diagram, state: &AnimationState) -> Self {
        let core = &state.core;
        match core.phase {
            Phase::Processing => Glyph::Spinner,
            Phase::Arrived => Glyph::Check,
            Phase::Traveling | Phase::SignalA | Phase::SignalB => {
                let destination = core.travel_target().unwrap_or(core.active_step_index);
                let icon = diagram
                    .step(destination)
                    .map(|step| step.icon.clone())
                    .unwrap_or_default();
                Glyph::StepIcon(icon)
            }
            Phase::FinaleHold | Phase::Fading => Glyph::Finale,
        }
    }

    /// Name the presentation layer uses to pick an asset
    pub fn name<'a>(&'a self, render: &'a RenderConfig) -> &'a str {
        match self {
            Glyph::Spinner => render.spinner_glyph.as_str(),
            Glyph::Check => render.check_glyph.as_str(),
            Glyph::StepIcon(icon) => icon.as_str(),
            Glyph::Finale => render.finale_glyph.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLightView {
    pub step_id: String,
    pub is_showing_signal: bool,
    pub signal_color: Option<SignalColor>,
    /// Resolved CSS color for the lit phase
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorView {
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub glyph: Glyph,
    pub glyph_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionView {
    pub from_step: String,
    pub to_step: String,
    pub progress: f64,
}

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderState {
    pub cycle: u64,
    pub phase: Phase,
    pub active_step_index: usize,
    pub status_lights: Vec<StatusLightView>,
    pub indicator: IndicatorView,
    pub connections: Vec<ConnectionView>,
}

impl RenderState {
    pub fn from_state(diagram: &Diagram, render: &RenderConfig, state: &AnimationState) -> Self {
        let core = &state.core;

        let status_lights = StatusIndicator::lights(diagram, core)
            .into_iter()
            .map(|light| StatusLightView {
                color: light.signal_color.map(|color| match color {
                    SignalColor::A => render.signal_a_color.clone(),
                    SignalColor::B => render.signal_b_color.clone(),
                }),
                step_id: light.step_id,
                is_showing_signal: light.is_showing_signal,
                signal_color: light.signal_color,
            })
            .collect();

        let glyph = Glyph::for_state(diagram, state);
        let indicator = IndicatorView {
            x: core.indicator_position.x,
            y: core.indicator_position.y,
            opacity: core.indicator_opacity,
            glyph_name: glyph.name(render).to_string(),
            glyph,
        };

        let connections = state
            .paths
            .connections()
            .iter()
            .map(|c| ConnectionView {
                from_step: step_id(diagram, c.from_index),
                to_step: step_id(diagram, c.to_index),
                progress: c.progress,
            })
            .collect();

        Self {
            cycle: core.cycle,
            phase: core.phase,
            active_step_index: core.active_step_index,
            status_lights,
            indicator,
            connections,
        }
    }

    pub fn signaling_steps(&self) -> usize {
        self.status_lights.iter().filter(|l| l.is_showing_signal).count()
    }

    pub fn connection_progress(&self, from_step: &str, to_step: &str) -> Option<f64> {
        self.connections
            .iter()
            .find(|c| c.from_step == from_step && c.to_step == to_step)
            .map(|c| c.progress)
    }
}

fn step_id(diagram: &Diagram, index: usize) -> String {
    diagram
        .step(index)
        .map(|step| step.id.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Point, WorkflowStep};

    fn diagram() -> Diagram {
        Diagram::new(vec![
            WorkflowStep::new("a", "A", Point::new(0.0, 0.0)).with_icon("inbox"),
            WorkflowStep::new("b", "B", Point::new(10.0, 0.0)).with_icon("gear"),
        ])
        .unwrap()
    }

    #[test]
    fn test_glyph_follows_phase() {
        let diagram = diagram();
        let mut state = AnimationState::initial(&diagram);

        assert_eq!(Glyph::for_state(&diagram, &state), Glyph::Spinner);

        state.core.phase = Phase::Arrived;
        assert_eq!(Glyph::for_state(&diagram, &state), Glyph::Check);

        state.core.phase = Phase::Traveling;
        assert_eq!(
            Glyph::for_state(&diagram, &state),
            Glyph::StepIcon("gear".to_string())
        );

        state.core.phase = Phase::FinaleHold;
        assert_eq!(Glyph::for_state(&diagram, &state), Glyph::Finale);
    }

    #[test]
    fn test_render_resolves_colors_and_connections() {
        let diagram = diagram();
        let render = RenderConfig::default();
        let mut state = AnimationState::initial(&diagram);
        state.core.active_step_index = 1;
        state.core.phase = Phase::SignalA;
        state.paths.begin(0, 1);
        state.paths.complete();

        let view = RenderState::from_state(&diagram, &render, &state);

        assert_eq!(view.signaling_steps(), 1);
        assert_eq!(view.status_lights[1].color.as_deref(), Some("#f59e0b"));
        assert_eq!(view.connection_progress("a", "b"), Some(1.0));
        assert_eq!(view.connection_progress("b", "a"), Some(0.0));
        assert_eq!(view.indicator.glyph_name, "gear");
    }

    #[test]
    fn test_render_serializes_for_presentation_layer() {
        let diagram = diagram();
        let state = AnimationState::initial(&diagram);
        let view = RenderState::from_state(&diagram, &RenderConfig::default(), &state);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["phase"], "PROCESSING");
        assert_eq!(json["indicator"]["glyph"], "spinner");
        assert_eq!(json["indicator"]["opacity"], 1.0);
    }
}
