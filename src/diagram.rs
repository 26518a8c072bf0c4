//! Workflow diagram model
//!
//! The diagram is the static half of the animation: an ordered list of steps,
//! each pinned to an anchor in diagram space, plus the connections derived
//! from adjacent pairs. It is validated once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// A coordinate in the diagram's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One node of the workflow diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Glyph shown on the indicator once it settles on this step
    #[serde(default = "default_icon")]
    pub icon: String,
    pub anchor: Point,
}

fn default_icon() -> String {
    "circle".to_string()
}

impl WorkflowStep {
    pub fn new(id: &str, title: &str, anchor: Point) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            icon: default_icon(),
            anchor,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }
}

/// Directed link between two adjacent steps in travel order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connection {
    pub from_index: usize,
    pub to_index: usize,
    pub from: Point,
    pub to: Point,
    pub progress: f64,
}

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("Workflow diagram needs at least one step")]
    EmptyStepList,
    #[error("Duplicate step id: {0}")]
    DuplicateStepId(String),
    #[error("Step {id} has a non-finite anchor")]
    NonFiniteAnchor { id: String },
    #[error("Failed to read step file {path}: {source}")]
    StepFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse step file {path}: {source}")]
    StepFileParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Validated, immutable step list
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    steps: Vec<WorkflowStep>,
}

impl Diagram {
    pub fn new(steps: Vec<WorkflowStep>) -> Result<Self, DiagramError> {
        if steps.is_empty() {
            return Err(DiagramError::EmptyStepList);
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(DiagramError::DuplicateStepId(step.id.clone()));
            }
            if !step.anchor.is_finite() {
                return Err(DiagramError::NonFiniteAnchor {
                    id: step.id.clone(),
                });
            }
        }

        if steps.len() == 1 {
            warn!(
                step_id = %steps[0].id,
                "Single-step diagram: travel is disabled and the finale loops forever"
            );
        }

        Ok(Self { steps })
    }

    /// Load a step list from a TOML file with a `[[steps]]` array
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, DiagramError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| DiagramError::StepFileRead {
            path: shown.clone(),
            source,
        })?;
        let diagram = Self::parse_steps(&content, &shown)?;

        info!(path = %shown, steps = diagram.len(), "Loaded workflow steps");
        Ok(diagram)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DiagramError> {
        Self::parse_steps(content, "<inline>")
    }

    fn parse_steps(content: &str, path: &str) -> Result<Self, DiagramError> {
        #[derive(Deserialize)]
        struct StepFile {
            steps: Vec<WorkflowStep>,
        }

        let file: StepFile =
            toml::from_str(content).map_err(|source| DiagramError::StepFileParse {
                path: path.to_string(),
                source,
            })?;
        Self::new(file.steps)
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&WorkflowStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Travel needs an origin and a distinct terminal step
    pub fn supports_travel(&self) -> bool {
        self.steps.len() >= 2
    }

    pub fn anchor(&self, index: usize) -> Point {
        self.steps[index.min(self.last_index())].anchor
    }

    /// Connections in travel order, including the wrap-around from the last
    /// step back to the first. Single-step diagrams have none.
    pub fn connections(&self) -> Vec<Connection> {
        if !self.supports_travel() {
            return Vec::new();
        }

        let count = self.steps.len();
        (0..count)
            .map(|from_index| {
                let to_index = (from_index + 1) % count;
                Connection {
                    from_index,
                    to_index,
                    from: self.steps[from_index].anchor,
                    to: self.steps[to_index].anchor,
                    progress: 0.0,
                }
            })
            .collect()
    }

    /// The four-stage pipeline shown on the landing page
    pub fn builtin() -> Self {
        Self {
            steps: vec![
                WorkflowStep::new("collect", "Collect", Point::new(80.0, 120.0))
                    .with_description("Pull raw events from connected sources")
                    .with_icon("database"),
                WorkflowStep::new("clean", "Clean", Point::new(280.0, 60.0))
                    .with_description("Deduplicate and normalise records")
                    .with_icon("filter"),
                WorkflowStep::new("analyze", "Analyze", Point::new(480.0, 120.0))
                    .with_description("Aggregate metrics and detect trends")
                    .with_icon("chart"),
                WorkflowStep::new("report", "Report", Point::new(680.0, 60.0))
                    .with_description("Publish insights to the dashboard")
                    .with_icon("document"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_steps() -> Vec<WorkflowStep> {
        vec![
            WorkflowStep::new("a", "A", Point::new(0.0, 0.0)),
            WorkflowStep::new("b", "B", Point::new(10.0, 0.0)),
            WorkflowStep::new("c", "C", Point::new(20.0, 0.0)),
        ]
    }

    #[test]
    fn test_empty_step_list_is_rejected() {
        assert!(matches!(
            Diagram::new(vec![]),
            Err(DiagramError::EmptyStepList)
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut steps = three_steps();
        steps[2].id = "a".to_string();
        assert!(matches!(
            Diagram::new(steps),
            Err(DiagramError::DuplicateStepId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_non_finite_anchor_is_rejected() {
        let mut steps = three_steps();
        steps[1].anchor = Point::new(f64::NAN, 0.0);
        assert!(matches!(
            Diagram::new(steps),
            Err(DiagramError::NonFiniteAnchor { id }) if id == "b"
        ));
    }

    #[test]
    fn test_connections_wrap_around() {
        let diagram = Diagram::new(three_steps()).unwrap();
        let connections = diagram.connections();

        assert_eq!(connections.len(), 3);
        assert_eq!((connections[0].from_index, connections[0].to_index), (0, 1));
        assert_eq!((connections[1].from_index, connections[1].to_index), (1, 2));
        assert_eq!((connections[2].from_index, connections[2].to_index), (2, 0));
        assert_eq!(connections[2].to, Point::new(0.0, 0.0));
        assert!(connections.iter().all(|c| c.progress == 0.0));
    }

    #[test]
    fn test_single_step_has_no_connections() {
        let diagram = Diagram::new(vec![WorkflowStep::new("solo", "Solo", Point::new(5.0, 5.0))])
            .unwrap();
        assert!(!diagram.supports_travel());
        assert!(diagram.connections().is_empty());
        assert_eq!(diagram.last_index(), 0);
    }

    #[test]
    fn test_steps_parse_from_toml() {
        let content = r#"
            [[steps]]
            id = "ingest"
            title = "Ingest"
            icon = "upload"
            anchor = { x = 0.0, y = 10.0 }

            [[steps]]
            id = "ship"
            title = "Ship"
            description = "Deliver"
            anchor = { x = 50.0, y = 10.0 }
        "#;

        let diagram = Diagram::from_toml_str(content).unwrap();
        assert_eq!(diagram.len(), 2);
        assert_eq!(diagram.steps()[0].icon, "upload");
        assert_eq!(diagram.steps()[1].icon, "circle");
        assert_eq!(diagram.anchor(1), Point::new(50.0, 10.0));
    }

    #[test]
    fn test_steps_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[[steps]]\nid = \"only\"\ntitle = \"Only\"\nanchor = {{ x = 1.0, y = 2.0 }}"
        )
        .unwrap();

        let diagram = Diagram::from_toml_file(file.path()).unwrap();
        assert_eq!(diagram.len(), 1);
        assert_eq!(diagram.anchor(0), Point::new(1.0, 2.0));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Diagram::from_toml_file(&missing),
            Err(DiagramError::StepFileRead { .. })
        ));
    }

    #[test]
    fn test_builtin_diagram_is_valid() {
        let builtin = Diagram::builtin();
        assert_eq!(Diagram::new(builtin.steps().to_vec()).unwrap(), builtin);
    }
}
