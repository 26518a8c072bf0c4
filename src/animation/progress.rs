use crate::diagram::Connection;
use tracing::debug;

/// Fill fraction for every connection of the diagram.
///
/// Only one connection animates at a time. Completed connections keep their
/// fill until `reset`, which the loop controller calls once per cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PathProgressTracker {
    connections: Vec<Connection>,
    active: Option<usize>,
}

impl PathProgressTracker {
    pub fn new(connections: Vec<Connection>) -> Self {
        Self {
            connections,
            active: None,
        }
    }

    /// Select the connection for the travel `from_index -> to_index` and start
    /// ticking it. Returns the connection's position in the list.
    pub fn begin(&mut self, from_index: usize, to_index: usize) -> Option<usize> {
        let selected = self
            .connections
            .iter()
            .position(|c| c.from_index == from_index && c.to_index == to_index);

        if let Some(index) = selected {
            debug!(connection = index, from_index, to_index, "Path fill started");
        }
        self.active = selected;
        selected
    }

    /// Apply one frame. Progress never decreases and is capped at 1; the
    /// tracker stops asking for frames once the fill is complete.
    pub fn advance(&mut self, fraction: f64) -> f64 {
        let Some(index) = self.active else {
            return 0.0;
        };

        let connection = &mut self.connections[index];
        let next = if fraction.is_nan() { 0.0 } else { fraction.min(1.0) };
        connection.progress = connection.progress.max(next);

        let progress = connection.progress;
        if progress >= 1.0 {
            self.active = None;
        }
        progress
    }

    /// Force the active connection to full and stop ticking it
    pub fn complete(&mut self) {
        if let Some(index) = self.active.take() {
            self.connections[index].progress = 1.0;
        }
    }

    /// Stop ticking without touching any fill
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Clear every fill back to zero
    pub fn reset(&mut self) {
        self.active = None;
        for connection in &mut self.connections {
            connection.progress = 0.0;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn progress_of(&self, from_index: usize, to_index: usize) -> Option<f64> {
        self.connections
            .iter()
            .find(|c| c.from_index == from_index && c.to_index == to_index)
            .map(|c| c.progress)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}
