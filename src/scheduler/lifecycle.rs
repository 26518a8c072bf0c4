use statig::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Teardown,
}

/// Coarse view of where the hosting view is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Mounted,
    Running,
    TornDown,
}

/// Mount → run → teardown. Once torn down nothing brings it back.
#[derive(Debug, Default)]
pub struct HostLifecycle {
    pub starts: u32,
}

#[state_machine(initial = "State::mounted()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl HostLifecycle {
    #[state]
    fn mounted(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Start => {
                self.starts += 1;
                info!("Workflow animation started");
                Transition(State::running())
            }
            LifecycleEvent::Teardown => {
                info!("Workflow animation torn down before start");
                Transition(State::torn_down())
            }
        }
    }

    #[state]
    fn running(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Start => Handled,
            LifecycleEvent::Teardown => {
                info!("Workflow animation torn down");
                Transition(State::torn_down())
            }
        }
    }

    #[state]
    fn torn_down(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        debug!(event = ?event, "Ignoring lifecycle event after teardown");
        Handled
    }
}

/// Shared liveness check for everything the scheduler runs.
///
/// Mutations go through `run_if_live`, which holds the lock for the duration
/// of the write; `teardown` takes the same lock, so once it returns no
/// callback scheduled before it can touch state.
#[derive(Clone)]
pub struct LivenessGate {
    machine: Arc<Mutex<StateMachine<HostLifecycle>>>,
}

impl std::fmt::Debug for LivenessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessGate")
            .field("phase", &self.phase())
            .finish()
    }
}

impl Default for LivenessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessGate {
    pub fn new() -> Self {
        Self {
            machine: Arc::new(Mutex::new(HostLifecycle::default().state_machine())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateMachine<HostLifecycle>> {
        // A panic while holding the lock cannot leave the lifecycle half-updated
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn start(&self) {
        self.lock().handle(&LifecycleEvent::Start);
    }

    /// Returns false when the gate was already torn down
    pub fn teardown(&self) -> bool {
        let mut machine = self.lock();
        let was_live = !matches!(machine.state(), State::TornDown {});
        machine.handle(&LifecycleEvent::Teardown);
        was_live
    }

    pub fn phase(&self) -> LifecyclePhase {
        match self.lock().state() {
            State::Mounted {} => LifecyclePhase::Mounted,
            State::Running {} => LifecyclePhase::Running,
            State::TornDown {} => LifecyclePhase::TornDown,
        }
    }

    pub fn is_live(&self) -> bool {
        self.phase() == LifecyclePhase::Running
    }

    pub fn run_if_live<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let machine = self.lock();
        if matches!(machine.state(), State::Running {}) {
            Some(f())
        } else {
            None
        }
    }
}
