use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, Instrument};

use crate::observability::AnimationMetrics;
use crate::orchestrator::{AnimationEvent, RenderState, WorkflowOrchestrator};
use crate::telemetry::{create_animation_span, generate_correlation_id};

use super::lifecycle::LivenessGate;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("No tokio runtime available to drive the animation")]
    NoRuntime,
    #[error("Orchestrator has been torn down")]
    TornDown,
    #[error("Invalid timing configuration: {0}")]
    InvalidTiming(String),
}

#[derive(Debug)]
enum DriverCommand {
    Restart,
}

enum Wake {
    Command(Option<DriverCommand>),
    PhaseDone,
}

/// Owner-side view of a running orchestrator.
///
/// Dropping the handle tears the orchestrator down.
pub struct OrchestratorHandle {
    render_rx: watch::Receiver<RenderState>,
    commands: mpsc::UnboundedSender<DriverCommand>,
    gate: LivenessGate,
    task: Option<JoinHandle<()>>,
    metrics: Arc<AnimationMetrics>,
    correlation_id: String,
}

impl std::fmt::Debug for OrchestratorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorHandle")
            .field("correlation_id", &self.correlation_id)
            .field("gate", &self.gate)
            .field("task", &self.task.is_some())
            .finish()
    }
}

/// Start driving `orchestrator` on the current tokio runtime
pub fn spawn(orchestrator: WorkflowOrchestrator) -> Result<OrchestratorHandle, DriverError> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| DriverError::NoRuntime)?;
    orchestrator
        .sequencer()
        .timing()
        .validate()
        .map_err(|e| DriverError::InvalidTiming(e.to_string()))?;

    let correlation_id = generate_correlation_id();
    let metrics = orchestrator.metrics();
    let (render_tx, render_rx) = watch::channel(orchestrator.render());
    let (commands, command_rx) = mpsc::unbounded_channel();

    let gate = LivenessGate::new();
    gate.start();

    let span = create_animation_span(orchestrator.diagram().len(), &correlation_id);
    let task = runtime.spawn(run(orchestrator, render_tx, command_rx, gate.clone()).instrument(span));

    info!(correlation_id = %correlation_id, "Workflow animation scheduled");

    Ok(OrchestratorHandle {
        render_rx,
        commands,
        gate,
        task: Some(task),
        metrics,
        correlation_id,
    })
}

impl OrchestratorHandle {
    /// Receiver that wakes on every published render state
    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.render_rx.clone()
    }

    pub fn snapshot(&self) -> RenderState {
        self.render_rx.borrow().clone()
    }

    /// Abandon the current phase and start over from step 0
    pub fn restart(&self) -> Result<(), DriverError> {
        if !self.gate.is_live() {
            return Err(DriverError::TornDown);
        }
        self.commands
            .send(DriverCommand::Restart)
            .map_err(|_| DriverError::TornDown)
    }

    /// Cancel every pending timer and frame. Safe to call more than once.
    pub fn teardown(&mut self) {
        let was_live = self.gate.teardown();
        if let Some(task) = self.task.take() {
            task.abort();
        }

        if was_live {
            self.metrics.record_teardown();
            info!(correlation_id = %self.correlation_id, "Workflow animation stopped");
        }
    }

    pub fn is_live(&self) -> bool {
        self.gate.is_live()
    }

    pub fn metrics(&self) -> Arc<AnimationMetrics> {
        self.metrics.clone()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl Drop for OrchestratorHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run(
    mut orchestrator: WorkflowOrchestrator,
    render_tx: watch::Sender<RenderState>,
    mut commands: mpsc::UnboundedReceiver<DriverCommand>,
    gate: LivenessGate,
) {
    loop {
        // Whichever branch loses is dropped here, taking its timers with it
        let wake = tokio::select! {
            biased;
            command = commands.recv() => Wake::Command(command),
            () = drive_phase(&mut orchestrator, &render_tx, &gate) => Wake::PhaseDone,
        };

        match wake {
            Wake::Command(Some(DriverCommand::Restart)) => {
                let restarted = gate.run_if_live(|| {
                    orchestrator.restart();
                    render_tx.send_replace(orchestrator.render());
                });
                if restarted.is_none() {
                    break;
                }
            }
            Wake::Command(None) => {
                debug!("Orchestrator handle dropped");
                break;
            }
            Wake::PhaseDone => {
                if !gate.is_live() {
                    break;
                }
            }
        }
    }
}

/// Run the current phase: frames while the state asks for them, then the
/// phase timer.
async fn drive_phase(
    orchestrator: &mut WorkflowOrchestrator,
    render_tx: &watch::Sender<RenderState>,
    gate: &LivenessGate,
) {
    let epoch = orchestrator.epoch();
    let started = Instant::now();
    let deadline = started + orchestrator.dwell();

    if orchestrator.wants_frames() {
        let mut frames = tokio::time::interval(orchestrator.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while orchestrator.wants_frames() {
            // The last frame lands on the deadline, not on the tick after it
            let elapsed = tokio::select! {
                biased;
                () = tokio::time::sleep_until(deadline) => orchestrator.dwell(),
                _ = frames.tick() => started.elapsed(),
            };
            let event = AnimationEvent::Frame { epoch, elapsed };
            if apply(orchestrator, event, render_tx, gate).is_none() {
                return;
            }
        }
    }

    tokio::time::sleep_until(deadline).await;
    apply(orchestrator, AnimationEvent::PhaseElapsed { epoch }, render_tx, gate);
}

fn apply(
    orchestrator: &mut WorkflowOrchestrator,
    event: AnimationEvent,
    render_tx: &watch::Sender<RenderState>,
    gate: &LivenessGate,
) -> Option<()> {
    gate.run_if_live(|| {
        if orchestrator.handle(event).is_ok() {
            render_tx.send_replace(orchestrator.render());
        }
    })
}
