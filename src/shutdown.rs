use anyhow::Result;
use std::future::Future;
use tracing::{info, warn};

use crate::scheduler::OrchestratorHandle;

/// Why the binary stopped animating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Completed,
    Interrupted,
}

/// Graceful shutdown coordinator: runs the work until it finishes or Ctrl-C
/// arrives, then tears the orchestrator down and reports its metrics.
pub struct ShutdownCoordinator {
    handle: OrchestratorHandle,
}

impl ShutdownCoordinator {
    pub fn new(handle: OrchestratorHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &OrchestratorHandle {
        &self.handle
    }

    pub async fn run_until_shutdown<F>(mut self, work: F) -> Result<ShutdownReason>
    where
        F: Future<Output = Result<()>>,
    {
        let outcome = tokio::select! {
            result = work => result.map(|()| ShutdownReason::Completed),
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupt received, stopping animation");
                Ok(ShutdownReason::Interrupted)
            }
        };

        // Teardown runs even when the work failed
        self.shutdown();
        outcome
    }

    fn shutdown(&mut self) {
        self.handle.teardown();
        self.handle.metrics().log_stats();
        info!(reason = "shutdown", "Graceful shutdown completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimatorConfig;
    use crate::diagram::Diagram;
    use crate::orchestrator::WorkflowOrchestrator;
    use crate::scheduler::spawn;

    fn coordinator() -> ShutdownCoordinator {
        let orchestrator = WorkflowOrchestrator::new(Diagram::builtin(), &AnimatorConfig::default());
        ShutdownCoordinator::new(spawn(orchestrator).unwrap())
    }

    #[tokio::test]
    async fn test_completed_work_tears_down() {
        let coordinator = coordinator();
        let metrics = coordinator.handle().metrics();

        let reason = coordinator.run_until_shutdown(std::future::ready(Ok(()))).await.unwrap();
        assert_eq!(reason, ShutdownReason::Completed);
        assert_eq!(metrics.get_stats().teardowns, 1);
    }

    #[tokio::test]
    async fn test_failed_work_still_tears_down() {
        let coordinator = coordinator();
        let metrics = coordinator.handle().metrics();

        let result = coordinator
            .run_until_shutdown(std::future::ready(Err(anyhow::anyhow!("render sink closed"))))
            .await;

        assert_eq!(result.unwrap_err().to_string(), "render sink closed");
        assert_eq!(metrics.get_stats().teardowns, 1);
    }
}
