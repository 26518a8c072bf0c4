use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize tracing for the binary.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so the
/// render stream on stdout stays machine-readable.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    if config.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init()?;
    }

    tracing::debug!("Workflow animator telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking everything one orchestrator logs
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping the lifetime of one driven orchestrator
pub fn create_animation_span(step_count: usize, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "workflow_animation",
        steps = step_count,
        correlation.id = correlation_id,
    )
}
