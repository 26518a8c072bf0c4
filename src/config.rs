use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::orchestrator::Phase;

/// Main configuration structure for the workflow animator
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Phase durations and frame cadence
    pub timing: TimingConfig,
    /// Colors and glyph names handed to the presentation layer
    pub render: RenderConfig,
    /// Logging and history settings
    pub observability: ObservabilityConfig,
    /// Where the step list comes from
    pub diagram: DiagramConfig,
}

/// Phase durations in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub processing_ms: u64,
    pub arrived_ms: u64,
    pub travel_ms: u64,
    pub signal_a_ms: u64,
    pub signal_b_ms: u64,
    pub finale_hold_ms: u64,
    pub fade_ms: u64,
    /// Cadence of the frame loop during animated phases
    pub frame_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            processing_ms: 900,
            arrived_ms: 700,
            travel_ms: 2500,
            signal_a_ms: 3000,
            signal_b_ms: 500,
            finale_hold_ms: 2000,
            fade_ms: 500,
            frame_interval_ms: 16, // ~60fps
        }
    }
}

impl TimingConfig {
    /// Uniform short durations for test harnesses
    pub fn uniform(phase_ms: u64, frame_interval_ms: u64) -> Self {
        Self {
            processing_ms: phase_ms,
            arrived_ms: phase_ms,
            travel_ms: phase_ms,
            signal_a_ms: phase_ms,
            signal_b_ms: phase_ms,
            finale_hold_ms: phase_ms,
            fade_ms: phase_ms,
            frame_interval_ms,
        }
    }

    /// How long a phase lasts before its timer fires
    pub fn dwell(&self, phase: Phase) -> Duration {
        let ms = match phase {
            Phase::Processing => self.processing_ms,
            Phase::Arrived => self.arrived_ms,
            Phase::Traveling => self.travel_ms,
            Phase::SignalA => self.signal_a_ms,
            Phase::SignalB => self.signal_b_ms,
            Phase::FinaleHold => self.finale_hold_ms,
            Phase::Fading => self.fade_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn travel(&self) -> Duration {
        Duration::from_millis(self.travel_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 {
            bail!("timing.frame_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Status light color while the first signal phase runs
    pub signal_a_color: String,
    /// Status light color while the second signal phase runs
    pub signal_b_color: String,
    pub spinner_glyph: String,
    pub check_glyph: String,
    pub finale_glyph: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            signal_a_color: "#f59e0b".to_string(),
            signal_b_color: "#22c55e".to_string(),
            spinner_glyph: "spinner".to_string(),
            check_glyph: "check".to_string(),
            finale_glyph: "sparkles".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable output
    pub json_logs: bool,
    /// Number of phase transitions kept for inspection
    pub history_limit: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            history_limit: 64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// TOML file with a `[[steps]]` array; the built-in diagram is used when unset
    pub steps_file: Option<String>,
}

impl AnimatorConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`workflow-animator.toml`, or `path` when given)
    /// 3. Environment variables (prefixed with WORKFLOW_ANIMATOR__)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new("workflow-animator.toml").exists() {
                    builder = builder.add_source(File::with_name("workflow-animator"));
                }
            }
        }

        // WORKFLOW_ANIMATOR__TIMING__TRAVEL_MS=1200
        builder = builder.add_source(
            Environment::with_prefix("WORKFLOW_ANIMATOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AnimatorConfig = builder.build()?.try_deserialize()?;
        config.timing.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
