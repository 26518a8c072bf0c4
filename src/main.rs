use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use workflow_animator::orchestrator::timeline::cycle_duration_ms;
use workflow_animator::{
    cycle_timeline, init_telemetry, spawn, AnimatorConfig, Diagram, RenderState,
    ShutdownCoordinator, ShutdownReason, StepSequencer, WorkflowOrchestrator,
};

#[derive(Parser)]
#[command(name = "workflow-animator")]
#[command(about = "Looping workflow diagram animation, rendered headless")]
#[command(long_about = "Drives the workflow diagram animation: an indicator that processes each step, \
                       travels along the connecting path, blinks on arrival and fades out after the last \
                       step before the loop starts again. Render states are printed as text or JSON lines.")]
struct Cli {
    /// Configuration file (defaults to ./workflow-animator.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// TOML file with a [[steps]] array (defaults to the built-in diagram)
    #[arg(long, global = true)]
    steps: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the animation in real time and print render states
    Run {
        #[arg(long, default_value = "1", help = "Stop after this many completed loops (0 runs until Ctrl-C)")]
        cycles: u64,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the phase schedule of one loop without waiting on timers
    Timeline {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to this path instead of printing it
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    AnimatorConfig::load_env_file()?;
    let config = AnimatorConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    match cli.command {
        Commands::Run { cycles, format } => {
            let diagram = load_diagram(cli.steps.as_deref(), &config)?;
            tokio::runtime::Runtime::new()?.block_on(async {
                run_command(diagram, &config, cycles, format).await
            })
        }
        Commands::Timeline { format } => {
            let diagram = load_diagram(cli.steps.as_deref(), &config)?;
            timeline_command(diagram, &config, format)
        }
        Commands::Config { init } => config_command(&config, init.as_deref()),
    }
}

fn load_diagram(steps: Option<&Path>, config: &AnimatorConfig) -> Result<Diagram> {
    let path = steps
        .map(Path::to_path_buf)
        .or_else(|| config.diagram.steps_file.as_ref().map(PathBuf::from));

    match path {
        Some(path) => Diagram::from_toml_file(&path)
            .with_context(|| format!("Could not load workflow steps from {}", path.display())),
        None => Ok(Diagram::builtin()),
    }
}

async fn run_command(
    diagram: Diagram,
    config: &AnimatorConfig,
    cycles: u64,
    format: OutputFormat,
) -> Result<()> {
    let orchestrator = WorkflowOrchestrator::new(diagram, config);
    let handle = spawn(orchestrator)?;
    let renders = handle.subscribe();
    let coordinator = ShutdownCoordinator::new(handle);

    let reason = coordinator
        .run_until_shutdown(stream_renders(renders, cycles, format))
        .await?;

    if reason == ShutdownReason::Interrupted {
        info!("Animation interrupted before reaching the requested cycle count");
    }
    Ok(())
}

async fn stream_renders(
    mut renders: watch::Receiver<RenderState>,
    cycles: u64,
    format: OutputFormat,
) -> Result<()> {
    let mut last_key = None;
    let initial = renders.borrow_and_update().clone();
    print_render(&initial, format, &mut last_key)?;

    while renders.changed().await.is_ok() {
        let render = renders.borrow_and_update().clone();
        if cycles > 0 && render.cycle >= cycles {
            break;
        }
        print_render(&render, format, &mut last_key)?;
    }
    Ok(())
}

/// Text output prints one line per phase; JSON prints every render state
fn print_render(
    render: &RenderState,
    format: OutputFormat,
    last_key: &mut Option<(u64, String, usize)>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(render)?);
        }
        OutputFormat::Text => {
            let key = (render.cycle, render.phase.to_string(), render.active_step_index);
            if last_key.as_ref() == Some(&key) {
                return Ok(());
            }

            let step_id = render
                .status_lights
                .get(render.active_step_index)
                .map(|light| light.step_id.as_str())
                .unwrap_or("-");
            println!(
                "cycle {:>2}  step {} ({:<10}) {:<12} x={:>7.1} y={:>7.1} opacity={:.2} glyph={}",
                render.cycle,
                render.active_step_index,
                step_id,
                render.phase,
                render.indicator.x,
                render.indicator.y,
                render.indicator.opacity,
                render.indicator.glyph_name,
            );
            *last_key = Some(key);
        }
    }
    Ok(())
}

fn timeline_command(diagram: Diagram, config: &AnimatorConfig, format: OutputFormat) -> Result<()> {
    let sequencer = StepSequencer::new(Arc::new(diagram), config.timing.clone());
    let entries = cycle_timeline(&sequencer)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            println!("{:>8}  {:>7}  {:<12} step", "offset", "length", "phase");
            for entry in &entries {
                println!(
                    "{:>6}ms  {:>5}ms  {:<12} {} ({})",
                    entry.offset_ms,
                    entry.duration_ms,
                    entry.phase,
                    entry.active_step_index,
                    entry.step_id,
                );
            }
            println!("cycle length: {}ms", cycle_duration_ms(&entries));
        }
    }
    Ok(())
}

fn config_command(config: &AnimatorConfig, init: Option<&Path>) -> Result<()> {
    match init {
        Some(path) => {
            config
                .save_to_file(path)
                .with_context(|| format!("Could not write {}", path.display()))?;
            println!("Wrote configuration to {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
