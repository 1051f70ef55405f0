mod ramp;

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand};
use ramp::LevelRamp;
use tracing_subscriber::EnvFilter;
use wave_visualiser_core::{Bounds, DirtyRect, StyleConfig, VisualizationEngine, VisualiserError};

const REFRESH_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> wave_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            preset,
            width,
            height,
            ticks,
            interval_ms,
        } => run_live(
            preset.as_deref(),
            Bounds::new(width, height),
            ticks,
            Duration::from_millis(interval_ms),
        ),
        Commands::Frame {
            level,
            steps,
            width,
            height,
            preset,
            output,
        } => run_frame(
            preset.as_deref(),
            Bounds::new(width, height),
            level,
            steps,
            output.as_deref(),
        ),
    }
}

fn run_live(
    preset: Option<&Path>,
    bounds: Bounds,
    ticks: u64,
    interval: Duration,
) -> wave_visualiser_core::Result<()> {
    tracing::info!(?preset, ticks, ?interval, "starting live mode");

    let mut engine = VisualizationEngine::with_bounds(load_style(preset)?, bounds)?;
    engine.set_listener(|rect: DirtyRect| {
        tracing::trace!(?rect, "redraw requested");
    });
    let handle = engine.handle();
    let running = Arc::new(AtomicBool::new(true));

    let producer = {
        let running = running.clone();
        thread::Builder::new()
            .name("level-driver".into())
            .spawn(move || {
                let mut ramp = LevelRamp::new();
                for _ in 0..ticks {
                    let level = ramp.next_level(engine.level());
                    engine.set_level(level);
                    thread::sleep(interval);
                }
                running.store(false, Ordering::Release);
            })?
    };

    let mut last_sequence = handle.render().sequence;
    let mut frames_seen = 0_u64;
    while running.load(Ordering::Acquire) {
        let frame = handle.render();
        if frame.sequence != last_sequence {
            last_sequence = frame.sequence;
            frames_seen += 1;
            tracing::debug!(
                sequence = frame.sequence,
                points = frame.points().count(),
                dirty = ?frame.dirty_rect(),
                "drawing frame"
            );
        }
        thread::sleep(REFRESH_INTERVAL);
    }

    producer
        .join()
        .map_err(|_| VisualiserError::msg("level driver thread panicked"))?;
    tracing::info!(frames_seen, last_sequence, "live mode finished");
    Ok(())
}

fn run_frame(
    preset: Option<&Path>,
    bounds: Bounds,
    level: f32,
    steps: u32,
    output: Option<&Path>,
) -> wave_visualiser_core::Result<()> {
    tracing::info!(level, steps, ?output, "computing frame");

    let mut engine = VisualizationEngine::with_bounds(load_style(preset)?, bounds)?;
    for _ in 0..steps.max(1) {
        engine.set_level(level);
    }

    let json = serde_json::to_string_pretty(engine.render().as_ref())?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn load_style(preset: Option<&Path>) -> wave_visualiser_core::Result<StyleConfig> {
    match preset {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            StyleConfig::from_json_str(&json)
        }
        None => Ok(StyleConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated sine-wave level visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the engine with an oscillating level and render on a second thread.
    Live {
        /// Optional JSON style preset.
        #[arg(short, long)]
        preset: Option<PathBuf>,
        #[arg(long, default_value_t = 300.0)]
        width: f32,
        #[arg(long, default_value_t = 100.0)]
        height: f32,
        /// Number of level updates before exiting.
        #[arg(long, default_value_t = 100)]
        ticks: u64,
        /// Delay between level updates.
        #[arg(long, default_value_t = ramp::DEFAULT_TICK.as_millis() as u64)]
        interval_ms: u64,
    },
    /// Compute a single frame and dump it as JSON.
    Frame {
        /// Level passed to every update.
        #[arg(short, long, default_value_t = 0.5)]
        level: f32,
        /// How many updates to apply; each advances the phase.
        #[arg(long, default_value_t = 1)]
        steps: u32,
        #[arg(long, default_value_t = 300.0)]
        width: f32,
        #[arg(long, default_value_t = 100.0)]
        height: f32,
        #[arg(short, long)]
        preset: Option<PathBuf>,
        /// Output path; stdout when omitted.
        output: Option<PathBuf>,
    },
}
