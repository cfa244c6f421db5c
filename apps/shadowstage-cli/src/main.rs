use clap::{Parser, Subcommand};
use shadowstage_input::OrbitControls;
use shadowstage_kernel::{
    AnimationClock, ManualTime, SceneConfig, ScenePreset, Stage, ViewportEvent, ViewportState,
};
use shadowstage_render::{DebugTextRenderer, FrameDriver, RefreshScheduler, ResizeHandler};
use shadowstage_tools::StageInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shadowstage-cli", about = "Headless shadowstage tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the scene presets
    Presets {
        /// Print full scene descriptions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drive the frame loop with simulated time
    Simulate {
        #[arg(short, long, default_value = "baked")]
        preset: ScenePreset,
        /// Number of frames to render
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Simulated refresh rate
        #[arg(long, default_value = "60")]
        fps: f64,
    },
    /// Apply one resize notification and print the resulting state
    Resize {
        #[arg(long, default_value = "1280")]
        width: f64,
        #[arg(long, default_value = "720")]
        height: f64,
        /// Device pixel ratio reported by the host
        #[arg(long, default_value = "1")]
        dpr: f64,
        #[arg(short, long, default_value = "lights")]
        preset: ScenePreset,
    },
}

/// Slowest refresh rate `simulate` accepts.
const MIN_FPS: f64 = 1e-3;

/// Seconds between simulated refresh ticks.
fn frame_step(fps: f64) -> anyhow::Result<f64> {
    anyhow::ensure!(
        fps.is_finite() && fps >= MIN_FPS,
        "fps must be a finite value of at least {MIN_FPS}, got {fps}"
    );
    Ok(1.0 / fps)
}

/// Counts tick requests in place of a display refresh.
#[derive(Default)]
struct TickCounter {
    requested: u64,
}

impl RefreshScheduler for TickCounter {
    fn request_tick(&mut self) {
        self.requested += 1;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("shadowstage-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", shadowstage_render::crate_info());
            println!("tools: {}", shadowstage_tools::crate_info());
            let names: Vec<_> = ScenePreset::ALL.iter().map(|p| p.name()).collect();
            println!("presets: {}", names.join(", "));
        }
        Commands::Presets { json } => {
            if json {
                let scenes: Vec<SceneConfig> = ScenePreset::ALL.iter().map(|p| p.build()).collect();
                println!("{}", serde_json::to_string_pretty(&scenes)?);
            } else {
                for preset in ScenePreset::ALL {
                    let scene = preset.build();
                    println!(
                        "{:<10} meshes={} shadows={:?} animated={}",
                        preset.name(),
                        scene.meshes.len(),
                        scene.shadow_mode,
                        scene.animation.is_some()
                    );
                }
            }
        }
        Commands::Simulate {
            preset,
            frames,
            fps,
        } => {
            let step = frame_step(fps)?;
            println!("Simulating {preset}: frames={frames}, fps={fps}");

            let time = ManualTime::new();
            let mut stage = Stage::with_clock(
                preset.build(),
                ViewportState::default(),
                AnimationClock::with_source(time.clone()),
            );
            let mut renderer = DebugTextRenderer::new();
            let viewport = stage.viewport;
            ResizeHandler::handle(
                &mut stage,
                &mut renderer,
                &ViewportEvent {
                    width: viewport.width,
                    height: viewport.height,
                    device_pixel_ratio: viewport.pixel_ratio,
                },
            )?;

            let mut controls = OrbitControls::default().with_damping(0.05);
            let mut scheduler = TickCounter::default();
            let mut driver = FrameDriver::new();

            for i in 0..frames {
                let output = if i == 0 {
                    driver.start(&mut stage, &mut controls, &mut renderer, &mut scheduler)?
                } else {
                    time.advance_secs(step);
                    driver.tick(&mut stage, &mut controls, &mut renderer, &mut scheduler)?
                };
                print!("{output}");
            }

            println!("{}", StageInspector::summary(&stage, driver.frames()));
            println!("tick requests: {}", scheduler.requested);
        }
        Commands::Resize {
            width,
            height,
            dpr,
            preset,
        } => {
            let mut stage = Stage::new(preset.build(), ViewportState::default());
            let mut renderer = DebugTextRenderer::new();
            let event = ViewportEvent {
                width,
                height,
                device_pixel_ratio: dpr,
            };
            let viewport = ResizeHandler::handle(&mut stage, &mut renderer, &event)?;
            let (buffer_w, buffer_h) = viewport.buffer_size();

            println!("viewport: {}x{}", viewport.width, viewport.height);
            println!("pixel ratio: {} (reported {dpr})", viewport.pixel_ratio);
            println!("camera aspect: {:.3}", stage.camera.aspect);
            println!("drawing buffer: {buffer_w}x{buffer_h}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_step_inverts_fps() {
        assert!((frame_step(60.0).unwrap() - 1.0 / 60.0).abs() < 1e-12);
        assert!((frame_step(MIN_FPS).unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn frame_step_rejects_degenerate_rates() {
        for fps in [1e-20, 0.0, -30.0, f64::NAN, f64::INFINITY] {
            assert!(frame_step(fps).is_err(), "fps={fps}");
        }
    }
}
