//! Gyroview Terminal - Rotating scene viewport
//!
//! Renders the configured scene as ASCII art and prints its orientation in
//! the status line.
//! Controls:
//!   - Arrow Keys / WASD / mouse drag: Orbit the camera
//!   - +/- / mouse wheel: Zoom
//!   - Q/ESC: Quit

use clap::{Parser, ValueEnum};
use gyroview_core::{status, AssetSource, AssetState, Scene, SceneVariant, ViewportConfig};
use gyroview_terminal::TerminalApp;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    Cube,
    Model,
    Forest,
}

impl From<Variant> for SceneVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Cube => SceneVariant::Cube,
            Variant::Model => SceneVariant::Model,
            Variant::Forest => SceneVariant::Forest,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gyroview-terminal")]
#[command(about = "Rotating 3D scene viewport in the terminal")]
#[command(version)]
struct Args {
    /// JSON viewport configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene to show, overriding the configuration
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// STL model for the model and forest scenes
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Smooth camera motion
    #[arg(long)]
    damping: bool,

    /// Write logs to this file (the terminal is busy rendering)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        match File::create(path) {
            Ok(file) => tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .init(),
            Err(e) => {
                eprintln!("Cannot open log file {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let asset = load_model(&config);
    let scene = Scene::build(&config.scene, asset);
    if let Some(reason) = scene.not_ready_reason() {
        eprintln!("{}", status::not_ready_line(&reason));
        return ExitCode::FAILURE;
    }

    tracing::info!(variant = ?config.scene.variant, "starting terminal viewport");
    let mut app = TerminalApp::new(scene, config, args.fps);
    if let Err(e) = app.run() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn load_config(args: &Args) -> Result<ViewportConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ViewportConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ViewportConfig::default(),
    };

    if let Some(variant) = args.variant {
        config.scene.variant = variant.into();
    }
    if let Some(path) = &args.model {
        config.scene.model = Some(AssetSource::Path(path.display().to_string()));
    }
    if args.damping {
        config.controls.enable_damping = true;
    }

    config.validate()?;
    Ok(config)
}

/// Read the model synchronously; the scene is only built once this resolves
fn load_model(config: &ViewportConfig) -> AssetState {
    if !config.scene.variant.needs_model() {
        return AssetState::Pending;
    }
    match &config.scene.model {
        Some(source @ AssetSource::Path(path)) => match std::fs::read(path) {
            Ok(bytes) => AssetState::from_bytes(source, &bytes),
            Err(e) => AssetState::failed(source, e),
        },
        Some(source @ AssetSource::Url(_)) => {
            AssetState::failed(source, "URL models are only supported in the browser")
        }
        None => AssetState::Pending,
    }
}
