//! vrmview - desktop viewer for glTF, GLB and VRM models
//!
//! Opens a window and renders the model given on the command line or dropped
//! onto the window.

mod app;
mod settings;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vrmview_render::{HeadlessBackend, SceneRegistry};
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::ViewerApp;
use crate::settings::ViewerSettings;

#[derive(Parser, Debug)]
#[command(name = "vrmview", version, about = "View glTF, GLB and VRM models")]
struct Cli {
    /// Model file to open on startup
    path: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `vrmview_render=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Load the model without a window, print a summary and exit
    #[arg(long, requires = "path")]
    inspect: bool,
}

fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run the full load pipeline against the headless backend.
fn inspect(path: PathBuf) -> Result<()> {
    let mut backend = HeadlessBackend::new();
    let mut registry = SceneRegistry::new(&mut backend).context("Failed to create default texture")?;
    let summary = registry
        .load(&mut backend, &path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    println!("File:               {}", summary.source.display());
    println!("Type:               {}", if summary.is_vrm { "VRM" } else { "glTF/GLB" });
    println!("Meshes:             {}", summary.mesh_count);
    println!("Textures:           {}", summary.texture_count);
    println!("Failed textures:    {}", summary.failed_textures);
    println!("Skipped primitives: {}", summary.skipped_primitives);
    println!(
        "Bounds:             center ({:.3}, {:.3}, {:.3}), radius {:.3}",
        summary.center.x, summary.center.y, summary.center.z, summary.radius
    );
    println!(
        "GPU resources:      {} buffers, {} textures, {} bytes",
        backend.live_buffers(),
        backend.live_textures(),
        backend.live_bytes()
    );

    registry.shutdown(&mut backend);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if cli.inspect {
        if let Some(path) = cli.path {
            return inspect(path);
        }
    }

    info!("Starting vrmview");
    let settings = ViewerSettings::load();

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(settings, cli.path);
    event_loop.run_app(&mut app).context("Event loop failed")?;
    Ok(())
}
