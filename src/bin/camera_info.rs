use anyhow::{Context, Result};
use bolometry::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use uom::si::length::millimeter;

#[derive(Parser)]
#[command(version, about = "Summarize a saved bolometer camera", long_about = None)]
struct Args {
    /// Camera file to read.
    #[arg(short, long)]
    camera: PathBuf,

    /// Name of the scene node to attach the camera to.
    #[arg(short, long)]
    parent: Option<String>,

    /// Write the camera back out to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let camera = Camera::load(&args.camera, args.parent.as_deref().map(NodeHandle::new))
        .with_context(|| format!("failed to load camera from {}", args.camera.display()))?;

    info!(
        camera_id = camera.camera_id(),
        foils = camera.len(),
        slits = camera.slits().len(),
        "camera"
    );

    for slit in camera.slits() {
        let c = slit.centre_point();
        let n = slit.normal();
        info!(
            "slit {}: centre=({:.4}, {:.4}, {:.4}) normal=({:.4}, {:.4}, {:.4}) size={:.3}x{:.3} mm",
            slit.slit_id(),
            c.x,
            c.y,
            c.z,
            n.x,
            n.y,
            n.z,
            slit.dx().get::<millimeter>(),
            slit.dy().get::<millimeter>(),
        );
    }

    for (i, foil) in camera.iter().enumerate() {
        let c = foil.centre_point();
        let n = foil.normal();
        info!(
            "foil {i} {} [{}] via {}: centre=({:.4}, {:.4}, {:.4}) normal=({:.4}, {:.4}, {:.4}) size={:.3}x{:.3} mm",
            foil.detector_id(),
            foil.ray_type(),
            foil.slit().slit_id(),
            c.x,
            c.y,
            c.z,
            n.x,
            n.y,
            n.z,
            foil.dx().get::<millimeter>(),
            foil.dy().get::<millimeter>(),
        );
    }

    if let Some(output) = args.output {
        camera
            .save(&output)
            .with_context(|| format!("failed to save camera to {}", output.display()))?;
    }

    Ok(())
}
