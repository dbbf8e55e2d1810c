use clap::Parser;
use pushbroom::{CameraModel, Pixel, Ray, config::CameraConfig};
use serde::Serialize;
use std::{
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Convert image pixels to viewing rays", long_about = None)]
struct Args {
    /// Path to a JSON camera description.
    #[arg(short, long)]
    camera: PathBuf,

    /// Row of a single pixel to convert.
    #[arg(long, requires = "col")]
    row: Option<f64>,

    /// Column of a single pixel to convert.
    #[arg(long, requires = "row")]
    col: Option<f64>,

    /// Spacing of the pixel grid converted when no single pixel is given.
    #[arg(long, default_value_t = 100)]
    step: usize,

    /// Stop at the first pixel that cannot be converted.
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Serialize)]
struct Output {
    row: f64,
    col: f64,
    time: f64,
    origin: [f64; 3],
    direction: [f64; 3],
}

fn main() -> ExitCode {
    // Register an event subscriber that prints events to STDERR.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let camera = match CameraConfig::from_path(&args.camera).and_then(|config| config.build()) {
        Ok(camera) => camera,
        Err(e) => {
            error!("{}: {e}", args.camera.display());
            return ExitCode::FAILURE;
        }
    };

    let pixels: Vec<Pixel> = match (args.row, args.col) {
        (Some(row), Some(col)) => vec![Pixel::new(row, col)],
        _ => camera.image_size().grid(args.step).collect(),
    };

    info!(pixels = pixels.len(), "converting pixels");

    let rays: Vec<(Pixel, Ray)> = if args.fail_fast {
        match camera.try_par_pixels_to_rays(&pixels) {
            Ok(rays) => pixels.into_iter().zip(rays).collect(),
            Err(failure) => {
                error!("{failure}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        let batch = camera.par_pixels_to_rays(&pixels);
        for failure in &batch.failures {
            warn!("{failure}");
        }
        batch.rays
    };

    let mut stdout = BufWriter::new(std::io::stdout().lock());
    for (pixel, ray) in rays {
        let output = Output {
            row: pixel.row,
            col: pixel.col,
            time: camera.time_at_line(pixel.row),
            origin: ray.origin.into(),
            direction: ray.direction.into(),
        };

        let written = serde_json::to_writer(&mut stdout, &output)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(stdout));
        if let Err(e) = written {
            error!("failed to write ray: {e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = stdout.flush() {
        error!("failed to write rays: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
