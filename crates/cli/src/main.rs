#![deny(unsafe_code)]
//! CLI binary for headless flowfield renders.
//!
//! Subcommands:
//! - `render`: run the flowfield for N frames at a fixed frame rate, write PNG
//! - `params`: print the parameter schema and defaults
//!
//! Set `RUST_LOG=debug` (or `trace` for per-frame lines) to see engine logs.

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use flowfield_core::{FlowfieldOptions, Raster, SurfaceDimensions};
use flowfield_engine::{flowfield, mount, HeadlessHost};
use serde_json::Value;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "flowfield", about = "Particle flowfield renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the flowfield for N frames and write a PNG snapshot.
    Render {
        /// Logical surface width.
        #[arg(short = 'W', long, default_value_t = 800.0)]
        width: f64,

        /// Logical surface height.
        #[arg(short = 'H', long, default_value_t = 600.0)]
        height: f64,

        /// Device pixel ratio, clamped to [1, 2].
        #[arg(long, default_value_t = 1.0)]
        dpr: f64,

        /// Number of frames to run.
        #[arg(short, long, default_value_t = 180)]
        frames: usize,

        /// Simulated frame rate; sets the field clock, not the step size.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Particle count (overrides --params).
        #[arg(short, long)]
        density: Option<usize>,

        /// PRNG seed (overrides --params).
        #[arg(long)]
        seed: Option<u64>,

        /// Hold the pointer at logical coordinates "x,y" for the whole run.
        #[arg(long, value_parser = parse_point)]
        pointer: Option<(f64, f64)>,

        /// Trigger a burst at these frame indices (comma separated).
        #[arg(long, value_delimiter = ',')]
        burst_at: Vec<usize>,

        /// Keep transparency instead of compositing over the background.
        #[arg(long)]
        transparent: bool,

        /// Output file path.
        #[arg(short, long, default_value = "flowfield.png")]
        output: PathBuf,

        /// Options as a JSON string, e.g. '{"accent":"#0fa6ff","style":{"fade_alpha":0.05}}'.
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Print the parameter schema and default values.
    Params,
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got '{s}'"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{v}': {e}"))
    };
    Ok((coord(x)?, coord(y)?))
}

/// Reads options from JSON params, then applies flag overrides.
fn build_options(
    params: &str,
    density: Option<usize>,
    seed: Option<u64>,
) -> Result<FlowfieldOptions, CliError> {
    let params: Value = serde_json::from_str(params)
        .map_err(|e| CliError::Params(e.to_string()))?;
    let mut options = FlowfieldOptions::from_json(&params)?;
    if let Some(density) = density {
        options.density = density;
    }
    if let Some(seed) = seed {
        options.seed = seed;
    }
    options.validate()?;
    Ok(options)
}

/// Milliseconds between frames at `fps`.
fn frame_interval_ms(fps: f64) -> Result<f64, CliError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(CliError::FrameRate(fps));
    }
    Ok(1000.0 / fps)
}

fn print_params(json: bool) -> Result<(), CliError> {
    let schema = flowfield::schema();
    if json {
        let info = serde_json::json!({
            "schema": schema,
            "defaults": serde_json::to_value(FlowfieldOptions::default())?,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    fn print_entries(prefix: &str, entries: &Value) {
        let Some(map) = entries.as_object() else {
            return;
        };
        for (name, entry) in map {
            if entry.get("type").is_none() {
                print_entries(&format!("{prefix}{name}."), entry);
                continue;
            }
            println!(
                "  {prefix}{name} ({}, default {}): {}",
                entry["type"].as_str().unwrap_or("?"),
                entry["default"],
                entry["description"].as_str().unwrap_or("")
            );
        }
    }
    println!("Parameters:");
    print_entries("", &schema);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Params => print_params(cli.json)?,
        Command::Render {
            width,
            height,
            dpr,
            frames,
            fps,
            density,
            seed,
            pointer,
            burst_at,
            transparent,
            output,
            params,
        } => {
            let frame_ms = frame_interval_ms(fps)?;
            let options = build_options(&params, density, seed)?;
            let background = (!transparent).then_some(options.style.background);
            let dims = SurfaceDimensions::new(width, height, dpr)?;
            log::info!(
                "rendering {frames} frames of {} particles at {}x{} (dpr {})",
                options.density,
                dims.width(),
                dims.height(),
                dims.device_pixel_ratio()
            );

            let (mut driver, burst) = mount(Raster::new(dims), HeadlessHost::new(), dims, options)?;
            if let Some((x, y)) = pointer {
                driver.pointer_move(x, y);
            }
            for frame in 0..frames {
                if burst_at.contains(&frame) {
                    log::debug!("burst at frame {frame}");
                    burst.burst();
                }
                driver.tick(frame as f64 * frame_ms)?;
            }

            flowfield_snapshot::write_png(driver.surface(), background, &output)
                .map_err(|e| CliError::snapshot(&output, e))?;
            let (pixel_width, pixel_height) = (driver.surface().pixel_width(), driver.surface().pixel_height());
            driver.unmount();

            if cli.json {
                let info = serde_json::json!({
                    "width": dims.width(),
                    "height": dims.height(),
                    "device_pixel_ratio": dims.device_pixel_ratio(),
                    "pixel_width": pixel_width,
                    "pixel_height": pixel_height,
                    "frames": frames,
                    "fps": fps,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {frames} frames ({pixel_width}x{pixel_height} px) -> {}",
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            eprintln!("{}", serde_json::to_string_pretty(&e.to_json()).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
