use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use percolation_common::{read_ensemble, DensityTrajectory};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input ensemble file path (.csv, one run per row)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the rendered plots (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Width of each image in pixels
    #[arg(long, default_value_t = 1400)]
    width: u32,

    /// Height of each image in pixels
    #[arg(long, default_value_t = 700)]
    height: u32,
}

/// `(t, rho)` pairs for every time step.
fn linear_points(trajectory: &DensityTrajectory) -> Vec<(f64, f64)> {
    trajectory
        .iter()
        .enumerate()
        .map(|(t, &rho)| (t as f64, rho))
        .collect()
}

/// `(t, rho)` pairs that can be placed on log-log axes: `t = 0` and `rho <= 0` are dropped.
fn log_points(trajectory: &DensityTrajectory) -> Vec<(f64, f64)> {
    linear_points(trajectory)
        .into_iter()
        .filter(|&(t, rho)| t > 0.0 && rho > 0.0)
        .collect()
}

/// Axis ranges for a log-log chart, widened so a single point or a flat line still renders.
fn log_ranges(points: &[(f64, f64)]) -> ((f64, f64), (f64, f64)) {
    if points.is_empty() {
        return ((1.0, 10.0), (0.01, 1.5));
    }
    let t_max = points.iter().map(|p| p.0).fold(1.0, f64::max);
    let rho_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let rho_max = points.iter().map(|p| p.1).fold(0.0, f64::max);
    ((1.0, (t_max * 1.5).max(2.0)), (rho_min * 0.5, rho_max * 1.5))
}

fn draw_linear_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    trajectory: &DensityTrajectory,
) -> Result<(), Box<dyn Error>> {
    let points = linear_points(trajectory);
    let t_max = points.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, 0.0..1.05)?;
    chart
        .configure_mesh()
        .x_desc("time step t")
        .y_desc("rho(t)")
        .draw()?;
    chart.draw_series(points.iter().map(|&p| Cross::new(p, 3, BLUE.stroke_width(1))))?;
    Ok(())
}

fn draw_log_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    trajectory: &DensityTrajectory,
    y_desc: &str,
) -> Result<(), Box<dyn Error>> {
    let points = log_points(trajectory);
    let ((t_lo, t_hi), (rho_lo, rho_hi)) = log_ranges(&points);
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((t_lo..t_hi).log_scale(), (rho_lo..rho_hi).log_scale())?;
    chart
        .configure_mesh()
        .x_desc("time step t")
        .y_desc(y_desc)
        .draw()?;
    chart.draw_series(points.iter().map(|&p| Cross::new(p, 3, RED.stroke_width(1))))?;
    Ok(())
}

/// Last run on linear axes (left) and log-log axes (right).
fn render_last_run(path: &Path, trajectory: &DensityTrajectory, size: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("rho(t) for last run", ("sans-serif", 24))?;
    let panels = root.split_evenly((1, 2));
    draw_linear_panel(&panels[0], trajectory)?;
    draw_log_panel(&panels[1], trajectory, "rho(t)")?;
    root.present()?;
    Ok(())
}

/// Mean density over all runs on log-log axes.
fn render_mean(path: &Path, mean: &DensityTrajectory, runs: usize, size: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&format!("mean rho(t) over {} runs", runs), ("sans-serif", 24))?;
    draw_log_panel(&root, mean, "rho_mean(t)")?;
    root.present()?;
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    info!("Starting Percolation Visualizer...");
    info!("Input file: {}", args.input.display());

    let ensemble = read_ensemble(&args.input)?;
    let Some(last_run) = ensemble.last() else {
        warn!("Input file contains no runs. Exiting.");
        return Ok(());
    };
    info!(
        "Loaded {} runs of {} time steps",
        ensemble.len(),
        last_run.len()
    );

    // Column-wise mean gives the mean density for each time step
    let mean = ensemble.column_means()?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| args.input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ensemble".to_string());
    let size = (args.width, args.height);

    let last_path = output_dir.join(format!("{}_last_run.png", stem));
    render_last_run(&last_path, last_run, size)
        .map_err(|e| anyhow::anyhow!("Failed to render '{}': {}", last_path.display(), e))?;
    info!("Last-run plot saved to {}", last_path.display());

    let mean_path = output_dir.join(format!("{}_mean.png", stem));
    render_mean(&mean_path, &mean, ensemble.len(), size)
        .map_err(|e| anyhow::anyhow!("Failed to render '{}': {}", mean_path.display(), e))?;
    info!("Mean-density plot saved to {}", mean_path.display());

    Ok(())
}
