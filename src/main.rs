use std::path::PathBuf;
use std::process;

use clap::Parser;

use terrain_generator::colors::ColorRamp;
use terrain_generator::export;
use terrain_generator::params::SimulationParams;
use terrain_generator::viewer;
use terrain_generator::world::{solve_sea_level, World};

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate an eroded noise-and-Voronoi landscape")]
struct Args {
    /// Width of the terrain grid in cells
    #[arg(short = 'W', long, default_value = "1800")]
    width: usize,

    /// Height of the terrain grid in cells
    #[arg(short = 'H', long, default_value = "900")]
    height: usize,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Layering/erosion iterations before the final pass
    #[arg(long)]
    iterations: Option<usize>,

    /// Droplets per erosion pass
    #[arg(long)]
    droplets: Option<usize>,

    /// Show the simulation in a window instead of running headless
    #[arg(long)]
    view: bool,

    /// Batched parallel droplet mode (output diverges from the sequential
    /// mode)
    #[arg(long)]
    parallel: bool,

    /// Output image path for headless runs
    #[arg(short, long, default_value = "terrain.png")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let defaults = SimulationParams::default();
    let params = SimulationParams {
        width: args.width,
        height: args.height,
        seed: args.seed.unwrap_or_else(rand::random),
        parallel: args.parallel,
        max_iterations: args.iterations.unwrap_or(defaults.max_iterations),
        droplets_per_pass: args.droplets.unwrap_or(defaults.droplets_per_pass),
        ..defaults
    };

    if let Err(err) = params.validate() {
        eprintln!("Invalid configuration: {}", err);
        process::exit(2);
    }

    println!("Generating terrain with seed: {}", params.seed);
    println!("Grid size: {}x{}", params.width, params.height);

    if args.view {
        viewer::run_viewer(params);
        return;
    }

    let mut world = World::new(params.clone());
    while world.advance() {
        if world.iteration % 10 == 0 {
            println!(
                "iteration {}/{} (sea level {:.3})",
                world.iteration, params.max_iterations, world.sea_level
            );
        }
    }
    println!("Final erosion pass done after {} iterations", world.iteration);

    let snapshot = world.snapshot_normalized();
    let ramp = ColorRamp::standard();
    let sea_level = solve_sea_level(&snapshot, params.water_threshold);

    export::save_heightmap_png(&snapshot, &ramp, sea_level, &args.output)
        .expect("Failed to save image");
    let metadata_path = args.output.with_extension("json");
    export::save_metadata_json(&params, world.iteration, sea_level, &metadata_path)
        .expect("Failed to save metadata");

    println!(
        "Saved {} and {} (sea level {:.3})",
        args.output.display(),
        metadata_path.display(),
        sea_level
    );
}
