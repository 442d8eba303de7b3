//! Debug tool for comparing erosion budgets visually.
//! Renders the same landscape under increasing droplet counts into one
//! comparison sheet.

use image::RgbImage;

use terrain_generator::colors::ColorRamp;
use terrain_generator::export;
use terrain_generator::params::SimulationParams;
use terrain_generator::world::{solve_sea_level, World};

const WIDTH: usize = 512;
const HEIGHT: usize = 256;
const SEED: u64 = 42;

fn main() {
    println!("Generating erosion comparison sheet...");

    let base = SimulationParams {
        width: WIDTH,
        height: HEIGHT,
        seed: SEED,
        max_iterations: 10,
        droplets_per_pass: 0,
        final_droplets: 0,
        ..SimulationParams::default()
    };

    let ramp = ColorRamp::standard();
    let budgets = [0usize, 20_000, 100_000, 400_000];
    let mut panels: Vec<RgbImage> = Vec::new();

    for budget in budgets {
        println!("  simulating final pass with {} droplets", budget);
        let variant = SimulationParams {
            final_droplets: budget,
            ..base.clone()
        };
        let mut world = World::new(variant);
        while world.advance() {}

        let snapshot = world.snapshot_normalized();
        let sea_level = solve_sea_level(&snapshot, world.params.water_threshold);
        panels.push(export::render_heightmap(&snapshot, &ramp, sea_level));
    }

    let sheet = build_sheet(&panels, 2);
    sheet
        .save("erosion_comparison.png")
        .expect("Failed to save sheet");
    println!("Saved erosion_comparison.png");
}

/// Tile the panels into a grid `cols` wide.
fn build_sheet(panels: &[RgbImage], cols: usize) -> RgbImage {
    let cell_w = panels[0].width();
    let cell_h = panels[0].height();
    let rows = panels.len().div_ceil(cols);
    let mut sheet = RgbImage::new(cell_w * cols as u32, cell_h * rows as u32);

    for (i, panel) in panels.iter().enumerate() {
        let ox = (i % cols) as u32 * cell_w;
        let oy = (i / cols) as u32 * cell_h;
        for y in 0..cell_h {
            for x in 0..cell_w {
                sheet.put_pixel(ox + x, oy + y, *panel.get_pixel(x, y));
            }
        }
    }

    sheet
}
