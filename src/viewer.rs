//! Incremental window display for the running simulation.
//!
//! The window shows the evolving field once per frame while the orchestrator
//! advances underneath it. The simulation itself never blocks on input; the
//! loop simply stops advancing once the final pass has run and keeps
//! redrawing.

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::colors::ColorRamp;
use crate::params::SimulationParams;
use crate::tilemap::Tilemap;
use crate::world::World;

/// Pack a normalized field into a 0RGB buffer through the ramp.
pub fn render_frame(map: &Tilemap<f32>, ramp: &ColorRamp, sea_level: f32) -> Vec<u32> {
    let mut buffer = Vec::with_capacity(map.width * map.height);
    for y in 0..map.height {
        for x in 0..map.width {
            let [r, g, b] = ramp.color_for(*map.get(x, y), sea_level);
            buffer.push(((r as u32) << 16) | ((g as u32) << 8) | b as u32);
        }
    }
    buffer
}

/// Run the interactive loop. Esc exits, R regenerates with a new seed.
pub fn run_viewer(params: SimulationParams) {
    let width = params.width;
    let height = params.height;

    let mut window = Window::new(
        "Terrain Generator - R: Regenerate, Esc: Exit",
        width,
        height,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )
    .expect("Failed to create window");
    window.set_target_fps(60);

    let ramp = ColorRamp::standard();
    let mut world = World::new(params.clone());

    println!("Viewer started. Controls:");
    println!("  R: Regenerate with a new seed");
    println!("  Esc: Exit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            let reseeded = SimulationParams {
                seed: rand::random(),
                ..params.clone()
            };
            println!("Regenerating with seed: {}", reseeded.seed);
            world = World::new(reseeded);
        }

        if world.advance() && world.iteration % 10 == 0 {
            println!(
                "iteration {}/{} (sea level {:.3})",
                world.iteration, world.params.max_iterations, world.sea_level
            );
        }

        let frame = world.snapshot_normalized();
        let buffer = render_frame(&frame, &ramp, world.sea_level);
        window
            .update_with_buffer(&buffer, width, height)
            .expect("Failed to update window");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_frame_packs_0rgb() {
        let ramp = ColorRamp::standard();
        let mut map = Tilemap::new_with(2, 1, 0.0f32);
        map.set(1, 0, 1.0);

        let buffer = render_frame(&map, &ramp, 0.5);
        // Below sea level packs pure blue, the peak packs white.
        assert_eq!(buffer[0], 0x0000FF);
        assert_eq!(buffer[1], 0xFFFFFF);
    }
}
