//! Export of the final heightfield: a PNG rendered through the color ramp
//! plus a JSON metadata sidecar describing the run.

use std::fs::File;
use std::io;
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use serde::Serialize;

use crate::colors::ColorRamp;
use crate::params::SimulationParams;
use crate::tilemap::Tilemap;

/// Render a normalized heightfield through the ramp.
pub fn render_heightmap(map: &Tilemap<f32>, ramp: &ColorRamp, sea_level: f32) -> RgbImage {
    ImageBuffer::from_fn(map.width as u32, map.height as u32, |x, y| {
        Rgb(ramp.color_for(*map.get(x as usize, y as usize), sea_level))
    })
}

pub fn save_heightmap_png(
    map: &Tilemap<f32>,
    ramp: &ColorRamp,
    sea_level: f32,
    path: &Path,
) -> Result<(), image::ImageError> {
    render_heightmap(map, ramp, sea_level).save(path)
}

/// Run description written next to exported images, enough to recreate the
/// landscape from scratch.
#[derive(Serialize)]
struct RunMetadata<'a> {
    sea_level: f32,
    iterations: usize,
    params: &'a SimulationParams,
}

pub fn save_metadata_json(
    params: &SimulationParams,
    iterations: usize,
    sea_level: f32,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(
        file,
        &RunMetadata {
            sea_level,
            iterations,
            params,
        },
    )
    .map_err(io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_matches_grid_dimensions() {
        let ramp = ColorRamp::standard();
        let map = Tilemap::new_with(8, 4, 0.6f32);
        let img = render_heightmap(&map, &ramp, 0.5);
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 4);
    }

    #[test]
    fn test_render_water_and_land_split() {
        let ramp = ColorRamp::standard();
        let mut map = Tilemap::new_with(2, 1, 0.1f32);
        map.set(1, 0, 0.9);
        let img = render_heightmap(&map, &ramp, 0.5);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
        assert_ne!(img.get_pixel(1, 0).0, [0, 0, 255]);
    }
}
