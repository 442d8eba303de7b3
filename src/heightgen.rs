//! Base heightfield synthesis.
//!
//! Multi-octave noise where each octave's contribution is damped by the
//! gradient accumulated so far, flattening peaks and valley floors while
//! keeping the transitions between them sharp.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::noise_field::NoiseField;
use crate::tilemap::Tilemap;

/// Finite-difference step for the per-octave gradient estimate.
const GRADIENT_DELTA: f32 = 1e-5;

/// Octave offsets are drawn from this range to decorrelate octaves.
const OFFSET_RANGE: f32 = 10_000.0;

/// Suppresses an octave's contribution where the accumulated slope is steep.
/// The magnitude is non-negative by construction, so the odd power never
/// sees a negative base.
fn gradient_damp(gradient_magnitude: f32) -> f32 {
    (-gradient_magnitude.powi(5)).exp()
}

/// Accumulate a gradient-damped multi-octave field into `heightmap`.
///
/// Does not clear the map first; callers start from a zeroed grid.
/// Gradients carry across octaves, so early steep regions keep damping
/// later octaves. Deterministic for a fixed noise field and rng state.
pub fn synthesize(
    heightmap: &mut Tilemap<f32>,
    noise: &NoiseField,
    rng: &mut ChaCha8Rng,
    octaves: u32,
    persistence: f32,
    lacunarity: f32,
    scale: f32,
) {
    let width = heightmap.width;
    let height = heightmap.height;
    let mut gradients = vec![(0.0f32, 0.0f32); width * height];

    let mut amplitude = 1.0f32;
    let mut frequency = 1.0f32;

    for _ in 0..octaves {
        let offset_x = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE);
        let offset_y = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE);

        for y in 0..height {
            for x in 0..width {
                let sx = (x as f32 + offset_x) * scale / frequency;
                let sy = (y as f32 + offset_y) * scale / frequency;

                let base = noise.sample2(sx, sy) * amplitude;
                let ahead_x = noise.sample2(sx + GRADIENT_DELTA, sy) * amplitude;
                let ahead_y = noise.sample2(sx, sy + GRADIENT_DELTA) * amplitude;

                // Forward differences on the amplitude-recentred samples.
                let dx = ((ahead_x + amplitude) / 2.0 - (base + amplitude) / 2.0)
                    / GRADIENT_DELTA;
                let dy = ((ahead_y + amplitude) / 2.0 - (base + amplitude) / 2.0)
                    / GRADIENT_DELTA;

                let cell = &mut gradients[y * width + x];
                cell.0 += dx;
                cell.1 += dy;
                let magnitude = cell.0.hypot(cell.1);

                *heightmap.get_mut(x, y) += base * gradient_damp(magnitude);
            }
        }

        amplitude *= persistence;
        frequency *= lacunarity;
    }
}
