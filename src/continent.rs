//! Continental structure from layered, relaxed Voronoi point sets.
//!
//! Each layer scatters a small point set over the grid. The points drift
//! toward their Voronoi cell centroids (Lloyd relaxation) while every update
//! stamps a noise-modulated radial basin or mound around each point into the
//! shared accumulation grid. Later layers carry more points at smaller
//! radii, tightening the tessellation.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::noise_field::NoiseField;
use crate::params::SimulationParams;
use crate::tilemap::Tilemap;

/// Deposit noise offsets are drawn from this range per call.
const OFFSET_RANGE: f32 = 10_000.0;

/// A relaxable layer point in grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x1 - x2).hypot(y1 - y2)
}

/// One Lloyd-relaxation step over `points`.
///
/// Every grid cell votes for its nearest point (ties go to the lowest
/// index); each point then moves toward its cluster centroid by
/// `move_speed / points.len()`, so denser layers relax more slowly per
/// point. A point whose cluster is empty keeps its position.
///
/// Callers guarantee `points` is non-empty. O(width * height * points).
pub fn relax_points(points: &mut [Point], width: usize, height: usize, move_speed: f32) {
    debug_assert!(!points.is_empty(), "relaxation needs at least one point");

    let mut sums = vec![(0.0f64, 0.0f64); points.len()];
    let mut counts = vec![0u32; points.len()];

    for y in 0..height {
        for x in 0..width {
            let mut closest = f32::MAX;
            let mut closest_index = 0;
            for (i, p) in points.iter().enumerate() {
                let d = distance(x as f32, y as f32, p.x, p.y);
                if d < closest {
                    closest = d;
                    closest_index = i;
                }
            }
            sums[closest_index].0 += x as f64;
            sums[closest_index].1 += y as f64;
            counts[closest_index] += 1;
        }
    }

    let t = move_speed / points.len() as f32;
    for (i, point) in points.iter_mut().enumerate() {
        let (cx, cy) = if counts[i] > 0 {
            (
                (sums[i].0 / counts[i] as f64) as f32,
                (sums[i].1 / counts[i] as f64) as f32,
            )
        } else {
            (point.x, point.y)
        };
        point.x += (cx - point.x) * t;
        point.y += (cy - point.y) * t;
    }
}

/// Stamp one layer's points into the accumulation grid.
///
/// The influence radius shrinks as `layer_scale_index` grows. Each cell
/// within the radius receives a ramp toward the point plus 3D noise
/// decorrelated by the point index, scaled by `rate`. The falloff is
/// `r - dist / r`, not a normalized ramp; deposits stay near-plateau
/// across the disc.
pub fn deposit_layer(
    accum: &mut Tilemap<f32>,
    points: &[Point],
    layer_scale_index: f32,
    layer_count: usize,
    size_modifier: f32,
    noise: &NoiseField,
    rng: &mut ChaCha8Rng,
    bias_scale: f32,
    rate: f32,
) {
    let offset_x = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE);
    let offset_y = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE);
    let radius = size_modifier * layer_count as f32 / layer_scale_index;

    for (index, point) in points.iter().enumerate() {
        let x0 = (point.x - radius).max(0.0) as usize;
        let y0 = (point.y - radius).max(0.0) as usize;
        let x1 = (point.x + radius).clamp(0.0, (accum.width - 1) as f32) as usize;
        let y1 = (point.y + radius).clamp(0.0, (accum.height - 1) as f32) as usize;

        for x in x0..=x1 {
            for y in y0..=y1 {
                let dist = distance(x as f32, y as f32, point.x, point.y);
                if dist > radius {
                    continue;
                }
                let noise_factor = noise.sample3(
                    x as f32 * bias_scale + offset_x,
                    y as f32 * bias_scale + offset_y,
                    index as f32,
                ) * 1.5;
                let ramp = if radius == 0.0 {
                    0.0
                } else {
                    radius - dist / radius
                };
                *accum.get_mut(x, y) += (ramp + noise_factor) * rate;
            }
        }
    }
}

/// The full layer hierarchy. Layer `i` owns `start_points + i` points and is
/// updated on iterations divisible by `i + 1`, so coarse layers keep moving
/// every frame while fine layers settle on a slower cadence.
pub struct ContinentStack {
    layers: Vec<Vec<Point>>,
    size_modifier: f32,
    move_speed: f32,
    bias_scale: f32,
    rate: f32,
}

impl ContinentStack {
    /// Scatter every layer's points uniformly over the grid.
    pub fn new(params: &SimulationParams, rng: &mut ChaCha8Rng) -> Self {
        let mut layers = Vec::with_capacity(params.layer_count);
        for i in 0..params.layer_count {
            let count = params.start_points + i;
            let mut points = Vec::with_capacity(count);
            for _ in 0..count {
                points.push(Point {
                    x: rng.gen_range(0.0..params.width as f32),
                    y: rng.gen_range(0.0..params.height as f32),
                });
            }
            layers.push(points);
        }
        Self {
            layers,
            size_modifier: params.size_modifier,
            move_speed: params.move_speed,
            bias_scale: params.bias_scale,
            rate: params.layer_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, index: usize) -> &[Point] {
        &self.layers[index]
    }

    /// Relax and deposit every layer whose cadence divides `iteration`.
    pub fn update(
        &mut self,
        iteration: usize,
        accum: &mut Tilemap<f32>,
        noise: &NoiseField,
        rng: &mut ChaCha8Rng,
    ) {
        let layer_count = self.layers.len();
        for (i, points) in self.layers.iter_mut().enumerate() {
            if iteration % (i + 1) != 0 {
                continue;
            }
            relax_points(points, accum.width, accum.height, self.move_speed);
            deposit_layer(
                accum,
                points,
                (i + 1) as f32,
                layer_count,
                self.size_modifier,
                noise,
                rng,
                self.bias_scale,
                self.rate,
            );
        }
    }
}
