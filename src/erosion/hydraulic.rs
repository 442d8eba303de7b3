//! Droplet simulation.
//!
//! Each droplet spawns at a random spot, runs downhill under inertia, picks
//! up sediment while descending below capacity, and deposits when climbing
//! or over capacity. Deposits land on the four bilinear corners of the
//! droplet's previous cell; erosion spreads through the precomputed brush.
//!
//! Droplets run strictly sequentially in `erode`: each one sees the carving
//! left by its predecessors, and the landscape compounds over many droplets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::erosion::brush::ErosionBrush;
use crate::params::SimulationParams;

/// Aggregate effect of one erosion pass.
#[derive(Clone, Debug, Default)]
pub struct ErosionStats {
    pub droplets: usize,
    pub total_eroded: f64,
    pub total_deposited: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct DropletOutcome {
    eroded: f64,
    deposited: f64,
}

struct HeightAndGradient {
    height: f32,
    gradient_x: f32,
    gradient_y: f32,
}

/// Bilinear height and gradient at a continuous position.
/// Callers keep the position inside `[0, width-1) x [0, height-1)` so all
/// four corners are in range.
fn height_and_gradient(map: &[f32], width: usize, pos_x: f32, pos_y: f32) -> HeightAndGradient {
    let node_x = pos_x as usize;
    let node_y = pos_y as usize;
    let x = pos_x - node_x as f32;
    let y = pos_y - node_y as f32;

    let nw = node_y * width + node_x;
    let height_nw = map[nw];
    let height_ne = map[nw + 1];
    let height_sw = map[nw + width];
    let height_se = map[nw + width + 1];

    HeightAndGradient {
        height: height_nw * (1.0 - x) * (1.0 - y)
            + height_ne * x * (1.0 - y)
            + height_sw * (1.0 - x) * y
            + height_se * x * y,
        gradient_x: (height_ne - height_nw) * (1.0 - y) + (height_se - height_sw) * y,
        gradient_y: (height_sw - height_nw) * (1.0 - x) + (height_se - height_ne) * x,
    }
}

/// Simulate one droplet from `start` until it stalls, leaves the margin, or
/// its lifetime expires, mutating the heightfield in place.
fn simulate_droplet(
    map: &mut [f32],
    width: usize,
    height: usize,
    brush: &ErosionBrush,
    params: &SimulationParams,
    start_x: f32,
    start_y: f32,
) -> DropletOutcome {
    let mut pos_x = start_x;
    let mut pos_y = start_y;
    let mut dir_x = 0.0f32;
    let mut dir_y = 0.0f32;
    let mut speed = params.initial_speed;
    let mut water = params.initial_water;
    let mut sediment = 0.0f32;
    let mut outcome = DropletOutcome::default();

    for _ in 0..params.max_droplet_lifetime {
        let node_x = pos_x as usize;
        let node_y = pos_y as usize;
        let droplet_index = node_y * width + node_x;
        let cell_offset_x = pos_x - node_x as f32;
        let cell_offset_y = pos_y - node_y as f32;

        let old = height_and_gradient(map, width, pos_x, pos_y);

        dir_x = dir_x * params.inertia - old.gradient_x * (1.0 - params.inertia);
        dir_y = dir_y * params.inertia - old.gradient_y * (1.0 - params.inertia);
        let len = dir_x.hypot(dir_y);
        if len != 0.0 {
            dir_x /= len;
            dir_y /= len;
        }
        pos_x += dir_x;
        pos_y += dir_y;

        // Stalled, or stepped past the margin that keeps bilinear reads in
        // range.
        if (dir_x == 0.0 && dir_y == 0.0)
            || pos_x < 0.0
            || pos_x >= (width - 1) as f32
            || pos_y < 0.0
            || pos_y >= (height - 1) as f32
        {
            break;
        }

        let new_height = height_and_gradient(map, width, pos_x, pos_y).height;
        let delta_height = new_height - old.height;

        let capacity =
            (-delta_height * speed * water * params.capacity_factor).max(params.min_capacity);

        if sediment > capacity || delta_height > 0.0 {
            // Climbing fills the dip behind the droplet; otherwise shed the
            // surplus over capacity.
            let amount = if delta_height > 0.0 {
                delta_height.min(sediment)
            } else {
                (sediment - capacity) * params.deposit_speed
            };
            sediment -= amount;

            map[droplet_index] += amount * (1.0 - cell_offset_x) * (1.0 - cell_offset_y);
            map[droplet_index + 1] += amount * cell_offset_x * (1.0 - cell_offset_y);
            map[droplet_index + width] += amount * (1.0 - cell_offset_x) * cell_offset_y;
            map[droplet_index + width + 1] += amount * cell_offset_x * cell_offset_y;
            outcome.deposited += amount as f64;
        } else {
            let amount = ((capacity - sediment) * params.erode_speed).min(-delta_height);
            let (indices, weights) = brush.cell(droplet_index);
            for (&index, &weight) in indices.iter().zip(weights) {
                let requested = amount * weight;
                // Never take more than the cell holds.
                let taken = map[index as usize].min(requested);
                map[index as usize] -= taken;
                sediment += taken;
                outcome.eroded += taken as f64;
            }
        }

        // Energy floor: a forced climb cannot leave negative kinetic energy.
        speed = (speed * speed + delta_height * params.gravity).max(0.0).sqrt();
        water *= 1.0 - params.evaporate_speed;
    }

    outcome
}

/// Run `iterations` droplets sequentially over the flattened heightfield.
///
/// Spawn positions are uniform over `[0, width-1) x [0, height-1)`, which
/// keeps the first bilinear fetch in range; a droplet that steps outside
/// that margin terminates before sampling again.
pub fn erode(
    map: &mut [f32],
    width: usize,
    height: usize,
    brush: &ErosionBrush,
    params: &SimulationParams,
    rng: &mut ChaCha8Rng,
    iterations: usize,
) -> ErosionStats {
    debug_assert_eq!(map.len(), width * height);

    let mut stats = ErosionStats {
        droplets: iterations,
        ..ErosionStats::default()
    };

    for _ in 0..iterations {
        let start_x = rng.gen_range(0.0..(width - 1) as f32);
        let start_y = rng.gen_range(0.0..(height - 1) as f32);
        let outcome = simulate_droplet(map, width, height, brush, params, start_x, start_y);
        stats.total_eroded += outcome.eroded;
        stats.total_deposited += outcome.deposited;
    }

    stats
}

/// Like `simulate_droplet`, but reads a fixed snapshot and records height
/// changes instead of applying them.
fn simulate_droplet_recorded(
    snapshot: &[f32],
    width: usize,
    height: usize,
    brush: &ErosionBrush,
    params: &SimulationParams,
    start_x: f32,
    start_y: f32,
) -> (Vec<(u32, f32)>, DropletOutcome) {
    let mut changes: Vec<(u32, f32)> = Vec::new();
    let mut pos_x = start_x;
    let mut pos_y = start_y;
    let mut dir_x = 0.0f32;
    let mut dir_y = 0.0f32;
    let mut speed = params.initial_speed;
    let mut water = params.initial_water;
    let mut sediment = 0.0f32;
    let mut outcome = DropletOutcome::default();

    for _ in 0..params.max_droplet_lifetime {
        let node_x = pos_x as usize;
        let node_y = pos_y as usize;
        let droplet_index = node_y * width + node_x;
        let cell_offset_x = pos_x - node_x as f32;
        let cell_offset_y = pos_y - node_y as f32;

        let old = height_and_gradient(snapshot, width, pos_x, pos_y);

        dir_x = dir_x * params.inertia - old.gradient_x * (1.0 - params.inertia);
        dir_y = dir_y * params.inertia - old.gradient_y * (1.0 - params.inertia);
        let len = dir_x.hypot(dir_y);
        if len != 0.0 {
            dir_x /= len;
            dir_y /= len;
        }
        pos_x += dir_x;
        pos_y += dir_y;

        if (dir_x == 0.0 && dir_y == 0.0)
            || pos_x < 0.0
            || pos_x >= (width - 1) as f32
            || pos_y < 0.0
            || pos_y >= (height - 1) as f32
        {
            break;
        }

        let new_height = height_and_gradient(snapshot, width, pos_x, pos_y).height;
        let delta_height = new_height - old.height;

        let capacity =
            (-delta_height * speed * water * params.capacity_factor).max(params.min_capacity);

        if sediment > capacity || delta_height > 0.0 {
            let amount = if delta_height > 0.0 {
                delta_height.min(sediment)
            } else {
                (sediment - capacity) * params.deposit_speed
            };
            sediment -= amount;

            changes.push((
                droplet_index as u32,
                amount * (1.0 - cell_offset_x) * (1.0 - cell_offset_y),
            ));
            changes.push((
                (droplet_index + 1) as u32,
                amount * cell_offset_x * (1.0 - cell_offset_y),
            ));
            changes.push((
                (droplet_index + width) as u32,
                amount * (1.0 - cell_offset_x) * cell_offset_y,
            ));
            changes.push((
                (droplet_index + width + 1) as u32,
                amount * cell_offset_x * cell_offset_y,
            ));
            outcome.deposited += amount as f64;
        } else {
            let amount = ((capacity - sediment) * params.erode_speed).min(-delta_height);
            let (indices, weights) = brush.cell(droplet_index);
            for (&index, &weight) in indices.iter().zip(weights) {
                let requested = amount * weight;
                let taken = snapshot[index as usize].min(requested);
                changes.push((index, -taken));
                sediment += taken;
                outcome.eroded += taken as f64;
            }
        }

        speed = (speed * speed + delta_height * params.gravity).max(0.0).sqrt();
        water *= 1.0 - params.evaporate_speed;
    }

    (changes, outcome)
}

/// Batched parallel variant of `erode`.
///
/// Droplets inside a batch observe a fixed snapshot instead of each other's
/// carving, then the summed deltas are applied between batches. The output
/// therefore diverges from what `erode` produces; callers opt in knowingly.
/// Each droplet gets its own seed derived from `base_seed`, so results are
/// reproducible regardless of thread scheduling.
pub fn erode_parallel(
    map: &mut [f32],
    width: usize,
    height: usize,
    brush: &ErosionBrush,
    params: &SimulationParams,
    base_seed: u64,
    iterations: usize,
) -> ErosionStats {
    const BATCH_SIZE: usize = 10_000;

    debug_assert_eq!(map.len(), width * height);

    let mut stats = ErosionStats {
        droplets: iterations,
        ..ErosionStats::default()
    };

    let mut batch_start = 0usize;
    while batch_start < iterations {
        let batch = (iterations - batch_start).min(BATCH_SIZE);
        let snapshot: Vec<f32> = map.to_vec();

        let results: Vec<(Vec<(u32, f32)>, DropletOutcome)> = (0..batch)
            .into_par_iter()
            .map(|i| {
                let seed = base_seed.wrapping_add((batch_start + i) as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let start_x = rng.gen_range(0.0..(width - 1) as f32);
                let start_y = rng.gen_range(0.0..(height - 1) as f32);
                simulate_droplet_recorded(
                    &snapshot, width, height, brush, params, start_x, start_y,
                )
            })
            .collect();

        for (changes, outcome) in results {
            stats.total_eroded += outcome.eroded;
            stats.total_deposited += outcome.deposited;
            for (index, delta) in changes {
                map[index as usize] += delta;
            }
        }

        batch_start += batch;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params(width: usize, height: usize) -> SimulationParams {
        SimulationParams {
            width,
            height,
            erosion_radius: 2,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn test_droplet_near_edge_terminates_cleanly() {
        let width = 10;
        let height = 10;
        let params = test_params(width, height);
        let brush = ErosionBrush::new(width, height, params.erosion_radius);

        // Slope descending toward +x pushes the droplet off the right edge.
        let mut map = vec![0.0f32; width * height];
        for y in 0..height {
            for x in 0..width {
                map[y * width + x] = -(x as f32);
            }
        }

        let outcome = simulate_droplet(
            &mut map,
            width,
            height,
            &brush,
            &params,
            (width as f32) - 1.001,
            4.0,
        );
        assert!(outcome.eroded.is_finite() && outcome.deposited.is_finite());
    }

    #[test]
    fn test_droplet_on_flat_terrain_stalls() {
        let width = 12;
        let height = 12;
        let params = test_params(width, height);
        let brush = ErosionBrush::new(width, height, params.erosion_radius);
        let mut map = vec![0.5f32; width * height];
        let before = map.clone();

        let outcome = simulate_droplet(&mut map, width, height, &brush, &params, 5.5, 5.5);

        // Zero gradient means zero direction: the droplet stalls on its
        // first step without touching the field.
        assert_eq!(outcome.eroded, 0.0);
        assert_eq!(outcome.deposited, 0.0);
        assert_eq!(map, before);
    }

    #[test]
    fn test_droplet_flows_into_pit_and_conserves_mass() {
        let width = 10;
        let height = 10;
        let params = test_params(width, height);
        let brush = ErosionBrush::new(width, height, params.erosion_radius);

        let mut map = vec![0.5f32; width * height];
        map[5 * width + 5] = 0.1;
        let initial_sum: f64 = map.iter().map(|&v| v as f64).sum();

        let outcome = simulate_droplet(&mut map, width, height, &brush, &params, 4.0, 5.0);

        let final_sum: f64 = map.iter().map(|&v| v as f64).sum();
        let net = outcome.deposited - outcome.eroded;
        assert!(
            (final_sum - initial_sum - net).abs() < 1e-3,
            "mass created from nothing: field moved {} but droplet accounts for {}",
            final_sum - initial_sum,
            net
        );
        assert!(outcome.eroded > 0.0 || outcome.deposited > 0.0);
    }

    #[test]
    fn test_erode_is_deterministic_for_seed() {
        let width = 16;
        let height = 16;
        let params = test_params(width, height);
        let brush = ErosionBrush::new(width, height, params.erosion_radius);

        let base: Vec<f32> = (0..width * height)
            .map(|i| ((i % width) as f32 * 0.07).sin() + ((i / width) as f32 * 0.11).cos())
            .collect();

        let mut a = base.clone();
        let mut b = base.clone();
        let mut rng_a = ChaCha8Rng::seed_from_u64(77);
        let mut rng_b = ChaCha8Rng::seed_from_u64(77);

        erode(&mut a, width, height, &brush, &params, &mut rng_a, 200);
        erode(&mut b, width, height, &brush, &params, &mut rng_b, 200);
        assert_eq!(a, b);
    }

    #[test]
    fn test_erode_changes_sloped_terrain() {
        let width = 32;
        let height = 32;
        let params = test_params(width, height);
        let brush = ErosionBrush::new(width, height, params.erosion_radius);

        // A V-valley: droplets erode on the way down, cross the trough, and
        // must deposit while climbing the far slope.
        let mut map: Vec<f32> = (0..width * height)
            .map(|i| ((i % width) as f32 - 16.0).abs() * 0.1 + 1.0)
            .collect();
        let before = map.clone();

        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let stats = erode(&mut map, width, height, &brush, &params, &mut rng, 1000);

        assert!(stats.total_eroded > 0.0);
        assert!(stats.total_deposited > 0.0);
        assert_ne!(map, before);
    }

    #[test]
    fn test_parallel_mode_runs_and_reports() {
        let width = 24;
        let height = 24;
        let params = test_params(width, height);
        let brush = ErosionBrush::new(width, height, params.erosion_radius);

        let mut map: Vec<f32> = (0..width * height)
            .map(|i| (width - i % width) as f32 * 0.02)
            .collect();

        let stats = erode_parallel(&mut map, width, height, &brush, &params, 9, 500);
        assert_eq!(stats.droplets, 500);
        assert!(stats.total_eroded > 0.0);
    }
}
