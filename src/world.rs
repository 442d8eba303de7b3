//! Orchestration: the full terrain pipeline bundled behind one state value.
//!
//! Each iteration layers continents into the accumulation map, blends in the
//! base field, then normalizes, erodes in place, and restores the original
//! range. The sea level tracks a target underwater fraction as the landscape
//! evolves.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::continent::ContinentStack;
use crate::erosion::{self, ErosionBrush};
use crate::heightgen;
use crate::noise_field::NoiseField;
use crate::params::SimulationParams;
use crate::tilemap::Tilemap;

/// Iterations between sea-level re-solves.
const SEA_LEVEL_CADENCE: usize = 10;

pub struct World {
    pub params: SimulationParams,
    rng: ChaCha8Rng,
    noise: NoiseField,
    layers: ContinentStack,
    base: Tilemap<f32>,
    map: Tilemap<f32>,
    brush: ErosionBrush,
    pub iteration: usize,
    pub sea_level: f32,
}

impl World {
    /// Build the initial state: scatter layer points, synthesize the base
    /// field once, precompute the erosion brush. Callers validate `params`
    /// first.
    pub fn new(params: SimulationParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let noise = NoiseField::new(params.seed as u32);
        let layers = ContinentStack::new(&params, &mut rng);

        let mut base = Tilemap::new_with(params.width, params.height, 0.0f32);
        heightgen::synthesize(
            &mut base,
            &noise,
            &mut rng,
            params.octaves,
            params.persistence,
            params.lacunarity,
            params.noise_scale,
        );

        let map = Tilemap::new_with(params.width, params.height, 0.0f32);
        let brush = ErosionBrush::new(params.width, params.height, params.erosion_radius);

        Self {
            rng,
            noise,
            layers,
            base,
            map,
            brush,
            iteration: 0,
            sea_level: 0.5,
            params,
        }
    }

    /// Advance one orchestration iteration. Returns false once the final
    /// erosion pass has run and the field is inert.
    pub fn advance(&mut self) -> bool {
        if self.iteration < self.params.max_iterations {
            self.layers
                .update(self.iteration, &mut self.map, &self.noise, &mut self.rng);
            self.map.add_scaled(&self.base, self.params.base_blend);
            self.erosion_pass(self.params.droplets_per_pass);
        } else if self.iteration == self.params.max_iterations {
            self.erosion_pass(self.params.final_droplets);
        } else {
            return false;
        }

        self.iteration += 1;
        if self.iteration % SEA_LEVEL_CADENCE == 0 {
            self.update_sea_level();
        }
        true
    }

    /// Normalize, run droplets in place, restore the original range.
    fn erosion_pass(&mut self, droplets: usize) {
        let (min, max) = self.map.normalize();
        let width = self.map.width;
        let height = self.map.height;
        if self.params.parallel {
            let pass_seed = self.params.seed.wrapping_add(self.iteration as u64);
            erosion::erode_parallel(
                self.map.as_mut_slice(),
                width,
                height,
                &self.brush,
                &self.params,
                pass_seed,
                droplets,
            );
        } else {
            erosion::erode(
                self.map.as_mut_slice(),
                width,
                height,
                &self.brush,
                &self.params,
                &mut self.rng,
                droplets,
            );
        }
        self.map.rescale(min, max);
    }

    /// The evolving combined field.
    pub fn map(&self) -> &Tilemap<f32> {
        &self.map
    }

    /// Fresh [0, 1] copy of the field for display or export.
    pub fn snapshot_normalized(&self) -> Tilemap<f32> {
        let mut snapshot = self.map.clone();
        snapshot.normalize();
        snapshot
    }

    pub fn update_sea_level(&mut self) {
        self.sea_level = solve_sea_level(&self.snapshot_normalized(), self.params.water_threshold);
    }
}

/// Bisect the level at which `water_fraction` of cells sit underwater.
/// Expects a field normalized to [0, 1]; converges to within 1e-3.
pub fn solve_sea_level(map: &Tilemap<f32>, water_fraction: f32) -> f32 {
    let total = (map.width * map.height) as f32;
    let mut lower = 0.0f32;
    let mut upper = 1.0f32;
    let mut level = 0.0f32;

    while upper - lower > 0.001 {
        level = (lower + upper) / 2.0;
        let below = map.as_slice().iter().filter(|&&h| h < level).count() as f32;
        if below / total < water_fraction {
            lower = level;
        } else {
            upper = level;
        }
    }

    level
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> SimulationParams {
        SimulationParams {
            width: 48,
            height: 32,
            seed: 12,
            octaves: 3,
            layer_count: 4,
            start_points: 2,
            erosion_radius: 2,
            droplets_per_pass: 50,
            final_droplets: 100,
            max_iterations: 2,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn test_sea_level_splits_bimodal_field() {
        let mut map = Tilemap::new_with(20, 10, 0.2f32);
        for y in 0..10 {
            for x in 10..20 {
                map.set(x, y, 0.8);
            }
        }
        let level = solve_sea_level(&map, 0.5);
        assert!(level > 0.2 && level < 0.8);
    }

    #[test]
    fn test_advance_runs_to_completion() {
        let params = small_params();
        let mut world = World::new(params.clone());

        let mut steps = 0;
        while world.advance() {
            steps += 1;
            assert!(steps <= params.max_iterations + 1);
        }
        // max_iterations layering passes plus the final erosion pass.
        assert_eq!(world.iteration, params.max_iterations + 1);
        assert!(!world.advance(), "a finished world stays inert");
    }

    #[test]
    fn test_advance_mutates_field() {
        let mut world = World::new(small_params());
        world.advance();
        let (min, max) = world.map().min_max();
        assert!(max > min, "layering plus base blend must leave relief");
    }

    #[test]
    fn test_worlds_with_same_seed_match() {
        let params = small_params();
        let mut a = World::new(params.clone());
        let mut b = World::new(params);
        a.advance();
        b.advance();
        assert_eq!(a.map().as_slice(), b.map().as_slice());
    }

    #[test]
    fn test_snapshot_is_normalized_copy() {
        let mut world = World::new(small_params());
        world.advance();
        let snapshot = world.snapshot_normalized();
        let (min, max) = snapshot.min_max();
        assert!(min >= 0.0 && max <= 1.0);
    }
}
