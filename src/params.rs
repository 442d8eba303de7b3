//! Simulation parameters and startup validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// All tunables for one generation run.
///
/// Defaults: a 1800x900 sheet, fifty continent layers, and a heavy droplet
/// budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Master seed for the rng stream and the noise field
    pub seed: u64,

    /// Number of noise octaves for the base field
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
    /// Base sampling scale for the noise field
    pub noise_scale: f32,
    /// Factor applied to the base field each time it is blended into the
    /// accumulation map
    pub base_blend: f32,

    /// Number of continent layers
    pub layer_count: usize,
    /// Points in the coarsest layer; layer i holds `start_points + i`
    pub start_points: usize,
    /// Scales every layer's influence radius
    pub size_modifier: f32,
    /// Lloyd-relaxation rate, shared across a layer's points
    pub move_speed: f32,
    /// Noise sampling scale inside layer deposits
    pub bias_scale: f32,
    /// Accumulation rate per layer deposit
    pub layer_rate: f32,

    /// Radius of the precomputed erosion brush (cells)
    pub erosion_radius: usize,
    /// Momentum conservation factor (0.0-1.0); higher keeps droplets
    /// moving in a straight line longer
    pub inertia: f32,
    /// Sediment carrying capacity multiplier
    pub capacity_factor: f32,
    /// Capacity floor so droplets on flats still carry a little
    pub min_capacity: f32,
    /// Rate at which droplets pick up terrain (0.0-1.0)
    pub erode_speed: f32,
    /// Rate at which droplets shed surplus sediment (0.0-1.0)
    pub deposit_speed: f32,
    /// Water lost per step (0.0-1.0)
    pub evaporate_speed: f32,
    /// Acceleration applied to descending droplets
    pub gravity: f32,
    /// Maximum steps per droplet
    pub max_droplet_lifetime: usize,
    /// Starting water volume per droplet
    pub initial_water: f32,
    /// Starting speed per droplet
    pub initial_speed: f32,
    /// Droplets simulated per orchestration iteration
    pub droplets_per_pass: usize,
    /// Droplets in the one-off final pass
    pub final_droplets: usize,

    /// Layering/erosion iterations before the final pass
    pub max_iterations: usize,
    /// Target fraction of cells below sea level
    pub water_threshold: f32,
    /// Use the batched parallel droplet mode (output diverges from the
    /// sequential mode)
    pub parallel: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 900,
            seed: 12,

            octaves: 10,
            persistence: 0.83,
            lacunarity: 1.23,
            noise_scale: 0.043,
            base_blend: 10.0,

            layer_count: 50,
            start_points: 2,
            size_modifier: 30.0,
            move_speed: 0.01,
            bias_scale: 0.0001,
            layer_rate: 1.0,

            erosion_radius: 3,
            inertia: 0.05,
            capacity_factor: 4.0,
            min_capacity: 0.01,
            erode_speed: 0.3,
            deposit_speed: 0.3,
            evaporate_speed: 0.01,
            gravity: 4.0,
            max_droplet_lifetime: 30,
            initial_water: 1.0,
            initial_speed: 1.0,
            droplets_per_pass: 200_000,
            final_droplets: 2_000_000,

            max_iterations: 100,
            water_threshold: 0.75,
            parallel: false,
        }
    }
}

/// Configuration rejected before the simulation starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyGrid,
    NoOctaves,
    NoLayers,
    NoStartPoints,
    BadErosionRadius {
        radius: usize,
        width: usize,
        height: usize,
    },
    InertiaOutOfRange(f32),
    EvaporationOutOfRange(f32),
    NonPositive(&'static str),
    WaterThresholdOutOfRange(f32),
    ZeroDropletLifetime,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyGrid => write!(f, "grid dimensions must be non-zero"),
            ConfigError::NoOctaves => write!(f, "octave count must be at least 1"),
            ConfigError::NoLayers => write!(f, "layer count must be at least 1"),
            ConfigError::NoStartPoints => {
                write!(f, "layers need at least one starting point")
            }
            ConfigError::BadErosionRadius {
                radius,
                width,
                height,
            } => write!(
                f,
                "erosion radius {} is invalid for a {}x{} grid",
                radius, width, height
            ),
            ConfigError::InertiaOutOfRange(v) => {
                write!(f, "inertia {} must be in [0, 1)", v)
            }
            ConfigError::EvaporationOutOfRange(v) => {
                write!(f, "evaporation speed {} must be in (0, 1)", v)
            }
            ConfigError::NonPositive(name) => write!(f, "{} must be positive", name),
            ConfigError::WaterThresholdOutOfRange(v) => {
                write!(f, "water threshold {} must be in (0, 1)", v)
            }
            ConfigError::ZeroDropletLifetime => {
                write!(f, "droplet lifetime must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl SimulationParams {
    /// Validate the configuration before any grid is allocated.
    ///
    /// The inner loops assume these invariants instead of re-checking them:
    /// relaxation divides by the point count, the brush builder needs room
    /// for its radius, and the evaporation multiplier must actually shrink
    /// droplets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if self.octaves == 0 {
            return Err(ConfigError::NoOctaves);
        }
        if self.layer_count == 0 {
            return Err(ConfigError::NoLayers);
        }
        if self.start_points == 0 {
            return Err(ConfigError::NoStartPoints);
        }
        if self.erosion_radius == 0
            || 2 * self.erosion_radius + 1 > self.width.min(self.height)
        {
            return Err(ConfigError::BadErosionRadius {
                radius: self.erosion_radius,
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..1.0).contains(&self.inertia) {
            return Err(ConfigError::InertiaOutOfRange(self.inertia));
        }
        if self.evaporate_speed <= 0.0 || self.evaporate_speed >= 1.0 {
            return Err(ConfigError::EvaporationOutOfRange(self.evaporate_speed));
        }
        for (name, value) in [
            ("persistence", self.persistence),
            ("lacunarity", self.lacunarity),
            ("noise scale", self.noise_scale),
            ("size modifier", self.size_modifier),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive(name));
            }
        }
        if self.water_threshold <= 0.0 || self.water_threshold >= 1.0 {
            return Err(ConfigError::WaterThresholdOutOfRange(self.water_threshold));
        }
        if self.max_droplet_lifetime == 0 {
            return Err(ConfigError::ZeroDropletLifetime);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_start_points_rejected() {
        let params = SimulationParams {
            start_points: 0,
            ..SimulationParams::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::NoStartPoints));
    }

    #[test]
    fn test_oversized_brush_rejected() {
        let params = SimulationParams {
            width: 100,
            height: 100,
            erosion_radius: 60,
            ..SimulationParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::BadErosionRadius { .. })
        ));
    }

    #[test]
    fn test_evaporation_bounds_rejected() {
        for bad in [0.0, 1.0, 1.5] {
            let params = SimulationParams {
                evaporate_speed: bad,
                ..SimulationParams::default()
            };
            assert!(matches!(
                params.validate(),
                Err(ConfigError::EvaporationOutOfRange(_))
            ));
        }
    }
}
