//! Elevation color ramp.
//!
//! An immutable ramp of 31 land-to-rock colors with evenly spaced height
//! breakpoints. Heights are re-mapped around the sea level before lookup:
//! below-sea values land in [-1, 0) and draw as the fixed water color.
//! Constructed once at startup, never mutated.

/// Number of ramp entries.
const RAMP_LEN: usize = 31;

/// Everything below sea level.
const WATER: [u8; 3] = [0, 0, 255];

/// Sand through grass bands into bare rock and snow.
const LAND_COLORS: [[u8; 3]; RAMP_LEN] = [
    [203, 189, 147],
    [198, 194, 145],
    [192, 199, 145],
    [184, 200, 137],
    [178, 205, 137],
    [173, 211, 135],
    [163, 217, 129],
    [152, 223, 129],
    [140, 230, 110],
    [130, 240, 75],
    [124, 252, 0],
    [115, 240, 0],
    [100, 228, 0],
    [90, 208, 20],
    [76, 187, 23],
    [65, 180, 23],
    [59, 167, 23],
    [53, 150, 35],
    [85, 130, 102],
    [120, 102, 115],
    [136, 141, 140],
    [145, 150, 145],
    [159, 159, 159],
    [169, 169, 169],
    [178, 178, 178],
    [189, 189, 189],
    [200, 200, 200],
    [211, 211, 211],
    [225, 225, 225],
    [242, 242, 242],
    [255, 255, 255],
];

/// Discrete land palette plus the water cutoff, keyed by normalized height.
pub struct ColorRamp {
    colors: [[u8; 3]; RAMP_LEN],
    breakpoints: [f32; RAMP_LEN],
    water: [u8; 3],
}

impl ColorRamp {
    /// The standard ramp: 31 colors at breakpoints `i / 31`.
    pub fn standard() -> Self {
        let mut breakpoints = [0.0f32; RAMP_LEN];
        for (i, b) in breakpoints.iter_mut().enumerate() {
            *b = i as f32 / RAMP_LEN as f32;
        }
        Self {
            colors: LAND_COLORS,
            breakpoints,
            water: WATER,
        }
    }

    /// Map a normalized height in [0, 1] through the sea-level split to RGB.
    pub fn color_for(&self, value: f32, sea_level: f32) -> [u8; 3] {
        let remapped = if value < sea_level {
            map_range(value, 0.0, sea_level, -1.0, 0.0)
        } else {
            map_range(value, sea_level, 1.0, 0.0, 1.0)
        };
        if remapped < 0.0 {
            return self.water;
        }
        self.colors[self.bucket(remapped)]
    }

    /// Nearest-lower-breakpoint lookup.
    fn bucket(&self, value: f32) -> usize {
        for i in 0..RAMP_LEN {
            if value >= self.breakpoints[i]
                && (i == RAMP_LEN - 1 || value < self.breakpoints[i + 1])
            {
                return i;
            }
        }
        RAMP_LEN - 1
    }
}

/// Linear remap of `value` from one range onto another.
pub(crate) fn map_range(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    to_min + (to_max - to_min) * ((value - from_min) / (from_max - from_min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_sea_level_is_water() {
        let ramp = ColorRamp::standard();
        assert_eq!(ramp.color_for(0.2, 0.5), WATER);
        assert_eq!(ramp.color_for(0.0, 0.5), WATER);
    }

    #[test]
    fn test_top_of_range_is_last_color() {
        let ramp = ColorRamp::standard();
        assert_eq!(ramp.color_for(1.0, 0.5), LAND_COLORS[RAMP_LEN - 1]);
    }

    #[test]
    fn test_shoreline_starts_at_first_color() {
        let ramp = ColorRamp::standard();
        assert_eq!(ramp.color_for(0.5, 0.5), LAND_COLORS[0]);
    }

    #[test]
    fn test_land_buckets_ascend_with_height() {
        let ramp = ColorRamp::standard();
        let low = ramp.bucket(0.1);
        let high = ramp.bucket(0.9);
        assert!(low < high);
    }

    #[test]
    fn test_breakpoints_evenly_spaced() {
        let ramp = ColorRamp::standard();
        for i in 1..RAMP_LEN {
            let gap = ramp.breakpoints[i] - ramp.breakpoints[i - 1];
            assert!((gap - 1.0 / RAMP_LEN as f32).abs() < 1e-6);
        }
    }
}
