//! Precomputed per-cell erosion brushes.
//!
//! Each cell owns the set of in-bounds neighbors within the erosion radius,
//! weighted by distance and normalized so every cell's weights sum to one.
//! Built once at initialization, read-only afterwards. Storage is CSR-style:
//! one offsets table into shared index/weight arrays, no per-cell
//! allocations.

pub struct ErosionBrush {
    starts: Vec<u32>,
    indices: Vec<u32>,
    weights: Vec<f32>,
}

impl ErosionBrush {
    /// Precompute brushes for every cell of a `width` x `height` grid.
    ///
    /// O(width * height * radius^2) one-time cost; dominates initialization
    /// memory. Callers validate that the radius fits the grid.
    pub fn new(width: usize, height: usize, radius: usize) -> Self {
        let cells = width * height;
        let r = radius as i32;
        let radius_f = radius as f32;
        let sqr_radius = (r * r) as f32;

        let mut starts = Vec::with_capacity(cells + 1);
        let mut indices = Vec::new();
        let mut weights = Vec::new();
        let mut scratch: Vec<(u32, f32)> =
            Vec::with_capacity((2 * radius + 1) * (2 * radius + 1));

        starts.push(0u32);
        for cell in 0..cells {
            let center_x = (cell % width) as i32;
            let center_y = (cell / width) as i32;

            scratch.clear();
            let mut weight_sum = 0.0f32;
            for dy in -r..=r {
                for dx in -r..=r {
                    let sqr_dist = (dx * dx + dy * dy) as f32;
                    if sqr_dist >= sqr_radius {
                        continue;
                    }
                    let nx = center_x + dx;
                    let ny = center_y + dy;
                    if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                        continue;
                    }
                    let weight = 1.0 - sqr_dist.sqrt() / radius_f;
                    weight_sum += weight;
                    scratch.push((ny as u32 * width as u32 + nx as u32, weight));
                }
            }

            // The center offset always survives with weight 1, so the sum
            // is never zero.
            for &(index, weight) in &scratch {
                indices.push(index);
                weights.push(weight / weight_sum);
            }
            starts.push(indices.len() as u32);
        }

        Self {
            starts,
            indices,
            weights,
        }
    }

    /// Neighbor indices and normalized weights for a flattened cell index.
    pub fn cell(&self, cell: usize) -> (&[u32], &[f32]) {
        let lo = self.starts[cell] as usize;
        let hi = self.starts[cell + 1] as usize;
        (&self.indices[lo..hi], &self.weights[lo..hi])
    }

    /// Number of cells covered.
    pub fn cells(&self) -> usize {
        self.starts.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one_everywhere() {
        let brush = ErosionBrush::new(10, 8, 3);
        for cell in 0..brush.cells() {
            let (_, weights) = brush.cell(cell);
            let total: f32 = weights.iter().sum();
            assert!(
                (total - 1.0).abs() < 1e-5,
                "cell {} weights sum to {}",
                cell,
                total
            );
        }
    }

    #[test]
    fn test_corner_brush_is_clipped() {
        let brush = ErosionBrush::new(10, 8, 3);
        let (corner, _) = brush.cell(0);
        let (interior, _) = brush.cell(4 * 10 + 5);
        assert!(corner.len() < interior.len());
        assert!(!corner.is_empty());
    }

    #[test]
    fn test_indices_stay_in_bounds() {
        let width = 7;
        let height = 9;
        let brush = ErosionBrush::new(width, height, 3);
        for cell in 0..brush.cells() {
            let (indices, _) = brush.cell(cell);
            for &index in indices {
                assert!((index as usize) < width * height);
            }
        }
    }

    #[test]
    fn test_brush_covers_circle_not_square() {
        let brush = ErosionBrush::new(20, 20, 3);
        let (interior, _) = brush.cell(10 * 20 + 10);
        // Every offset in the 5x5 block has squared distance <= 8 < 9, and
        // the distance-3 ring is excluded: 25 entries, not 49.
        assert_eq!(interior.len(), 25);
    }
}
