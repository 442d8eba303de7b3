//! Droplet-based hydraulic erosion over the combined heightfield.

pub mod brush;
pub mod hydraulic;

pub use brush::ErosionBrush;
pub use hydraulic::{erode, erode_parallel, ErosionStats};
