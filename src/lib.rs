//! Terrain generation library
//!
//! Layered noise synthesis, Voronoi continent layering, and droplet
//! hydraulic erosion, plus the window and export surfaces that consume
//! the final heightfield.

pub mod colors;
pub mod continent;
pub mod erosion;
pub mod export;
pub mod heightgen;
pub mod noise_field;
pub mod params;
pub mod tilemap;
pub mod viewer;
pub mod world;
