// src/utils/mod.rs
pub mod geo;

pub use geo::{distance_km, parse_coordinate};
