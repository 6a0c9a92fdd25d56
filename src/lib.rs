//! firegrid: burned-area grid-cell aggregation
//!
//! Aggregates per-pixel burn detections (burn day of year, land cover,
//! observation status, burn probability) into fixed-size grid cells and
//! produces the burned-area product bands: burned area, standard error,
//! number of patches, observed fraction, burnable fraction and burned area
//! per vegetation class.

pub mod config;
pub mod core;
pub mod io;
pub mod types;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use config::{AggregationConfig, MinimumSample, Tolerances};
pub use core::{GridCellAggregator, GridCellStats, Period, SubPeriod, TileAggregate};
pub use io::{GeoCoding, GridCellWriter, LandCoverRemapper, PixelWindowSource, TileKey};
pub use types::{GeoPos, GeoTransform, GridError, GridResult};
