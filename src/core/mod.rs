//! Core grid-cell aggregation modules

pub mod aggregate;
pub mod area;
pub mod patches;
pub mod period;
pub mod stats;
pub mod tile_job;
pub mod uncertainty;
pub mod validate;

// Re-export main types
pub use aggregate::{fraction, GridCellAggregator, TileAggregate};
pub use area::AreaCalculator;
pub use patches::{count_patches, PatchCounter};
pub use period::{HalfMonthSplit, Period, SubPeriod};
pub use stats::{BandData, GridCellStats};
pub use tile_job::run_tile;
pub use uncertainty::{predict_errors, BurnProbabilityUncertainty, ErrorEstimator};
pub use validate::{Diagnostic, DiagnosticKind};
