//! Aggregation parameters
//!
//! Parameters can be built in code (every struct has a `Default`) or read from
//! the XML fragment of a production request:
//!
//! ```xml
//! <aggregation>
//!     <cellSize>90</cellSize>
//!     <targetWidth>40</targetWidth>
//!     <targetHeight>40</targetHeight>
//!     <landCoverClassCount>18</landCoverClassCount>
//!     <tolerances>
//!         <areaSlack>1.001</areaSlack>
//!     </tolerances>
//! </aggregation>
//! ```

use crate::types::{GridError, GridResult};
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of land-cover classes of the fire products
pub const LC_CLASSES_COUNT: usize = 18;

/// Source pixels along one side of a target grid cell
pub const DEFAULT_CELL_SIZE: usize = 90;

/// Empirically tuned thresholds of the invariant checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tolerances {
    /// Factor by which burned area may exceed the cell area
    pub area_slack: f64,
    /// Allowed relative gap between summed land-cover burned area and burned area
    pub lc_relative_tolerance: f64,
    /// Minimum number of burned cells before the land-cover sum is checked
    pub min_burned_cells: Option<usize>,
    /// Minimum share of burned cells before the land-cover sum is checked
    pub min_burned_fraction: Option<f64>,
    /// Burned area below which a cell's standard error is forced to zero
    pub negligible_burned_area: f64,
    /// Per-cell limit of land-cover burned fraction relative to burnable fraction
    pub burnable_lc_slack: Option<f64>,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            area_slack: 1.001,
            lc_relative_tolerance: 0.05,
            min_burned_cells: None,
            min_burned_fraction: None,
            negligible_burned_area: 1e-5,
            burnable_lc_slack: None,
        }
    }
}

/// How many burned cells a tile needs before the land-cover sum check applies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinimumSample {
    Cells(usize),
    Fraction(f64),
}

impl MinimumSample {
    pub const HALF_MONTH: MinimumSample = MinimumSample::Cells(80);
    pub const WHOLE_PERIOD: MinimumSample = MinimumSample::Fraction(0.05);

    pub fn is_reached(&self, burned_cells: usize, total_cells: usize) -> bool {
        match *self {
            MinimumSample::Cells(n) => burned_cells >= n,
            MinimumSample::Fraction(f) => burned_cells as f64 >= total_cells as f64 * f,
        }
    }
}

impl Tolerances {
    /// Minimum sample for the land-cover sum check; explicit settings win over the mode default
    pub fn minimum_sample(&self, half_month: bool) -> MinimumSample {
        match (self.min_burned_cells, self.min_burned_fraction) {
            (Some(cells), _) => MinimumSample::Cells(cells),
            (None, Some(fraction)) => MinimumSample::Fraction(fraction),
            (None, None) if half_month => MinimumSample::HALF_MONTH,
            (None, None) => MinimumSample::WHOLE_PERIOD,
        }
    }
}

/// Grid-cell aggregation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationConfig {
    /// Source pixels per target cell side
    pub cell_size: usize,
    /// Target cells per tile row
    pub target_width: usize,
    /// Target cell rows per tile
    pub target_height: usize,
    pub land_cover_class_count: usize,
    /// Drop burned pixels whose (non-zero) land-cover code maps to no class
    pub mask_unmappable_pixels: bool,
    pub tolerances: Tolerances,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            target_width: 40,
            target_height: 40,
            land_cover_class_count: LC_CLASSES_COUNT,
            mask_unmappable_pixels: false,
            tolerances: Tolerances::default(),
        }
    }
}

impl AggregationConfig {
    pub fn from_xml_str(xml: &str) -> GridResult<Self> {
        let config: AggregationConfig = from_str(xml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> GridResult<Self> {
        log::info!("Reading aggregation config: {}", path.as_ref().display());
        let xml = std::fs::read_to_string(path.as_ref())?;
        Self::from_xml_str(&xml)
    }

    pub fn band_size(&self) -> usize {
        self.target_width * self.target_height
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.cell_size == 0 {
            return Err(GridError::Config("cellSize must be positive".to_string()));
        }
        if self.target_width == 0 || self.target_height == 0 {
            return Err(GridError::Config(format!(
                "Invalid target raster size {}x{}",
                self.target_width, self.target_height
            )));
        }
        let t = &self.tolerances;
        if !(t.area_slack >= 1.0) {
            return Err(GridError::Config(format!("areaSlack must be >= 1, got {}", t.area_slack)));
        }
        if !(t.lc_relative_tolerance >= 0.0) {
            return Err(GridError::Config(format!(
                "lcRelativeTolerance must be >= 0, got {}",
                t.lc_relative_tolerance
            )));
        }
        if let Some(f) = t.min_burned_fraction {
            if !(0.0..=1.0).contains(&f) {
                return Err(GridError::Config(format!("minBurnedFraction out of [0, 1]: {}", f)));
            }
        }
        Ok(())
    }
}
