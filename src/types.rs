use serde::{Deserialize, Serialize};

/// Burn day-of-year marking a pixel without observation
pub const NO_DATA: i32 = -1;

/// Burn day-of-year marking a pixel that is masked or unburnable by construction
pub const UNBURNABLE: i32 = 999;

/// Observation status code of a pixel seen cloud-free during the period
pub const OBSERVED: i32 = 1;

/// Value left in every band for cells without source data
pub const FILL_VALUE: f32 = 0.0;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPos {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPos {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && self.lat.abs() <= 90.0
    }
}

/// Geospatial transformation parameters (GDAL coefficient order)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Plate carrée grid with square pixels anchored at the upper-left corner
    pub fn geographic(upper_left_lon: f64, upper_left_lat: f64, pixel_size_deg: f64) -> Self {
        Self {
            top_left_x: upper_left_lon,
            pixel_width: pixel_size_deg,
            rotation_x: 0.0,
            top_left_y: upper_left_lat,
            rotation_y: 0.0,
            pixel_height: -pixel_size_deg,
        }
    }

    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        Self {
            top_left_x: coefficients[0],
            pixel_width: coefficients[1],
            rotation_x: coefficients[2],
            top_left_y: coefficients[3],
            rotation_y: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// Map an image coordinate (pixel corner convention) to the transform's CRS
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.top_left_x + x * self.pixel_width + y * self.rotation_x,
            self.top_left_y + x * self.rotation_y + y * self.pixel_height,
        )
    }
}

/// Rectangle of source pixels belonging to one target grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl CellRect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// Source rectangle of target cell `(cell_x, cell_y)` for square cells of `cell_size` pixels
    pub fn for_cell(cell_x: usize, cell_y: usize, cell_size: usize) -> Self {
        Self::new(cell_x * cell_size, cell_y * cell_size, cell_size, cell_size)
    }

    /// Clip against a raster of `width` x `height`; `None` if nothing overlaps
    pub fn clip(&self, width: usize, height: usize) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self::new(self.x, self.y, w, h))
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Error types for grid-cell aggregation
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invariant violated at cell {cell:?}: {message}")]
    InvariantViolation {
        cell: Option<usize>,
        message: String,
    },

    #[error("Pixel data unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Unable to predict error from BA {burned_area:?}, areas {cell_area:?}: {reason}")]
    StatisticalModelFailure {
        burned_area: Vec<f64>,
        cell_area: Vec<f64>,
        reason: String,
    },

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

impl GridError {
    pub fn invariant(cell: Option<usize>, message: impl Into<String>) -> Self {
        GridError::InvariantViolation {
            cell,
            message: message.into(),
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, GridError::InvariantViolation { .. })
    }
}

impl From<quick_xml::DeError> for GridError {
    fn from(e: quick_xml::DeError) -> Self {
        GridError::Config(e.to_string())
    }
}

/// Result type for grid operations
pub type GridResult<T> = Result<T, GridError>;
