use crate::core::area::AreaCalculator;
use crate::core::period::Period;
use crate::io::geocoding::GeoCoding;
use crate::io::landcover::LandCoverRemapper;
use crate::types::{CellRect, GridError, GridResult, NO_DATA};
use ndarray::{s, Array2};

/// Per-pixel arrays of one target-cell window
#[derive(Debug, Clone)]
pub struct PixelWindow {
    /// Burn day-of-year, `NO_DATA` or `UNBURNABLE`
    pub burn_day: Array2<i32>,
    /// Geodetic pixel area in m²
    pub area: Array2<f64>,
    /// Raw land-cover code
    pub land_cover: Array2<i32>,
    pub burnable: Array2<bool>,
    /// Observation status, `OBSERVED` for cloud-free pixels
    pub status: Array2<i32>,
    /// Burn probability in percent, read only by the uncertainty model
    pub probability: Array2<f64>,
}

impl PixelWindow {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            burn_day: Array2::from_elem((rows, cols), NO_DATA),
            area: Array2::zeros((rows, cols)),
            land_cover: Array2::zeros((rows, cols)),
            burnable: Array2::from_elem((rows, cols), false),
            status: Array2::zeros((rows, cols)),
            probability: Array2::zeros((rows, cols)),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.burn_day.dim()
    }

    pub fn len(&self) -> usize {
        self.burn_day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.burn_day.is_empty()
    }

    /// Reset every pixel to no-data, reallocating only if the shape changes
    pub fn reset(&mut self, rows: usize, cols: usize) {
        if self.dim() != (rows, cols) {
            *self = Self::new(rows, cols);
            return;
        }
        self.burn_day.fill(NO_DATA);
        self.area.fill(0.0);
        self.land_cover.fill(0);
        self.burnable.fill(false);
        self.status.fill(0);
        self.probability.fill(0.0);
    }

    pub fn check_shape(&self) -> GridResult<()> {
        let dim = self.dim();
        let consistent = self.area.dim() == dim
            && self.land_cover.dim() == dim
            && self.burnable.dim() == dim
            && self.status.dim() == dim
            && self.probability.dim() == dim;
        if consistent {
            Ok(())
        } else {
            Err(GridError::InvalidInput(format!(
                "Pixel window arrays disagree in shape (burn day {:?})",
                dim
            )))
        }
    }
}

/// Supplier of per-pixel data for target cells.
///
/// Implementations fill a caller-owned window so that it can be reused from
/// cell to cell. Returning `Ok(false)` means there is no data for the cell,
/// which is not an error; an `Err` aborts the whole tile.
pub trait PixelWindowSource {
    fn read_window(&mut self, rect: &CellRect, period: &Period, window: &mut PixelWindow) -> GridResult<bool>;
}

/// Source over bands that are already held in memory
#[derive(Debug, Clone)]
pub struct InMemorySource {
    burn_day: Array2<i32>,
    area: Array2<f64>,
    land_cover: Array2<i32>,
    burnable: Array2<bool>,
    status: Array2<i32>,
    probability: Array2<f64>,
}

impl InMemorySource {
    /// Build a source from burn days and pixel areas; every pixel starts
    /// burnable, observed, in land-cover code 0 with zero probability
    pub fn new(burn_day: Array2<i32>, area: Array2<f64>) -> GridResult<Self> {
        if burn_day.dim() != area.dim() {
            return Err(GridError::InvalidInput(format!(
                "Burn day raster {:?} and area raster {:?} differ in size",
                burn_day.dim(),
                area.dim()
            )));
        }
        let dim = burn_day.dim();
        Ok(Self {
            burn_day,
            area,
            land_cover: Array2::zeros(dim),
            burnable: Array2::from_elem(dim, true),
            status: Array2::from_elem(dim, crate::types::OBSERVED),
            probability: Array2::zeros(dim),
        })
    }

    /// Build a source whose pixel areas come from a geocoding
    pub fn with_geocoding<G: GeoCoding + Sync>(burn_day: Array2<i32>, geocoding: G) -> GridResult<Self> {
        let (rows, cols) = burn_day.dim();
        log::debug!("Computing pixel areas for {}x{} raster", cols, rows);
        let calculator = AreaCalculator::new(geocoding);
        let area = calculator.window_areas(&CellRect::new(0, 0, cols, rows), cols, rows)?;
        Self::new(burn_day, area)
    }

    pub fn with_land_cover(mut self, land_cover: Array2<i32>) -> GridResult<Self> {
        self.check_dim("land cover", land_cover.dim())?;
        self.land_cover = land_cover;
        Ok(self)
    }

    /// Set land cover and derive the burnable flag from the remapper
    pub fn with_remapped_land_cover(self, land_cover: Array2<i32>, remapper: &dyn LandCoverRemapper) -> GridResult<Self> {
        let burnable = land_cover.mapv(|code| remapper.is_burnable(code));
        self.with_land_cover(land_cover)?.with_burnable(burnable)
    }

    pub fn with_burnable(mut self, burnable: Array2<bool>) -> GridResult<Self> {
        self.check_dim("burnable", burnable.dim())?;
        self.burnable = burnable;
        Ok(self)
    }

    pub fn with_status(mut self, status: Array2<i32>) -> GridResult<Self> {
        self.check_dim("status", status.dim())?;
        self.status = status;
        Ok(self)
    }

    pub fn with_probability(mut self, probability: Array2<f64>) -> GridResult<Self> {
        self.check_dim("probability", probability.dim())?;
        self.probability = probability;
        Ok(self)
    }

    /// Raster size as (width, height)
    pub fn raster_size(&self) -> (usize, usize) {
        let (rows, cols) = self.burn_day.dim();
        (cols, rows)
    }

    fn check_dim(&self, name: &str, dim: (usize, usize)) -> GridResult<()> {
        if dim != self.burn_day.dim() {
            return Err(GridError::InvalidInput(format!(
                "{} raster {:?} does not match burn day raster {:?}",
                name,
                dim,
                self.burn_day.dim()
            )));
        }
        Ok(())
    }
}

impl PixelWindowSource for InMemorySource {
    fn read_window(&mut self, rect: &CellRect, _period: &Period, window: &mut PixelWindow) -> GridResult<bool> {
        let (width, height) = self.raster_size();
        let Some(clipped) = rect.clip(width, height) else {
            return Ok(false);
        };

        window.reset(clipped.height, clipped.width);
        let rows = clipped.y..clipped.y + clipped.height;
        let cols = clipped.x..clipped.x + clipped.width;
        window.burn_day.assign(&self.burn_day.slice(s![rows.clone(), cols.clone()]));
        window.area.assign(&self.area.slice(s![rows.clone(), cols.clone()]));
        window.land_cover.assign(&self.land_cover.slice(s![rows.clone(), cols.clone()]));
        window.burnable.assign(&self.burnable.slice(s![rows.clone(), cols.clone()]));
        window.status.assign(&self.status.slice(s![rows.clone(), cols.clone()]));
        window.probability.assign(&self.probability.slice(s![rows, cols]));
        Ok(true)
    }
}
