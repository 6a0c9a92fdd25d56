use crate::core::period::SubPeriod;
use crate::types::FILL_VALUE;
use serde::{Deserialize, Serialize};

/// Output band names as written to the gridded product
pub const BURNED_AREA: &str = "burned_area";
pub const STANDARD_ERROR: &str = "standard_error";
pub const NUMBER_OF_PATCHES: &str = "number_of_patches";
pub const FRACTION_OF_OBSERVED_AREA: &str = "fraction_of_observed_area";
pub const FRACTION_OF_BURNABLE_AREA: &str = "fraction_of_burnable_area";
pub const BURNED_AREA_IN_VEGETATION_CLASS: &str = "burned_area_in_vegetation_class";

/// Aggregated bands of one tile and sub-period, indexed in raster order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCellStats {
    pub sub_period: SubPeriod,
    pub band_size: usize,
    pub land_cover_class_count: usize,
    /// Burned area per cell (m²)
    pub burned_area: Vec<f64>,
    /// Total pixel area per cell (m²)
    pub area: Vec<f64>,
    pub patch_count: Vec<u32>,
    pub standard_error: Vec<f32>,
    pub coverage: Vec<f32>,
    pub burnable_fraction: Vec<f32>,
    /// Burned area per land-cover class, class `c + 1` at index `c`
    pub ba_in_lc: Vec<Vec<f64>>,
}

/// Borrowed view of one output band
#[derive(Debug, Clone, Copy)]
pub enum BandData<'a> {
    F64(&'a [f64]),
    F32(&'a [f32]),
    U32(&'a [u32]),
}

impl BandData<'_> {
    pub fn len(&self) -> usize {
        match self {
            BandData::F64(v) => v.len(),
            BandData::F32(v) => v.len(),
            BandData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value_as_f64(&self, index: usize) -> Option<f64> {
        match self {
            BandData::F64(v) => v.get(index).copied(),
            BandData::F32(v) => v.get(index).map(|&x| x as f64),
            BandData::U32(v) => v.get(index).map(|&x| x as f64),
        }
    }
}

impl GridCellStats {
    pub fn new(sub_period: SubPeriod, band_size: usize, land_cover_class_count: usize) -> Self {
        let fill = FILL_VALUE;
        Self {
            sub_period,
            band_size,
            land_cover_class_count,
            burned_area: vec![fill as f64; band_size],
            area: vec![fill as f64; band_size],
            patch_count: vec![0; band_size],
            standard_error: vec![fill; band_size],
            coverage: vec![fill; band_size],
            burnable_fraction: vec![fill; band_size],
            ba_in_lc: vec![vec![fill as f64; band_size]; land_cover_class_count],
        }
    }

    /// Burned area attributed to 1-based class `class`
    pub fn ba_in_class(&self, class: usize) -> Option<&[f64]> {
        class.checked_sub(1).and_then(|i| self.ba_in_lc.get(i)).map(Vec::as_slice)
    }

    /// Sum of land-cover burned area at one cell
    pub fn lc_sum_at(&self, index: usize) -> f64 {
        self.ba_in_lc.iter().map(|band| band[index]).sum()
    }

    pub fn total_burned_area(&self) -> f64 {
        self.burned_area.iter().sum()
    }

    pub fn burned_cell_count(&self) -> usize {
        self.burned_area.iter().filter(|&&ba| ba != 0.0).count()
    }

    /// Scalar output bands with their product names
    pub fn bands(&self) -> Vec<(&'static str, BandData<'_>)> {
        vec![
            (BURNED_AREA, BandData::F64(&self.burned_area)),
            (STANDARD_ERROR, BandData::F32(&self.standard_error)),
            (NUMBER_OF_PATCHES, BandData::U32(&self.patch_count)),
            (FRACTION_OF_OBSERVED_AREA, BandData::F32(&self.coverage)),
            (FRACTION_OF_BURNABLE_AREA, BandData::F32(&self.burnable_fraction)),
        ]
    }

    /// Per-class bands of `burned_area_in_vegetation_class`, in class order
    pub fn vegetation_class_bands(&self) -> impl Iterator<Item = (usize, BandData<'_>)> {
        self.ba_in_lc
            .iter()
            .enumerate()
            .map(|(i, band)| (i + 1, BandData::F64(band)))
    }
}
