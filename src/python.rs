//! Python bindings (`firegrid._core`)

use crate::config::AggregationConfig;
use crate::core::aggregate::GridCellAggregator;
use crate::core::area::AreaCalculator;
use crate::core::patches;
use crate::core::period::Period;
use crate::io::geocoding::AffineGeoCoding;
use crate::io::landcover::CciLandCoverRemapping;
use crate::io::window::InMemorySource;
use crate::types::{GeoTransform, GridError};
use numpy::{PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

/// Convert PyReadonlyArray2 to ndarray Array2
fn numpy_to_array2<T>(arr: PyReadonlyArray2<T>) -> ndarray::Array2<T>
where
    T: Copy + numpy::Element,
{
    arr.as_array().to_owned()
}

/// Reshape a row-major band into a (height, width) numpy array
fn vec_to_numpy<T>(py: Python, values: Vec<T>, height: usize, width: usize) -> PyResult<PyObject>
where
    T: numpy::Element + Copy,
{
    let array = ndarray::Array2::from_shape_vec((height, width), values)
        .map_err(|e| PyRuntimeError::new_err(format!("Band shape mismatch: {}", e)))?;
    Ok(array.to_pyarray(py).into())
}

fn to_py_err(e: GridError) -> PyErr {
    match e {
        GridError::InvalidInput(_) | GridError::Config(_) => PyValueError::new_err(e.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Count 4-connected patches of `True` pixels
#[pyfunction]
fn count_patches(mask: PyReadonlyArray2<bool>) -> usize {
    patches::count_patches(mask.as_array())
}

/// Area in m² of pixel (x, y) of a raster with a GDAL-style geotransform
#[pyfunction]
fn pixel_area(geo_transform: [f64; 6], x: usize, y: usize, width: usize, height: usize) -> PyResult<f64> {
    if width == 0 || height == 0 {
        return Err(PyValueError::new_err("Raster size must be positive"));
    }
    let calculator = AreaCalculator::new(AffineGeoCoding::wgs84(GeoTransform::from_gdal(geo_transform)));
    calculator
        .pixel_area(x, y, width - 1, height - 1)
        .map_err(to_py_err)
}

/// Aggregate a tile held in numpy arrays into grid-cell bands.
///
/// Land cover uses the CCI legend; with `half_month` the period is split at
/// the 7th and 22nd of the month and one band set per half is returned.
#[pyfunction]
#[pyo3(signature = (burn_day, area, land_cover, year, month, cell_size, half_month=false))]
#[allow(clippy::too_many_arguments)]
fn aggregate_tile(
    py: Python,
    burn_day: PyReadonlyArray2<i32>,
    area: PyReadonlyArray2<f64>,
    land_cover: PyReadonlyArray2<i32>,
    year: i32,
    month: u32,
    cell_size: usize,
    half_month: bool,
) -> PyResult<PyObject> {
    let burn_day = numpy_to_array2(burn_day);
    let area = numpy_to_array2(area);
    let land_cover = numpy_to_array2(land_cover);
    if cell_size == 0 {
        return Err(PyValueError::new_err("cell_size must be positive"));
    }

    let (rows, cols) = burn_day.dim();
    let config = AggregationConfig {
        cell_size,
        target_width: cols.div_ceil(cell_size),
        target_height: rows.div_ceil(cell_size),
        ..AggregationConfig::default()
    };
    let (width, height) = (config.target_width, config.target_height);

    let period = if half_month {
        Period::half_month(year, month)
    } else {
        Period::month(year, month)
    }
    .map_err(to_py_err)?;

    let remapping = CciLandCoverRemapping;
    let mut source = InMemorySource::new(burn_day, area)
        .and_then(|s| s.with_remapped_land_cover(land_cover, &remapping))
        .map_err(to_py_err)?;
    let aggregator = GridCellAggregator::new(config, Box::new(remapping)).map_err(to_py_err)?;

    let result = aggregator.aggregate(&period, &mut source).map_err(to_py_err)?;

    let output = PyDict::new(py);
    for stats in &result.stats {
        let bands = PyDict::new(py);
        for (name, band) in stats.bands() {
            let values: Vec<f64> = (0..band.len()).filter_map(|i| band.value_as_f64(i)).collect();
            bands.set_item(name, vec_to_numpy(py, values, height, width)?)?;
        }
        let classes = PyList::empty(py);
        for band in &stats.ba_in_lc {
            classes.append(vec_to_numpy(py, band.clone(), height, width)?)?;
        }
        bands.set_item(crate::core::stats::BURNED_AREA_IN_VEGETATION_CLASS, classes)?;
        output.set_item(stats.sub_period.to_string(), bands)?;
    }
    output.set_item("skipped_cells", result.skipped_cells)?;
    output.set_item("diagnostics", result.diagnostics.len())?;

    Ok(output.into())
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(count_patches, m)?)?;
    m.add_function(wrap_pyfunction!(pixel_area, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_tile, m)?)?;
    Ok(())
}
