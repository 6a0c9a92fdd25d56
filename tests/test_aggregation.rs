use approx::assert_relative_eq;
use firegrid::config::AggregationConfig;
use firegrid::core::{run_tile, GridCellAggregator, Period, SubPeriod};
use firegrid::io::{AffineGeoCoding, CciLandCoverRemapping, InMemorySource, MemoryWriter, TileKey};
use firegrid::types::{GeoTransform, NO_DATA, UNBURNABLE};
use ndarray::Array2;

const CELL_SIZE: usize = 4;
const CELLS: usize = 20;
const PIXELS: usize = CELL_SIZE * CELLS;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> AggregationConfig {
    AggregationConfig {
        cell_size: CELL_SIZE,
        target_width: CELLS,
        target_height: CELLS,
        ..AggregationConfig::default()
    }
}

fn geocoding() -> AffineGeoCoding {
    AffineGeoCoding::wgs84(GeoTransform::geographic(10.0, 5.0, 0.0025))
}

/// Burn days of a synthetic June 2008 tile: fire scars of varying dates
/// plus no-data and unburnable pixels
fn synthetic_burn_days() -> Array2<i32> {
    Array2::from_shape_fn((PIXELS, PIXELS), |(r, c)| match (r * 7 + c * 13) % 11 {
        0 => NO_DATA,
        1 => UNBURNABLE,
        2 | 3 => 155 + (r % 10) as i32,
        4 | 5 => 170 + (c % 12) as i32,
        _ => 0,
    })
}

fn synthetic_land_cover() -> Array2<i32> {
    Array2::from_shape_fn((PIXELS, PIXELS), |(r, _)| if r < PIXELS / 2 { 130 } else { 30 })
}

fn synthetic_source() -> InMemorySource {
    InMemorySource::with_geocoding(synthetic_burn_days(), geocoding())
        .and_then(|s| s.with_remapped_land_cover(synthetic_land_cover(), &CciLandCoverRemapping))
        .and_then(|s| {
            s.with_status(Array2::from_shape_fn((PIXELS, PIXELS), |(_, c)| if c % 4 == 0 { 0 } else { 1 }))
        })
        .and_then(|s| s.with_probability(Array2::from_shape_fn((PIXELS, PIXELS), |(r, c)| ((r + c) % 101) as f64)))
        .expect("synthetic source")
}

#[test]
fn test_fully_burned_tile_round_trip() {
    init_logging();
    let burn_day = Array2::from_elem((PIXELS, PIXELS), 160);
    let mut source = InMemorySource::with_geocoding(burn_day, geocoding())
        .unwrap()
        .with_land_cover(Array2::from_elem((PIXELS, PIXELS), 10))
        .unwrap();

    let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();
    let result = aggregator.aggregate(&Period::month(2008, 6).unwrap(), &mut source).unwrap();
    let stats = result.get(SubPeriod::Whole).unwrap();

    for i in 0..CELLS * CELLS {
        assert!(stats.area[i] > 0.0);
        assert_relative_eq!(stats.burned_area[i], stats.area[i], max_relative = 1e-12);
        assert_eq!(stats.coverage[i], 1.0);
        assert_eq!(stats.burnable_fraction[i], 1.0);
        assert_eq!(stats.patch_count[i], 1);
        assert_relative_eq!(stats.ba_in_class(1).unwrap()[i], stats.area[i], max_relative = 1e-12);
    }
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_synthetic_tile_invariants() {
    init_logging();
    let mut source = synthetic_source();
    let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();
    let result = aggregator.aggregate(&Period::month(2008, 6).unwrap(), &mut source).unwrap();
    let stats = result.get(SubPeriod::Whole).unwrap();

    assert!(stats.burned_cell_count() >= 80);
    for i in 0..CELLS * CELLS {
        assert!(stats.area[i] >= 0.0);
        assert!(stats.burned_area[i] >= 0.0);
        assert!(stats.burned_area[i] <= stats.area[i] * 1.001);
        assert!((0.0..=1.0).contains(&stats.coverage[i]));
        assert!((0.0..=1.0).contains(&stats.burnable_fraction[i]));
        assert!(stats.patch_count[i] as usize <= CELL_SIZE * CELL_SIZE);
        if stats.standard_error[i] > 0.0 {
            assert!(stats.burned_area[i] > 0.0);
        }
        if stats.burned_area[i] == 0.0 {
            assert_eq!(stats.patch_count[i], 0);
        }
    }

    let lc_sum: f64 = stats.ba_in_lc.iter().flatten().sum();
    assert_relative_eq!(lc_sum, stats.total_burned_area(), max_relative = 1e-9);
}

#[test]
fn test_half_months_partition_the_month() {
    init_logging();
    let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();

    let whole = aggregator
        .aggregate(&Period::month(2008, 6).unwrap(), &mut synthetic_source())
        .unwrap();
    let halves = aggregator
        .aggregate(&Period::half_month(2008, 6).unwrap(), &mut synthetic_source())
        .unwrap();

    let whole = whole.get(SubPeriod::Whole).unwrap();
    let first = halves.get(SubPeriod::FirstHalf).unwrap();
    let second = halves.get(SubPeriod::SecondHalf).unwrap();

    for i in 0..CELLS * CELLS {
        assert_relative_eq!(
            first.burned_area[i] + second.burned_area[i],
            whole.burned_area[i],
            max_relative = 1e-9
        );
        assert_eq!(first.coverage[i], whole.coverage[i]);
        assert_eq!(second.burnable_fraction[i], whole.burnable_fraction[i]);
    }
}

#[test]
fn test_half_month_boundary_days() {
    init_logging();
    // June 2008 splits after day 167
    let burn_day = ndarray::array![[167, 168], [153, 182]];
    let mut source = InMemorySource::new(burn_day, Array2::from_elem((2, 2), 1.0))
        .unwrap()
        .with_land_cover(Array2::from_elem((2, 2), 130))
        .unwrap();

    let config = AggregationConfig {
        cell_size: 2,
        target_width: 1,
        target_height: 1,
        ..AggregationConfig::default()
    };
    let aggregator = GridCellAggregator::new(config, Box::new(CciLandCoverRemapping)).unwrap();
    let result = aggregator.aggregate(&Period::half_month(2008, 6).unwrap(), &mut source).unwrap();

    assert_relative_eq!(result.get(SubPeriod::FirstHalf).unwrap().burned_area[0], 2.0);
    assert_relative_eq!(result.get(SubPeriod::SecondHalf).unwrap().burned_area[0], 2.0);
}

#[test]
fn test_unobserved_pixels_lower_coverage() {
    init_logging();
    let mut source = InMemorySource::new(Array2::zeros((2, 2)), Array2::from_elem((2, 2), 5.0))
        .unwrap()
        .with_status(ndarray::array![[1, 0], [1, 0]])
        .unwrap()
        .with_burnable(ndarray::array![[true, true], [true, false]])
        .unwrap();

    let config = AggregationConfig {
        cell_size: 2,
        target_width: 1,
        target_height: 1,
        ..AggregationConfig::default()
    };
    let aggregator = GridCellAggregator::new(config, Box::new(CciLandCoverRemapping)).unwrap();
    let result = aggregator.aggregate(&Period::month(2008, 6).unwrap(), &mut source).unwrap();
    let stats = &result.stats[0];

    assert_relative_eq!(stats.coverage[0], 2.0 / 3.0, max_relative = 1e-6);
    assert_relative_eq!(stats.burnable_fraction[0], 0.75);
    assert_eq!(stats.burned_area[0], 0.0);
    assert_eq!(stats.standard_error[0], 0.0);
}

#[test]
fn test_run_tile_streams_both_halves() {
    init_logging();
    let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();
    let key = TileKey::new(2008, 6, "h15v07");
    let mut writer = MemoryWriter::new();

    let result = run_tile(
        &key,
        &Period::half_month(2008, 6).unwrap(),
        &aggregator,
        &mut synthetic_source(),
        &mut writer,
    )
    .unwrap();

    assert_eq!(writer.written.len(), 2);
    assert_eq!(result.stats.len(), 2);
    assert!(writer.find(&key, SubPeriod::FirstHalf).is_some());
    assert!(writer.find(&key, SubPeriod::SecondHalf).is_some());
    assert!(writer.written.iter().all(|(k, _, _)| k.to_string() == "2008-06-h15v07"));
}
