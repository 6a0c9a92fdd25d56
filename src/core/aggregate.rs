use crate::config::AggregationConfig;
use crate::core::patches::PatchCounter;
use crate::core::period::{Period, SubPeriod};
use crate::core::stats::GridCellStats;
use crate::core::uncertainty::{predict_errors, BurnProbabilityUncertainty, ErrorEstimator};
use crate::core::validate::{self, Diagnostic, DiagnosticKind};
use crate::io::landcover::LandCoverRemapper;
use crate::io::window::{PixelWindow, PixelWindowSource};
use crate::types::{CellRect, GridError, GridResult, OBSERVED};
use ndarray::Array2;
use num_traits::Float;

/// Result of aggregating one tile: one stats block per sub-period
#[derive(Debug, Clone)]
pub struct TileAggregate {
    pub stats: Vec<GridCellStats>,
    pub diagnostics: Vec<Diagnostic>,
    /// Cells for which the source had no data
    pub skipped_cells: usize,
}

impl TileAggregate {
    pub fn get(&self, sub_period: SubPeriod) -> Option<&GridCellStats> {
        self.stats.iter().find(|s| s.sub_period == sub_period)
    }
}

/// Per-cell running sums of one sub-period
struct CellAccumulator {
    burned_area: f64,
    ba_in_lc: Vec<f64>,
    mask: Array2<bool>,
    uncertainty: BurnProbabilityUncertainty,
    unmappable: usize,
}

impl CellAccumulator {
    fn new(class_count: usize) -> Self {
        Self {
            burned_area: 0.0,
            ba_in_lc: vec![0.0; class_count],
            mask: Array2::from_elem((0, 0), false),
            uncertainty: BurnProbabilityUncertainty::new(),
            unmappable: 0,
        }
    }

    fn reset(&mut self, rows: usize, cols: usize) {
        self.burned_area = 0.0;
        self.ba_in_lc.iter_mut().for_each(|v| *v = 0.0);
        if self.mask.dim() == (rows, cols) {
            self.mask.fill(false);
        } else {
            self.mask = Array2::from_elem((rows, cols), false);
        }
        self.uncertainty.reset();
        self.unmappable = 0;
    }
}

/// Area sums of one cell that do not depend on the sub-period
#[derive(Debug, Default, Clone, Copy)]
struct CellAreas {
    total: f64,
    burnable: f64,
    observed_burnable: f64,
}

/// Aggregates per-pixel burn detections into grid-cell statistics
pub struct GridCellAggregator {
    config: AggregationConfig,
    remapper: Box<dyn LandCoverRemapper>,
    error_model: Option<Box<dyn ErrorEstimator>>,
}

impl GridCellAggregator {
    pub fn new(config: AggregationConfig, remapper: Box<dyn LandCoverRemapper>) -> GridResult<Self> {
        config.validate()?;
        if remapper.class_count() != config.land_cover_class_count {
            log::warn!(
                "Remapper knows {} classes, output has {}",
                remapper.class_count(),
                config.land_cover_class_count
            );
        }
        Ok(Self {
            config,
            remapper,
            error_model: None,
        })
    }

    /// Replace the burn-probability uncertainty by a statistical model
    pub fn with_error_model(mut self, model: Box<dyn ErrorEstimator>) -> Self {
        self.error_model = Some(model);
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate every target cell of the tile for `period`
    pub fn aggregate(&self, period: &Period, source: &mut dyn PixelWindowSource) -> GridResult<TileAggregate> {
        let width = self.config.target_width;
        let height = self.config.target_height;
        let class_count = self.config.land_cover_class_count;
        let sub_periods = period.sub_periods();

        log::info!(
            "Computing grid cells for {}x{} target raster, days {}..={} ({} sub-period(s))",
            width,
            height,
            period.start_doy(),
            period.end_doy(),
            sub_periods.len()
        );

        let mut stats: Vec<GridCellStats> = sub_periods
            .iter()
            .map(|&sub| GridCellStats::new(sub, width * height, class_count))
            .collect();
        let mut accumulators: Vec<CellAccumulator> =
            sub_periods.iter().map(|_| CellAccumulator::new(class_count)).collect();
        let mut window = PixelWindow::new(self.config.cell_size, self.config.cell_size);
        let mut patch_counter = PatchCounter::new();
        let mut diagnostics = Vec::new();
        let mut skipped_cells = 0;

        for y in 0..height {
            log::debug!("Processing line {}/{} of target raster", y + 1, height);
            for x in 0..width {
                let index = y * width + x;
                let rect = CellRect::for_cell(x, y, self.config.cell_size);
                let found = source
                    .read_window(&rect, period, &mut window)
                    .map_err(|e| match e {
                        GridError::DataSourceUnavailable(_) => e,
                        other => GridError::DataSourceUnavailable(format!("cell ({}, {}): {}", x, y, other)),
                    })?;
                if !found || window.is_empty() {
                    skipped_cells += 1;
                    continue;
                }
                window.check_shape()?;

                let areas = self.accumulate_cell(index, period, &window, &mut accumulators)?;
                self.store_cell(index, areas, &accumulators, &mut stats, &mut patch_counter, &mut diagnostics)?;
            }
        }

        for cell_stats in stats.iter_mut() {
            diagnostics.extend(self.finish(period, cell_stats)?);
        }

        log::info!(
            "Grid cells done: {} skipped, {} diagnostic(s)",
            skipped_cells,
            diagnostics.len()
        );
        Ok(TileAggregate {
            stats,
            diagnostics,
            skipped_cells,
        })
    }

    /// Classify the pixels of one window and sum their areas
    fn accumulate_cell(
        &self,
        index: usize,
        period: &Period,
        window: &PixelWindow,
        accumulators: &mut [CellAccumulator],
    ) -> GridResult<CellAreas> {
        let (rows, cols) = window.dim();
        accumulators.iter_mut().for_each(|acc| acc.reset(rows, cols));
        let sub_periods = period.sub_periods();
        let mut areas = CellAreas::default();

        for ((r, c), &doy) in window.burn_day.indexed_iter() {
            let area = window.area[[r, c]];
            let burnable = window.burnable[[r, c]];

            let burned_in = sub_periods
                .iter()
                .position(|&sub| period.is_burned(sub, doy, burnable));
            if let Some(k) = burned_in {
                let land_cover = window.land_cover[[r, c]];
                let classes = self.remapper.classes_for(land_cover);
                let acc = &mut accumulators[k];
                if classes.is_empty() {
                    acc.unmappable += 1;
                }
                let masked = classes.is_empty() && land_cover != 0 && self.config.mask_unmappable_pixels;
                if !masked {
                    acc.burned_area += area;
                    acc.mask[[r, c]] = true;
                    acc.uncertainty.add(window.probability[[r, c]], area);
                    for &class in classes {
                        if let Some(bucket) = class.checked_sub(1).and_then(|i| acc.ba_in_lc.get_mut(i)) {
                            *bucket += area;
                        }
                    }
                }
            }

            areas.total += area;
            if burnable {
                areas.burnable += area;
                if window.status[[r, c]] == OBSERVED {
                    areas.observed_burnable += area;
                }
            }
        }

        validate::check_area(areas.total, index)?;
        Ok(areas)
    }

    fn store_cell(
        &self,
        index: usize,
        areas: CellAreas,
        accumulators: &[CellAccumulator],
        stats: &mut [GridCellStats],
        patch_counter: &mut PatchCounter,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> GridResult<()> {
        let coverage = fraction(areas.observed_burnable, areas.burnable);
        let burnable_fraction = fraction(areas.burnable, areas.total);

        for (acc, cell_stats) in accumulators.iter().zip(stats.iter_mut()) {
            cell_stats.area[index] = areas.total;
            cell_stats.burned_area[index] = acc.burned_area;
            cell_stats.coverage[index] = coverage;
            cell_stats.burnable_fraction[index] = burnable_fraction;
            cell_stats.standard_error[index] = acc.uncertainty.standard_error();
            cell_stats.patch_count[index] = patch_counter.count(acc.mask.view()) as u32;
            for (band, &value) in cell_stats.ba_in_lc.iter_mut().zip(&acc.ba_in_lc) {
                band[index] = value;
            }

            if acc.unmappable > 0 {
                log::debug!(
                    "{} burned pixel(s) in cell {} ({}) have no land-cover class",
                    acc.unmappable,
                    index,
                    cell_stats.sub_period
                );
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnmappableLandCover,
                    Some(index),
                    format!("{} burned pixel(s) not remappable", acc.unmappable),
                ));
            }

            if let Some(slack) = self.config.tolerances.burnable_lc_slack {
                validate::check_lc_within_burnable(
                    burnable_fraction,
                    cell_stats.lc_sum_at(index),
                    areas.total,
                    slack,
                    index,
                )?;
            }
        }
        Ok(())
    }

    /// Fill the error band and validate one sub-period's stats
    fn finish(&self, period: &Period, stats: &mut GridCellStats) -> GridResult<Vec<Diagnostic>> {
        let tolerances = &self.config.tolerances;

        if let Some(model) = &self.error_model {
            log::debug!("Predicting standard error for {} band", stats.sub_period);
            stats.standard_error = predict_errors(model.as_ref(), &stats.burned_area, &stats.area)?;
        }
        for (error, &ba) in stats.standard_error.iter_mut().zip(&stats.burned_area) {
            if ba < tolerances.negligible_burned_area {
                *error = 0.0;
            }
        }

        let minimum = tolerances.minimum_sample(period.is_half_month());
        validate::validate_stats(stats, tolerances, minimum)
    }
}

/// `value / total` clipped to `[0, 1]`; zero total or NaN give 0
pub fn fraction(value: f64, total: f64) -> f32 {
    if !(total > 0.0) {
        return 0.0;
    }
    clip_unit((value / total) as f32)
}

fn clip_unit<T: Float>(value: T) -> T {
    if value.is_nan() {
        T::zero()
    } else {
        value.max(T::zero()).min(T::one())
    }
}
