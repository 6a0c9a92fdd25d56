//! Consistency checks over aggregated bands
//!
//! Every check either fails with [`GridError::InvariantViolation`] or returns
//! the non-fatal findings as [`Diagnostic`]s for the caller to report.

use crate::config::{MinimumSample, Tolerances};
use crate::core::stats::GridCellStats;
use crate::types::{GridError, GridResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Standard error is NaN; tolerated
    NanError,
    /// Burned pixels whose land-cover code maps to no class
    UnmappableLandCover,
    /// Too few burned cells for the land-cover sum check
    LcSumCheckSkipped,
}

/// Non-fatal finding of aggregation or validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub cell: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, cell: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            cell,
            message: message.into(),
        }
    }
}

pub fn check_area(area: f64, index: usize) -> GridResult<()> {
    if area < 0.0 {
        return Err(GridError::invariant(Some(index), format!("area < 0 ({})", area)));
    }
    Ok(())
}

pub fn check_areas(areas: &[f64]) -> GridResult<()> {
    areas
        .iter()
        .enumerate()
        .try_for_each(|(i, &area)| check_area(area, i))
}

/// Burned area must lie in `[0, area * slack]`
pub fn check_burned_area(burned_area: &[f64], areas: &[f64], slack: f64) -> GridResult<()> {
    for (i, (&ba, &area)) in burned_area.iter().zip(areas).enumerate() {
        if ba < 0.0 {
            return Err(GridError::invariant(Some(i), format!("BA ({}) < 0", ba)));
        }
        if ba > area * slack {
            return Err(GridError::invariant(
                Some(i),
                format!("BA ({}) > area ({}) * {}", ba, area, slack),
            ));
        }
    }
    Ok(())
}

/// A positive error needs burned area; NaN errors are only reported
pub fn check_errors(errors: &[f32], burned_area: &[f64]) -> GridResult<Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    for (i, (&error, &ba)) in errors.iter().zip(burned_area).enumerate() {
        if error > 0.0 && !(ba > 0.0) {
            return Err(GridError::invariant(
                Some(i),
                format!("error ({}) > 0 but BA ({}) is not", error, ba),
            ));
        }
        if error.is_nan() {
            log::warn!("Standard error is NaN at cell {}", i);
            diagnostics.push(Diagnostic::new(DiagnosticKind::NanError, Some(i), "error is NaN"));
        }
    }
    Ok(diagnostics)
}

/// Tile-wide land-cover burned area must match burned area within `tolerance`
pub fn check_lc_sum(
    burned_area: &[f64],
    ba_in_lc: &[Vec<f64>],
    tolerance: f64,
    minimum: MinimumSample,
) -> GridResult<Vec<Diagnostic>> {
    let burned_cells = burned_area.iter().filter(|&&ba| ba != 0.0).count();
    if !minimum.is_reached(burned_cells, burned_area.len()) {
        log::debug!(
            "Skipping land-cover sum check: {} burned cells, minimum {:?}",
            burned_cells,
            minimum
        );
        return Ok(vec![Diagnostic::new(
            DiagnosticKind::LcSumCheckSkipped,
            None,
            format!("{} burned cells below minimum {:?}", burned_cells, minimum),
        )]);
    }

    let ba_sum: f64 = burned_area.iter().sum();
    let ba_in_lc_sum: f64 = ba_in_lc.iter().flat_map(|band| band.iter()).sum();
    if (ba_sum - ba_in_lc_sum).abs() > ba_sum * tolerance {
        log::warn!("baSum = {}, baInLcSum = {}", ba_sum, ba_in_lc_sum);
        return Err(GridError::invariant(
            None,
            format!(
                "|baSum ({}) - baInLcSum ({})| > baSum * {}",
                ba_sum, ba_in_lc_sum, tolerance
            ),
        ));
    }
    Ok(Vec::new())
}

/// Land-cover burned fraction of one cell must not exceed its burnable fraction times `slack`
pub fn check_lc_within_burnable(
    burnable_fraction: f32,
    lc_area_sum: f64,
    area: f64,
    slack: f64,
    index: usize,
) -> GridResult<()> {
    let lc_fraction = crate::core::aggregate::fraction(lc_area_sum, area);
    if lc_fraction as f64 > burnable_fraction as f64 * slack {
        return Err(GridError::invariant(
            Some(index),
            format!(
                "lcAreaSumFraction ({}) > burnableFraction ({}) * {}",
                lc_fraction, burnable_fraction, slack
            ),
        ));
    }
    Ok(())
}

/// Run every tile-level check on finished stats
pub fn validate_stats(
    stats: &GridCellStats,
    tolerances: &Tolerances,
    minimum: MinimumSample,
) -> GridResult<Vec<Diagnostic>> {
    check_areas(&stats.area)?;
    let mut diagnostics = check_errors(&stats.standard_error, &stats.burned_area)?;
    diagnostics.extend(check_lc_sum(
        &stats.burned_area,
        &stats.ba_in_lc,
        tolerances.lc_relative_tolerance,
        minimum,
    )?);
    check_burned_area(&stats.burned_area, &stats.area, tolerances.area_slack)?;
    Ok(diagnostics)
}
