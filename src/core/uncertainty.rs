use crate::types::{GridError, GridResult};

/// Statistical model predicting the standard error of each grid cell
pub trait ErrorEstimator {
    /// One error per cell; `burned_area` and `cell_area` have equal length
    fn predict(&self, burned_area: &[f64], cell_area: &[f64]) -> GridResult<Vec<f32>>;
}

impl<F> ErrorEstimator for F
where
    F: Fn(&[f64], &[f64]) -> GridResult<Vec<f32>>,
{
    fn predict(&self, burned_area: &[f64], cell_area: &[f64]) -> GridResult<Vec<f32>> {
        self(burned_area, cell_area)
    }
}

/// Run `estimator`, turning any failure into a [`GridError::StatisticalModelFailure`]
/// that carries the offending inputs
pub fn predict_errors(
    estimator: &dyn ErrorEstimator,
    burned_area: &[f64],
    cell_area: &[f64],
) -> GridResult<Vec<f32>> {
    let failure = |reason: String| GridError::StatisticalModelFailure {
        burned_area: burned_area.to_vec(),
        cell_area: cell_area.to_vec(),
        reason,
    };

    let errors = estimator
        .predict(burned_area, cell_area)
        .map_err(|e| match e {
            GridError::StatisticalModelFailure { .. } => e,
            other => failure(other.to_string()),
        })?;
    if errors.len() != burned_area.len() {
        return Err(failure(format!(
            "model returned {} values for {} cells",
            errors.len(),
            burned_area.len()
        )));
    }
    Ok(errors)
}

/// Accumulates the burn-probability uncertainty of one cell.
///
/// Probabilities are percentages; a zero probability counts as 1 %, values
/// outside `[0, 100]` (cloud, water, no-data codes) are ignored.
#[derive(Debug, Default, Clone)]
pub struct BurnProbabilityUncertainty {
    variance: f64,
    area_sum: f64,
    count: usize,
    single_area: f64,
}

impl BurnProbabilityUncertainty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn add(&mut self, probability: f64, area: f64) {
        let probability = if probability == 0.0 { 1.0 } else { probability };
        if !(0.0..=100.0).contains(&probability) {
            return;
        }
        let pb = probability / 100.0;
        self.variance += pb * (1.0 - pb);
        self.area_sum += area;
        self.count += 1;
        self.single_area = area;
    }

    /// `sqrt(var * n / (n - 1)) * mean_area`; a single pixel yields its own area
    pub fn standard_error(&self) -> f32 {
        match self.count {
            0 => 0.0,
            1 => self.single_area as f32,
            n => {
                let n = n as f64;
                let mean_area = self.area_sum / n;
                ((self.variance * (n / (n - 1.0))).sqrt() * mean_area) as f32
            }
        }
    }
}
