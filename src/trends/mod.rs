//! Trend fitting between burst-kinetics parameters and expression level.
//!
//! Fits are batched per gene subset or species by excluded callers; a single fit that fails
//! to converge must never abort the batch, so every fitter distinguishes precondition errors
//! (`Err`) from soft non-convergence ([`FitOutcome::Failed`]).

use crate::table::SampleTable;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;
use single_utilities::traits::FloatOpsTS;

pub mod association;
pub mod linear;
pub mod power;

pub mod utils;

/// Outcome of one trend fit. `Failed` is a structurally valid "no fit" value: batch callers
/// filter it out and keep going, they do not treat it as an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome<R> {
    Converged(R),
    Failed,
}

impl<R> FitOutcome<R> {
    pub fn is_converged(&self) -> bool {
        matches!(self, FitOutcome::Converged(_))
    }

    pub fn as_converged(&self) -> Option<&R> {
        match self {
            FitOutcome::Converged(fit) => Some(fit),
            FitOutcome::Failed => None,
        }
    }

    pub fn converged(self) -> Option<R> {
        match self {
            FitOutcome::Converged(fit) => Some(fit),
            FitOutcome::Failed => None,
        }
    }
}

/// Fitted power-law relationship `y = a * x^b + c` and its unweighted coefficient of
/// determination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub r2: f64,
}

/// Fitted robust linear trend `y = intercept + slope * x`.
///
/// Both coefficients carry two-sided p-values under the robust parameter covariance. Two R²
/// values are reported on purpose: the unweighted one measures explanatory power on the raw
/// residuals including any outliers' pull, the weighted one credits the fit for points the
/// M-estimator intentionally downweighted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrendFit {
    pub intercept: f64,
    pub slope: f64,
    pub intercept_pval: f64,
    pub slope_pval: f64,
    pub r2_weighted: f64,
    pub r2_unweighted: f64,
}

/// Fit a power-law curve on each table in parallel.
///
/// Tables are independent, so the batch maps directly onto rayon; one `Failed` fit or one
/// table with a missing column affects only its own slot in the output.
pub fn fit_power_curve_batch<T>(
    tables: &[SampleTable<T>],
    x_var: &str,
    y_var: &str,
    loss: power::RobustLoss,
    f_scale: f64,
) -> Vec<anyhow::Result<FitOutcome<PowerLawFit>>>
where
    T: FloatOpsTS,
{
    tables
        .par_iter()
        .map(|table| power::fit_power_curve(table, x_var, y_var, loss, f_scale))
        .collect()
}

/// Fit a robust linear trend on each table in parallel.
pub fn fit_robust_linear_trend_batch<T>(
    tables: &[SampleTable<T>],
    x_var: &str,
    y_var: &str,
) -> Vec<anyhow::Result<FitOutcome<LinearTrendFit>>>
where
    T: FloatOpsTS,
{
    tables
        .par_iter()
        .map(|table| linear::fit_robust_linear_trend(table, x_var, y_var))
        .collect()
}
