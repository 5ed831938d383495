//! Robust linear trend fitting.
//!
//! Huber M-estimation of `y = intercept + slope * x` by iteratively reweighted least squares:
//! ordinary least squares start, then reweight each observation with the Huber influence rule
//! (tuning constant 1.345) on MAD-scaled residuals and re-solve the weighted normal equations
//! until the coefficients stop moving, with an explicit iteration cap to guarantee
//! termination. Standard errors follow the sandwich estimate of statsmodels' RLM (its default
//! "H1" form), with two-sided normal p-values.

use crate::table::SampleTable;
use crate::trends::utils::{r2_score, weighted_r2_score};
use crate::trends::{FitOutcome, LinearTrendFit};
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Huber influence tuning constant; 1.345 gives 95% efficiency under normal errors.
pub const HUBER_TUNING_CONSTANT: f64 = 1.345;

/// Cap on reweight-and-resolve rounds.
pub const MAX_IRLS_ITERATIONS: usize = 50;

const IRLS_TOLERANCE: f64 = 1e-8;

/// Standard normal quantile at 0.75, making the MAD a consistent scale estimate.
const MAD_NORMALIZATION: f64 = 0.674_489_750_196_081_7;

/// Fit `y_var ≈ intercept + slope * x_var` with a Huber M-estimator.
///
/// Returns [`FitOutcome::Failed`] when the solver cannot produce finite coefficient or R²
/// estimates; like the power-law fitter, this is data for the caller to branch on, not an
/// error.
///
/// # Errors
///
/// Fails on unknown column names or fewer than 3 observations.
pub fn fit_robust_linear_trend<T>(
    table: &SampleTable<T>,
    x_var: &str,
    y_var: &str,
) -> anyhow::Result<FitOutcome<LinearTrendFit>>
where
    T: FloatOps,
{
    let x = table.column_f64(x_var)?;
    let y = table.column_f64(y_var)?;
    let n = x.len();
    if n < 3 {
        return Err(anyhow::anyhow!(
            "Need at least 3 observations to fit a linear trend, got {}",
            n
        ));
    }

    let mut weights = vec![1.0; n];
    let mut beta = match weighted_least_squares(&x, &y, &weights) {
        Some(beta) => beta,
        None => return Ok(FitOutcome::Failed),
    };

    for _ in 0..MAX_IRLS_ITERATIONS {
        let residuals = residuals(&x, &y, beta);
        let scale = mad_scale(&residuals);
        if scale <= 0.0 {
            // Exact fit; nothing left to reweight.
            break;
        }
        for (weight, residual) in weights.iter_mut().zip(&residuals) {
            *weight = huber_weight(residual / scale);
        }

        let updated = match weighted_least_squares(&x, &y, &weights) {
            Some(beta) => beta,
            None => return Ok(FitOutcome::Failed),
        };
        let delta = (updated.0 - beta.0).abs().max((updated.1 - beta.1).abs());
        let denom = beta.0.abs().max(beta.1.abs()).max(1.0);
        beta = updated;
        if delta / denom < IRLS_TOLERANCE {
            break;
        }
    }

    let (intercept, slope) = beta;
    if !(intercept.is_finite() && slope.is_finite()) {
        return Ok(FitOutcome::Failed);
    }

    let final_residuals = residuals(&x, &y, beta);
    let scale = mad_scale(&final_residuals);
    let standard_errors = if scale > 0.0 {
        robust_standard_errors(&x, &final_residuals, scale)
    } else {
        // Exact fit: zero residual variance, coefficients are certain.
        Some((0.0, 0.0))
    };
    let (se_intercept, se_slope) = match standard_errors {
        Some(se) => se,
        None => return Ok(FitOutcome::Failed),
    };

    let normal = Normal::new(0.0, 1.0).unwrap();
    let intercept_pval = two_sided_pvalue(&normal, intercept, se_intercept);
    let slope_pval = two_sided_pvalue(&normal, slope, se_slope);

    let fitted: Vec<f64> = x.iter().map(|&xi| intercept + slope * xi).collect();
    let r2_unweighted = r2_score(&y, &fitted);
    let r2_weighted = weighted_r2_score(&y, &fitted, &weights);
    // A constant response has no total sum of squares to explain; R² is undefined there.
    if !(r2_unweighted.is_finite() && r2_weighted.is_finite()) {
        return Ok(FitOutcome::Failed);
    }

    Ok(FitOutcome::Converged(LinearTrendFit {
        intercept,
        slope,
        intercept_pval,
        slope_pval,
        r2_weighted,
        r2_unweighted,
    }))
}

fn residuals(x: &[f64], y: &[f64], (intercept, slope): (f64, f64)) -> Vec<f64> {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| yi - (intercept + slope * xi))
        .collect()
}

/// Closed-form weighted least squares for the intercept-and-slope design.
fn weighted_least_squares(x: &[f64], y: &[f64], weights: &[f64]) -> Option<(f64, f64)> {
    let mut sw = 0.0;
    let mut swx = 0.0;
    let mut swy = 0.0;
    let mut swxx = 0.0;
    let mut swxy = 0.0;
    for ((&xi, &yi), &wi) in x.iter().zip(y).zip(weights) {
        sw += wi;
        swx += wi * xi;
        swy += wi * yi;
        swxx += wi * xi * xi;
        swxy += wi * xi * yi;
    }

    let det = sw * swxx - swx * swx;
    if !det.is_finite() || det <= 0.0 {
        return None;
    }
    let intercept = (swxx * swy - swx * swxy) / det;
    let slope = (sw * swxy - swx * swy) / det;
    Some((intercept, slope))
}

/// Median absolute residual (centered at zero) scaled to estimate the error standard
/// deviation under normality.
fn mad_scale(residuals: &[f64]) -> f64 {
    let mut magnitudes: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    magnitudes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let m = magnitudes.len();
    let median = if m % 2 == 0 {
        (magnitudes[m / 2 - 1] + magnitudes[m / 2]) / 2.0
    } else {
        magnitudes[m / 2]
    };
    median / MAD_NORMALIZATION
}

fn huber_weight(u: f64) -> f64 {
    if u.abs() <= HUBER_TUNING_CONSTANT {
        1.0
    } else {
        HUBER_TUNING_CONSTANT / u.abs()
    }
}

/// Huber sandwich standard errors for (intercept, slope).
fn robust_standard_errors(x: &[f64], residuals: &[f64], scale: f64) -> Option<(f64, f64)> {
    let n = x.len() as f64;
    let p = 2.0;

    let mut psi_sq_sum = 0.0;
    let mut psi_prime_sum = 0.0;
    for &r in residuals {
        let u = r / scale;
        let psi = u.clamp(-HUBER_TUNING_CONSTANT, HUBER_TUNING_CONSTANT);
        psi_sq_sum += psi * psi;
        if u.abs() <= HUBER_TUNING_CONSTANT {
            psi_prime_sum += 1.0;
        }
    }

    let mean_psi_prime = psi_prime_sum / n;
    if mean_psi_prime <= 0.0 {
        return None;
    }
    // psi' is an indicator here, so its mean determines its variance.
    let var_psi_prime = mean_psi_prime * (1.0 - mean_psi_prime);
    let kappa = 1.0 + (p / n) * var_psi_prime / (mean_psi_prime * mean_psi_prime);
    let factor = kappa * kappa * scale * scale * (psi_sq_sum / (n - p))
        / (mean_psi_prime * mean_psi_prime);

    let sx: f64 = x.iter().sum();
    let sxx: f64 = x.iter().map(|xi| xi * xi).sum();
    let det = n * sxx - sx * sx;
    if !det.is_finite() || det <= 0.0 {
        return None;
    }
    let inv_intercept = sxx / det;
    let inv_slope = n / det;

    Some((
        (factor * inv_intercept).sqrt(),
        (factor * inv_slope).sqrt(),
    ))
}

fn two_sided_pvalue(normal: &Normal, coefficient: f64, standard_error: f64) -> f64 {
    if standard_error <= 0.0 {
        return if coefficient == 0.0 { f64::NAN } else { 0.0 };
    }
    let z = (coefficient / standard_error).abs();
    2.0 * (1.0 - normal.cdf(z))
}
