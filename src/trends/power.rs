//! Power-law curve fitting with robust losses.
//!
//! Fits `y = a * x^b + c` by damped (Levenberg-Marquardt) least squares over robustly
//! reweighted residuals. The loss operates on the squared scaled residual
//! `z = ((a * x^b + c - y) / f_scale)^2`, so `f_scale` sets the residual magnitude at which
//! the penalty transitions from quadratic to sub-quadratic and heavy-tailed genes stop
//! dominating the fit.
//!
//! `x` is assumed strictly positive (`x^b` with non-integer `b`); violating that is the
//! caller's bug and surfaces as NaN propagation ending in a `Failed` outcome, not as an error.

use crate::table::SampleTable;
use crate::trends::utils::r2_score;
use crate::trends::{FitOutcome, PowerLawFit};
use nalgebra::{Cholesky, Matrix3, Vector3};
use single_utilities::traits::FloatOps;

/// Residual-evaluation budget for one fit; fits that exhaust it are reported as `Failed`.
pub const MAX_FUNCTION_EVALUATIONS: usize = 5000;

const FTOL: f64 = 1e-10;
const XTOL: f64 = 1e-10;

/// Robust loss applied to the squared scaled residual `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobustLoss {
    /// Ordinary least squares: `rho(z) = z`.
    Linear,
    /// Quadratic below the scale, linear above: `rho(z) = z` for `z <= 1`, else `2*sqrt(z) - 1`.
    Huber,
    /// Smooth approximation of the absolute loss: `rho(z) = 2 * (sqrt(1 + z) - 1)`.
    SoftL1,
    /// Logarithmic: `rho(z) = ln(1 + z)`.
    Cauchy,
    /// `rho(z) = atan(z)`; the most aggressive outlier suppression of the set.
    Arctan,
}

impl RobustLoss {
    fn rho(&self, z: f64) -> f64 {
        match self {
            RobustLoss::Linear => z,
            RobustLoss::Huber => {
                if z <= 1.0 {
                    z
                } else {
                    2.0 * z.sqrt() - 1.0
                }
            }
            RobustLoss::SoftL1 => 2.0 * ((1.0 + z).sqrt() - 1.0),
            RobustLoss::Cauchy => (1.0 + z).ln(),
            RobustLoss::Arctan => z.atan(),
        }
    }

    /// Derivative of `rho` with respect to `z`; used as the IRLS weight of each observation.
    fn weight(&self, z: f64) -> f64 {
        match self {
            RobustLoss::Linear => 1.0,
            RobustLoss::Huber => {
                if z <= 1.0 {
                    1.0
                } else {
                    1.0 / z.sqrt()
                }
            }
            RobustLoss::SoftL1 => 1.0 / (1.0 + z).sqrt(),
            RobustLoss::Cauchy => 1.0 / (1.0 + z),
            RobustLoss::Arctan => 1.0 / (1.0 + z * z),
        }
    }
}

/// Evaluate the power-law model at one point.
pub fn power_function(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a * x.powf(b) + c
}

/// Fit `y_var ≈ a * x_var^b + c` with the given robust loss and loss scale.
///
/// The solver starts at `(a, b, c) = (1, 1, 0)` and is bounded by
/// [`MAX_FUNCTION_EVALUATIONS`]. On convergence the result carries the fitted parameters and
/// the unweighted R² of the predictions against `y_var`; on non-convergence it is
/// [`FitOutcome::Failed`] so that batch callers continue past individual failures.
///
/// # Errors
///
/// Fails on unknown column names, fewer than 3 observations, or a non-positive `f_scale`.
pub fn fit_power_curve<T>(
    table: &SampleTable<T>,
    x_var: &str,
    y_var: &str,
    loss: RobustLoss,
    f_scale: f64,
) -> anyhow::Result<FitOutcome<PowerLawFit>>
where
    T: FloatOps,
{
    let x = table.column_f64(x_var)?;
    let y = table.column_f64(y_var)?;
    if x.len() < 3 {
        return Err(anyhow::anyhow!(
            "Need at least 3 observations to fit a three-parameter curve, got {}",
            x.len()
        ));
    }
    if f_scale <= 0.0 {
        return Err(anyhow::anyhow!(
            "Loss scale must be strictly positive, got {}",
            f_scale
        ));
    }

    let params = match levenberg_marquardt(&x, &y, loss, f_scale) {
        Some(params) => params,
        None => return Ok(FitOutcome::Failed),
    };
    let [a, b, c] = params;

    let predictions: Vec<f64> = x.iter().map(|&xi| power_function(xi, a, b, c)).collect();
    let r2 = r2_score(&y, &predictions);
    if !(a.is_finite() && b.is_finite() && c.is_finite() && r2.is_finite()) {
        return Ok(FitOutcome::Failed);
    }

    Ok(FitOutcome::Converged(PowerLawFit { a, b, c, r2 }))
}

/// Damped least squares over the robustly reweighted normal equations, with Marquardt
/// diagonal scaling. Returns `None` on non-convergence: budget exhausted, singular damped
/// system, or non-finite intermediate values.
fn levenberg_marquardt(x: &[f64], y: &[f64], loss: RobustLoss, f_scale: f64) -> Option<[f64; 3]> {
    let mut params = [1.0, 1.0, 0.0];
    let mut nfev = 0usize;

    let mut cost = robust_cost(x, y, &params, loss, f_scale)?;
    nfev += 1;
    let mut lambda = 1e-3;

    while nfev < MAX_FUNCTION_EVALUATIONS {
        let [a, b, c] = params;
        let mut jtj = Matrix3::<f64>::zeros();
        let mut jtr = Vector3::<f64>::zeros();
        for (&xi, &yi) in x.iter().zip(y) {
            let xb = xi.powf(b);
            let r = (a * xb + c - yi) / f_scale;
            let w = loss.weight(r * r);
            let jac = Vector3::new(xb / f_scale, a * xb * xi.ln() / f_scale, 1.0 / f_scale);
            jtj += jac * jac.transpose() * w;
            jtr += jac * (w * r);
        }
        if !(jtj.iter().all(|v| v.is_finite()) && jtr.iter().all(|v| v.is_finite())) {
            return None;
        }

        let mut accepted = false;
        while nfev < MAX_FUNCTION_EVALUATIONS {
            let mut damped = jtj;
            for i in 0..3 {
                damped[(i, i)] += lambda * jtj[(i, i)];
            }
            // A rank-deficient Jacobian (e.g. zero-variance x) leaves the damped system
            // indefinite; there is no way forward from there.
            let chol = match Cholesky::new(damped) {
                Some(chol) => chol,
                None => return None,
            };
            let rhs = -jtr;
            let delta = chol.solve(&rhs);

            let trial = [params[0] + delta[0], params[1] + delta[1], params[2] + delta[2]];
            let trial_cost = robust_cost(x, y, &trial, loss, f_scale);
            nfev += 1;

            match trial_cost {
                Some(tc) if tc <= cost => {
                    let cost_drop = cost - tc;
                    let step_norm = delta.norm();
                    let params_norm =
                        (params[0].powi(2) + params[1].powi(2) + params[2].powi(2)).sqrt();
                    params = trial;
                    cost = tc;
                    lambda = (lambda * 0.1).max(1e-12);
                    accepted = true;
                    if cost_drop <= FTOL * cost.max(f64::MIN_POSITIVE)
                        || step_norm <= XTOL * (1.0 + params_norm)
                    {
                        return Some(params);
                    }
                    break;
                }
                _ => {
                    lambda *= 10.0;
                    if lambda > 1e12 {
                        // Damping saturated; only a stationary point counts as converged.
                        return if jtr.norm() <= 1e-8 { Some(params) } else { None };
                    }
                }
            }
        }
        if !accepted {
            return None;
        }
    }

    None
}

fn robust_cost(x: &[f64], y: &[f64], params: &[f64; 3], loss: RobustLoss, f_scale: f64) -> Option<f64> {
    let [a, b, c] = *params;
    let mut total = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let r = (a * xi.powf(b) + c - yi) / f_scale;
        total += loss.rho(r * r);
    }
    let cost = 0.5 * f_scale * f_scale * total;
    cost.is_finite().then_some(cost)
}
