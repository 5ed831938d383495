//! Pearson and Spearman correlation between two table columns.

use crate::table::SampleTable;
use num_traits::Float;
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::cmp::Ordering;

/// Correlation coefficient and its two-sided significance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationResult {
    pub r: f64,
    pub r_pval: f64,
}

/// Pearson product-moment correlation between `x_var` and `y_var`.
///
/// The p-value uses the exact null distribution through the t transform
/// `t = r * sqrt((n - 2) / (1 - r^2))` with `n - 2` degrees of freedom.
pub fn pearson_r<T>(
    table: &SampleTable<T>,
    x_var: &str,
    y_var: &str,
) -> anyhow::Result<CorrelationResult>
where
    T: FloatOps,
{
    let x = table.column_f64(x_var)?;
    let y = table.column_f64(y_var)?;
    correlation_from_values(&x, &y)
}

/// Spearman rank correlation between `x_var` and `y_var`.
///
/// Ranks (ties averaged) are pushed through the Pearson machinery, including the t-based
/// p-value, which is the standard large-sample treatment.
pub fn spearman_r<T>(
    table: &SampleTable<T>,
    x_var: &str,
    y_var: &str,
) -> anyhow::Result<CorrelationResult>
where
    T: FloatOps,
{
    let x = table.column_f64(x_var)?;
    let y = table.column_f64(y_var)?;
    correlation_from_values(&average_ranks(&x), &average_ranks(&y))
}

fn correlation_from_values(x: &[f64], y: &[f64]) -> anyhow::Result<CorrelationResult> {
    let n = x.len();
    if n < 3 {
        return Err(anyhow::anyhow!(
            "Need at least 3 observations to test a correlation, got {}",
            n
        ));
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let r = sxy / (sxx * syy).sqrt();
    let r_pval = correlation_pvalue(r, n);
    Ok(CorrelationResult { r, r_pval })
}

fn correlation_pvalue(r: f64, n: usize) -> f64 {
    if !r.is_finite() {
        return f64::NAN;
    }
    // Perfect correlation maps to an infinite t statistic.
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    }
}

/// Ranks starting at 1, with tied values assigned the average of their rank range.
fn average_ranks<T>(values: &[T]) -> Vec<f64>
where
    T: Float,
{
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for k in i..j {
            ranks[order[k]] = rank;
        }
        i = j;
    }
    ranks
}
