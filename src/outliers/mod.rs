//! Multivariate outlier distances.
//!
//! Mahalanobis distance of every row from the centroid of the same table, under the sample
//! covariance of that table. The input is deliberately its own reference distribution: a
//! contaminating outlier inflates the centroid and covariance it is compared against, and
//! downstream good-fit thresholds were calibrated against exactly that behavior.

use crate::table::SampleTable;
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use single_utilities::traits::FloatOps;

/// Mahalanobis distance of each row of `values` from the column-wise centroid.
///
/// The covariance is the sample covariance across all rows (denominator `n - 1`). A singular
/// covariance matrix (fewer independent rows than columns, or perfectly correlated columns)
/// is a hard error; there is no pseudo-inverse or regularization fallback.
pub fn mahalanobis_distances(values: &Array2<f64>) -> anyhow::Result<Vec<f64>> {
    let n_rows = values.nrows();
    let n_cols = values.ncols();
    if n_cols == 0 {
        return Err(anyhow::anyhow!("Need at least one column"));
    }
    if n_rows < 2 {
        return Err(anyhow::anyhow!(
            "Need at least 2 rows to estimate a covariance, got {}",
            n_rows
        ));
    }

    let centroid: Vec<f64> = (0..n_cols)
        .map(|j| values.column(j).sum() / n_rows as f64)
        .collect();

    let mut covariance = DMatrix::<f64>::zeros(n_cols, n_cols);
    for j in 0..n_cols {
        for k in j..n_cols {
            let mut sum = 0.0;
            for i in 0..n_rows {
                sum += (values[[i, j]] - centroid[j]) * (values[[i, k]] - centroid[k]);
            }
            let entry = sum / (n_rows - 1) as f64;
            covariance[(j, k)] = entry;
            covariance[(k, j)] = entry;
        }
    }

    let inverse = covariance.try_inverse().ok_or_else(|| {
        anyhow::anyhow!(
            "Covariance matrix is singular; Mahalanobis distances are undefined \
             ({} rows over {} columns)",
            n_rows,
            n_cols
        )
    })?;

    let distances = (0..n_rows)
        .map(|i| {
            let deviation =
                DVector::from_iterator(n_cols, (0..n_cols).map(|j| values[[i, j]] - centroid[j]));
            let squared = (&inverse * &deviation).dot(&deviation);
            // Round-off can push an exact zero slightly negative.
            squared.max(0.0).sqrt()
        })
        .collect();

    Ok(distances)
}

/// Mahalanobis distance per table row over the named columns, aligned with row order.
pub fn table_mahalanobis_distances<T>(
    table: &SampleTable<T>,
    columns: &[&str],
) -> anyhow::Result<Vec<f64>>
where
    T: FloatOps,
{
    let values = table.select_f64(columns)?;
    mahalanobis_distances(&values)
}
