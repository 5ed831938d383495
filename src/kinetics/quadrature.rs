//! Gauss-Jacobi quadrature rules.
//!
//! Nodes and weights for integrating against the Jacobi weight `(1 - x)^alpha * (1 + x)^beta`
//! on `[-1, 1]`, computed with the Golub-Welsch algorithm: the eigenvalues of the symmetric
//! tridiagonal Jacobi matrix built from the three-term recurrence coefficients are the nodes,
//! and the squared first components of its eigenvectors (scaled by the zeroth moment of the
//! weight) are the weights.

use nalgebra::{DMatrix, SymmetricEigen};
use statrs::function::beta::ln_beta;
use std::cmp::Ordering;

/// Compute an `n`-point Gauss-Jacobi rule for shape parameters `alpha`, `beta`.
///
/// Returns the nodes in ascending order and the matching weights. The weights sum to the
/// zeroth moment of the Jacobi weight, `2^(alpha + beta + 1) * B(alpha + 1, beta + 1)`.
///
/// # Arguments
///
/// * `n` - Number of quadrature nodes (exact for polynomials up to degree `2n - 1`)
/// * `alpha` - Exponent of `(1 - x)`, must be greater than -1
/// * `beta` - Exponent of `(1 + x)`, must be greater than -1
pub fn gauss_jacobi(n: usize, alpha: f64, beta: f64) -> anyhow::Result<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(anyhow::anyhow!("Quadrature order must be at least 1"));
    }
    if alpha <= -1.0 || beta <= -1.0 {
        return Err(anyhow::anyhow!(
            "Jacobi shape parameters must be greater than -1 (alpha={}, beta={})",
            alpha,
            beta
        ));
    }

    let ab = alpha + beta;
    let mut jacobi = DMatrix::<f64>::zeros(n, n);

    jacobi[(0, 0)] = (beta - alpha) / (ab + 2.0);
    for k in 1..n {
        let kf = k as f64;
        jacobi[(k, k)] =
            (beta * beta - alpha * alpha) / ((2.0 * kf + ab) * (2.0 * kf + ab + 2.0));

        // Squared off-diagonal recurrence coefficient; the k = 1 form avoids a removable
        // 0/0 singularity of the general formula at alpha + beta = -1.
        let b_sq = if k == 1 {
            4.0 * (1.0 + alpha) * (1.0 + beta) / ((2.0 + ab).powi(2) * (3.0 + ab))
        } else {
            4.0 * kf * (kf + alpha) * (kf + beta) * (kf + ab)
                / ((2.0 * kf + ab).powi(2) * (2.0 * kf + ab + 1.0) * (2.0 * kf + ab - 1.0))
        };
        let b = b_sq.sqrt();
        jacobi[(k - 1, k)] = b;
        jacobi[(k, k - 1)] = b;
    }

    // Zeroth moment of the weight function.
    let mu0 = (ab + 1.0).exp2() * ln_beta(alpha + 1.0, beta + 1.0).exp();

    let eigen = SymmetricEigen::new(jacobi);
    let mut pairs: Vec<(f64, f64)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.row(0).iter())
        .map(|(&node, &first_component)| (node, mu0 * first_component * first_component))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    Ok(pairs.into_iter().unzip())
}
