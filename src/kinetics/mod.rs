//! The two-state (telegraph) model of transcriptional bursting.
//!
//! A gene switches between an inactive and an active state at rates `k_on` and `k_off`, and
//! synthesizes mRNA at rate `k_syn` while active. The stationary mRNA distribution is a
//! Poisson-beta mixture: a Poisson count distribution whose rate is modulated by a
//! Beta(`k_on`, `k_off`)-distributed burst intensity. [`poisson_beta_pmf`] evaluates this
//! mixture for observed counts by Gauss-Jacobi quadrature over the mixing variable.

pub mod quadrature;

use statrs::distribution::{Discrete, Poisson};
use statrs::function::beta::ln_beta;

/// Default number of quadrature nodes used by likelihood callers.
pub const DEFAULT_QUADRATURE_NODES: usize = 50;

/// Ceiling on the largest node-mapped Poisson rate. Beyond this the pmf evaluation is
/// numerically meaningless, so crossing it is a hard error rather than a warning.
pub const MAX_POISSON_RATE: f64 = 1e6;

/// One candidate burst-kinetics hypothesis: activation rate `k_on`, deactivation rate
/// `k_off`, and synthesis rate `k_syn`, all strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticParams {
    pub k_on: f64,
    pub k_off: f64,
    pub k_syn: f64,
}

impl KineticParams {
    pub fn new(k_on: f64, k_off: f64, k_syn: f64) -> anyhow::Result<Self> {
        if !(k_on > 0.0 && k_off > 0.0 && k_syn > 0.0) {
            return Err(anyhow::anyhow!(
                "Kinetic rates must be strictly positive (k_on={}, k_off={}, k_syn={})",
                k_on,
                k_off,
                k_syn
            ));
        }
        Ok(KineticParams { k_on, k_off, k_syn })
    }

    /// Burst frequency point estimate. Bursty genes spend most of their time off, so their
    /// burst frequency is `k_on` itself; otherwise the harmonic combination of both switching
    /// rates is used.
    pub fn burst_frequency(&self, bursty: bool) -> f64 {
        if bursty {
            self.k_on
        } else {
            (self.k_on * self.k_off) / (self.k_on + self.k_off)
        }
    }

    /// Burst size point estimate: mean number of molecules synthesized per active period.
    pub fn burst_size(&self) -> f64 {
        self.k_syn / self.k_off
    }
}

/// Evaluate the Poisson-beta mixture pmf for a vector of observed molecule counts.
///
/// The beta mixing integral is approximated by `n_nodes`-point Gauss-Jacobi quadrature with
/// shape parameters `(k_off - 1, k_on - 1)`; each node `u` maps to a Poisson rate
/// `k_syn * (u + 1) / 2`. Output values are finite, non-negative, and aligned with `counts`.
/// They are not renormalized over the count support; the quadrature approximation of the full
/// mixture sums to one only up to quadrature and Poisson tail error.
///
/// # Errors
///
/// Fails if `k_on` or `k_off` is not strictly positive, or if the largest mapped Poisson rate
/// reaches [`MAX_POISSON_RATE`].
pub fn poisson_beta_pmf(
    counts: &[u64],
    params: &KineticParams,
    n_nodes: usize,
) -> anyhow::Result<Vec<f64>> {
    if params.k_on <= 0.0 || params.k_off <= 0.0 {
        return Err(anyhow::anyhow!(
            "Kinetic rates must be strictly positive (k_on={}, k_off={})",
            params.k_on,
            params.k_off
        ));
    }

    let (nodes, weights) =
        quadrature::gauss_jacobi(n_nodes, params.k_off - 1.0, params.k_on - 1.0)?;
    let rates: Vec<f64> = nodes
        .iter()
        .map(|u| params.k_syn * (u + 1.0) / 2.0)
        .collect();

    let max_rate = rates.iter().cloned().fold(0.0, f64::max);
    if max_rate >= MAX_POISSON_RATE {
        return Err(anyhow::anyhow!(
            "Largest node-mapped Poisson rate {:.3e} exceeds the stability ceiling {:.0e}; \
             k_syn={} is too large for a meaningful likelihood",
            max_rate,
            MAX_POISSON_RATE,
            params.k_syn
        ));
    }

    let log_scale = (1.0 - params.k_on - params.k_off) * std::f64::consts::LN_2
        - ln_beta(params.k_on, params.k_off);
    let scale = log_scale.exp();

    let probabilities = counts
        .iter()
        .map(|&k| {
            let mixture: f64 = weights
                .iter()
                .zip(&rates)
                .map(|(w, &mu)| w * poisson_pmf(k, mu))
                .sum();
            scale * mixture
        })
        .collect();

    Ok(probabilities)
}

fn poisson_pmf(k: u64, rate: f64) -> f64 {
    // Nodes sit strictly inside (-1, 1), but a rate can still underflow to zero for extreme
    // shape parameters; the Poisson degenerates to a point mass at zero there.
    if rate <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    match Poisson::new(rate) {
        Ok(dist) => dist.pmf(k),
        Err(_) => 0.0,
    }
}
