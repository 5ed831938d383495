/// Coefficient of determination of `predictions` against the observed `y`.
pub fn r2_score(y: &[f64], predictions: &[f64]) -> f64 {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let ss_res: f64 = y
        .iter()
        .zip(predictions)
        .map(|(yi, pi)| (yi - pi).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|yi| (yi - mean).powi(2)).sum();
    1.0 - ss_res / ss_tot
}

/// Sample-weighted coefficient of determination. Both sums of squares and the reference mean
/// use the weights, so fully downweighted observations drop out of the score entirely.
pub fn weighted_r2_score(y: &[f64], predictions: &[f64], weights: &[f64]) -> f64 {
    let weight_sum: f64 = weights.iter().sum();
    let mean = y
        .iter()
        .zip(weights)
        .map(|(yi, wi)| wi * yi)
        .sum::<f64>()
        / weight_sum;
    let ss_res: f64 = y
        .iter()
        .zip(predictions)
        .zip(weights)
        .map(|((yi, pi), wi)| wi * (yi - pi).powi(2))
        .sum();
    let ss_tot: f64 = y
        .iter()
        .zip(weights)
        .map(|(yi, wi)| wi * (yi - mean).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}
