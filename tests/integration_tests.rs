// End-to-end scenario: fit burst-parameter trends across a synthetic gene panel, then use
// outlier distances to separate the aberrant gene from the good-fit subset, the way the
// batch analysis drivers combine these components.

#[cfg(test)]
mod integration_tests {
    use single_burst::kinetics::{DEFAULT_QUADRATURE_NODES, KineticParams, poisson_beta_pmf};
    use single_burst::outliers::table_mahalanobis_distances;
    use single_burst::table::SampleTable;
    use single_burst::trends::linear::fit_robust_linear_trend;
    use single_burst::trends::power::{RobustLoss, fit_power_curve};
    use single_burst::trends::{fit_power_curve_batch, FitOutcome};

    fn gene_panel() -> SampleTable<f64> {
        // 20 well-behaved genes following bs = 2 * mean^0.5 + 1 and bf = 0.3 + 0.05 * mean,
        // plus one aberrant gene far off both trends.
        let mut rna_mean: Vec<f64> = (1..=20).map(|i| i as f64 * 0.5).collect();
        let mut bs_point: Vec<f64> = rna_mean
            .iter()
            .enumerate()
            .map(|(i, &m)| 2.0 * m.powf(0.5) + 1.0 + 0.05 * (i as f64 * 0.7).sin())
            .collect();
        let mut bf_point: Vec<f64> = rna_mean
            .iter()
            .enumerate()
            .map(|(i, &m)| 0.3 + 0.05 * m + 0.005 * (i as f64 * 1.3).cos())
            .collect();

        rna_mean.push(5.0);
        bs_point.push(25.0);
        bf_point.push(2.5);

        SampleTable::from_columns(vec![
            ("rna_mean", rna_mean),
            ("bs_point", bs_point),
            ("bf_point", bf_point),
        ])
        .unwrap()
    }

    #[test]
    fn trend_fitting_and_good_fit_selection() {
        let table = gene_panel();

        // Robust power-law trend of burst size against expression level.
        let power = fit_power_curve(&table, "rna_mean", "bs_point", RobustLoss::SoftL1, 1.0)
            .unwrap()
            .converged()
            .expect("power trend must converge");
        assert!(power.b > 0.2 && power.b < 0.9);

        // Robust linear trend of burst frequency against expression level.
        let linear = fit_robust_linear_trend(&table, "rna_mean", "bf_point")
            .unwrap()
            .converged()
            .expect("linear trend must converge");
        assert!((linear.slope - 0.05).abs() < 0.02);
        assert!(linear.r2_weighted > linear.r2_unweighted);

        // The aberrant gene is the most distant row in burst-parameter space.
        let distances = table_mahalanobis_distances(&table, &["bs_point", "bf_point"]).unwrap();
        assert_eq!(distances.len(), table.n_rows());
        let (most_distant, _) = distances
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(most_distant, table.n_rows() - 1);
    }

    #[test]
    fn batch_fitting_continues_past_failures() {
        let good = gene_panel();
        let degenerate = SampleTable::from_columns(vec![
            ("rna_mean", vec![1.0; 10]),
            ("bs_point", (1..=10).map(|i| i as f64).collect()),
        ])
        .unwrap();

        let results = fit_power_curve_batch(
            &[good, degenerate],
            "rna_mean",
            "bs_point",
            RobustLoss::SoftL1,
            1.0,
        );
        assert_eq!(results.len(), 2);
        assert!(results[0].as_ref().unwrap().is_converged());
        assert!(matches!(results[1].as_ref().unwrap(), FitOutcome::Failed));
    }

    #[test]
    fn likelihood_scoring_of_observed_counts() {
        let params = KineticParams::new(0.8, 4.0, 30.0).unwrap();
        let counts = vec![0, 1, 2, 5, 10, 25];
        let pmf = poisson_beta_pmf(&counts, &params, DEFAULT_QUADRATURE_NODES).unwrap();

        assert_eq!(pmf.len(), counts.len());
        assert!(pmf.iter().all(|p| p.is_finite() && *p >= 0.0));
        // Unnormalized likelihood contributions still behave like probabilities here.
        assert!(pmf.iter().sum::<f64>() <= 1.0 + 1e-9);
    }
}
