//! # single-burst
//!
//! A specialized Rust library for transcriptional burst kinetics analysis of single-cell data,
//! part of the single-rust ecosystem.
//!
//! This crate provides the numerical core for quantifying transcriptional "bursting" from
//! single-cell molecule counts: likelihood evaluation under the two-state (telegraph) model of
//! gene expression, robust trend fitting of burst parameters against expression level, and
//! multivariate outlier scoring for selecting well-fitted genes.
//!
//! ## Core Features
//!
//! - **Burst-Kinetics Likelihoods**: Poisson-beta mixture pmf evaluated by Gauss-Jacobi quadrature
//! - **Robust Trend Fitting**: power-law curves via damped least squares with pluggable robust
//!   losses, and Huber M-estimator linear trends via iteratively reweighted least squares
//! - **Outlier Scoring**: Mahalanobis distances from the sample centroid for good-fit selection
//! - **Correlation Measures**: Pearson and Spearman coefficients with significance
//!
//! All components are pure functions over in-memory tables: no I/O, no shared state, and
//! identical inputs always produce identical outputs. Batch entry points parallelize across
//! independent tables with rayon.
//!
//! ## Module Organization
//!
//! - **[`table`]**: Named-column numeric tables consumed by the fitters
//! - **[`kinetics`]**: The two-state bursting model pmf and its quadrature rule
//! - **[`trends`]**: Power-law and robust linear trend fitting, correlation measures
//! - **[`outliers`]**: Mahalanobis distance computation over table columns

pub mod kinetics;
pub mod outliers;
pub mod table;
pub mod trends;
