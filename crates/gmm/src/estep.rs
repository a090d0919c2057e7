//! Expectation step: responsibilities and log-likelihood under fixed parameters.

use gmix_matrix::{Matrix, Orientation};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::density::GaussianDensity;
use crate::error::GmmError;
use crate::theta::Theta;

/// Output of one E-step.
#[derive(Debug, Clone)]
pub struct EStep {
    /// N×K posterior component probabilities; each row sums to 1.
    responsibilities: Matrix,
    /// Σ over points of the per-point log-likelihood.
    log_likelihood: f64,
    point_log_likelihoods: Vec<f64>,
    /// Points whose weighted densities all underflowed.
    n_fallback: usize,
}

impl EStep {
    pub(crate) fn new(responsibilities: Matrix, point_log_likelihoods: Vec<f64>, n_fallback: usize) -> Self {
        Self {
            responsibilities,
            log_likelihood: point_log_likelihoods.iter().sum(),
            point_log_likelihoods,
            n_fallback,
        }
    }

    /// Returns the N×K responsibilities; each row sums to 1.
    pub fn responsibilities(&self) -> &Matrix {
        &self.responsibilities
    }

    /// Consumes the step, returning the responsibilities.
    pub fn into_responsibilities(self) -> Matrix {
        self.responsibilities
    }

    /// Returns the total log-likelihood of the data.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Log-likelihood of each point, `ln Σ_k π_k N(x_n | μ_k, Σ_k)`.
    pub fn point_log_likelihoods(&self) -> &[f64] {
        &self.point_log_likelihoods
    }

    /// Number of points that fell back to uniform responsibilities.
    pub fn n_fallback(&self) -> usize {
        self.n_fallback
    }
}

/// `m + ln Σ exp(a_j − m)` with `m = max a_j`; `None` if every term is −∞
/// (or the inputs are NaN).
fn log_sum_exp(values: &[f64]) -> Option<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    let lse = max + sum.ln();
    lse.is_finite().then_some(lse)
}

/// Computes responsibilities for every point under `theta`.
///
/// A point whose weighted component densities are all zero gets uniform
/// responsibilities `1/K` and contributes `ln(f64::MIN_POSITIVE)` to the
/// log-likelihood.
///
/// # Errors
///
/// - [`GmmError::DimensionMismatch`] if `data` and `theta` disagree on M.
/// - [`GmmError::SingularCovariance`] if a component covariance cannot be
///   inverted or has a non-positive determinant.
#[tracing::instrument(skip(data, theta), fields(n = data.rows(), k = theta.n_components()))]
pub fn e_step(data: &Matrix, theta: &Theta) -> Result<EStep, GmmError> {
    if data.cols() != theta.n_dims() {
        return Err(GmmError::DimensionMismatch {
            what: "data dimension",
            expected: theta.n_dims(),
            got: data.cols(),
        });
    }
    let n = data.rows();
    let k = theta.n_components();

    let components = (0..k)
        .map(|c| {
            GaussianDensity::new(theta.mean(c), theta.covariance(c)).map_err(|e| {
                if e.is_solver_error() {
                    GmmError::SingularCovariance { component: c }
                } else {
                    GmmError::Matrix(e)
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let log_weights: Vec<f64> = theta.weights().iter().map(|w| w.ln()).collect();

    let rows: Vec<(Vec<f64>, f64, bool)> = (0..n)
        .into_par_iter()
        .map(|i| {
            let x = data.row_slice(i);
            let mut log_w: Vec<f64> = components
                .iter()
                .zip(&log_weights)
                .map(|(g, lw)| lw + g.log_density(x))
                .collect();
            match log_sum_exp(&log_w) {
                Some(lse) => {
                    log_w.iter_mut().for_each(|v| *v = (*v - lse).exp());
                    (log_w, lse, false)
                }
                None => (vec![1.0 / k as f64; k], f64::MIN_POSITIVE.ln(), true),
            }
        })
        .collect();

    let mut resp = Vec::with_capacity(n * k);
    let mut point_ll = Vec::with_capacity(n);
    let mut n_fallback = 0;
    for (row, ll, fallback) in rows {
        resp.extend(row);
        point_ll.push(ll);
        n_fallback += usize::from(fallback);
    }
    let out = EStep::new(
        Matrix::from_vec(resp, n, k, Orientation::RowMajor)?,
        point_ll,
        n_fallback,
    );

    if n_fallback > 0 {
        warn!(n_fallback, "points with zero density under every component");
    }
    debug!(log_likelihood = out.log_likelihood, "e-step");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn column(values: &[f64]) -> Matrix {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    fn two_component_1d() -> Theta {
        Theta::new(
            vec![0.5, 0.5],
            column(&[-2.0, 2.0]),
            vec![Matrix::identity(1), Matrix::identity(1)],
        )
        .unwrap()
    }

    #[test]
    fn test_log_sum_exp() {
        assert_abs_diff_eq!(
            log_sum_exp(&[0.0, 0.0]).unwrap(),
            2.0_f64.ln(),
            epsilon = 1e-15
        );
        // Stable for large magnitudes.
        assert_abs_diff_eq!(
            log_sum_exp(&[-1000.0, -1000.0]).unwrap(),
            -1000.0 + 2.0_f64.ln(),
            epsilon = 1e-12
        );
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), None);
        assert_eq!(log_sum_exp(&[f64::NAN, 0.0]), None);
    }

    #[test]
    fn test_symmetric_point_splits_evenly() {
        let out = e_step(&column(&[0.0]), &two_component_1d()).unwrap();
        let r = out.responsibilities();
        assert_abs_diff_eq!(r[(0, 0)], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(r[(0, 1)], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_rows_sum_to_one_and_favor_nearest() {
        let data = column(&[-3.0, -1.0, 0.5, 4.0]);
        let out = e_step(&data, &two_component_1d()).unwrap();
        let r = out.responsibilities();
        assert_eq!(r.shape(), (4, 2));
        for i in 0..4 {
            assert_abs_diff_eq!(r[(i, 0)] + r[(i, 1)], 1.0, epsilon = 1e-12);
        }
        assert!(r[(0, 0)] > 0.99);
        assert!(r[(3, 1)] > 0.99);
        assert!(r[(2, 1)] > r[(2, 0)]);
    }

    #[test]
    fn test_log_likelihood_matches_direct_sum() {
        let data = column(&[-1.0, 0.3, 2.5]);
        let theta = Theta::new(
            vec![0.3, 0.7],
            column(&[-1.0, 2.0]),
            vec![Matrix::from_diag(&[0.5]), Matrix::from_diag(&[2.0])],
        )
        .unwrap();
        let out = e_step(&data, &theta).unwrap();

        let pdf = |x: f64, mu: f64, var: f64| {
            (-(x - mu).powi(2) / (2.0 * var)).exp() / (2.0 * std::f64::consts::PI * var).sqrt()
        };
        let expected: f64 = [-1.0, 0.3, 2.5]
            .iter()
            .map(|&x| (0.3 * pdf(x, -1.0, 0.5) + 0.7 * pdf(x, 2.0, 2.0)).ln())
            .sum();
        assert_abs_diff_eq!(out.log_likelihood(), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(
            out.point_log_likelihoods().iter().sum::<f64>(),
            out.log_likelihood(),
            epsilon = 1e-12
        );
        assert_eq!(out.n_fallback(), 0);
    }

    #[test]
    fn test_far_point_stays_finite_in_log_space() {
        // Plain densities underflow to 0 here; log-space keeps a real posterior.
        let data = column(&[60.0]);
        let out = e_step(&data, &two_component_1d()).unwrap();
        assert_eq!(out.n_fallback(), 0);
        assert!(out.log_likelihood().is_finite());
        assert!(out.responsibilities()[(0, 1)] > 0.999);
    }

    #[test]
    fn test_zero_weight_components_fall_back_to_uniform() {
        let theta = Theta::from_parts(
            vec![0.0, 0.0],
            column(&[0.0, 1.0]),
            vec![Matrix::identity(1), Matrix::identity(1)],
        );
        let out = e_step(&column(&[0.5, 0.7]), &theta).unwrap();
        assert_eq!(out.n_fallback(), 2);
        assert_abs_diff_eq!(out.responsibilities()[(0, 0)], 0.5);
        assert_abs_diff_eq!(
            out.log_likelihood(),
            2.0 * f64::MIN_POSITIVE.ln(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_singular_covariance_reports_component() {
        let theta = Theta::new(
            vec![0.5, 0.5],
            Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap(),
            vec![
                Matrix::identity(2),
                Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap();
        let data = Matrix::from_rows(&[vec![0.0, 0.0]]).unwrap();
        let err = e_step(&data, &theta).unwrap_err();
        assert!(matches!(err, GmmError::SingularCovariance { component: 1 }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let data = Matrix::from_rows(&[vec![0.0, 0.0]]).unwrap();
        let err = e_step(&data, &two_component_1d()).unwrap_err();
        assert!(matches!(err, GmmError::DimensionMismatch { .. }));
    }
}
