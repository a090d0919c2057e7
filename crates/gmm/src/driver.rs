//! EM driver: K-means bootstrap, then alternating E- and M-steps.

use gmix_kmeans::{KMeansConfig, kmeans};
use gmix_matrix::Matrix;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{CovarianceInit, EmConfig};
use crate::error::GmmError;
use crate::estep::{EStep, e_step};
use crate::mstep::{DegenerateHandling, RepairAction, m_step};
use crate::result::{EmFit, Termination};
use crate::theta::Theta;

/// Relative slack below which a log-likelihood decrease is treated as noise.
const LIKELIHOOD_NOISE: f64 = 1e-8;

/// Lifecycle of an [`EmDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmState {
    Uninitialized,
    /// Initial parameters are available.
    Bootstrapped,
    Iterating,
    Converged,
    /// A fatal error ended the run.
    Failed,
}

/// Runs EM over one dataset, tracking its lifecycle state.
///
/// The free functions [`initialize`], [`run_em`] and [`fit`] wrap a
/// short-lived driver.
#[derive(Debug)]
pub struct EmDriver<'a> {
    data: &'a Matrix,
    config: &'a EmConfig,
    state: EmState,
}

impl<'a> EmDriver<'a> {
    /// Creates a driver after validating the configuration and the dataset.
    ///
    /// # Errors
    ///
    /// [`GmmError::InvalidConfig`], [`GmmError::EmptyData`] or
    /// [`GmmError::NonFiniteData`].
    pub fn new(data: &'a Matrix, config: &'a EmConfig) -> Result<Self, GmmError> {
        config.validate()?;
        if data.is_empty() {
            return Err(GmmError::EmptyData);
        }
        if !data.is_finite() {
            return Err(GmmError::NonFiniteData);
        }
        Ok(Self {
            data,
            config,
            state: EmState::Uninitialized,
        })
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> EmState {
        self.state
    }

    fn transition(&mut self, to: EmState) {
        debug!(from = ?self.state, to = ?to, "em state");
        self.state = to;
    }

    /// Records `Failed` if `result` is an error.
    fn guard<T>(&mut self, result: Result<T, GmmError>) -> Result<T, GmmError> {
        if result.is_err() {
            self.transition(EmState::Failed);
        }
        result
    }

    /// Builds initial parameters for `k` components.
    ///
    /// Means come from K-means with the configured seeding, iteration cap
    /// and empty cluster policy; weights are `1/k`; every covariance is the
    /// configured [`CovarianceInit`].
    #[tracing::instrument(skip(self, rng), fields(n = self.data.rows()))]
    pub fn initialize(&mut self, k: usize, rng: &mut impl Rng) -> Result<Theta, GmmError> {
        let result = self.bootstrap(k, rng);
        let theta = self.guard(result)?;
        self.transition(EmState::Bootstrapped);
        Ok(theta)
    }

    fn bootstrap(&self, k: usize, rng: &mut impl Rng) -> Result<Theta, GmmError> {
        let n = self.data.rows();
        if k == 0 {
            return Err(GmmError::InvalidK { k });
        }
        if k > n {
            return Err(GmmError::TooManyComponents { k, n });
        }

        let km_config = KMeansConfig::new(k)
            .with_max_iterations(self.config.max_kmeans_iterations())
            .with_seeding(self.config.seeding().clone())
            .with_empty_cluster_policy(self.config.empty_cluster_policy());
        let km = kmeans(self.data, &km_config, rng)?;
        info!(
            k,
            iterations = km.iterations(),
            termination = km.termination().as_str(),
            total_distance = km.total_distance(),
            "k-means bootstrap finished"
        );

        let cov = initial_covariance(self.data, self.config.covariance_init())?;
        Ok(Theta::from_parts(
            vec![1.0 / k as f64; k],
            km.into_centroids(),
            vec![cov; k],
        ))
    }

    /// Iterates E- and M-steps from `theta0` until the log-likelihood settles.
    ///
    /// Points that were the only support of a collapsed component stay
    /// isolated for the rest of the run; see [`m_step`].
    ///
    /// # Errors
    ///
    /// - [`GmmError::DimensionMismatch`] if `theta0` does not match the data.
    /// - [`GmmError::SingularCovariance`] from the E-step.
    /// - [`GmmError::SingularFallback`] if reseeding is enabled and the
    ///   fallback covariance is singular.
    /// - [`GmmError::ReseedLimitExceeded`] after more than `max_reseeds`
    ///   component reseeds.
    /// - In strict mode, [`GmmError::NotConverged`] at the iteration cap and
    ///   [`GmmError::DegenerateComponent`] for any repair.
    #[tracing::instrument(skip_all, fields(n = self.data.rows(), k = theta0.n_components()))]
    pub fn run(&mut self, theta0: Theta) -> Result<EmFit, GmmError> {
        self.transition(EmState::Iterating);
        let result = self.iterate(theta0);
        let fit = self.guard(result)?;
        if fit.converged() {
            self.transition(EmState::Converged);
        }
        Ok(fit)
    }

    fn iterate(&self, theta0: Theta) -> Result<EmFit, GmmError> {
        let data = self.data;
        let config = self.config;
        if theta0.n_dims() != data.cols() {
            return Err(GmmError::DimensionMismatch {
                what: "parameter dimension",
                expected: data.cols(),
                got: theta0.n_dims(),
            });
        }
        let fallback = initial_covariance(data, CovarianceInit::Global)?;
        let mut handling = DegenerateHandling::new(config.empty_cluster_policy(), fallback)?;

        let mut theta = theta0;
        let mut trace = Vec::new();
        let mut repairs = Vec::new();
        let mut prev_ll = f64::NEG_INFINITY;
        let mut last_step_repaired = false;
        let mut reseeds = 0;
        let mut iterations = 0;
        let mut consistent: Option<EStep> = None;

        let termination = loop {
            if iterations == config.max_em_iterations() {
                break Termination::IterationCap;
            }
            iterations += 1;

            let estep = e_step(data, &theta)?;
            let ll = estep.log_likelihood();
            trace.push(ll);

            let slack = LIKELIHOOD_NOISE * ll.abs().max(1.0);
            if !last_step_repaired && ll < prev_ll - slack {
                warn!(iteration = iterations, ll, prev_ll, "log-likelihood decreased");
            }
            debug!(iteration = iterations, ll, delta = ll - prev_ll, "em iteration");

            if config.is_converged(prev_ll, ll) {
                consistent = Some(estep);
                break Termination::Converged;
            }

            let step = m_step(data, &estep, &theta, &handling)?;
            handling.mark_isolated(step.isolated_points());
            let (next, step_repairs) = step.into_parts();
            if config.strict() {
                if let Some(r) = step_repairs.first() {
                    return Err(GmmError::DegenerateComponent {
                        component: r.component,
                        cause: r.cause,
                    });
                }
            }
            reseeds += step_repairs
                .iter()
                .filter(|r| r.action == RepairAction::Reseeded)
                .count();
            if reseeds > config.max_reseeds() {
                return Err(GmmError::ReseedLimitExceeded {
                    attempts: reseeds,
                    limit: config.max_reseeds(),
                });
            }

            last_step_repaired = !step_repairs.is_empty();
            repairs.extend(step_repairs);
            theta = next;
            prev_ll = ll;
        };

        if termination == Termination::IterationCap {
            if config.strict() {
                return Err(GmmError::NotConverged { iterations });
            }
            warn!(
                iterations,
                log_likelihood = prev_ll,
                "EM stopped at the iteration cap without converging"
            );
        }

        let estep = match consistent {
            Some(estep) => estep,
            None => e_step(data, &theta)?,
        };
        info!(
            iterations,
            log_likelihood = estep.log_likelihood(),
            termination = termination.as_str(),
            repairs = repairs.len(),
            "EM finished"
        );

        Ok(EmFit::new(
            theta,
            estep.responsibilities().clone(),
            trace,
            estep.log_likelihood(),
            termination,
            iterations,
            repairs,
        ))
    }
}

/// Covariance used for every component at bootstrap and for reseeds.
///
/// `Global` is the sample covariance of the data (identity for a single
/// point); `ScaledIdentity` is the mean per-dimension variance times the
/// identity (identity if the data has no spread).
pub fn initial_covariance(data: &Matrix, init: CovarianceInit) -> Result<Matrix, GmmError> {
    let m = data.cols();
    if data.rows() < 2 {
        return Ok(Matrix::identity(m));
    }
    let cov = data.covar()?;
    match init {
        CovarianceInit::Global => Ok(cov),
        CovarianceInit::ScaledIdentity => {
            let mean_var = (0..m).map(|j| cov[(j, j)]).sum::<f64>() / m as f64;
            let mut out = Matrix::identity(m);
            if mean_var > 0.0 && mean_var.is_finite() {
                out.scale(mean_var);
            }
            Ok(out)
        }
    }
}

/// Builds initial parameters for `k` components. See [`EmDriver::initialize`].
pub fn initialize(
    data: &Matrix,
    k: usize,
    config: &EmConfig,
    rng: &mut impl Rng,
) -> Result<Theta, GmmError> {
    EmDriver::new(data, config)?.initialize(k, rng)
}

/// Runs EM from `theta0`. See [`EmDriver::run`].
pub fn run_em(data: &Matrix, theta0: Theta, config: &EmConfig) -> Result<EmFit, GmmError> {
    EmDriver::new(data, config)?.run(theta0)
}

/// Bootstraps with K-means and runs EM to completion.
///
/// # Example
///
/// ```
/// use gmix_gmm::{EmConfig, fit};
/// use gmix_matrix::Matrix;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let rows: Vec<Vec<f64>> = [-5.2, -4.9, -5.1, -4.8, -5.0, 4.9, 5.1, 5.0, 4.8, 5.2]
///     .iter()
///     .map(|&x| vec![x])
///     .collect();
/// let data = Matrix::from_rows(&rows).unwrap();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let fit = fit(&data, 2, &EmConfig::default(), &mut rng).unwrap();
/// assert!(fit.converged());
/// assert_eq!(fit.theta().n_components(), 2);
/// ```
pub fn fit(
    data: &Matrix,
    k: usize,
    config: &EmConfig,
    rng: &mut impl Rng,
) -> Result<EmFit, GmmError> {
    let mut driver = EmDriver::new(data, config)?;
    let theta0 = driver.initialize(k, rng)?;
    driver.run(theta0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use gmix_kmeans::{EmptyClusterPolicy, Seeding};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn column(values: &[f64]) -> Matrix {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    fn two_groups() -> Matrix {
        column(&[-5.2, -4.9, -5.1, -4.8, -5.0, 4.9, 5.1, 5.0, 4.8, 5.2])
    }

    #[test]
    fn test_driver_states() {
        let data = two_groups();
        let config = EmConfig::default();
        let mut driver = EmDriver::new(&data, &config).unwrap();
        assert_eq!(driver.state(), EmState::Uninitialized);

        let mut rng = StdRng::seed_from_u64(1);
        let theta = driver.initialize(2, &mut rng).unwrap();
        assert_eq!(driver.state(), EmState::Bootstrapped);

        let fit = driver.run(theta).unwrap();
        assert!(fit.converged());
        assert_eq!(driver.state(), EmState::Converged);
    }

    #[test]
    fn test_failed_state_on_error() {
        let data = two_groups();
        let config = EmConfig::default();
        let mut driver = EmDriver::new(&data, &config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(driver.initialize(11, &mut rng).is_err());
        assert_eq!(driver.state(), EmState::Failed);
    }

    #[test]
    fn test_initialize_validation() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = EmConfig::default();
        assert!(matches!(
            initialize(&Matrix::new(), 1, &config, &mut rng),
            Err(GmmError::EmptyData)
        ));
        assert!(matches!(
            initialize(&column(&[1.0, f64::INFINITY]), 1, &config, &mut rng),
            Err(GmmError::NonFiniteData)
        ));
        assert!(matches!(
            initialize(&two_groups(), 0, &config, &mut rng),
            Err(GmmError::InvalidK { k: 0 })
        ));
        assert!(matches!(
            initialize(&two_groups(), 11, &config, &mut rng),
            Err(GmmError::TooManyComponents { k: 11, n: 10 })
        ));
    }

    #[test]
    fn test_initialize_uses_kmeans_and_global_covariance() {
        let data = two_groups();
        let config = EmConfig::default().with_seeding(Seeding::Fixed(vec![vec![-5.0], vec![5.0]]));
        let mut rng = StdRng::seed_from_u64(0);
        let theta = initialize(&data, 2, &config, &mut rng).unwrap();

        assert_eq!(theta.weights(), &[0.5, 0.5]);
        assert_abs_diff_eq!(theta.mean(0)[0], -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(theta.mean(1)[0], 5.0, epsilon = 1e-12);
        let global = data.covar().unwrap();
        assert_eq!(theta.covariance(0), &global);
        assert_eq!(theta.covariance(1), &global);
    }

    #[test]
    fn test_initial_covariance_scaled_identity() {
        let data = Matrix::from_rows(&[vec![0.0, 0.0], vec![2.0, 4.0], vec![4.0, 8.0]]).unwrap();
        let cov = initial_covariance(&data, CovarianceInit::ScaledIdentity).unwrap();
        // Variances 4 and 16.
        assert_eq!(cov, Matrix::from_diag(&[10.0, 10.0]));

        let single = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            initial_covariance(&single, CovarianceInit::Global).unwrap(),
            Matrix::identity(2)
        );
    }

    #[test]
    fn test_iteration_cap_non_strict_and_strict() {
        let data = two_groups();
        let mut rng = StdRng::seed_from_u64(2);
        let config = EmConfig::default()
            .with_max_em_iterations(1)
            .with_convergence_epsilon(1e-300);
        let theta0 = initialize(&data, 2, &config, &mut rng).unwrap();

        let fit = run_em(&data, theta0.clone(), &config).unwrap();
        assert_eq!(fit.termination(), Termination::IterationCap);
        assert_eq!(fit.iterations(), 1);
        assert_eq!(fit.trace().len(), 1);

        let strict = config.with_strict(true);
        let err = run_em(&data, theta0, &strict).unwrap_err();
        assert!(matches!(err, GmmError::NotConverged { iterations: 1 }));
    }

    #[test]
    fn test_theta_dimension_mismatch() {
        let data = two_groups();
        let theta = Theta::new(
            vec![1.0],
            Matrix::from_rows(&[vec![0.0, 0.0]]).unwrap(),
            vec![Matrix::identity(2)],
        )
        .unwrap();
        let err = run_em(&data, theta, &EmConfig::default()).unwrap_err();
        assert!(matches!(err, GmmError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_strict_mode_rejects_repairs() {
        // The third component sits on the outlier alone and collapses in the first M-step.
        let data = column(&[0.0, 0.2, 0.4, 0.6, 0.8, 10.0, 10.2, 10.4, 10.6, 10.8, 1000.0]);
        let theta0 = Theta::new(
            vec![5.0 / 11.0, 5.0 / 11.0, 1.0 / 11.0],
            column(&[0.4, 10.4, 1000.0]),
            vec![
                Matrix::from_diag(&[0.1]),
                Matrix::from_diag(&[0.1]),
                Matrix::from_diag(&[1e-6]),
            ],
        )
        .unwrap();

        let strict = EmConfig::default()
            .with_empty_cluster_policy(EmptyClusterPolicy::Freeze)
            .with_strict(true);
        let err = run_em(&data, theta0.clone(), &strict).unwrap_err();
        assert!(matches!(err, GmmError::DegenerateComponent { component: 2, .. }));

        let lenient = strict.with_strict(false);
        let fit = run_em(&data, theta0, &lenient).unwrap();
        assert!(fit.repairs().iter().all(|r| r.component == 2));
        assert!(!fit.repairs().is_empty());
    }
}
