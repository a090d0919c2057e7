//! Configuration for EM fitting.

use gmix_kmeans::{EmptyClusterPolicy, Seeding};

use crate::error::GmmError;

/// How the log-likelihood change is compared against the convergence epsilon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tolerance {
    /// Converged when `|L - L_prev| < epsilon`.
    #[default]
    Absolute,
    /// Converged when `|L - L_prev| < epsilon * |L|`.
    Relative,
}

/// Initial covariance for every component after K-means seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CovarianceInit {
    /// Sample covariance of the whole dataset.
    #[default]
    Global,
    /// Identity scaled by the mean per-dimension variance of the dataset.
    ScaledIdentity,
}

/// Configuration for [`initialize`](crate::initialize) and [`run_em`](crate::run_em).
///
/// # Example
///
/// ```
/// use gmix_gmm::{EmConfig, EmptyClusterPolicy, Tolerance};
///
/// let config = EmConfig::default()
///     .with_convergence_epsilon(1e-8)
///     .with_tolerance(Tolerance::Relative)
///     .with_empty_cluster_policy(EmptyClusterPolicy::Freeze);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EmConfig {
    max_kmeans_iterations: usize,
    convergence_epsilon: f64,
    tolerance: Tolerance,
    max_em_iterations: usize,
    empty_cluster_policy: EmptyClusterPolicy,
    seeding: Seeding,
    covariance_init: CovarianceInit,
    /// Total reseeds allowed over one EM run.
    max_reseeds: usize,
    /// Treat non-convergence and any component repair as errors.
    strict: bool,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            max_kmeans_iterations: 100,
            convergence_epsilon: 1e-6,
            tolerance: Tolerance::Absolute,
            max_em_iterations: 1000,
            empty_cluster_policy: EmptyClusterPolicy::Reseed,
            seeding: Seeding::PlusPlus,
            covariance_init: CovarianceInit::Global,
            max_reseeds: 10,
            strict: false,
        }
    }
}

impl EmConfig {
    /// Sets the iteration cap for the K-means bootstrap.
    pub fn with_max_kmeans_iterations(mut self, n: usize) -> Self {
        self.max_kmeans_iterations = n;
        self
    }

    /// Sets the log-likelihood change below which EM stops.
    pub fn with_convergence_epsilon(mut self, epsilon: f64) -> Self {
        self.convergence_epsilon = epsilon;
        self
    }

    /// Sets whether the epsilon is absolute or relative.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the EM iteration cap.
    pub fn with_max_em_iterations(mut self, n: usize) -> Self {
        self.max_em_iterations = n;
        self
    }

    /// Sets the policy for empty K-means clusters and degenerate EM components.
    pub fn with_empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster_policy = policy;
        self
    }

    /// Sets how K-means picks its initial centroids.
    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    /// Sets the initial covariance of every component.
    pub fn with_covariance_init(mut self, init: CovarianceInit) -> Self {
        self.covariance_init = init;
        self
    }

    /// Sets how many component reseeds a run may perform.
    pub fn with_max_reseeds(mut self, n: usize) -> Self {
        self.max_reseeds = n;
        self
    }

    /// Turns repairs and the iteration cap into errors.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the K-means iteration cap.
    pub fn max_kmeans_iterations(&self) -> usize {
        self.max_kmeans_iterations
    }

    /// Returns the convergence epsilon.
    pub fn convergence_epsilon(&self) -> f64 {
        self.convergence_epsilon
    }

    /// Returns how the epsilon is applied.
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Returns the EM iteration cap.
    pub fn max_em_iterations(&self) -> usize {
        self.max_em_iterations
    }

    /// Returns the policy for empty clusters and degenerate components.
    pub fn empty_cluster_policy(&self) -> EmptyClusterPolicy {
        self.empty_cluster_policy
    }

    /// Returns the K-means seeding.
    pub fn seeding(&self) -> &Seeding {
        &self.seeding
    }

    /// Returns the initial covariance choice.
    pub fn covariance_init(&self) -> CovarianceInit {
        self.covariance_init
    }

    /// Returns the reseed budget.
    pub fn max_reseeds(&self) -> usize {
        self.max_reseeds
    }

    /// Returns `true` in strict mode.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Returns `true` when a log-likelihood step from `previous` to `current`
    /// is within tolerance.
    pub fn is_converged(&self, previous: f64, current: f64) -> bool {
        let delta = (current - previous).abs();
        match self.tolerance {
            Tolerance::Absolute => delta < self.convergence_epsilon,
            Tolerance::Relative => delta < self.convergence_epsilon * current.abs(),
        }
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// [`GmmError::InvalidConfig`] if the epsilon is not a positive finite
    /// number or an iteration cap is zero.
    pub fn validate(&self) -> Result<(), GmmError> {
        if !(self.convergence_epsilon.is_finite() && self.convergence_epsilon > 0.0) {
            return Err(GmmError::InvalidConfig {
                reason: format!(
                    "convergence_epsilon must be positive and finite, got {}",
                    self.convergence_epsilon
                ),
            });
        }
        if self.max_em_iterations < 1 {
            return Err(GmmError::InvalidConfig {
                reason: "max_em_iterations must be >= 1".to_string(),
            });
        }
        if self.max_kmeans_iterations < 1 {
            return Err(GmmError::InvalidConfig {
                reason: "max_kmeans_iterations must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}
