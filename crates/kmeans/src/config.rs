//! Configuration for K-means runs.

use crate::error::KMeansError;

/// How the initial centroids are chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Seeding {
    /// Caller-supplied centroids, one `Vec` of length M per cluster.
    Fixed(Vec<Vec<f64>>),
    /// K distinct data points drawn uniformly without replacement.
    RandomSample,
    /// k-means++: each further centroid is drawn with probability
    /// proportional to its squared distance from the nearest chosen one.
    #[default]
    PlusPlus,
}

/// What to do when a cluster (or mixture component) loses all of its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyClusterPolicy {
    /// Move the centroid to the worst-served point.
    Reseed,
    /// Keep the previous centroid until the cluster regains members.
    #[default]
    Freeze,
    /// Abort the run with an error.
    Error,
}

/// Configuration for a K-means run.
///
/// # Example
///
/// ```
/// use gmix_kmeans::{EmptyClusterPolicy, KMeansConfig, Seeding};
///
/// let config = KMeansConfig::new(3)
///     .with_max_iterations(50)
///     .with_seeding(Seeding::RandomSample)
///     .with_empty_cluster_policy(EmptyClusterPolicy::Reseed);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters.
    k: usize,
    /// Cap on batch reassignment rounds.
    max_iterations: usize,
    /// Initial centroid strategy.
    seeding: Seeding,
    /// Empty cluster handling.
    empty_cluster_policy: EmptyClusterPolicy,
}

impl KMeansConfig {
    /// Creates a new configuration for `k` clusters.
    ///
    /// Defaults: `max_iterations = 100`, `seeding = PlusPlus`,
    /// `empty_cluster_policy = Freeze`.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 100,
            seeding: Seeding::PlusPlus,
            empty_cluster_policy: EmptyClusterPolicy::Freeze,
        }
    }

    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the seeding strategy.
    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    /// Sets the empty cluster policy.
    pub fn with_empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster_policy = policy;
        self
    }

    /// Returns the number of clusters.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the iteration cap.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the seeding strategy.
    pub fn seeding(&self) -> &Seeding {
        &self.seeding
    }

    /// Returns the empty cluster policy.
    pub fn empty_cluster_policy(&self) -> EmptyClusterPolicy {
        self.empty_cluster_policy
    }

    /// Validates this configuration independently of any dataset.
    ///
    /// Returns an error if k < 1, max_iterations < 1, or a fixed seed list
    /// does not contain exactly k finite centroids of equal dimension.
    pub fn validate(&self) -> Result<(), KMeansError> {
        if self.k < 1 {
            return Err(KMeansError::InvalidK { k: self.k });
        }
        if self.max_iterations < 1 {
            return Err(KMeansError::InvalidMaxIterations {
                max_iterations: self.max_iterations,
            });
        }
        if let Seeding::Fixed(seeds) = &self.seeding {
            if seeds.len() != self.k {
                return Err(KMeansError::SeedCountMismatch {
                    expected: self.k,
                    got: seeds.len(),
                });
            }
            let dim = seeds[0].len();
            for (index, seed) in seeds.iter().enumerate() {
                if seed.len() != dim || dim == 0 {
                    return Err(KMeansError::InvalidSeed {
                        index,
                        reason: format!("dimension {}, expected {dim}", seed.len()),
                    });
                }
                if seed.iter().any(|v| !v.is_finite()) {
                    return Err(KMeansError::InvalidSeed {
                        index,
                        reason: "non-finite coordinate".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self::new(1)
    }
}
