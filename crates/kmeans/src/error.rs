//! Error types for the gmix-kmeans crate.

use gmix_matrix::MatrixError;

/// Error type for all fallible operations in the gmix-kmeans crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KMeansError {
    /// Returned when the dataset has no rows or no columns.
    #[error("dataset is empty")]
    EmptyData,

    /// Returned when the dataset contains NaN or infinity.
    #[error("dataset contains non-finite values")]
    NonFiniteData,

    /// Returned when k is zero.
    #[error("k must be >= 1, got {k}")]
    InvalidK {
        /// The invalid k value.
        k: usize,
    },

    /// Returned when there are fewer points than clusters.
    #[error("k = {k} exceeds the number of points ({n})")]
    TooManyClusters {
        /// Requested number of clusters.
        k: usize,
        /// Number of points in the dataset.
        n: usize,
    },

    /// Returned when the iteration cap is zero.
    #[error("max_iterations must be >= 1, got {max_iterations}")]
    InvalidMaxIterations {
        /// The invalid cap.
        max_iterations: usize,
    },

    /// Returned when a fixed seed list has the wrong number of centroids.
    #[error("expected {expected} seed centroids, got {got}")]
    SeedCountMismatch {
        /// Number of clusters requested.
        expected: usize,
        /// Number of seed centroids supplied.
        got: usize,
    },

    /// Returned when a fixed seed centroid has the wrong dimension or is not finite.
    #[error("seed centroid {index} is invalid: {reason}")]
    InvalidSeed {
        /// Index of the offending seed centroid.
        index: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Returned under [`EmptyClusterPolicy::Error`](crate::EmptyClusterPolicy::Error)
    /// when a cluster loses all of its members.
    #[error("cluster {cluster} has no members at iteration {iteration}")]
    EmptyCluster {
        /// Index of the empty cluster.
        cluster: usize,
        /// Iteration at which the cluster emptied.
        iteration: usize,
    },

    /// Wraps an error from the matrix engine.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
