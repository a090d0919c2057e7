//! Error types for the gmix-gmm crate.

use gmix_kmeans::KMeansError;
use gmix_matrix::MatrixError;

use crate::mstep::DegenerateCause;

/// Error type for all fallible operations in the gmix-gmm crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GmmError {
    /// Returned when the number of components is zero.
    #[error("number of components must be >= 1, got {k}")]
    InvalidK {
        /// The invalid component count.
        k: usize,
    },

    /// Returned when there are fewer points than components.
    #[error("{k} components requested but the dataset has only {n} points")]
    TooManyComponents {
        /// Requested number of components.
        k: usize,
        /// Number of points in the dataset.
        n: usize,
    },

    /// Returned when the dataset has no rows or no columns.
    #[error("dataset is empty")]
    EmptyData,

    /// Returned when the dataset contains NaN or infinity.
    #[error("dataset contains non-finite values")]
    NonFiniteData,

    /// Returned when two inputs disagree on a dimension.
    #[error("{what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which quantity disagrees.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when an [`EmConfig`](crate::EmConfig) value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when mixture parameters are malformed.
    #[error("invalid parameters: {reason}")]
    InvalidTheta {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a component covariance cannot be inverted during the E-step.
    #[error("covariance of component {component} is singular")]
    SingularCovariance {
        /// Index of the offending component.
        component: usize,
    },

    /// Returned when a component degenerates and the policy forbids repair.
    #[error("component {component} degenerated: {cause}")]
    DegenerateComponent {
        /// Index of the degenerate component.
        component: usize,
        /// Why the component was considered degenerate.
        cause: DegenerateCause,
    },

    /// Returned when the fallback covariance used for reseeding is singular.
    #[error("fallback covariance is singular")]
    SingularFallback,

    /// Returned when more components were reseeded than allowed.
    #[error("reseed limit exceeded: {attempts} reseeds, limit {limit}")]
    ReseedLimitExceeded {
        /// Number of reseeds performed so far.
        attempts: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Returned in strict mode when the iteration cap is reached.
    #[error("EM did not converge within {iterations} iterations")]
    NotConverged {
        /// Number of iterations performed.
        iterations: usize,
    },

    /// Wraps an error from the K-means initializer.
    #[error("k-means initialization failed: {0}")]
    KMeans(#[from] KMeansError),

    /// Wraps an error from the matrix engine.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
