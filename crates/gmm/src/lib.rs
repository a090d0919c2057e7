//! Gaussian mixture models fitted by expectation-maximization.
//!
//! A K-component mixture in M dimensions is described by a [`Theta`]:
//!
//! | Parameter | Shape | Constraint |
//! |-----------|-------|------------|
//! | weights π | K | non-negative, sum to 1 |
//! | means μ | K×M | finite |
//! | covariances Σ | K × (M×M) | symmetric, invertible |
//!
//! Fitting starts from K-means centroids and alternates:
//!
//! - **E-step** ([`e_step`]): responsibilities `p_nk ∝ π_k N(x_n | μ_k, Σ_k)`,
//!   computed in log space with log-sum-exp normalization.
//! - **M-step** ([`m_step`]): responsibility-weighted weights, means and
//!   covariances; starved or collapsed components are handled per
//!   [`EmptyClusterPolicy`].
//!
//! until the log-likelihood changes by less than the configured epsilon.
//!
//! # Quick start
//!
//! ```
//! use gmix_gmm::{EmConfig, fit};
//! use gmix_matrix::Matrix;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let rows: Vec<Vec<f64>> = (0..40)
//!     .map(|i| {
//!         let centre = if i < 20 { -3.0 } else { 3.0 };
//!         vec![centre + 0.05 * (i % 7) as f64]
//!     })
//!     .collect();
//! let data = Matrix::from_rows(&rows).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let fit = fit(&data, 2, &EmConfig::default(), &mut rng).unwrap();
//! let labels = fit.labels();
//! assert_eq!(labels[0], labels[19]);
//! assert_ne!(labels[0], labels[20]);
//! ```
//!
//! # Architecture
//!
//! ```text
//! fit()                         (driver.rs)
//!   ├─ initialize()
//!   │    ├─ gmix_kmeans::kmeans()
//!   │    └─ initial_covariance()
//!   └─ run_em()
//!        └─ loop
//!             ├─ e_step()       (estep.rs, density.rs)
//!             └─ m_step()       (mstep.rs)
//! ```

pub mod config;
pub mod density;
pub mod driver;
pub mod error;
pub mod estep;
pub mod mstep;
pub mod result;
pub mod theta;

pub use config::{CovarianceInit, EmConfig, Tolerance};
pub use density::{GaussianDensity, density, log_density};
pub use driver::{EmDriver, EmState, fit, initial_covariance, initialize, run_em};
pub use error::GmmError;
pub use estep::{EStep, e_step};
pub use gmix_kmeans::{EmptyClusterPolicy, Seeding};
pub use mstep::{
    DegenerateCause, DegenerateHandling, MIN_EFFECTIVE_MASS, MStep, Repair, RepairAction, m_step,
};
pub use result::{EmFit, Termination};
pub use theta::Theta;
