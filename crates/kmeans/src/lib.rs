//! K-means clustering used to bootstrap mixture-model means.
//!
//! Batch Lloyd's method over the rows of a [`Matrix`](gmix_matrix::Matrix):
//!
//! | Step | What happens |
//! |------|--------------|
//! | Seed | [`Seeding::Fixed`], [`Seeding::RandomSample`] or [`Seeding::PlusPlus`] (default) |
//! | Assign | nearest centroid by squared Euclidean distance, ties to the lowest index |
//! | Update | centroid = mean of its members; empty clusters per [`EmptyClusterPolicy`] |
//! | Stop | no reassignment, total distance increase (rolled back), or iteration cap |
//!
//! # Quick start
//!
//! ```
//! use gmix_kmeans::{KMeansConfig, Termination, kmeans};
//! use gmix_matrix::Matrix;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let data = Matrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.2],
//!     vec![5.0, 5.0],
//!     vec![5.2, 4.9],
//! ])
//! .unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! let result = kmeans(&data, &KMeansConfig::new(2), &mut rng).unwrap();
//!
//! assert_eq!(result.termination(), Termination::Converged);
//! assert_eq!(result.assignment()[0], result.assignment()[1]);
//! assert_ne!(result.assignment()[0], result.assignment()[2]);
//! ```
//!
//! # Architecture
//!
//! ```text
//! kmeans()
//!   ├─ validate config + data
//!   ├─ seed_centroids()        (seed.rs)
//!   └─ loop
//!        ├─ update_centroids() (kmeans.rs)
//!        ├─ total_distance()   (distance.rs)
//!        └─ assign_nearest()   (distance.rs)
//! ```

pub mod config;
pub mod error;
pub mod kmeans;
pub mod result;

pub(crate) mod distance;
pub(crate) mod seed;

pub use config::{EmptyClusterPolicy, KMeansConfig, Seeding};
pub use error::KMeansError;
pub use kmeans::kmeans;
pub use result::{KMeansResult, Termination};
