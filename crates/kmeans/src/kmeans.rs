//! Lloyd's method with a non-improvement guard.

use gmix_matrix::Matrix;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::{EmptyClusterPolicy, KMeansConfig};
use crate::distance::{all_distances, assign_nearest, total_distance};
use crate::error::KMeansError;
use crate::result::{KMeansResult, Termination};
use crate::seed::seed_centroids;

/// Checks the dataset against the configured number of clusters.
fn validate_data(data: &Matrix, k: usize) -> Result<(), KMeansError> {
    if data.is_empty() {
        return Err(KMeansError::EmptyData);
    }
    if !data.is_finite() {
        return Err(KMeansError::NonFiniteData);
    }
    if k > data.rows() {
        return Err(KMeansError::TooManyClusters { k, n: data.rows() });
    }
    Ok(())
}

/// Partitions the rows of `data` into `config.k()` clusters.
///
/// Each iteration recomputes the centroids from the current assignment,
/// then reassigns every point to its nearest centroid. The run stops when a
/// reassignment changes nothing, when the total within-cluster squared
/// distance goes up (the previous state is restored), or at
/// `config.max_iterations()`.
///
/// # Errors
///
/// - Config errors from [`KMeansConfig::validate`].
/// - [`KMeansError::EmptyData`], [`KMeansError::NonFiniteData`],
///   [`KMeansError::TooManyClusters`] for unusable datasets.
/// - [`KMeansError::InvalidSeed`] if fixed seeds do not match the data dimension.
/// - [`KMeansError::EmptyCluster`] under [`EmptyClusterPolicy::Error`].
///
/// # Example
///
/// ```
/// use gmix_kmeans::{KMeansConfig, Seeding, kmeans};
/// use gmix_matrix::Matrix;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let data = Matrix::from_rows(&[vec![0.0], vec![0.2], vec![9.8], vec![10.0]]).unwrap();
/// let config = KMeansConfig::new(2).with_seeding(Seeding::Fixed(vec![vec![1.0], vec![8.0]]));
/// let mut rng = StdRng::seed_from_u64(0);
///
/// let result = kmeans(&data, &config, &mut rng).unwrap();
/// assert_eq!(result.assignment(), &[0, 0, 1, 1]);
/// ```
#[tracing::instrument(skip(data, config, rng), fields(n = data.rows(), dim = data.cols(), k = config.k()))]
pub fn kmeans(
    data: &Matrix,
    config: &KMeansConfig,
    rng: &mut impl Rng,
) -> Result<KMeansResult, KMeansError> {
    config.validate()?;
    let k = config.k();
    validate_data(data, k)?;
    let n = data.rows();

    let mut centroids = seed_centroids(data, k, config.seeding(), rng)?;
    let mut dist = vec![0.0; n * k];
    let mut assignment = vec![0usize; n];
    let mut next_assignment = vec![0usize; n];
    all_distances(data, &centroids, &mut dist);
    assign_nearest(&dist, k, &mut assignment);

    let mut history = Vec::new();
    let mut empty_clusters = Vec::new();
    let mut prev_total = f64::INFINITY;
    let mut prev_centroids = centroids.clone();
    let mut prev_assignment = assignment.clone();
    let mut iteration = 0;

    let termination = loop {
        if iteration == config.max_iterations() {
            break Termination::MaxIterations;
        }
        iteration += 1;

        update_centroids(
            data,
            &assignment,
            &dist,
            &mut centroids,
            config.empty_cluster_policy(),
            iteration,
            &mut empty_clusters,
        )?;

        let total = total_distance(data, &centroids, &assignment);
        if total > prev_total {
            debug!(iteration, total, prev_total, "total distance increased, rolling back");
            centroids = prev_centroids;
            assignment = prev_assignment;
            break Termination::NoImprovement;
        }
        history.push(total);

        prev_centroids.clone_from(&centroids);
        prev_assignment.clone_from(&assignment);

        all_distances(data, &centroids, &mut dist);
        assign_nearest(&dist, k, &mut next_assignment);
        let changes = assignment
            .iter()
            .zip(&next_assignment)
            .filter(|(a, b)| a != b)
            .count();
        std::mem::swap(&mut assignment, &mut next_assignment);

        debug!(
            iteration,
            changes,
            total_distance = total,
            delta = prev_total - total,
            "kmeans iteration"
        );
        prev_total = total;

        if changes == 0 {
            break Termination::Converged;
        }
    };

    let total = total_distance(data, &centroids, &assignment);
    debug!(iterations = iteration, ?termination, total_distance = total, "kmeans finished");

    Ok(KMeansResult::new(
        centroids,
        assignment,
        total,
        history,
        iteration,
        termination,
        empty_clusters,
    ))
}

/// Recomputes every centroid as the mean of its members.
///
/// `dist` holds the point-to-centroid distances that produced `assignment`;
/// it is used to find reseed targets.
fn update_centroids(
    data: &Matrix,
    assignment: &[usize],
    dist: &[f64],
    centroids: &mut Matrix,
    policy: EmptyClusterPolicy,
    iteration: usize,
    empty_clusters: &mut Vec<usize>,
) -> Result<(), KMeansError> {
    let k = centroids.rows();
    let m = centroids.cols();
    let mut sums = vec![0.0; k * m];
    let mut counts = vec![0usize; k];

    for (point, &c) in data.iter_rows().zip(assignment) {
        counts[c] += 1;
        for (s, &x) in sums[c * m..(c + 1) * m].iter_mut().zip(point) {
            *s += x;
        }
    }

    let mut reseeded: Vec<usize> = Vec::new();
    for c in 0..k {
        if counts[c] > 0 {
            let inv = 1.0 / counts[c] as f64;
            for j in 0..m {
                centroids[(c, j)] = sums[c * m + j] * inv;
            }
            continue;
        }

        warn!(cluster = c, iteration, ?policy, "empty cluster");
        if !empty_clusters.contains(&c) {
            empty_clusters.push(c);
        }
        match policy {
            EmptyClusterPolicy::Freeze => {}
            EmptyClusterPolicy::Error => {
                return Err(KMeansError::EmptyCluster {
                    cluster: c,
                    iteration,
                });
            }
            EmptyClusterPolicy::Reseed => {
                if let Some(target) = farthest_point(assignment, dist, k, &reseeded) {
                    for (j, &x) in data.row_slice(target).iter().enumerate() {
                        centroids[(c, j)] = x;
                    }
                    reseeded.push(target);
                    debug!(cluster = c, point = target, "reseeded empty cluster");
                }
            }
        }
    }
    Ok(())
}

/// Index of the point farthest from its assigned centroid, skipping `used`.
fn farthest_point(assignment: &[usize], dist: &[f64], k: usize, used: &[usize]) -> Option<usize> {
    assignment
        .iter()
        .enumerate()
        .filter(|(i, _)| !used.contains(i))
        .map(|(i, &c)| (i, dist[i * k + c]))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, bd)) if bd >= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}
