//! Initial centroid selection.

use gmix_matrix::Matrix;
use rand::Rng;

use crate::config::Seeding;
use crate::distance::sq_euclidean;
use crate::error::KMeansError;

/// Picks `k` initial centroids according to `seeding`.
///
/// Assumes the dataset and config have already been validated (`k <= n`,
/// fixed seeds of the right count).
pub(crate) fn seed_centroids(
    data: &Matrix,
    k: usize,
    seeding: &Seeding,
    rng: &mut impl Rng,
) -> Result<Matrix, KMeansError> {
    match seeding {
        Seeding::Fixed(seeds) => {
            if let Some((index, seed)) = seeds
                .iter()
                .enumerate()
                .find(|(_, s)| s.len() != data.cols())
            {
                return Err(KMeansError::InvalidSeed {
                    index,
                    reason: format!("dimension {}, expected {}", seed.len(), data.cols()),
                });
            }
            Ok(Matrix::from_rows(seeds)?)
        }
        Seeding::RandomSample => {
            let picked = rand::seq::index::sample(rng, data.rows(), k).into_vec();
            gather_rows(data, &picked)
        }
        Seeding::PlusPlus => {
            let picked = plus_plus_indices(data, k, rng);
            gather_rows(data, &picked)
        }
    }
}

fn gather_rows(data: &Matrix, indices: &[usize]) -> Result<Matrix, KMeansError> {
    let rows: Vec<Vec<f64>> = indices
        .iter()
        .map(|&i| data.row_slice(i).to_vec())
        .collect();
    Ok(Matrix::from_rows(&rows)?)
}

/// k-means++ index selection (Arthur & Vassilvitskii 2007).
///
/// Once every remaining point coincides with a chosen centroid (all D² are
/// zero), the lowest unchosen index is taken so that `k` distinct rows are
/// still returned.
fn plus_plus_indices(data: &Matrix, k: usize, rng: &mut impl Rng) -> Vec<usize> {
    let n = data.rows();
    let mut chosen = Vec::with_capacity(k);
    let mut is_chosen = vec![false; n];
    let mut d2 = vec![f64::INFINITY; n];

    let first = rng.random_range(0..n);
    chosen.push(first);
    is_chosen[first] = true;

    while chosen.len() < k {
        let last = data.row_slice(*chosen.last().unwrap_or(&first));
        for (i, d) in d2.iter_mut().enumerate() {
            if !is_chosen[i] {
                *d = d.min(sq_euclidean(data.row_slice(i), last));
            } else {
                *d = 0.0;
            }
        }
        let total: f64 = d2.iter().sum();

        let next = if total > 0.0 && total.is_finite() {
            let u: f64 = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = None;
            for (i, &d) in d2.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                acc += d;
                pick = Some(i);
                if acc >= u {
                    break;
                }
            }
            pick
        } else {
            None
        };
        let next = next.unwrap_or_else(|| is_chosen.iter().position(|&c| !c).unwrap_or(0));
        chosen.push(next);
        is_chosen[next] = true;
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn line(n: usize) -> Matrix {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_fixed_seeds_used_verbatim() {
        let data = line(5);
        let seeding = Seeding::Fixed(vec![vec![0.5], vec![3.5]]);
        let mut rng = StdRng::seed_from_u64(0);
        let c = seed_centroids(&data, 2, &seeding, &mut rng).unwrap();
        assert_eq!(c.as_slice(), &[0.5, 3.5]);
    }

    #[test]
    fn test_fixed_seeds_dimension_checked_against_data() {
        let data = line(5);
        let seeding = Seeding::Fixed(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        let mut rng = StdRng::seed_from_u64(0);
        let err = seed_centroids(&data, 2, &seeding, &mut rng).unwrap_err();
        assert!(matches!(err, KMeansError::InvalidSeed { index: 0, .. }));
    }

    #[test]
    fn test_random_sample_distinct_points() {
        let data = line(20);
        let mut rng = StdRng::seed_from_u64(7);
        let c = seed_centroids(&data, 5, &Seeding::RandomSample, &mut rng).unwrap();
        let mut values: Vec<f64> = c.as_slice().to_vec();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn test_plus_plus_distinct_points() {
        let data = line(30);
        let mut rng = StdRng::seed_from_u64(3);
        let idx = plus_plus_indices(&data, 6, &mut rng);
        let mut sorted = idx.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_plus_plus_spreads_over_separated_groups() {
        // Two tight groups far apart: the second pick must land in the other group.
        let mut rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64 * 0.01]).collect();
        rows.extend((0..10).map(|i| vec![1000.0 + i as f64 * 0.01]));
        let data = Matrix::from_rows(&rows).unwrap();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let idx = plus_plus_indices(&data, 2, &mut rng);
            assert_ne!(idx[0] < 10, idx[1] < 10, "seed {seed}: {idx:?}");
        }
    }

    #[test]
    fn test_plus_plus_duplicate_points() {
        let data = Matrix::from_rows(&[vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut idx = plus_plus_indices(&data, 3, &mut rng);
        idx.sort_unstable();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn test_seeding_is_reproducible() {
        let data = line(50);
        let a = seed_centroids(&data, 4, &Seeding::PlusPlus, &mut StdRng::seed_from_u64(11));
        let b = seed_centroids(&data, 4, &Seeding::PlusPlus, &mut StdRng::seed_from_u64(11));
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
