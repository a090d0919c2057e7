//! Integration tests for K-means on synthetic groups.

use approx::assert_abs_diff_eq;
use gmix_kmeans::{EmptyClusterPolicy, KMeansConfig, KMeansError, Seeding, Termination, kmeans};
use gmix_matrix::Matrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

fn column(values: &[f64]) -> Matrix {
    let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
    Matrix::from_rows(&rows).unwrap()
}

/// 20 one-dimensional points, half near 0 and half near 10.
fn two_groups() -> Matrix {
    let mut values: Vec<f64> = (0..10).map(|i| -0.45 + 0.1 * i as f64).collect();
    values.extend((0..10).map(|i| 9.55 + 0.1 * i as f64));
    column(&values)
}

#[test]
fn two_groups_recover_centres() {
    let data = two_groups();
    for seed in [1, 7, 42, 1234] {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = kmeans(&data, &KMeansConfig::new(2), &mut rng).unwrap();

        assert_eq!(result.termination(), Termination::Converged);
        let mut centres = [result.centroids()[(0, 0)], result.centroids()[(1, 0)]];
        centres.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_abs_diff_eq!(centres[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(centres[1], 10.0, epsilon = 1e-9);

        // Every point in the first half shares a label, disjoint from the second half.
        let a = result.assignment();
        assert!(a[..10].iter().all(|&c| c == a[0]));
        assert!(a[10..].iter().all(|&c| c == a[10]));
        assert_ne!(a[0], a[10]);
    }
}

#[test]
fn converged_assignment_is_stable() {
    let data = two_groups();
    let mut rng = StdRng::seed_from_u64(3);
    let first = kmeans(&data, &KMeansConfig::new(2), &mut rng).unwrap();

    // Restarting from the converged centroids changes nothing.
    let seeds: Vec<Vec<f64>> = first.centroids().iter_rows().map(|r| r.to_vec()).collect();
    let config = KMeansConfig::new(2).with_seeding(Seeding::Fixed(seeds));
    let second = kmeans(&data, &config, &mut rng).unwrap();

    assert_eq!(second.assignment(), first.assignment());
    assert_eq!(second.iterations(), 1);
    assert_abs_diff_eq!(second.total_distance(), first.total_distance(), epsilon = 1e-12);
}

#[test]
fn distance_history_is_non_increasing() {
    let mut rng = StdRng::seed_from_u64(99);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut rows = Vec::new();
    for centre in [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [4.0, 4.0]] {
        for _ in 0..50 {
            rows.push(vec![
                centre[0] + normal.sample(&mut rng),
                centre[1] + normal.sample(&mut rng),
            ]);
        }
    }
    let data = Matrix::from_rows(&rows).unwrap();

    for seeding in [Seeding::RandomSample, Seeding::PlusPlus] {
        let config = KMeansConfig::new(4).with_seeding(seeding);
        let result = kmeans(&data, &config, &mut rng).unwrap();

        let history = result.distance_history();
        assert!(!history.is_empty());
        for w in history.windows(2) {
            assert!(w[1] <= w[0], "history increased: {} -> {}", w[0], w[1]);
        }
        assert!(result.iterations() <= 100);
        assert!(result.total_distance() <= history[history.len() - 1] + 1e-9);
        assert_eq!(result.member_counts().iter().sum::<usize>(), 200);
    }
}

#[test]
fn centroids_are_member_means() {
    let data = two_groups();
    let mut rng = StdRng::seed_from_u64(11);
    let result = kmeans(&data, &KMeansConfig::new(2), &mut rng).unwrap();

    for c in 0..2 {
        let members: Vec<f64> = result
            .assignment()
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a == c)
            .map(|(i, _)| data[(i, 0)])
            .collect();
        let mean = members.iter().sum::<f64>() / members.len() as f64;
        assert_abs_diff_eq!(result.centroids()[(c, 0)], mean, epsilon = 1e-12);
    }
}

#[test]
fn same_seed_same_result() {
    let data = two_groups();
    let a = kmeans(&data, &KMeansConfig::new(3), &mut StdRng::seed_from_u64(5)).unwrap();
    let b = kmeans(&data, &KMeansConfig::new(3), &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(a.centroids(), b.centroids());
    assert_eq!(a.assignment(), b.assignment());
}

#[test]
fn empty_cluster_policies() {
    // The third seed is far away from every point and never attracts a member.
    let data = column(&[0.0, 0.5, 1.0, 9.0, 9.5, 10.0]);
    let seeds = Seeding::Fixed(vec![vec![0.0], vec![10.0], vec![1000.0]]);
    let mut rng = StdRng::seed_from_u64(0);

    let frozen = kmeans(
        &data,
        &KMeansConfig::new(3).with_seeding(seeds.clone()),
        &mut rng,
    )
    .unwrap();
    assert_eq!(frozen.empty_clusters(), &[2]);
    assert_abs_diff_eq!(frozen.centroids()[(2, 0)], 1000.0);

    let err = kmeans(
        &data,
        &KMeansConfig::new(3)
            .with_seeding(seeds.clone())
            .with_empty_cluster_policy(EmptyClusterPolicy::Error),
        &mut rng,
    )
    .unwrap_err();
    assert!(matches!(err, KMeansError::EmptyCluster { cluster: 2, .. }));

    let reseeded = kmeans(
        &data,
        &KMeansConfig::new(3)
            .with_seeding(seeds)
            .with_empty_cluster_policy(EmptyClusterPolicy::Reseed),
        &mut rng,
    )
    .unwrap();
    assert!(reseeded.empty_clusters().contains(&2));
    assert!(reseeded.centroids()[(2, 0)] <= 10.0);
    assert!(reseeded.member_counts()[2] > 0);
}

#[test]
fn fixed_seed_dimension_mismatch() {
    let data = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
    let config = KMeansConfig::new(1).with_seeding(Seeding::Fixed(vec![vec![0.0]]));
    let mut rng = StdRng::seed_from_u64(0);
    let err = kmeans(&data, &config, &mut rng).unwrap_err();
    assert!(matches!(err, KMeansError::InvalidSeed { index: 0, .. }));
}
