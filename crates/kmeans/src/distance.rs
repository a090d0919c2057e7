//! Squared Euclidean distances between points and centroids.

use gmix_matrix::Matrix;

/// Squared Euclidean distance between two equal-length points.
#[inline]
pub(crate) fn sq_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Fills `out[i * k + j]` with the squared distance from point `i` to centroid `j`.
///
/// # Panics
///
/// Debug-asserts that `out.len() == data.rows() * centroids.rows()` and that
/// both matrices have the same column count.
pub(crate) fn all_distances(data: &Matrix, centroids: &Matrix, out: &mut [f64]) {
    let k = centroids.rows();
    debug_assert_eq!(out.len(), data.rows() * k);
    debug_assert_eq!(data.cols(), centroids.cols());

    for (point, row_out) in data.iter_rows().zip(out.chunks_exact_mut(k)) {
        for (o, centroid) in row_out.iter_mut().zip(centroids.iter_rows()) {
            *o = sq_euclidean(point, centroid);
        }
    }
}

/// Assigns each point to its nearest centroid from a precomputed distance
/// table. Ties go to the lowest cluster index.
pub(crate) fn assign_nearest(dist: &[f64], k: usize, assignment: &mut [usize]) {
    debug_assert_eq!(dist.len(), assignment.len() * k);
    for (a, row) in assignment.iter_mut().zip(dist.chunks_exact(k)) {
        let mut best = 0;
        let mut best_d = row[0];
        for (j, &d) in row.iter().enumerate().skip(1) {
            if d < best_d {
                best = j;
                best_d = d;
            }
        }
        *a = best;
    }
}

/// Total within-cluster squared distance for the given assignment.
pub(crate) fn total_distance(data: &Matrix, centroids: &Matrix, assignment: &[usize]) -> f64 {
    data.iter_rows()
        .zip(assignment)
        .map(|(point, &c)| sq_euclidean(point, centroids.row_slice(c)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn m(rows: &[Vec<f64>]) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_sq_euclidean() {
        assert_abs_diff_eq!(sq_euclidean(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_abs_diff_eq!(sq_euclidean(&[1.5], &[1.5]), 0.0);
    }

    #[test]
    fn test_all_distances_layout() {
        let data = m(&[vec![0.0], vec![10.0]]);
        let centroids = m(&[vec![1.0], vec![4.0], vec![10.0]]);
        let mut out = vec![0.0; 6];
        all_distances(&data, &centroids, &mut out);
        assert_eq!(out, vec![1.0, 16.0, 100.0, 81.0, 36.0, 0.0]);
    }

    #[test]
    fn test_assign_nearest() {
        let dist = [5.0, 1.0, 3.0, 0.5, 2.0, 9.0];
        let mut assignment = vec![0; 2];
        assign_nearest(&dist, 3, &mut assignment);
        assert_eq!(assignment, vec![1, 0]);
    }

    #[test]
    fn test_assign_nearest_tie_goes_to_lowest_index() {
        let dist = [2.0, 1.0, 1.0];
        let mut assignment = vec![9];
        assign_nearest(&dist, 3, &mut assignment);
        assert_eq!(assignment, vec![1]);
    }

    #[test]
    fn test_total_distance() {
        let data = m(&[vec![0.0, 0.0], vec![2.0, 0.0], vec![10.0, 10.0]]);
        let centroids = m(&[vec![1.0, 0.0], vec![10.0, 10.0]]);
        assert_abs_diff_eq!(total_distance(&data, &centroids, &[0, 0, 1]), 2.0);
    }
}
