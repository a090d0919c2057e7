//! Output type for K-means runs.

use gmix_matrix::Matrix;

/// Why a K-means run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A reassignment pass changed no point.
    Converged,
    /// The total distance increased; the previous state was restored.
    NoImprovement,
    /// The iteration cap was reached.
    MaxIterations,
}

impl Termination {
    /// Short lowercase label, used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::NoImprovement => "no_improvement",
            Termination::MaxIterations => "max_iterations",
        }
    }
}

/// Result of a K-means run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Final centroids, K×M.
    centroids: Matrix,
    /// Cluster index of each point.
    assignment: Vec<usize>,
    /// Total within-cluster squared distance of the returned state.
    total_distance: f64,
    /// Accepted totals, one per completed iteration (non-increasing).
    distance_history: Vec<f64>,
    /// Number of centroid updates performed.
    iterations: usize,
    termination: Termination,
    /// Clusters that lost all members at some point, in order of occurrence.
    empty_clusters: Vec<usize>,
}

impl KMeansResult {
    pub(crate) fn new(
        centroids: Matrix,
        assignment: Vec<usize>,
        total_distance: f64,
        distance_history: Vec<f64>,
        iterations: usize,
        termination: Termination,
        empty_clusters: Vec<usize>,
    ) -> Self {
        Self {
            centroids,
            assignment,
            total_distance,
            distance_history,
            iterations,
            termination,
            empty_clusters,
        }
    }

    /// Returns the centroids (K×M).
    pub fn centroids(&self) -> &Matrix {
        &self.centroids
    }

    /// Consumes the result and returns the centroids.
    pub fn into_centroids(self) -> Matrix {
        self.centroids
    }

    /// Returns the cluster index of each point.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Returns the total within-cluster squared distance.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Returns the accepted total distance per iteration.
    pub fn distance_history(&self) -> &[f64] {
        &self.distance_history
    }

    /// Returns the number of iterations performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns why the run stopped.
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Returns the clusters that were found empty during the run.
    pub fn empty_clusters(&self) -> &[usize] {
        &self.empty_clusters
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centroids.rows()
    }

    /// Returns the number of points assigned to each cluster.
    pub fn member_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.k()];
        for &c in &self.assignment {
            counts[c] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let centroids = Matrix::from_rows(&[vec![0.0], vec![10.0]]).unwrap();
        let result = KMeansResult::new(
            centroids.clone(),
            vec![0, 0, 1],
            2.5,
            vec![4.0, 2.5],
            2,
            Termination::Converged,
            vec![],
        );
        assert_eq!(result.centroids(), &centroids);
        assert_eq!(result.assignment(), &[0, 0, 1]);
        assert_eq!(result.total_distance(), 2.5);
        assert_eq!(result.distance_history(), &[4.0, 2.5]);
        assert_eq!(result.iterations(), 2);
        assert_eq!(result.termination(), Termination::Converged);
        assert!(result.empty_clusters().is_empty());
        assert_eq!(result.k(), 2);
        assert_eq!(result.member_counts(), vec![2, 1]);
    }

    #[test]
    fn test_member_counts_with_empty_cluster() {
        let centroids = Matrix::from_rows(&[vec![0.0], vec![5.0], vec![10.0]]).unwrap();
        let result = KMeansResult::new(
            centroids,
            vec![0, 2, 2],
            0.0,
            vec![0.0],
            1,
            Termination::Converged,
            vec![1],
        );
        assert_eq!(result.member_counts(), vec![1, 0, 2]);
    }

    #[test]
    fn test_termination_labels() {
        assert_eq!(Termination::Converged.as_str(), "converged");
        assert_eq!(Termination::NoImprovement.as_str(), "no_improvement");
        assert_eq!(Termination::MaxIterations.as_str(), "max_iterations");
    }
}
