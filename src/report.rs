//! JSON reports for fitted models and clusterings.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use gmix_gmm::{EmFit, RepairAction};
use gmix_kmeans::KMeansResult;
use gmix_matrix::Matrix;

#[derive(Debug, Serialize)]
pub struct RepairReport {
    pub component: usize,
    pub cause: String,
    pub action: &'static str,
}

/// Summary of an EM fit.
#[derive(Debug, Serialize)]
pub struct FitReport {
    pub n_points: usize,
    pub n_dims: usize,
    pub n_components: usize,
    pub weights: Vec<f64>,
    pub means: Vec<Vec<f64>>,
    pub covariances: Vec<Vec<Vec<f64>>>,
    pub log_likelihood: f64,
    pub trace: Vec<f64>,
    pub termination: &'static str,
    pub iterations: usize,
    pub repairs: Vec<RepairReport>,
    pub labels: Vec<usize>,
}

/// Summary of a standalone K-means run.
#[derive(Debug, Serialize)]
pub struct KMeansReport {
    pub n_points: usize,
    pub n_dims: usize,
    pub k: usize,
    pub centroids: Vec<Vec<f64>>,
    pub member_counts: Vec<usize>,
    pub total_distance: f64,
    pub distance_history: Vec<f64>,
    pub termination: &'static str,
    pub iterations: usize,
    pub empty_clusters: Vec<usize>,
    pub assignment: Vec<usize>,
}

fn rows_of(m: &Matrix) -> Vec<Vec<f64>> {
    m.iter_rows().map(<[f64]>::to_vec).collect()
}

impl FitReport {
    pub fn from_fit(data: &Matrix, fit: &EmFit) -> Self {
        let theta = fit.theta();
        Self {
            n_points: data.rows(),
            n_dims: data.cols(),
            n_components: theta.n_components(),
            weights: theta.weights().to_vec(),
            means: rows_of(theta.means()),
            covariances: theta.covariances().iter().map(rows_of).collect(),
            log_likelihood: fit.log_likelihood(),
            trace: fit.trace().to_vec(),
            termination: fit.termination().as_str(),
            iterations: fit.iterations(),
            repairs: fit
                .repairs()
                .iter()
                .map(|r| RepairReport {
                    component: r.component,
                    cause: r.cause.to_string(),
                    action: match r.action {
                        RepairAction::Reseeded => "reseeded",
                        RepairAction::Frozen => "frozen",
                    },
                })
                .collect(),
            labels: fit.labels(),
        }
    }
}

impl KMeansReport {
    pub fn from_result(data: &Matrix, result: &KMeansResult) -> Self {
        Self {
            n_points: data.rows(),
            n_dims: data.cols(),
            k: result.k(),
            centroids: rows_of(result.centroids()),
            member_counts: result.member_counts(),
            total_distance: result.total_distance(),
            distance_history: result.distance_history().to_vec(),
            termination: result.termination().as_str(),
            iterations: result.iterations(),
            empty_clusters: result.empty_clusters().to_vec(),
            assignment: result.assignment().to_vec(),
        }
    }
}

/// Serialize `report` as pretty JSON to `output`, or stdout when `None`.
pub fn write_report<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
