//! Maximization step: re-estimate mixture parameters from responsibilities.

use std::fmt;

use gmix_kmeans::EmptyClusterPolicy;
use gmix_matrix::{Axis, Matrix, MatrixError};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::GmmError;
use crate::estep::EStep;
use crate::theta::Theta;

/// Components whose responsibility mass falls below this are starved.
pub const MIN_EFFECTIVE_MASS: f64 = 1e-10;

/// Why a component could not be re-estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateCause {
    /// Total responsibility below [`MIN_EFFECTIVE_MASS`].
    Starved,
    /// The estimated covariance is singular or not positive definite.
    Singular,
}

impl fmt::Display for DegenerateCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateCause::Starved => write!(f, "no responsibility mass"),
            DegenerateCause::Singular => write!(f, "singular covariance"),
        }
    }
}

/// What was done to a degenerate component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    /// Mean moved to a poorly explained point, covariance reset to the fallback.
    Reseeded,
    /// Previous mean and covariance kept.
    Frozen,
}

/// A degenerate component and how it was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repair {
    /// Index of the degenerate component.
    pub component: usize,
    /// Why it could not be re-estimated.
    pub cause: DegenerateCause,
    /// What was done about it.
    pub action: RepairAction,
}

/// Policy plus the state used when a component is reseeded.
///
/// Under `Reseed`, points that were the only support of a collapsed
/// component are marked isolated. They are never chosen as reseed targets,
/// and a component that collapses onto isolated points alone is frozen
/// instead of being reseeded again.
#[derive(Debug, Clone)]
pub struct DegenerateHandling {
    policy: EmptyClusterPolicy,
    fallback_covariance: Matrix,
    /// Sorted, deduplicated point indices.
    isolated_points: Vec<usize>,
}

impl DegenerateHandling {
    /// Creates the handling for `policy` with `fallback_covariance` for reseeds.
    ///
    /// # Errors
    ///
    /// [`GmmError::SingularFallback`] if the policy is `Reseed` and the
    /// fallback covariance is not invertible with a positive determinant.
    pub fn new(policy: EmptyClusterPolicy, fallback_covariance: Matrix) -> Result<Self, GmmError> {
        if policy == EmptyClusterPolicy::Reseed && !is_usable_covariance(&fallback_covariance) {
            return Err(GmmError::SingularFallback);
        }
        Ok(Self {
            policy,
            fallback_covariance,
            isolated_points: Vec::new(),
        })
    }

    /// Starts from a known set of isolated points.
    pub fn with_isolated_points(mut self, points: &[usize]) -> Self {
        self.mark_isolated(points);
        self
    }

    /// Returns the degenerate component policy.
    pub fn policy(&self) -> EmptyClusterPolicy {
        self.policy
    }

    /// Returns the covariance given to reseeded components.
    pub fn fallback_covariance(&self) -> &Matrix {
        &self.fallback_covariance
    }

    /// Returns the points excluded from reseeding, in ascending order.
    pub fn isolated_points(&self) -> &[usize] {
        &self.isolated_points
    }

    /// Adds `points` to the isolated set.
    pub(crate) fn mark_isolated(&mut self, points: &[usize]) {
        self.isolated_points.extend_from_slice(points);
        self.isolated_points.sort_unstable();
        self.isolated_points.dedup();
    }

    fn is_isolated(&self, point: usize) -> bool {
        self.isolated_points.binary_search(&point).is_ok()
    }
}

/// Output of one M-step.
#[derive(Debug, Clone)]
pub struct MStep {
    theta: Theta,
    repairs: Vec<Repair>,
    isolated: Vec<usize>,
}

impl MStep {
    /// Returns the re-estimated parameters.
    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    /// Returns the degenerate components handled in this step.
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    /// Returns the points newly found to be the only support of a
    /// collapsed component in this step.
    pub fn isolated_points(&self) -> &[usize] {
        &self.isolated
    }

    /// Splits into the new parameters and the repairs.
    pub fn into_parts(self) -> (Theta, Vec<Repair>) {
        (self.theta, self.repairs)
    }
}

fn is_usable_covariance(cov: &Matrix) -> bool {
    cov.inv().is_ok() && cov.log_det().is_ok()
}

/// Per-component estimate before degenerate handling.
enum Estimate {
    Fitted { mass: f64, mean: Vec<f64>, cov: Matrix },
    Degenerate { mass: f64, cause: DegenerateCause },
}

fn estimate_component(data: &Matrix, resp: &Matrix, c: usize) -> Result<Estimate, MatrixError> {
    let p = resp.column(c)?;
    let mass: f64 = p.iter().sum();
    if mass.is_nan() || mass < MIN_EFFECTIVE_MASS {
        return Ok(Estimate::Degenerate {
            mass,
            cause: DegenerateCause::Starved,
        });
    }
    let mean = data.average(Axis::Columns, Some(&p))?;
    let cov = data.weighted_covar(&p)?;
    if !is_usable_covariance(&cov) {
        return Ok(Estimate::Degenerate {
            mass,
            cause: DegenerateCause::Singular,
        });
    }
    Ok(Estimate::Fitted { mass, mean, cov })
}

/// Re-estimates weights, means and covariances from the E-step output.
///
/// Each component is estimated independently:
/// `N_k = Σ_n p_nk`, `π_k = N_k / N`, `μ_k = Σ_n p_nk x_n / N_k`,
/// `Σ_k = Σ_n p_nk (x_n − μ_k)(x_n − μ_k)ᵀ / N_k`.
///
/// A starved or singular component is resolved by `handling`:
///
/// | Policy | Mean | Covariance | Weight |
/// |--------|------|------------|--------|
/// | `Reseed` | worst-explained unused, non-isolated point | fallback | `max(N_k, 1) / N` |
/// | `Freeze` | previous | previous | `N_k / N` |
/// | `Error` | returns [`GmmError::DegenerateComponent`] | | |
///
/// Under `Reseed`, the points a singular component owned (by largest
/// responsibility) become isolated and are reported through
/// [`MStep::isolated_points`]. A singular component that owns only points
/// already in [`DegenerateHandling::isolated_points`] is frozen instead.
///
/// Weights are renormalized to sum to 1 afterwards.
///
/// # Errors
///
/// - [`GmmError::DimensionMismatch`] if the E-step output or `previous`
///   does not match `data`.
/// - [`GmmError::DegenerateComponent`] under [`EmptyClusterPolicy::Error`].
#[tracing::instrument(skip_all, fields(n = data.rows(), k = previous.n_components()))]
pub fn m_step(
    data: &Matrix,
    estep: &EStep,
    previous: &Theta,
    handling: &DegenerateHandling,
) -> Result<MStep, GmmError> {
    let n = data.rows();
    let k = previous.n_components();
    let resp = estep.responsibilities();
    if resp.shape() != (n, k) {
        return Err(GmmError::DimensionMismatch {
            what: "responsibility rows",
            expected: n,
            got: resp.rows(),
        });
    }
    if data.cols() != previous.n_dims() {
        return Err(GmmError::DimensionMismatch {
            what: "data dimension",
            expected: previous.n_dims(),
            got: data.cols(),
        });
    }

    let estimates = (0..k)
        .into_par_iter()
        .map(|c| estimate_component(data, resp, c))
        .collect::<Result<Vec<_>, _>>()?;

    let n_f = n as f64;
    let mut weights = Vec::with_capacity(k);
    let mut means = Vec::with_capacity(k);
    let mut covariances = Vec::with_capacity(k);
    let mut repairs = Vec::new();
    let mut reseed_order: Option<Vec<usize>> = None;
    let mut owners: Option<Vec<usize>> = None;
    let mut used_points: Vec<usize> = Vec::new();
    let mut isolated: Vec<usize> = Vec::new();

    for (c, estimate) in estimates.into_iter().enumerate() {
        match estimate {
            Estimate::Fitted { mass, mean, cov } => {
                weights.push(mass / n_f);
                means.push(mean);
                covariances.push(cov);
            }
            Estimate::Degenerate { mass, cause } => {
                warn!(component = c, %cause, mass, policy = ?handling.policy, "degenerate component");
                match handling.policy {
                    EmptyClusterPolicy::Error => {
                        return Err(GmmError::DegenerateComponent {
                            component: c,
                            cause,
                        });
                    }
                    EmptyClusterPolicy::Freeze => {
                        weights.push(mass.max(0.0) / n_f);
                        means.push(previous.mean(c).to_vec());
                        covariances.push(previous.covariance(c).clone());
                        repairs.push(Repair {
                            component: c,
                            cause,
                            action: RepairAction::Frozen,
                        });
                    }
                    EmptyClusterPolicy::Reseed => {
                        let support: Vec<usize> = match cause {
                            DegenerateCause::Singular => owners
                                .get_or_insert_with(|| owner_of_each_point(resp))
                                .iter()
                                .enumerate()
                                .filter(|&(_, &o)| o == c)
                                .map(|(i, _)| i)
                                .collect(),
                            DegenerateCause::Starved => Vec::new(),
                        };
                        if !support.is_empty() && support.iter().all(|&i| handling.is_isolated(i)) {
                            debug!(component = c, ?support, "collapsed onto isolated points again, freezing");
                            weights.push(mass.max(0.0) / n_f);
                            means.push(previous.mean(c).to_vec());
                            covariances.push(previous.covariance(c).clone());
                            repairs.push(Repair {
                                component: c,
                                cause,
                                action: RepairAction::Frozen,
                            });
                            continue;
                        }
                        isolated.extend_from_slice(&support);

                        let order = reseed_order
                            .get_or_insert_with(|| worst_explained_order(estep.point_log_likelihoods()));
                        let excluded =
                            |i: &usize| used_points.contains(i) || handling.is_isolated(*i) || isolated.contains(i);
                        let Some(point) = order
                            .iter()
                            .copied()
                            .find(|i| !excluded(i))
                            .or_else(|| order.iter().copied().find(|i| !used_points.contains(i)))
                            .or_else(|| order.first().copied())
                        else {
                            return Err(GmmError::EmptyData);
                        };
                        used_points.push(point);
                        debug!(component = c, point, "reseeding component");

                        weights.push(mass.max(1.0) / n_f);
                        means.push(data.row_slice(point).to_vec());
                        covariances.push(handling.fallback_covariance.clone());
                        repairs.push(Repair {
                            component: c,
                            cause,
                            action: RepairAction::Reseeded,
                        });
                    }
                }
            }
        }
    }

    normalize(&mut weights);
    let means = Matrix::from_rows(&means)?;
    isolated.sort_unstable();
    isolated.dedup();
    Ok(MStep {
        theta: Theta::from_parts(weights, means, covariances),
        repairs,
        isolated,
    })
}

/// Index of the component with the largest responsibility for each point,
/// ties to the lowest index.
fn owner_of_each_point(resp: &Matrix) -> Vec<usize> {
    resp.iter_rows()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (c, &p)| if p > best.1 { (c, p) } else { best })
                .0
        })
        .collect()
}

/// Point indices sorted by ascending log-likelihood (worst explained first).
fn worst_explained_order(point_ll: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..point_ll.len()).collect();
    order.sort_by(|&a, &b| point_ll[a].total_cmp(&point_ll[b]));
    order
}

/// Scales weights to sum to 1; all-zero weights become uniform.
fn normalize(weights: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        weights.iter_mut().for_each(|w| *w /= sum);
    } else {
        let u = 1.0 / weights.len() as f64;
        weights.iter_mut().for_each(|w| *w = u);
    }
}
