//! Output type for EM fits.

use gmix_matrix::Matrix;

use crate::mstep::Repair;
use crate::theta::Theta;

/// Why an EM run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The log-likelihood change fell below the convergence epsilon.
    Converged,
    /// `max_em_iterations` was reached first.
    IterationCap,
}

impl Termination {
    /// Short lowercase label, used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::IterationCap => "iteration_cap",
        }
    }
}

/// Result of a completed EM run.
#[derive(Debug, Clone)]
pub struct EmFit {
    theta: Theta,
    /// N×K, computed under `theta`.
    responsibilities: Matrix,
    /// Log-likelihood evaluated at the start of each iteration.
    trace: Vec<f64>,
    /// Log-likelihood of `theta`.
    log_likelihood: f64,
    termination: Termination,
    iterations: usize,
    repairs: Vec<Repair>,
}

impl EmFit {
    pub(crate) fn new(
        theta: Theta,
        responsibilities: Matrix,
        trace: Vec<f64>,
        log_likelihood: f64,
        termination: Termination,
        iterations: usize,
        repairs: Vec<Repair>,
    ) -> Self {
        Self {
            theta,
            responsibilities,
            trace,
            log_likelihood,
            termination,
            iterations,
            repairs,
        }
    }

    /// Returns the fitted parameters.
    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    /// Returns the N×K responsibilities under the fitted parameters.
    pub fn responsibilities(&self) -> &Matrix {
        &self.responsibilities
    }

    /// Returns the log-likelihood at every iteration.
    pub fn trace(&self) -> &[f64] {
        &self.trace
    }

    /// Returns the final log-likelihood.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Returns why the run stopped.
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Returns the number of E-steps performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Every degenerate component handled during the run, in order.
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    /// Returns `true` if the run stopped on the convergence test.
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Most responsible component for each point (ties to the lowest index).
    pub fn labels(&self) -> Vec<usize> {
        self.responsibilities
            .iter_rows()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (j, &p)| {
                        if p > best.1 { (j, p) } else { best }
                    })
                    .0
            })
            .collect()
    }
}
