//! Fit command: K-means bootstrapped EM.

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use gmix_gmm::fit;

use crate::cli::RunArgs;
use crate::context::RunContext;
use crate::convert;
use crate::report::{FitReport, write_report};

/// Run the EM fitting pipeline.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("fit").entered();
    let mut ctx = RunContext::from_args(&args)?;

    let k = ctx.config.em.components;
    let em_cfg = convert::build_em_config(&ctx.config.em, &ctx.config.kmeans)?;

    info!(
        k,
        n_points = ctx.data.rows(),
        n_dims = ctx.data.cols(),
        "fitting mixture"
    );
    let result = fit(&ctx.data, k, &em_cfg, &mut ctx.rng).context("EM fit failed")?;

    if !result.converged() {
        warn!(
            iterations = result.iterations(),
            "EM stopped at the iteration cap without converging"
        );
    }
    info!(
        log_likelihood = result.log_likelihood(),
        iterations = result.iterations(),
        termination = result.termination().as_str(),
        "fit complete"
    );

    let report = FitReport::from_fit(&ctx.data, &result);
    write_report(&report, ctx.output.as_deref())
}
