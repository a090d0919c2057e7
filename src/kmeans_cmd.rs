//! K-means command: clustering without the EM stage.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use gmix_kmeans::kmeans;

use crate::cli::RunArgs;
use crate::context::RunContext;
use crate::convert;
use crate::report::{KMeansReport, write_report};

/// Run a standalone K-means clustering.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("kmeans").entered();
    let mut ctx = RunContext::from_args(&args)?;

    let km_cfg = convert::build_kmeans_config(&ctx.config.kmeans, ctx.config.kmeans.clusters)?;
    let result = kmeans(&ctx.data, &km_cfg, &mut ctx.rng).context("k-means failed")?;
    info!(
        total_distance = result.total_distance(),
        iterations = result.iterations(),
        termination = result.termination().as_str(),
        "clustering complete"
    );

    let report = KMeansReport::from_result(&ctx.data, &result);
    write_report(&report, ctx.output.as_deref())
}
