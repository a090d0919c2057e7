use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gmix: Gaussian mixture model fitting.
#[derive(Parser)]
#[command(
    name = "gmix",
    version,
    about = "Gaussian mixture model fitting via K-means bootstrapped EM"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Fit a Gaussian mixture model by EM.
    Fit(RunArgs),
    /// Cluster the data with K-means only.
    Kmeans(RunArgs),
}

/// Arguments shared by `fit` and `kmeans`.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the input CSV path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the JSON report path from config. Stdout when unset.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the number of clusters / components.
    #[arg(short)]
    pub k: Option<usize>,

    /// Override the global RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,
}
