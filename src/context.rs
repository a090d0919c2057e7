//! Shared setup for the `fit` and `kmeans` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use gmix_io::read_table;
use gmix_matrix::Matrix;

use crate::cli::RunArgs;
use crate::config::GmixConfig;
use crate::convert;

/// Everything a command needs after config loading and overrides.
pub struct RunContext {
    pub config: GmixConfig,
    pub data: Matrix,
    pub rng: StdRng,
    pub output: Option<PathBuf>,
}

/// Load the TOML config, or the built-in defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GmixConfig> {
    let Some(path) = path else {
        return Ok(GmixConfig::default());
    };
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}

/// Apply CLI overrides on top of the file config.
pub fn apply_overrides(config: &mut GmixConfig, args: &RunArgs) {
    if let Some(ref input) = args.input {
        config.io.input = Some(input.clone());
    }
    if let Some(ref output) = args.output {
        config.io.output = Some(output.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(k) = args.k {
        config.kmeans.clusters = k;
        config.em.components = k;
    }
}

impl RunContext {
    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let mut config = load_config(args.config.as_deref())?;
        apply_overrides(&mut config, args);

        let input = config.io.input.clone().ok_or_else(|| {
            anyhow::anyhow!("no input path: set [io].input in config or use --input")
        })?;
        let reader_cfg = convert::build_reader_config(&config.io)?;

        info!(path = %input.display(), "reading data");
        let data = read_table(&input, &reader_cfg)
            .with_context(|| format!("failed to read table: {}", input.display()))?;

        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let output = config.io.output.clone();

        Ok(Self {
            config,
            data,
            rng,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            input: Some(PathBuf::from("cli.csv")),
            output: None,
            k: Some(4),
            seed: Some(11),
        }
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config: GmixConfig =
            toml::from_str("seed = 1\n[io]\ninput = \"file.csv\"\n").unwrap();
        apply_overrides(&mut config, &args());
        assert_eq!(config.io.input, Some(PathBuf::from("cli.csv")));
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.kmeans.clusters, 4);
        assert_eq!(config.em.components, 4);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config(Some(Path::new("/tmp/gmix_missing_config.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }

    #[test]
    fn context_reads_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        std::fs::write(&path, "1,2\n3,4\n5,6\n").unwrap();
        let mut a = args();
        a.input = Some(path);

        let ctx = RunContext::from_args(&a).unwrap();
        assert_eq!(ctx.data.shape(), (3, 2));
        assert!(ctx.output.is_none());
    }
}
