//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Result, bail};

use crate::config::*;

use gmix_gmm::{CovarianceInit, EmConfig, Tolerance};
use gmix_io::ReaderConfig;
use gmix_kmeans::{EmptyClusterPolicy, KMeansConfig, Seeding};

/// Parses a seeding strategy name, pulling fixed centroids from the config.
pub fn parse_seeding(s: &str, centroids: Option<&[Vec<f64>]>) -> Result<Seeding> {
    match s.to_lowercase().as_str() {
        "kmeans++" | "plusplus" => Ok(Seeding::PlusPlus),
        "random" => Ok(Seeding::RandomSample),
        "fixed" => match centroids {
            Some(c) => Ok(Seeding::Fixed(c.to_vec())),
            None => bail!("seeding \"fixed\" requires [kmeans].centroids"),
        },
        other => bail!("unknown seeding: {other:?}"),
    }
}

/// Parses an empty-cluster policy name into the corresponding enum variant.
pub fn parse_policy(s: &str) -> Result<EmptyClusterPolicy> {
    match s.to_lowercase().as_str() {
        "reseed" => Ok(EmptyClusterPolicy::Reseed),
        "freeze" => Ok(EmptyClusterPolicy::Freeze),
        "error" => Ok(EmptyClusterPolicy::Error),
        other => bail!("unknown empty cluster policy: {other:?}"),
    }
}

/// Parses a convergence tolerance mode.
pub fn parse_tolerance(s: &str) -> Result<Tolerance> {
    match s.to_lowercase().as_str() {
        "absolute" => Ok(Tolerance::Absolute),
        "relative" => Ok(Tolerance::Relative),
        other => bail!("unknown tolerance: {other:?}"),
    }
}

/// Parses an initial covariance strategy.
pub fn parse_covariance_init(s: &str) -> Result<CovarianceInit> {
    match s.to_lowercase().as_str() {
        "global" => Ok(CovarianceInit::Global),
        "scaled_identity" | "scaled-identity" => Ok(CovarianceInit::ScaledIdentity),
        other => bail!("unknown covariance init: {other:?}"),
    }
}

/// Parses a delimiter string. Accepts a single ASCII character or `"\t"`/`"tab"`.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    let bytes = s.as_bytes();
    if bytes.len() != 1 {
        bail!("delimiter must be a single ASCII character, got {s:?}");
    }
    Ok(bytes[0])
}

/// Builds a [`ReaderConfig`] from the TOML I/O configuration.
pub fn build_reader_config(io: &IoToml) -> Result<ReaderConfig> {
    let cfg = ReaderConfig::default()
        .with_delimiter(parse_delimiter(&io.delimiter)?)
        .with_headers(io.has_headers)
        .with_columns(io.columns.clone());
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a [`KMeansConfig`] for a standalone K-means run with `k` clusters.
pub fn build_kmeans_config(kmeans: &KMeansToml, k: usize) -> Result<KMeansConfig> {
    let cfg = KMeansConfig::new(k)
        .with_max_iterations(kmeans.max_iterations)
        .with_seeding(parse_seeding(&kmeans.seeding, kmeans.centroids.as_deref())?)
        .with_empty_cluster_policy(parse_policy(&kmeans.empty_cluster_policy)?);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds an [`EmConfig`]. Seeding and the K-means cap come from `[kmeans]`.
pub fn build_em_config(em: &EmToml, kmeans: &KMeansToml) -> Result<EmConfig> {
    let cfg = EmConfig::default()
        .with_max_kmeans_iterations(kmeans.max_iterations)
        .with_seeding(parse_seeding(&kmeans.seeding, kmeans.centroids.as_deref())?)
        .with_convergence_epsilon(em.epsilon)
        .with_tolerance(parse_tolerance(&em.tolerance)?)
        .with_max_em_iterations(em.max_iterations)
        .with_empty_cluster_policy(parse_policy(&em.empty_cluster_policy)?)
        .with_covariance_init(parse_covariance_init(&em.covariance_init)?)
        .with_max_reseeds(em.max_reseeds)
        .with_strict(em.strict);
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_names() {
        assert!(matches!(parse_seeding("kmeans++", None).unwrap(), Seeding::PlusPlus));
        assert!(matches!(
            parse_seeding("Random", None).unwrap(),
            Seeding::RandomSample
        ));
        let c = vec![vec![1.0], vec![2.0]];
        match parse_seeding("fixed", Some(&c)).unwrap() {
            Seeding::Fixed(seeds) => assert_eq!(seeds, c),
            other => panic!("expected Fixed, got {other:?}"),
        }
        assert!(parse_seeding("fixed", None).is_err());
        assert!(parse_seeding("forgy", None).is_err());
    }

    #[test]
    fn policy_names() {
        assert_eq!(parse_policy("reseed").unwrap(), EmptyClusterPolicy::Reseed);
        assert_eq!(parse_policy("FREEZE").unwrap(), EmptyClusterPolicy::Freeze);
        assert_eq!(parse_policy("error").unwrap(), EmptyClusterPolicy::Error);
        assert!(parse_policy("drop").is_err());
    }

    #[test]
    fn tolerance_and_covariance_names() {
        assert_eq!(parse_tolerance("relative").unwrap(), Tolerance::Relative);
        assert!(parse_tolerance("loose").is_err());
        assert_eq!(
            parse_covariance_init("scaled_identity").unwrap(),
            CovarianceInit::ScaledIdentity
        );
        assert!(parse_covariance_init("diag").is_err());
    }

    #[test]
    fn delimiters() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
    }

    #[test]
    fn default_toml_builds_configs() {
        let cfg = GmixConfig::default();
        assert!(build_reader_config(&cfg.io).is_ok());
        let km = build_kmeans_config(&cfg.kmeans, 3).unwrap();
        assert_eq!(km.k(), 3);
        assert_eq!(km.empty_cluster_policy(), EmptyClusterPolicy::Freeze);
        let em = build_em_config(&cfg.em, &cfg.kmeans).unwrap();
        assert_eq!(em.empty_cluster_policy(), EmptyClusterPolicy::Reseed);
        assert_eq!(em.max_em_iterations(), 1000);
    }

    #[test]
    fn invalid_epsilon_rejected() {
        let cfg = GmixConfig::default();
        let em = EmToml {
            epsilon: -1.0,
            ..EmToml::default()
        };
        assert!(build_em_config(&em, &cfg.kmeans).is_err());
    }
}
