use std::path::PathBuf;

use serde::Deserialize;

/// Top-level gmix configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GmixConfig {
    /// Global RNG seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// I/O settings.
    #[serde(default)]
    pub io: IoToml,

    /// K-means settings (standalone runs and EM initialization).
    #[serde(default)]
    pub kmeans: KMeansToml,

    /// EM settings.
    #[serde(default)]
    pub em: EmToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub has_headers: bool,
    #[serde(default)]
    pub columns: Option<Vec<usize>>,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            delimiter: default_delimiter(),
            has_headers: false,
            columns: None,
        }
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KMeansToml {
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    #[serde(default = "default_kmeans_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_seeding")]
    pub seeding: String,
    /// Starting centroids, required when `seeding = "fixed"`.
    #[serde(default)]
    pub centroids: Option<Vec<Vec<f64>>>,
    #[serde(default = "default_kmeans_policy")]
    pub empty_cluster_policy: String,
}

impl Default for KMeansToml {
    fn default() -> Self {
        Self {
            clusters: default_clusters(),
            max_iterations: default_kmeans_iterations(),
            seeding: default_seeding(),
            centroids: None,
            empty_cluster_policy: default_kmeans_policy(),
        }
    }
}

fn default_clusters() -> usize {
    2
}
fn default_kmeans_iterations() -> usize {
    100
}
fn default_seeding() -> String {
    "kmeans++".to_string()
}
fn default_kmeans_policy() -> String {
    "freeze".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmToml {
    #[serde(default = "default_clusters")]
    pub components: usize,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: String,
    #[serde(default = "default_em_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_em_policy")]
    pub empty_cluster_policy: String,
    #[serde(default = "default_covariance_init")]
    pub covariance_init: String,
    #[serde(default = "default_max_reseeds")]
    pub max_reseeds: usize,
    #[serde(default)]
    pub strict: bool,
}

impl Default for EmToml {
    fn default() -> Self {
        Self {
            components: default_clusters(),
            epsilon: default_epsilon(),
            tolerance: default_tolerance(),
            max_iterations: default_em_iterations(),
            empty_cluster_policy: default_em_policy(),
            covariance_init: default_covariance_init(),
            max_reseeds: default_max_reseeds(),
            strict: false,
        }
    }
}

fn default_epsilon() -> f64 {
    1e-6
}
fn default_tolerance() -> String {
    "absolute".to_string()
}
fn default_em_iterations() -> usize {
    1000
}
fn default_em_policy() -> String {
    "reseed".to_string()
}
fn default_covariance_init() -> String {
    "global".to_string()
}
fn default_max_reseeds() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: GmixConfig = toml::from_str("").unwrap();
        assert!(cfg.seed.is_none());
        assert_eq!(cfg.io.delimiter, ",");
        assert_eq!(cfg.kmeans.seeding, "kmeans++");
        assert_eq!(cfg.em.components, 2);
        assert_eq!(cfg.em.max_iterations, 1000);
        assert!(!cfg.em.strict);
    }

    #[test]
    fn full_document_parses() {
        let text = r#"
seed = 7

[io]
input = "points.csv"
delimiter = ";"
has_headers = true
columns = [0, 2]

[kmeans]
seeding = "fixed"
centroids = [[0.0, 0.0], [5.0, 5.0]]

[em]
components = 3
tolerance = "relative"
empty_cluster_policy = "freeze"
strict = true
"#;
        let cfg: GmixConfig = toml::from_str(text).unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.io.columns, Some(vec![0, 2]));
        assert!(cfg.io.has_headers);
        assert_eq!(cfg.kmeans.centroids.as_ref().map(Vec::len), Some(2));
        assert_eq!(cfg.em.components, 3);
        assert!(cfg.em.strict);
    }

    #[test]
    fn unknown_field_rejected() {
        let result: Result<GmixConfig, _> = toml::from_str("[em]\nepsilonn = 1.0\n");
        assert!(result.is_err());
    }
}
