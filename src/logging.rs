use tracing_subscriber::EnvFilter;

/// Library crates whose spans and events reach the log.
const CRATE_TARGETS: &[&str] = &[
    "gmix",
    "gmix_gmm",
    "gmix_io",
    "gmix_kmeans",
    "gmix_matrix",
];

/// Level for a `-v` count: warnings by default, `trace` from `-vvv` on.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directive applying the verbosity level to every gmix crate.
fn default_filter(verbosity: u8) -> String {
    let level = level_for(verbosity);
    CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `-v`.
///
/// Logs go to stderr; stdout carries the JSON report.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(3), "trace");
        assert_eq!(level_for(u8::MAX), "trace");
    }

    #[test]
    fn test_default_filter_covers_every_crate() {
        let filter = default_filter(1);
        assert_eq!(filter.split(',').count(), CRATE_TARGETS.len());
        assert!(filter.split(',').all(|d| d.ends_with("=info")));
        assert!(filter.contains("gmix_gmm=info"));
        EnvFilter::new(filter);
    }
}
