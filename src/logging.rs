//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to stderr so that tables rendered on stdout stay clean.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "jira_export=info,warn";

/// Log filter used with `--verbose`.
const VERBOSE_LOG_FILTER: &str = "jira_export=debug,info";

/// Pick the filter directive for the requested verbosity.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over `verbose` when set, e.g.
/// `RUST_LOG=jira_export=trace`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "jira-export starting up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(default_filter(false), "jira_export=info,warn");
        assert_eq!(default_filter(true), "jira_export=debug,info");
    }

    #[test]
    fn test_filters_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
    }
}
