//! Tracing subscriber setup shared by the DocIntel binaries

use crate::config::ObservabilityConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `observability.log_level` when set. Calling this twice
/// is harmless: the second install is ignored.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logging {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Application crates at `level`, chatty dependencies held at warn
fn default_directives(level: &str) -> String {
    format!(
        "{level},docintel_common={level},docintel_ingestion={level},docintel_gateway={level},\
         aws_config=warn,aws_smithy_runtime=warn,hyper=warn,h2=warn,lopdf=warn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = ObservabilityConfig::default();
        init(&config);
        init(&config);
    }
}
