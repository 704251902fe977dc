//! Logging bootstrap and metric descriptions.

use std::io;
use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr; stdout carries command output only.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "registry_cache_hit_total",
            Unit::Count,
            "Total number of collection cache hits."
        );
        describe_counter!(
            "registry_cache_miss_total",
            Unit::Count,
            "Total number of collection cache misses, including expired entries."
        );
        describe_counter!(
            "registry_cache_load_total",
            Unit::Count,
            "Total number of collections loaded from the backing store."
        );
        describe_counter!(
            "registry_cache_evict_total",
            Unit::Count,
            "Total number of collection evictions by expiry or invalidation."
        );
    });
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn second_install_reports_telemetry_error() {
        let logging = LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        };

        // Another test may already own the global subscriber.
        let _ = init(&logging);
        match init(&logging) {
            Err(InfraError::Telemetry(message)) => {
                assert!(message.contains("tracing subscriber"));
            }
            other => panic!("expected telemetry error, got {other:?}"),
        }
    }
}
