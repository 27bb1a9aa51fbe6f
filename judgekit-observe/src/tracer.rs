//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::LogConfig;

/// Error type for tracer initialization.
#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    /// Failed to set global subscriber.
    #[error("failed to set global subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter from `RUST_LOG`, falling back to the configured directive.
#[must_use]
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Initialize the global tracing subscriber.
///
/// Console output goes to stderr so stdout stays free for command output.
/// `error!` events are forwarded to Sentry as issues and `warn!` events as
/// breadcrumbs; without an initialized Sentry client that layer does nothing.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(config: &LogConfig) -> Result<(), TracerError> {
    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let compact_layer = (!config.json).then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    let sentry_layer = sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    Registry::default()
        .with(build_filter(config))
        .with(json_layer)
        .with(compact_layer)
        .with(sentry_layer)
        .try_init()?;

    tracing::debug!("tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::info;

    #[test]
    fn init_tracing_sets_up_global_subscriber() {
        init_tracing(&LogConfig::default()).expect("init_tracing should succeed");

        let span = tracing::info_span!("test_span", test_key = "test_value");
        let _enter = span.enter();
        info!("test message inside span");

        // A second global subscriber is refused.
        assert!(init_tracing(&LogConfig::default()).is_err());
    }
}
