//! Sentry client bootstrap for error reporting.

use std::sync::Arc;

use crate::config::TelemetryConfig;

/// Error type for Sentry initialization.
#[derive(Debug, thiserror::Error)]
pub enum SentryError {
    /// The configured DSN could not be parsed.
    #[error("invalid sentry dsn: {0}")]
    InvalidDsn(String),
}

/// Build client options from configuration.
///
/// Outside production the DSN is left unset, which makes the client a no-op.
pub fn sentry_options(config: &TelemetryConfig) -> Result<sentry::ClientOptions, SentryError> {
    let dsn = if config.reporting_enabled() {
        config
            .sentry_dsn
            .as_deref()
            .map(|raw| raw.parse().map_err(|e| SentryError::InvalidDsn(format!("{e}"))))
            .transpose()?
    } else {
        None
    };

    Ok(sentry::ClientOptions {
        dsn,
        release: Some(env!("CARGO_PKG_VERSION").into()),
        environment: Some(config.environment.clone().into()),
        traces_sample_rate: config.traces_sample_rate,
        debug: false,
        send_default_pii: false,
        before_send: Some(Arc::new(|mut event| {
            if let Some(ref mut user) = event.user {
                user.email = None;
                user.ip_address = None;
                user.username = None;
            }
            Some(event)
        })),
        ..Default::default()
    })
}

/// Initialize the global Sentry client.
///
/// Keep the returned guard alive for the whole program; dropping it flushes
/// pending events.
pub fn init_sentry(config: &TelemetryConfig) -> Result<sentry::ClientInitGuard, SentryError> {
    Ok(sentry::init(sentry_options(config)?))
}
