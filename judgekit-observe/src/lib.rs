//! Logging and error reporting bootstrap for judgekit.
//!
//! This crate wires the `tracing` ecosystem to two sinks:
//! - A console formatter (compact or JSON) filtered by `RUST_LOG`
//! - Sentry, which receives `error!` events as issues and `warn!` events
//!   as breadcrumbs
//!
//! Call [`init_sentry`] first and keep its guard alive, then
//! [`init_tracing`].

pub mod config;
pub mod reporting;
pub mod tracer;

pub use config::{LogConfig, TelemetryConfig};
pub use reporting::{SentryError, init_sentry, sentry_options};
pub use tracer::{TracerError, init_tracing};
