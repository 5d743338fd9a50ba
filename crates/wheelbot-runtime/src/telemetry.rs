//! Logging and trace export setup.
//!
//! Call [`init_tracing`] once at process startup, before the Tokio runtime
//! spawns anything that logs.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL. When set, spans are exported over OTLP/HTTP. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `WHEELBOT_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |
//!
//! ```rust,no_run
//! let _guard = wheelbot_runtime::telemetry::init_tracing(
//!     &wheelbot_runtime::telemetry::LoggingOptions::from_env("wheelbot"),
//! );
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How the global subscriber is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    pub service_name: String,
    /// Newline-delimited JSON instead of the compact console format.
    pub json: bool,
    /// OTLP/HTTP collector endpoint. `None` disables span export.
    pub otlp_endpoint: Option<String>,
    /// `EnvFilter` directive, e.g. `"info,wheelbot_kernel=debug"`.
    pub filter: String,
}

impl LoggingOptions {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            json: false,
            otlp_endpoint: None,
            filter: "info".to_string(),
        }
    }

    /// Read `WHEELBOT_LOG_FORMAT`, `OTEL_EXPORTER_OTLP_ENDPOINT` and `RUST_LOG`.
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        service_name: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut options = Self::new(service_name);
        options.json = lookup("WHEELBOT_LOG_FORMAT").as_deref() == Some("json");
        options.otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.is_empty());
        if let Some(filter) = lookup("RUST_LOG").filter(|f| !f.is_empty()) {
            options.filter = filter;
        }
        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Install the global `tracing` subscriber.
///
/// Spans go to the OTLP collector when `options.otlp_endpoint` is set. The
/// returned [`TracerProviderGuard`] must be held until the process exits;
/// dropping it flushes pending spans.
pub fn init_tracing(options: &LoggingOptions) -> TracerProviderGuard {
    let env_filter = EnvFilter::try_new(&options.filter).unwrap_or_else(|e| {
        eprintln!("[wheelbot] invalid log filter {:?}: {e}", options.filter);
        EnvFilter::new("info")
    });

    let provider = options
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| build_provider(&options.service_name, endpoint));

    if let Some(ref p) = provider {
        let otel_layer = tracing_opentelemetry::layer().with_tracer(p.tracer("wheelbot"));
        if options.json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
    } else if options.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    TracerProviderGuard(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// RAII guard
// ─────────────────────────────────────────────────────────────────────────────

/// Shuts the [`SdkTracerProvider`] down on drop, flushing pending spans.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("[wheelbot] OpenTelemetry provider shutdown error: {e}");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `None` when the exporter cannot be built; the error goes to
/// stderr since no subscriber exists yet.
fn build_provider(service_name: &str, endpoint: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[wheelbot] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // Simple exporter: no Tokio runtime exists yet at init time.
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let opts = LoggingOptions::from_lookup("wheelbot", lookup(&[]));
        assert_eq!(opts, LoggingOptions::new("wheelbot"));
        assert_eq!(opts.filter, "info");
        assert!(!opts.json);
    }

    #[test]
    fn env_overrides() {
        let opts = LoggingOptions::from_lookup(
            "wheelbot",
            lookup(&[
                ("WHEELBOT_LOG_FORMAT", "json"),
                ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4318"),
                ("RUST_LOG", "debug"),
            ]),
        );
        assert!(opts.json);
        assert_eq!(opts.otlp_endpoint.as_deref(), Some("http://localhost:4318"));
        assert_eq!(opts.filter, "debug");
    }

    #[test]
    fn empty_endpoint_disables_export() {
        let opts = LoggingOptions::from_lookup(
            "wheelbot",
            lookup(&[("OTEL_EXPORTER_OTLP_ENDPOINT", ""), ("WHEELBOT_LOG_FORMAT", "text")]),
        );
        assert_eq!(opts.otlp_endpoint, None);
        assert!(!opts.json);
    }

    #[test]
    fn guard_without_provider_drops_cleanly() {
        let guard = TracerProviderGuard(None);
        assert!(!guard.is_exporting());
        drop(guard);
    }
}
