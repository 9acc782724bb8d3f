//! Tracing and OpenTelemetry setup.
//!
//! Logs always go to stdout through `tracing_subscriber::fmt`. Spans are
//! exported over OTLP only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, so a
//! bare deployment runs without a collector.

use anyhow::Result;
use once_cell::sync::OnceCell;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime,
    trace::{Tracer, TracerProvider as SdkTracerProvider},
    Resource,
};
use std::{env, time::Duration};
use tonic::transport::ClientTlsConfig;
use tracing::debug;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};
use ulid::Ulid;

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Install the global subscriber. `verbosity_level` comes from `-v` flags;
/// `RUST_LOG` still wins when set.
pub fn init(verbosity_level: Option<tracing::Level>) -> Result<()> {
    let default_level = verbosity_level.unwrap_or(tracing::Level::ERROR);

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    let otlp_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.is_empty());

    if let Some(endpoint) = otlp_endpoint {
        let tracer = init_tracer(&endpoint)?;

        let subscriber = Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .with(OpenTelemetryLayer::new(tracer));

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(env_filter).with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

fn init_tracer(endpoint: &str) -> Result<Tracer> {
    let endpoint = normalize_endpoint(endpoint);

    let mut exporter_builder = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .with_timeout(Duration::from_secs(3));

    if let Some(domain) = endpoint
        .strip_prefix("https://")
        .and_then(|rest| rest.split('/').next())
        .and_then(|authority| authority.split(':').next())
    {
        let tls = ClientTlsConfig::new()
            .domain_name(domain.to_string())
            .with_native_roots();

        exporter_builder = exporter_builder.with_tls_config(tls);
    }

    let exporter = exporter_builder.build()?;

    let instance_id =
        env::var("OTEL_SERVICE_INSTANCE_ID").unwrap_or_else(|_| Ulid::new().to_string());

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![
            KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("service.instance.id", instance_id),
        ]))
        .build();

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));

    // Keep a handle so the exporter can be flushed on exit.
    let _ = TRACER_PROVIDER.set(provider);

    Ok(tracer)
}

/// The tonic exporter expects the gRPC root, not the HTTP path some agents
/// advertise.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');

    trimmed
        .strip_suffix("/v1/traces")
        .unwrap_or(trimmed)
        .to_string()
}

/// Flush and shut down the tracer provider. No-op when tracing was never
/// initialized.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        for result in provider.force_flush() {
            if let Err(err) = result {
                debug!("Failed to flush spans: {err:?}");
            }
        }

        if let Err(err) = provider.shutdown() {
            debug!("Failed to shut down tracer provider: {err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_endpoint, shutdown_tracer};

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("http://localhost:4317"),
            "http://localhost:4317"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:4317/"),
            "http://localhost:4317"
        );
        assert_eq!(
            normalize_endpoint("https://otel.example.com:4317/v1/traces"),
            "https://otel.example.com:4317"
        );
        assert_eq!(
            normalize_endpoint("https://otel.example.com/v1/traces/"),
            "https://otel.example.com"
        );
    }

    #[test]
    fn test_shutdown_without_init() {
        // Without a provider this must return quietly.
        shutdown_tracer();
    }
}
