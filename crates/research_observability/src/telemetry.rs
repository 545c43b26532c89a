//! Subscriber initialization.
//!
//! One registry with an env filter and up to three layers: stderr (opt-in,
//! since stdout carries the live transcript), an append-only log file, and
//! OTLP span export when an endpoint is configured.

use std::fs::OpenOptions;
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use opentelemetry::{global, trace::TracerProvider, KeyValue};
use opentelemetry_otlp::tonic_types::metadata::MetadataMap;
use opentelemetry_otlp::{WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::ObservabilityConfig;
use crate::error::ObservabilityError;

// Kept so buffered spans can be flushed on exit
static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Initialize tracing with the given configuration
///
/// Returns an error if the filter does not parse, the log file cannot be
/// opened, or a global subscriber is already installed. A failing OTLP
/// exporter only disables export.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    let env_filter = build_filter(config.log_level.as_deref())?;

    let console_layer = config.enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
    });

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let otlp = config.otlp_endpoint.as_deref().map(|endpoint| {
        build_otlp_tracer_provider(&config, endpoint).map(|(tracer, provider)| {
            global::set_tracer_provider(provider.clone());
            let _ = TRACER_PROVIDER.set(provider);
            tracer
        })
    });
    let (otel_layer, otlp_error) = match otlp {
        Some(Ok(tracer)) => (Some(OpenTelemetryLayer::new(tracer)), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| ObservabilityError::InitFailed(e.to_string()))?;

    tracing::info!(
        service.name = %config.service_name,
        service.version = config.service_version.as_deref().unwrap_or("unknown"),
        log.file = ?config.log_file,
        otlp.endpoint = ?config.otlp_endpoint,
        "Tracing initialized"
    );
    if let Some(e) = otlp_error {
        tracing::warn!(error = %e, "OTLP export disabled, logging to file only");
    }

    Ok(())
}

/// Flush and stop span export. No-op when export was never enabled.
pub fn shutdown() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            tracing::debug!(error = %e, "Tracer provider shutdown failed");
        }
    }
}

fn build_otlp_tracer_provider(
    config: &ObservabilityConfig,
    endpoint: &str,
) -> Result<(SdkTracer, SdkTracerProvider), ObservabilityError> {
    let mut attributes = vec![KeyValue::new("service.name", config.service_name.clone())];
    if let Some(version) = &config.service_version {
        attributes.push(KeyValue::new("service.version", version.clone()));
    }
    let resource = Resource::builder().with_attributes(attributes).build();

    let mut exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.to_string());
    if let Some(token) = &config.otlp_bearer_token {
        exporter = exporter.with_metadata(auth_metadata(token)?);
    }
    let exporter = exporter
        .build()
        .map_err(|e| ObservabilityError::InitFailed(format!("OTLP exporter for {endpoint}: {e}")))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    let tracer = provider.tracer(config.service_name.clone());

    Ok((tracer, provider))
}

fn auth_metadata(token: &str) -> Result<MetadataMap, ObservabilityError> {
    let mut metadata = MetadataMap::new();
    match format!("Bearer {token}").parse() {
        Ok(value) => {
            metadata.insert("authorization", value);
            Ok(metadata)
        }
        Err(_) => Err(ObservabilityError::InitFailed(
            "OTLP token is not a valid header value".to_string(),
        )),
    }
}

fn build_filter(level: Option<&str>) -> Result<EnvFilter, ObservabilityError> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| ObservabilityError::InitFailed(format!("invalid log filter '{level}': {e}"))),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}
